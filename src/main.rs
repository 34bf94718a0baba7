use chrono::{NaiveDate, Utc};
use dotenvy::dotenv;
use home_ledger::{
    api,
    config::{self, AppConfig},
    core::overview,
    errors::{Error, Result},
};
use sea_orm::DatabaseConnection;
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const USAGE: &str = "usage: home-ledger [init | report <user_id> [YYYY-MM-DD]]";

/// What the binary was asked to do.
enum Command {
    /// Create missing tables and exit
    Init,
    /// Print the dashboard payloads of one user as JSON
    Report { user_id: i64, today: NaiveDate },
}

fn parse_args(args: &[String]) -> Result<Command> {
    let usage = || Error::Usage {
        message: USAGE.to_string(),
    };
    match args {
        [] => Ok(Command::Init),
        [cmd] if cmd == "init" => Ok(Command::Init),
        [cmd, user_id, rest @ ..] if cmd == "report" && rest.len() <= 1 => {
            let user_id = user_id.parse().map_err(|_| usage())?;
            let today = match rest.first() {
                Some(date) => NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| usage())?,
                None => Utc::now().date_naive(),
            };
            Ok(Command::Report { user_id, today })
        }
        _ => Err(usage()),
    }
}

fn print_json<T: Serialize>(name: &str, response: &api::Response<T>) -> Result<()> {
    let json = serde_json::to_string_pretty(response)
        .inspect_err(|e| error!("Failed to serialize {name}: {e}"))?;
    println!("{name}: {json}");
    Ok(())
}

async fn report(
    db: &DatabaseConnection,
    app_config: &AppConfig,
    user_id: i64,
    today: NaiveDate,
) -> Result<()> {
    let settings = app_config.overview;

    let net_worth = overview::get_net_worth(db, user_id, today, settings).await;
    print_json("net_worth", &api::respond(net_worth))?;

    let consumption = overview::get_total_consumption(db, user_id, today, settings).await;
    print_json("total_consumption", &api::respond(consumption))?;

    let expenses = overview::get_expenses_trend(db, user_id, today, settings).await;
    print_json("expenses_trend", &api::respond(expenses))?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // 1. Load .env before anything reads the environment
    dotenv().ok();

    // 2. Load the application configuration, logged once tracing is up
    let loaded = config::load_app_configuration()?;

    // 3. Initialize tracing, RUST_LOG wins over the configured filter
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&loaded.config.logging.filter)),
        )
        .init();
    loaded.log_origin();
    let app_config = loaded.config;
    info!("Configuration loaded, database at {}", app_config.database.url);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let command = parse_args(&args).inspect_err(|e| error!("{e}"))?;

    // 4. Connect and make sure the schema exists
    let db = config::database::create_connection(&app_config.database)
        .await
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    config::database::create_tables(&db).await?;

    match command {
        Command::Init => info!("Database initialized successfully."),
        Command::Report { user_id, today } => report(&db, &app_config, user_id, today).await?,
    }

    Ok(())
}

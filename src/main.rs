use clap::Parser;
use trendintel::cli::commands::{Cli, Commands};
use trendintel::domain::entities::snapshot::RawSourceOutput;
use trendintel::domain::values::source_category::SourceCategory;
use trendintel::TrendIntel;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let db_path = std::env::var("TRENDINTEL_DB").unwrap_or_else(|_| "./trendintel.db".into());
    let config_dir =
        std::env::var("TRENDINTEL_CONFIG_DIR").unwrap_or_else(|_| "./config".into());

    let ti = match TrendIntel::new(&db_path, std::path::Path::new(&config_dir)) {
        Ok(ti) => ti,
        Err(e) => {
            eprintln!("Error initializing TrendIntel: {e}");
            std::process::exit(1);
        }
    };

    let result = run_command(ti, cli.command).await;
    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run_command(ti: TrendIntel, cmd: Commands) -> Result<(), Box<dyn std::error::Error>> {
    match cmd {
        Commands::SnapshotBuild { date, input } => {
            let date = parse_date(&date)?;
            let raw = std::fs::read_to_string(&input)?;
            let outputs: Vec<RawSourceOutput> = serde_json::from_str(&raw)?;
            let snapshot = ti.build_snapshot(date, &outputs)?;
            println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
        }
        Commands::Snapshots => {
            let dates = ti.snapshot_dates()?;
            for d in &dates {
                println!("{d}");
            }
        }
        Commands::Refresh { date, window } => {
            let date = parse_date(&date)?;
            let report = ti.refresh_signals(date, window).await?;
            println!("{}", serde_json::to_string_pretty(&report).unwrap());
        }
        Commands::Resolve {
            date,
            name,
            category,
            context,
        } => match name {
            Some(name) => {
                let category: Option<SourceCategory> =
                    category.map(|c| c.parse()).transpose().map_err(|e: String| e)?;
                let resolution = ti.resolve_name(&name, category, &context);
                println!("{}", serde_json::to_string_pretty(&resolution).unwrap());
            }
            None => {
                let date = parse_date(&date)?;
                let scan = ti.resolve_entities(date)?;
                println!("{}", serde_json::to_string_pretty(&scan).unwrap());
            }
        },
        Commands::Score { entity, date } => {
            let date = parse_date(&date)?;
            let assessment = ti.score_conviction(&entity, date)?;
            println!("{}", serde_json::to_string_pretty(&assessment).unwrap());
        }
        Commands::Backtest {
            prediction_date,
            validation_date,
            top_k,
        } => {
            let prediction = parse_date(&prediction_date)?;
            let validation = parse_date(&validation_date)?;
            let scorecard = ti.run_backtest(prediction, validation, top_k)?;
            println!("{}", serde_json::to_string_pretty(&scorecard).unwrap());
        }
    }
    Ok(())
}

fn parse_date(s: &str) -> Result<chrono::NaiveDate, String> {
    chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {s}. Use YYYY-MM-DD"))
}

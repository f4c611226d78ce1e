use clap::{Parser, Subcommand};
use serde_json::{json, Value};

use obs_lab::observability::metrics::{
    sample_sum, ERRORS_TOTAL, LOGIN_ERRORS_TOTAL, REQUESTS_TOTAL,
};

#[derive(Parser)]
#[command(name = "obs-cli")]
#[command(about = "Management CLI for the obs-lab service", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Liveness probe
    Health,
    /// Readiness probe
    Ready,
    /// Flip the readiness flag
    ToggleReady,
    /// Dump the raw Prometheus exposition
    Metrics,
    /// Summarize request and error counters
    Summary,
    /// Send a log entry as a frontend client would
    Log {
        level: String,
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/healthz", base)).send().await?;
            print_json(res).await?;
        }
        Commands::Ready => {
            let res = client.get(format!("{}/readyz", base)).send().await?;
            print_json(res).await?;
        }
        Commands::ToggleReady => {
            let res = client.post(format!("{}/toggle-ready", base)).send().await?;
            print_json(res).await?;
        }
        Commands::Metrics => {
            let body = client
                .get(format!("{}/metrics", base))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            print!("{}", body);
        }
        Commands::Summary => {
            let body = client
                .get(format!("{}/metrics", base))
                .send()
                .await?
                .error_for_status()?
                .text()
                .await?;
            println!("{:<28} {:>10}", "SERIES", "TOTAL");
            for name in [REQUESTS_TOTAL, ERRORS_TOTAL, LOGIN_ERRORS_TOTAL] {
                println!("{:<28} {:>10}", name, sample_sum(&body, name));
            }
        }
        Commands::Log { level, message } => {
            let res = client
                .post(format!("{}/client-logs", base))
                .json(&json!({ "level": level, "message": message }))
                .send()
                .await?;
            println!("{} {}", res.status(), res.text().await?);
        }
    }

    Ok(())
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body: Value = res.json().await?;
    println!("{} {}", status, serde_json::to_string_pretty(&body)?);
    Ok(())
}

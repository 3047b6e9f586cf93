use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::{json, Value};

use resilience_gateway::CircuitState;

#[derive(Parser)]
#[command(name = "gateway-cli")]
#[command(about = "Management CLI for the resilience gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Admin API key, required by `force`.
    #[arg(short, long, default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show actuator health with every breaker
    Health,
    /// List circuit breakers
    Breakers,
    /// Inspect one circuit breaker
    Breaker { name: String },
    /// Force a circuit breaker into CLOSED, OPEN or HALF_OPEN
    Force {
        name: String,
        #[arg(value_parser = parse_state)]
        state: CircuitState,
    },
    /// Call the protected upstream once
    Fetch,
}

fn parse_state(s: &str) -> Result<CircuitState, String> {
    s.parse()
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Health => {
            let res = client.get(format!("{}/actuator/health", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Breakers => {
            let res = client.get(format!("{}/actuator/circuitbreakers", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Breaker { name } => {
            let res = client
                .get(format!("{}/actuator/circuitbreakers/{}", cli.url, name))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Force { name, state } => {
            let mut headers = HeaderMap::new();
            headers.insert(
                AUTHORIZATION,
                HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
            );
            let res = client
                .post(format!("{}/admin/circuitbreakers/{}/state", cli.url, name))
                .headers(headers)
                .json(&json!({ "state": state }))
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Fetch => {
            let res = client.get(format!("{}/api/greek", cli.url)).send().await?;
            println!("{}", res.text().await?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: gateway returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

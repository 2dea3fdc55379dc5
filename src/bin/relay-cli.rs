use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::Value;

use lambda_relay::http::X_REQUEST_ID;
use lambda_relay::instrumentation::{SpanContext, TRACEPARENT};

#[derive(Parser)]
#[command(name = "relay-cli")]
#[command(about = "Smoke-test client for deployed relay endpoints", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Invoke the endpoint and print the decoded envelope
    Invoke {
        /// Number of sequential invocations
        #[arg(short, long, default_value_t = 1)]
        count: u32,

        /// Start a new trace and send its traceparent header
        #[arg(long)]
        trace: bool,
    },
    /// Probe the health endpoint
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Invoke { count, trace } => {
            for i in 1..=count {
                let mut headers = HeaderMap::new();
                headers.insert(X_REQUEST_ID, HeaderValue::from_str(&format!("relay-cli-{}", i))?);
                if trace {
                    let context = SpanContext::root();
                    headers.insert(TRACEPARENT, HeaderValue::from_str(&context.traceparent().to_string())?);
                    println!("trace_id: {}", context.trace_id_hex());
                }

                let res = client.get(format!("{}/", base)).headers(headers).send().await?;
                print_envelope(res).await?;
            }
        }
        Commands::Health => {
            let res = client.get(format!("{}/health", base)).send().await?;
            println!("{} {}", res.status(), res.text().await?);
        }
    }

    Ok(())
}

async fn print_envelope(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let content_type = res
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();
    let text = res.text().await?;

    println!("statusCode: {}", status.as_u16());
    println!("Content-Type: {}", content_type);
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => {
            eprintln!("Warning: body is not JSON");
            println!("{}", text);
        }
    }
    Ok(())
}

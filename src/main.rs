use anyhow::{bail, Context as _};
use clap::{Parser, Subcommand};
use dogapi::config::{credentials_file, Credentials};
use dogapi::metrics::from_unix;
use dogapi::{Client, ClientConfig, DataPoint, Metric};
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    #[command(about = "Write an empty credentials file")]
    Init {},
    #[command(about = "Submit metric points")]
    Post {
        #[arg(short, long, conflicts_with = "file")]
        metric: Option<String>,
        #[arg(short, long, requires = "metric")]
        value: Option<f64>,
        #[arg(long, requires = "metric")]
        timestamp: Option<f64>,
        #[arg(long = "type", default_value = "gauge")]
        metric_type: String,
        #[arg(long, default_value = "")]
        host: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(short, long, help = "JSON array of metrics")]
        file: Option<PathBuf>,
    },
    #[command(about = "Query metric series")]
    Query {
        #[arg(short, long)]
        query: String,
        #[arg(long, help = "start, UNIX seconds")]
        from: i64,
        #[arg(long, help = "end, UNIX seconds")]
        to: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Init {} => {
            let file = credentials_file();
            if file.path().exists() {
                log::info!("credentials already exist at {:?}", file.path());
                return Ok(());
            }
            file.save_toml(Credentials::default())
                .map_err(|e| anyhow::anyhow!("failed to save the credentials: {:?}", e))?;
            println!("{}", file.path().display());
        }
        Commands::Post {
            metric,
            value,
            timestamp,
            metric_type,
            host,
            tags,
            file,
        } => {
            let series = match (file, metric) {
                (Some(path), _) => {
                    let data = fs::read_to_string(&path)
                        .with_context(|| format!("unable to read {}", path.display()))?;
                    serde_json::from_str::<Vec<Metric>>(&data)
                        .with_context(|| format!("unable to parse {}", path.display()))?
                }
                (None, Some(name)) => {
                    let value = match value {
                        Some(v) => v,
                        None => bail!("--value is required with --metric"),
                    };
                    let point = match timestamp {
                        Some(ts) => DataPoint::new(ts, value),
                        None => DataPoint::now(value),
                    };
                    vec![Metric {
                        metric: name,
                        points: vec![point],
                        metric_type,
                        host,
                        tags,
                    }]
                }
                (None, None) => bail!("either --metric or --file is required"),
            };

            let client = Client::new(ClientConfig::load()?)?;
            client.post_metrics(&series).await?;
            log::info!("posted {} series", series.len());
        }
        Commands::Query { query, from, to } => {
            let client = Client::new(ClientConfig::load()?)?;
            let series = client
                .query_metrics(&query, from_unix(from)?, from_unix(to)?)
                .await?;
            println!("{}", serde_json::to_string_pretty(&series)?);
        }
    }

    Ok(())
}

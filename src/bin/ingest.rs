//! `biofeedback-ingest` — post transcription files to the biofeedback API.
//!
//! ```bash
//! biofeedback-ingest --dir sample_data --api-url http://localhost:8000
//! ```

use std::path::PathBuf;

use clap::Parser;

use biofeedback_api::ingest::{run, IngestClient, TokenRequest};

#[derive(Parser)]
#[command(name = "biofeedback-ingest", version, about)]
struct Cli {
    /// Directory of transcription `.json` files
    #[arg(long, env = "INGEST_DIR", default_value = "sample_data")]
    dir: PathBuf,

    /// Base URL of the biofeedback API
    #[arg(long, env = "BIOFEEDBACK_API_URL", default_value = "http://localhost:8000")]
    api_url: String,

    /// Token endpoint. When set, a token is fetched before any file is sent.
    #[arg(long, env = "INGEST_TOKEN_URL")]
    token_url: Option<String>,

    #[arg(long, env = "INGEST_USERNAME", default_value = "")]
    username: String,

    #[arg(long, env = "INGEST_PASSWORD", default_value = "", hide_env_values = true)]
    password: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "biofeedback_api=info,biofeedback_ingest=info".into()),
        )
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let mut client = IngestClient::new(&cli.api_url);

    let token = cli.token_url.clone().map(|url| TokenRequest {
        url,
        username: cli.username.clone(),
        password: cli.password.clone(),
    });

    let summary = match run(&mut client, token.as_ref(), &cli.dir).await {
        Ok(summary) => summary,
        Err(e) => {
            tracing::error!(error = %format!("{e:#}"), "Ingestion aborted");
            return Err(e);
        }
    };
    tracing::info!(
        processed = summary.processed,
        failed = summary.failed,
        dir = %cli.dir.display(),
        "Ingestion finished"
    );

    Ok(())
}

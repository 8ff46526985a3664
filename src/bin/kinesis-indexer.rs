//! Indexes the records of one Kinesis event read from stdin.
//!
//! ```bash
//! INDEXER_REGION=us-east-1 \
//! INDEXER_ENDPOINT=https://search-demo.us-east-1.es.amazonaws.com \
//! INDEXER_INDEX=orders INDEXER_DOC_TYPE=order \
//!     kinesis-indexer < event.json
//! ```

use std::process;

use tokio::io::AsyncReadExt;
use tracing_subscriber::EnvFilter;

use kinesis_indexer::{credentials, handler, HttpTransport, Result, TargetConfig};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        tracing::error!(error = %e, "invocation failed");
        eprintln!("Error: {e}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = TargetConfig::from_env()?;
    let credentials = credentials::resolve().await?;

    let mut payload = Vec::new();
    tokio::io::stdin().read_to_end(&mut payload).await?;
    let records = handler::parse_event(&payload)?;

    let transport = HttpTransport::new()?;
    let result = handler::handle_records(&records, &config, &credentials, &transport).await?;
    println!("{}", result.summary());
    Ok(())
}

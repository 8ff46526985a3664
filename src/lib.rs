//! Forwards batches of Kinesis stream records to an Elasticsearch/OpenSearch
//! domain as SigV4-signed document writes.
//!
//! ```no_run
//! use kinesis_indexer::{credentials, handler, HttpTransport, TargetConfig};
//!
//! # async fn invoke(event: &[u8]) -> kinesis_indexer::Result<()> {
//! let config = TargetConfig::from_env()?;
//! let credentials = credentials::resolve().await?;
//! let records = handler::parse_event(event)?;
//! let result = handler::handle_records(&records, &config, &credentials, &HttpTransport::new()?).await?;
//! println!("{}", result.summary());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod credentials;
pub mod error;
pub mod forwarder;
pub mod handler;
pub mod interface;
pub mod transport;

pub use config::{Endpoint, TargetConfig};
pub use error::{Error, Result};
pub use forwarder::{BatchForwarder, BatchResult};
pub use interface::processor::{OutcomeSink, RecordProcessor, TracingSink};
pub use interface::record::StreamRecord;
pub use transport::{HttpTransport, Transport};

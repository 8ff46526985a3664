use base64::{engine::general_purpose::STANDARD, Engine as _};
use rusoto_kinesis::Record;
use serde::Deserialize;

/// A single stream record as delivered to the indexer. `data` holds the
/// base64-encoded document body exactly as it appears in the stream event.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamRecord {
    #[serde(default)]
    pub sequence_number: String,
    #[serde(default)]
    pub partition_key: String,
    pub data: String,
}

impl StreamRecord {
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            sequence_number: String::new(),
            partition_key: String::new(),
            data: data.into(),
        }
    }

    /// Wraps a raw document body, encoding it the way the stream would.
    pub fn from_body(body: impl AsRef<[u8]>) -> Self {
        Self::new(STANDARD.encode(body))
    }

    /// Records read through the Kinesis API carry raw bytes; re-encode them so
    /// every record reaching the forwarder has the same envelope.
    pub fn from_record(record: Record) -> Self {
        Self {
            sequence_number: record.sequence_number,
            partition_key: record.partition_key,
            data: STANDARD.encode(&record.data),
        }
    }

    /// Decodes the payload into the document text.
    pub fn decode(&self) -> Result<String, DecodeError> {
        let bytes = STANDARD.decode(self.data.trim())?;
        Ok(String::from_utf8(bytes)?)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("payload is not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// The Lambda-style Kinesis event envelope.
#[derive(Debug, Deserialize)]
pub struct KinesisEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<KinesisEventRecord>,
}

#[derive(Debug, Deserialize)]
pub struct KinesisEventRecord {
    pub kinesis: StreamRecord,
}

impl KinesisEvent {
    pub fn into_records(self) -> Vec<StreamRecord> {
        self.records.into_iter().map(|r| r.kinesis).collect()
    }
}

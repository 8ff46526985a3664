use async_trait::async_trait;
use rusoto_kinesis::Record;

use super::record::StreamRecord;

pub struct InitializationInput {
    pub shard_id: String,
}

pub struct ProcessRecordsInput {
    pub records: Vec<StreamRecord>,
    pub is_at_shard_end: bool,
}

impl ProcessRecordsInput {
    /// Wraps records read through the Kinesis API.
    pub fn from_kinesis(records: Vec<Record>, is_at_shard_end: bool) -> Self {
        Self {
            records: records.into_iter().map(StreamRecord::from_record).collect(),
            is_at_shard_end,
        }
    }
}

/// Lifecycle hooks a shard consumer drives for every shard it owns.
#[async_trait]
pub trait RecordProcessor: Send + Sync {
    async fn initialize(&self, input: InitializationInput);
    async fn process_records(&self, input: ProcessRecordsInput);
    async fn lease_lost(&self);
    async fn shard_ended(&self);
    async fn shutdown_requested(&self);
}

/// Fire-and-forget notifications for individual record outcomes.
pub trait OutcomeSink: Send + Sync {
    fn succeed(&self, message: &str);
    fn fail(&self, message: &str);
}

/// Sink that turns outcomes into log events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl OutcomeSink for TracingSink {
    fn succeed(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn fail(&self, message: &str) {
        tracing::warn!("{}", message);
    }
}

use std::sync::{
    atomic::{AtomicBool, AtomicUsize, Ordering},
    Arc,
};

use async_trait::async_trait;
use rusoto_core::credential::AwsCredentials;
use tokio::sync::RwLock;

use crate::config::TargetConfig;
use crate::error::Result;
use crate::forwarder::{BatchForwarder, BatchResult};
use crate::interface::processor::{
    InitializationInput, OutcomeSink, ProcessRecordsInput, RecordProcessor, TracingSink,
};
use crate::interface::record::{KinesisEvent, StreamRecord};
use crate::transport::Transport;

/// Parses a Lambda Kinesis event into the records it carries.
pub fn parse_event(payload: &[u8]) -> Result<Vec<StreamRecord>> {
    let event: KinesisEvent = serde_json::from_slice(payload)?;
    Ok(event.into_records())
}

/// Runs one invocation with log-backed outcome reporting.
pub async fn handle_records<T: Transport + ?Sized>(
    records: &[StreamRecord],
    config: &TargetConfig,
    credentials: &AwsCredentials,
    transport: &T,
) -> Result<BatchResult> {
    handle_records_with_sink(records, config, credentials, transport, &TracingSink).await
}

pub async fn handle_records_with_sink<T, S>(
    records: &[StreamRecord],
    config: &TargetConfig,
    credentials: &AwsCredentials,
    transport: &T,
    sink: &S,
) -> Result<BatchResult>
where
    T: Transport + ?Sized,
    S: OutcomeSink + ?Sized,
{
    let forwarder = BatchForwarder::new(records, config, credentials, transport, sink)?;
    let result = forwarder.run().await;
    tracing::info!(
        processed = result.processed,
        failed = result.failed,
        index = %config.index,
        "{}",
        result.summary()
    );
    Ok(result)
}

/// Feeds every batch a shard consumer delivers into a [`BatchForwarder`].
pub struct IndexingProcessor<T> {
    config: TargetConfig,
    credentials: AwsCredentials,
    transport: Arc<T>,

    shard_id: RwLock<Option<String>>,
    processed: AtomicUsize,
    failed: AtomicUsize,
    finished: AtomicBool,
}

impl<T: Transport> IndexingProcessor<T> {
    pub fn new(config: TargetConfig, credentials: AwsCredentials, transport: Arc<T>) -> Self {
        Self {
            config,
            credentials,
            transport,
            shard_id: RwLock::new(None),
            processed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        }
    }

    /// Documents indexed and failed across every batch so far.
    pub fn totals(&self) -> (usize, usize) {
        (
            self.processed.load(Ordering::SeqCst),
            self.failed.load(Ordering::SeqCst),
        )
    }

    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    async fn shard(&self) -> String {
        self.shard_id
            .read()
            .await
            .clone()
            .unwrap_or_else(|| "unassigned".to_string())
    }
}

#[async_trait]
impl<T: Transport + 'static> RecordProcessor for IndexingProcessor<T> {
    async fn initialize(&self, input: InitializationInput) {
        tracing::info!(shard_id = %input.shard_id, "indexing processor initialized");
        *self.shard_id.write().await = Some(input.shard_id);
    }

    async fn process_records(&self, input: ProcessRecordsInput) {
        if self.is_finished() {
            let shard_id = self.shard().await;
            tracing::warn!(shard_id = %shard_id, "dropping records delivered after shutdown");
            return;
        }

        match handle_records(
            &input.records,
            &self.config,
            &self.credentials,
            self.transport.as_ref(),
        )
        .await
        {
            Ok(result) => {
                self.processed.fetch_add(result.processed, Ordering::SeqCst);
                self.failed.fetch_add(result.failed, Ordering::SeqCst);
            }
            Err(err) => {
                // A batch that cannot even start counts entirely as failed.
                let shard_id = self.shard().await;
                tracing::error!(shard_id = %shard_id, error = %err, "batch aborted");
                self.failed.fetch_add(input.records.len(), Ordering::SeqCst);
            }
        }

        if input.is_at_shard_end {
            self.shard_ended().await;
        }
    }

    async fn lease_lost(&self) {
        let shard_id = self.shard().await;
        tracing::warn!(shard_id = %shard_id, "lease lost");
        self.finished.store(true, Ordering::SeqCst);
    }

    async fn shard_ended(&self) {
        let shard_id = self.shard().await;
        let (processed, failed) = self.totals();
        tracing::info!(shard_id = %shard_id, processed, failed, "shard ended");
        self.finished.store(true, Ordering::SeqCst);
    }

    async fn shutdown_requested(&self) {
        let shard_id = self.shard().await;
        let (processed, failed) = self.totals();
        tracing::info!(shard_id = %shard_id, processed, failed, "shutdown requested");
        self.finished.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;
    use rusoto_kinesis::Record;

    use super::*;
    use crate::config::Endpoint;
    use crate::error::Error;
    use crate::transport::testing::{RecordingSink, Reply, ScriptedTransport};

    fn config() -> TargetConfig {
        let endpoint = Endpoint::parse("search.example.com").unwrap();
        TargetConfig::new("eu-central-1", endpoint, "clicks", "click").unwrap()
    }

    fn credentials() -> AwsCredentials {
        AwsCredentials::new("AKIDEXAMPLE", "secret", None, None)
    }

    fn api_record(data: &'static [u8]) -> Record {
        Record {
            sequence_number: "1".to_string(),
            partition_key: "pk".to_string(),
            data: Bytes::from_static(data),
            ..Default::default()
        }
    }

    #[test]
    fn parse_event_reads_records() {
        let payload = br#"{"Records":[{"kinesis":{"data":"QQ=="}},{"kinesis":{"data":"Qg=="}}]}"#;
        let records = parse_event(payload).unwrap();
        let bodies: Vec<String> = records.iter().map(|r| r.decode().unwrap()).collect();
        assert_eq!(bodies, vec!["A", "B"]);
    }

    #[test]
    fn parse_event_rejects_garbage() {
        assert!(matches!(parse_event(b"{\"Records\": 3}"), Err(Error::Event(_))));
    }

    #[tokio::test]
    async fn handles_parsed_event() {
        let payload = br#"{"Records":[{"kinesis":{"data":"QQ=="}},{"kinesis":{"data":"Qg=="}},{"kinesis":{"data":"Qw=="}}]}"#;
        let records = parse_event(payload).unwrap();
        let transport = ScriptedTransport::new().reply("B", Reply::Status(503));
        let sink = RecordingSink::default();

        let result = handle_records_with_sink(&records, &config(), &credentials(), &transport, &sink)
            .await
            .unwrap();

        assert_eq!(result.processed, 2);
        assert_eq!(result.failed_bodies, vec!["B".to_string()]);
        assert_eq!(result.summary(), "Processed 2 documents, failed 1");
    }

    #[tokio::test]
    async fn invalid_credentials_abort_the_invocation() {
        let records = vec![StreamRecord::from_body("A")];
        let transport = ScriptedTransport::new();
        let credentials = AwsCredentials::new("", "secret", None, None);

        let err = handle_records(&records, &config(), &credentials, &transport)
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Credentials(_)));
        assert!(transport.sent_bodies().is_empty());
    }

    #[tokio::test]
    async fn processor_accumulates_batches() {
        let transport = Arc::new(ScriptedTransport::new().reply("bad", Reply::Error));
        let processor = IndexingProcessor::new(config(), credentials(), transport.clone());

        processor
            .initialize(InitializationInput {
                shard_id: "shardId-000000000001".to_string(),
            })
            .await;
        processor
            .process_records(ProcessRecordsInput::from_kinesis(
                vec![api_record(b"good"), api_record(b"bad")],
                false,
            ))
            .await;
        processor
            .process_records(ProcessRecordsInput::from_kinesis(
                vec![api_record(b"more")],
                true,
            ))
            .await;

        assert_eq!(processor.totals(), (2, 1));
        assert!(processor.is_finished());
        assert_eq!(transport.sent_bodies().len(), 3);
    }

    #[tokio::test]
    async fn processor_ignores_records_after_lease_loss() {
        let transport = Arc::new(ScriptedTransport::new());
        let processor = IndexingProcessor::new(config(), credentials(), transport.clone());

        processor.lease_lost().await;
        processor
            .process_records(ProcessRecordsInput {
                records: vec![StreamRecord::from_body("late")],
                is_at_shard_end: false,
            })
            .await;

        assert_eq!(processor.totals(), (0, 0));
        assert!(transport.sent_bodies().is_empty());
    }
}

//! Fans a batch of stream records out into concurrent signed document writes.
//!
//! Every record runs through its own pipeline (decode, build, sign, send). The
//! pipelines are polled together on the calling task, so at most one of them is
//! doing CPU work at any instant while any number may be waiting on the network.
//! Outcomes are drained by a single loop that owns the tally; a record's failure
//! is recorded and never stops its siblings.

use futures::stream::{FuturesUnordered, StreamExt};
use rusoto_core::credential::AwsCredentials;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::TargetConfig;
use crate::credentials;
use crate::error::Result;
use crate::interface::processor::OutcomeSink;
use crate::interface::record::{DecodeError, StreamRecord};
use crate::transport::{Transport, TransportError};

pub mod request;

use request::OutboundRequest;

/// Counts for one invocation. `failed_bodies` keeps the documents that were not
/// indexed, in the order their writes completed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub processed: usize,
    pub failed: usize,
    pub failed_bodies: Vec<String>,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.processed + self.failed
    }

    pub fn summary(&self) -> String {
        format!(
            "Processed {} documents, failed {}",
            self.processed, self.failed
        )
    }

    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Success(_) => self.processed += 1,
            Outcome::Failure(body) => {
                self.failed += 1;
                self.failed_bodies.push(body);
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Success(String),
    Failure(String),
}

/// Why a single record was not indexed.
#[derive(Debug, Error)]
pub enum RecordError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error("index rejected document with status {status}: {body}")]
    Status { status: u16, body: String },
}

pub struct BatchForwarder<'a, T: ?Sized, S: ?Sized> {
    records: &'a [StreamRecord],
    config: &'a TargetConfig,
    credentials: &'a AwsCredentials,
    transport: &'a T,
    sink: &'a S,
}

impl<'a, T, S> BatchForwarder<'a, T, S>
where
    T: Transport + ?Sized,
    S: OutcomeSink + ?Sized,
{
    /// Fails if the credentials cannot sign or the target is malformed; nothing
    /// is sent in that case.
    pub fn new(
        records: &'a [StreamRecord],
        config: &'a TargetConfig,
        credentials: &'a AwsCredentials,
        transport: &'a T,
        sink: &'a S,
    ) -> Result<Self> {
        credentials::validate(credentials)?;
        config.validate()?;
        Ok(Self {
            records,
            config,
            credentials,
            transport,
            sink,
        })
    }

    /// Sends every record and waits for all of them. Never fails on account of
    /// individual records, even if all of them fail.
    pub async fn run(&self) -> BatchResult {
        let mut pending = self
            .records
            .iter()
            .map(|record| self.forward(record))
            .collect::<FuturesUnordered<_>>();

        let mut result = BatchResult::default();
        while let Some(outcome) = pending.next().await {
            match &outcome {
                Outcome::Success(body) => self
                    .sink
                    .succeed(&format!("Added document: '{}'", body)),
                Outcome::Failure(body) => self
                    .sink
                    .fail(&format!("Failed to add document: '{}'", body)),
            }
            result.record(outcome);
        }
        result
    }

    async fn forward(&self, record: &StreamRecord) -> Outcome {
        let body = match record.decode() {
            Ok(body) => body,
            Err(err) => {
                warn!(
                    sequence_number = %record.sequence_number,
                    error = %err,
                    "could not decode record"
                );
                return Outcome::Failure(record.data.clone());
            }
        };

        match self.index(body.clone()).await {
            Ok(()) => Outcome::Success(body),
            Err(err) => {
                warn!(
                    sequence_number = %record.sequence_number,
                    error = %err,
                    "document write failed"
                );
                Outcome::Failure(body)
            }
        }
    }

    async fn index(&self, body: String) -> std::result::Result<(), RecordError> {
        let request = OutboundRequest::build(self.config, body);
        debug!(path = request.path(), host = ?request.host(), "sending document");

        let signed = request.sign(self.credentials);
        let response = self.transport.send(signed).await?;
        if response.is_success() {
            Ok(())
        } else {
            Err(RecordError::Status {
                status: response.status,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
    }
}

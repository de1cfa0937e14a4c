//! Lead dispatcher — best-effort, at-most-once delivery to two webhooks.
//!
//! A lead is accepted as soon as its required fields are present. The primary
//! (JSON) and backup (multipart) submissions then run as independent tasks;
//! their outcomes are logged and never change the result the caller saw.

pub mod payload;
pub mod webhook;

pub use payload::LeadPayload;
pub use webhook::{FormWebhook, JsonWebhook, LeadSink};

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::DispatchConfig;
use crate::error::DispatchError;
use crate::quiz::record::LeadRecord;

/// Outcome of one webhook submission: HTTP status, or the transport error.
pub type SinkResult = Result<u16, DispatchError>;

/// Handles to the in-flight submissions. Dropping it does not cancel them.
pub struct DispatchHandle {
    pub primary: JoinHandle<SinkResult>,
    pub backup: Option<JoinHandle<SinkResult>>,
}

/// Collected results, for callers (mostly tests) that choose to wait.
#[derive(Debug)]
pub struct DispatchReport {
    pub primary: SinkResult,
    pub backup: Option<SinkResult>,
}

impl DispatchHandle {
    /// Wait for both submissions to finish.
    pub async fn join(self) -> DispatchReport {
        let primary = flatten(self.primary.await);
        let backup = match self.backup {
            Some(handle) => Some(flatten(handle.await)),
            None => None,
        };
        DispatchReport { primary, backup }
    }
}

fn flatten(joined: Result<SinkResult, tokio::task::JoinError>) -> SinkResult {
    joined.unwrap_or_else(|e| {
        Err(DispatchError::Webhook {
            sink: "task".into(),
            reason: e.to_string(),
        })
    })
}

/// Fires a completed lead at the configured sinks.
pub struct LeadDispatcher {
    primary: Arc<dyn LeadSink>,
    backup: Option<Arc<dyn LeadSink>>,
}

impl LeadDispatcher {
    pub fn new(primary: Arc<dyn LeadSink>, backup: Option<Arc<dyn LeadSink>>) -> Self {
        Self { primary, backup }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        let backup = config
            .backup_url
            .as_ref()
            .map(|url| Arc::new(FormWebhook::new(url.clone())) as Arc<dyn LeadSink>);
        Self::new(Arc::new(JsonWebhook::new(config.primary_url.clone())), backup)
    }

    /// Validate and send. Returns immediately after spawning the submissions;
    /// an incomplete record is refused without any network call.
    pub fn dispatch(&self, record: &LeadRecord) -> Result<DispatchHandle, DispatchError> {
        let missing = record.missing_required();
        if !missing.is_empty() {
            error!(missing = ?missing, "Blocked incomplete lead");
            return Err(DispatchError::Incomplete { missing });
        }

        let payload = Arc::new(LeadPayload::from_record(record));
        info!(
            email = %payload.email,
            project_type = %payload.project_type,
            ab_variant = %payload.ab_variant,
            "Lead accepted, dispatching"
        );

        let primary = spawn_submit(Arc::clone(&self.primary), Arc::clone(&payload));
        let backup = match &self.backup {
            Some(sink) => Some(spawn_submit(Arc::clone(sink), Arc::clone(&payload))),
            None => {
                warn!("Backup webhook not configured, sending primary only");
                None
            }
        };

        Ok(DispatchHandle { primary, backup })
    }
}

fn spawn_submit(sink: Arc<dyn LeadSink>, payload: Arc<LeadPayload>) -> JoinHandle<SinkResult> {
    tokio::spawn(async move {
        let result = sink.submit(&payload).await;
        match &result {
            Ok(status) if (200..300).contains(status) => {
                info!(sink = sink.name(), status, "Lead delivered")
            }
            Ok(status) => warn!(sink = sink.name(), status, "Webhook answered with non-success"),
            Err(e) => error!(sink = sink.name(), error = %e, "Error sending lead"),
        }
        result
    })
}

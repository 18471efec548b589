//! Log sink used by the pipeline.

use tracing::{error, info};

/// Destination for pipeline progress and failure messages.
///
/// `context` is the message identifier, or `None` when the failure cannot
/// be attributed to a message.
pub trait PipelineLogger: Send + Sync {
    /// Record a progress message.
    fn info(&self, context: Option<&str>, text: &str);

    /// Record a failure.
    fn error(&self, context: Option<&str>, text: &str);
}

/// Forwards pipeline messages to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingLogger;

impl PipelineLogger for TracingLogger {
    fn info(&self, context: Option<&str>, text: &str) {
        match context {
            Some(message_id) => info!(message_id, "{text}"),
            None => info!("{text}"),
        }
    }

    fn error(&self, context: Option<&str>, text: &str) {
        match context {
            Some(message_id) => error!(message_id, "{text}"),
            None => error!("{text}"),
        }
    }
}

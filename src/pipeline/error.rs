//! Terminal outcomes of a pipeline run other than success.

use std::fmt::{Display, Formatter};

/// Why a pipeline run did not produce an issue URL.
///
/// The first three variants are expected steady-state outcomes; the rest
/// are failures that get logged at error level and replied to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// No rule matched the event.
    Unmatched,
    /// Another run for the same message is executing.
    InProgress {
        /// Message being processed by the other run.
        message_id: String,
    },
    /// The message already carries the success reaction.
    AlreadyProcessed {
        /// Permalink to the message.
        permalink: String,
    },
    /// Fetching the message's reactions failed.
    ReactionFetch {
        /// Permalink to the message.
        permalink: String,
        /// Underlying failure.
        cause: String,
    },
    /// Creating the GitHub issue failed.
    IssueCreation {
        /// Target repository.
        repository: String,
        /// Underlying failure.
        cause: String,
    },
    /// The issue exists but the success reaction could not be added.
    MarkerApplication {
        /// URL of the created issue.
        issue_url: String,
        /// Success reaction name.
        reaction: String,
        /// Underlying failure.
        cause: String,
    },
    /// A failure outside the modelled stages.
    Unanticipated {
        /// Description of the failure.
        error: String,
        /// Raw event, pretty-printed.
        event_json: String,
    },
}

impl PipelineError {
    /// Whether this outcome is part of normal operation rather than a fault.
    #[must_use]
    pub fn is_expected(&self) -> bool {
        matches!(
            self,
            Self::Unmatched | Self::InProgress { .. } | Self::AlreadyProcessed { .. }
        )
    }
}

impl Display for PipelineError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unmatched => write!(f, "no matching rule"),
            Self::InProgress { message_id } => write!(f, "already in progress: {message_id}"),
            Self::AlreadyProcessed { permalink } => write!(f, "already processed {permalink}"),
            Self::ReactionFetch { permalink, cause } => {
                write!(f, "failed to get reactions for {permalink}: {cause}")
            }
            Self::IssueCreation { repository, cause } => {
                write!(f, "failed to create a GitHub issue in {repository}: {cause}")
            }
            Self::MarkerApplication {
                issue_url,
                reaction,
                cause,
            } => write!(f, "created {issue_url} but failed to add {reaction}: {cause}"),
            Self::Unanticipated { error, event_json } => {
                write!(f, "unhandled error: {error}\nmessage: {event_json}")
            }
        }
    }
}

impl std::error::Error for PipelineError {}

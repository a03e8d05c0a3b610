//! Validation-message aggregation for bulk claim submissions.
//!
//! Given a submission (and optionally one claim) this crate fetches one page of
//! validation messages from the claims-data service, enriches every message
//! with the display fields of the claim it refers to, and reconciles the page
//! metadata the upstream service reports.

mod engine;
mod model;
mod pagination;
mod resolver;
mod rows;
#[cfg(test)]
mod testing;

pub use engine::{classify_source, EngineConfig, MessageAggregationEngine, ValidationMessageQuery};
pub use model::{
    AggregationResult, ClaimDetail, ClaimRef, MessageQuery, MessageRow, MessageType,
    MessagesSource, PageDescriptor, PartialPageDescriptor, ValidationMessage,
    ValidationMessagesPage,
};
pub use pagination::{PaginationConfig, PaginationReconciler, DEFAULT_PAGE_SIZE};
pub use resolver::{recover_claim, ClaimDetailSource, ClaimResolver, ResolverConfig};
pub use rows::{client_display_name, to_row};

/// Failure reported by one of the claims-data collaborators.
#[derive(Debug, Clone, thiserror::Error, Eq, PartialEq)]
pub enum UpstreamError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("upstream returned HTTP {status}: {body}")]
    Status { status: u16, body: String },
    #[error("malformed upstream payload: {0}")]
    Decode(String),
}

impl UpstreamError {
    /// HTTP status reported by the upstream service, when there was one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }
}

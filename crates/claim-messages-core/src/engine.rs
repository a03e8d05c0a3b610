use std::future::Future;

use tracing::debug;
use uuid::Uuid;

use crate::model::{
    AggregationResult, ClaimDetail, MessageQuery, MessageType, MessagesSource, ValidationMessage,
    ValidationMessagesPage,
};
use crate::pagination::{PaginationConfig, PaginationReconciler};
use crate::resolver::{ClaimDetailSource, ClaimResolver, ResolverConfig};
use crate::rows::to_row;
use crate::UpstreamError;

/// Paged validation-message query against the claims-data service.
pub trait ValidationMessageQuery: Send + Sync {
    /// Fetch one page of messages. `Ok(None)` means the service returned no result.
    fn fetch_messages(
        &self,
        query: &MessageQuery,
    ) -> impl Future<Output = Result<Option<ValidationMessagesPage>, UpstreamError>> + Send;
}

#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct EngineConfig {
    pub pagination: PaginationConfig,
    pub resolver: ResolverConfig,
}

/// Builds one page of display-ready validation messages for a submission.
#[derive(Debug, Clone)]
pub struct MessageAggregationEngine<Q, C> {
    messages: Q,
    resolver: ClaimResolver<C>,
    pagination: PaginationReconciler,
}

impl<Q, C> MessageAggregationEngine<Q, C>
where
    Q: ValidationMessageQuery,
    C: ClaimDetailSource,
{
    #[must_use]
    pub fn new(messages: Q, claims: C, config: EngineConfig) -> Self {
        Self {
            messages,
            resolver: ClaimResolver::new(claims, config.resolver),
            pagination: PaginationReconciler::new(config.pagination),
        }
    }

    /// Build the page of messages for `submission_id`, optionally narrowed to
    /// one claim and one message type.
    ///
    /// # Errors
    /// Returns the [`UpstreamError`] of the validation-message query unchanged
    /// when that query fails. Claim lookups never fail the build.
    pub async fn build(
        &self,
        submission_id: Uuid,
        claim_id: Option<Uuid>,
        message_type: Option<MessageType>,
        page: i32,
        size: i32,
    ) -> Result<AggregationResult, UpstreamError> {
        let query = MessageQuery {
            submission_id,
            claim_id,
            message_type,
            source: None,
            page: Some(page),
            size: Some(size),
        };
        self.aggregate(&query, page, size).await
    }

    /// ERROR messages across the whole submission.
    ///
    /// # Errors
    /// Returns the validation-message query failure unchanged.
    pub async fn build_errors(
        &self,
        submission_id: Uuid,
        page: i32,
        size: i32,
    ) -> Result<AggregationResult, UpstreamError> {
        self.build(submission_id, None, Some(MessageType::Error), page, size).await
    }

    /// WARNING messages for one claim, leaving paging to the upstream defaults.
    ///
    /// # Errors
    /// Returns the validation-message query failure unchanged.
    pub async fn build_all_warnings(
        &self,
        submission_id: Uuid,
        claim_id: Uuid,
    ) -> Result<AggregationResult, UpstreamError> {
        let query = MessageQuery {
            claim_id: Some(claim_id),
            message_type: Some(MessageType::Warning),
            ..MessageQuery::for_submission(submission_id)
        };
        self.aggregate(&query, 0, 0).await
    }

    async fn aggregate(
        &self,
        query: &MessageQuery,
        requested_page: i32,
        requested_size: i32,
    ) -> Result<AggregationResult, UpstreamError> {
        let response = self.messages.fetch_messages(query).await?;

        let Some(page) = response.filter(|page| !page.content.is_empty()) else {
            debug!(submission_id = %query.submission_id, "no validation messages returned");
            return Ok(self.empty_result(requested_page, requested_size));
        };

        debug!(
            submission_id = %query.submission_id,
            messages = page.content.len(),
            "fetched validation message page"
        );

        let claim_refs = page.content.iter().filter_map(ValidationMessage::claim_ref);
        let claims = self.resolver.resolve_many(claim_refs).await;
        let no_claim = ClaimDetail::default();
        let rows = page
            .content
            .iter()
            .map(|message| {
                let claim = message
                    .claim_ref()
                    .and_then(|claim| claims.get(&claim))
                    .unwrap_or(&no_claim);
                to_row(message, claim)
            })
            .collect();

        Ok(AggregationResult {
            rows,
            total_message_count: non_negative(page.total_elements),
            total_claims_with_messages: non_negative(page.total_claims),
            pagination: self.pagination.reconcile(
                requested_page,
                requested_size,
                Some(&page.page_descriptor()),
            ),
            messages_source: classify_source(&page.content),
        })
    }

    fn empty_result(&self, requested_page: i32, requested_size: i32) -> AggregationResult {
        AggregationResult {
            rows: Vec::new(),
            total_message_count: 0,
            total_claims_with_messages: 0,
            pagination: self.pagination.from_request(requested_page, requested_size),
            messages_source: MessagesSource::None,
        }
    }
}

/// Classify a page by its first message: no claim means the page holds
/// submission-level messages. An empty page has no source.
///
/// Pages mixing both kinds are classified by whichever comes first.
#[must_use]
pub fn classify_source(messages: &[ValidationMessage]) -> MessagesSource {
    match messages.first() {
        None => MessagesSource::None,
        Some(first) if first.claim_id.is_none() => MessagesSource::Submission,
        Some(_) => MessagesSource::Claim,
    }
}

fn non_negative(value: Option<i64>) -> u64 {
    value.and_then(|value| u64::try_from(value).ok()).unwrap_or(0)
}

use std::collections::{BTreeSet, HashMap};
use std::future::Future;
use std::num::NonZeroUsize;

use futures::future::join_all;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

use crate::model::{ClaimDetail, ClaimRef};
use crate::UpstreamError;

/// Claim-detail lookup against the claims-data service.
pub trait ClaimDetailSource: Send + Sync {
    /// Fetch one claim. `Ok(None)` means the service returned no claim.
    fn fetch_claim(
        &self,
        claim: ClaimRef,
    ) -> impl Future<Output = Result<Option<ClaimDetail>, UpstreamError>> + Send;
}

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct ResolverConfig {
    /// Upper bound on claim lookups in flight at once.
    pub max_in_flight: NonZeroUsize,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self { max_in_flight: NonZeroUsize::new(8).unwrap_or(NonZeroUsize::MIN) }
    }
}

/// Resolves claim references to claim details, one lookup per distinct reference.
#[derive(Debug, Clone)]
pub struct ClaimResolver<S> {
    source: S,
    config: ResolverConfig,
}

impl<S> ClaimResolver<S>
where
    S: ClaimDetailSource,
{
    #[must_use]
    pub fn new(source: S, config: ResolverConfig) -> Self {
        Self { source, config }
    }

    /// Resolve every distinct reference in `refs`.
    ///
    /// Duplicates are collapsed before any lookup is issued, and lookups run
    /// concurrently up to `max_in_flight`. A failed or empty lookup resolves
    /// to [`ClaimDetail::default`], so the returned map always holds an entry
    /// for every distinct reference.
    pub async fn resolve_many<I>(&self, refs: I) -> HashMap<ClaimRef, ClaimDetail>
    where
        I: IntoIterator<Item = ClaimRef>,
    {
        let distinct: BTreeSet<ClaimRef> = refs.into_iter().collect();
        if distinct.is_empty() {
            return HashMap::new();
        }

        debug!(
            distinct_claims = distinct.len(),
            max_in_flight = self.config.max_in_flight.get(),
            "resolving claim details"
        );
        let permits = Semaphore::new(self.config.max_in_flight.get());
        let lookups = distinct.into_iter().map(|claim| self.resolve_one(claim, &permits));
        join_all(lookups).await.into_iter().collect()
    }

    async fn resolve_one(&self, claim: ClaimRef, permits: &Semaphore) -> (ClaimRef, ClaimDetail) {
        let _permit = permits.acquire().await;
        let outcome = self.source.fetch_claim(claim).await;
        (claim, recover_claim(claim, outcome))
    }
}

/// Map one lookup outcome to the detail used for display.
///
/// This is the only place a claim-lookup failure is absorbed: errors and
/// empty results both become [`ClaimDetail::default`].
#[must_use]
pub fn recover_claim(
    claim: ClaimRef,
    outcome: Result<Option<ClaimDetail>, UpstreamError>,
) -> ClaimDetail {
    match outcome {
        Ok(Some(detail)) => detail,
        Ok(None) => {
            warn!(
                submission_id = %claim.submission_id,
                claim_id = %claim.claim_id,
                "claim not returned by claims-data service; using empty claim detail"
            );
            ClaimDetail::default()
        }
        Err(err) => {
            warn!(
                submission_id = %claim.submission_id,
                claim_id = %claim.claim_id,
                error = %err,
                "claim lookup failed; using empty claim detail"
            );
            ClaimDetail::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::testing::StubClaims;

    fn claim_ref(submission_id: Uuid) -> ClaimRef {
        ClaimRef { submission_id, claim_id: Uuid::new_v4() }
    }

    fn detail(ufn: &str) -> ClaimDetail {
        ClaimDetail { unique_file_number: Some(ufn.to_string()), ..ClaimDetail::default() }
    }

    #[test]
    fn recover_claim_keeps_successful_lookup() {
        let claim = claim_ref(Uuid::new_v4());
        assert_eq!(recover_claim(claim, Ok(Some(detail("ABC123")))), detail("ABC123"));
    }

    #[test]
    fn recover_claim_substitutes_default_for_failures() {
        let claim = claim_ref(Uuid::new_v4());
        assert!(recover_claim(claim, Ok(None)).is_empty());
        assert!(recover_claim(
            claim,
            Err(UpstreamError::Status { status: 404, body: "not found".to_string() })
        )
        .is_empty());
        let reset = UpstreamError::Transport("reset".to_string());
        assert!(recover_claim(claim, Err(reset)).is_empty());
    }

    #[tokio::test]
    async fn resolve_many_fetches_each_distinct_reference_once() {
        let submission_id = Uuid::new_v4();
        let first = claim_ref(submission_id);
        let second = claim_ref(submission_id);
        let claims = StubClaims::default()
            .with_claim(first, detail("UFN1"))
            .with_claim(second, detail("UFN2"));
        let resolver = ClaimResolver::new(claims.clone(), ResolverConfig::default());

        let resolved = resolver.resolve_many([first, second, first, first, second]).await;

        assert_eq!(resolved.len(), 2);
        assert_eq!(resolved.get(&first), Some(&detail("UFN1")));
        assert_eq!(resolved.get(&second), Some(&detail("UFN2")));
        assert_eq!(claims.calls_for(first), 1);
        assert_eq!(claims.calls_for(second), 1);
        assert_eq!(claims.total_calls(), 2);
    }

    #[tokio::test]
    async fn resolve_many_absorbs_individual_failures() {
        let submission_id = Uuid::new_v4();
        let good = claim_ref(submission_id);
        let failing = claim_ref(submission_id);
        let missing = claim_ref(submission_id);
        let claims = StubClaims::default().with_claim(good, detail("GOOD")).with_failure(failing);
        let resolver = ClaimResolver::new(claims.clone(), ResolverConfig::default());

        let resolved = resolver.resolve_many([good, failing, missing]).await;

        assert_eq!(resolved.len(), 3);
        assert_eq!(resolved.get(&good), Some(&detail("GOOD")));
        assert_eq!(resolved.get(&failing), Some(&ClaimDetail::default()));
        assert_eq!(resolved.get(&missing), Some(&ClaimDetail::default()));
        assert_eq!(claims.total_calls(), 3);
    }

    #[tokio::test]
    async fn resolve_many_with_no_references_issues_no_lookups() {
        let claims = StubClaims::default();
        let resolver = ClaimResolver::new(claims.clone(), ResolverConfig::default());

        let resolved = resolver.resolve_many(Vec::new()).await;

        assert!(resolved.is_empty());
        assert_eq!(claims.total_calls(), 0);
    }

    #[tokio::test]
    async fn resolve_many_runs_lookups_concurrently_within_bound() {
        let submission_id = Uuid::new_v4();
        let refs: Vec<ClaimRef> = (0..12).map(|_| claim_ref(submission_id)).collect();
        let claims = StubClaims::default().with_delay(Duration::from_millis(20));
        let config =
            ResolverConfig { max_in_flight: NonZeroUsize::new(3).unwrap_or(NonZeroUsize::MIN) };
        let resolver = ClaimResolver::new(claims.clone(), config);

        let resolved = resolver.resolve_many(refs.clone()).await;

        assert_eq!(resolved.len(), refs.len());
        assert_eq!(claims.total_calls(), refs.len());
        assert!(claims.peak_in_flight() > 1, "lookups should overlap");
        assert!(claims.peak_in_flight() <= 3, "peak {} exceeded bound", claims.peak_in_flight());
    }
}

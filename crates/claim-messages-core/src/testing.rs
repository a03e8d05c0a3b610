//! In-memory collaborators for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::engine::ValidationMessageQuery;
use crate::model::{ClaimDetail, ClaimRef, MessageQuery, ValidationMessagesPage};
use crate::resolver::ClaimDetailSource;
use crate::UpstreamError;

#[derive(Debug, Default)]
struct ClaimCounters {
    calls: Mutex<HashMap<ClaimRef, usize>>,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct StubClaims {
    claims: HashMap<ClaimRef, ClaimDetail>,
    failures: HashSet<ClaimRef>,
    delay: Option<Duration>,
    counters: Arc<ClaimCounters>,
}

impl StubClaims {
    pub(crate) fn with_claim(mut self, claim: ClaimRef, detail: ClaimDetail) -> Self {
        self.claims.insert(claim, detail);
        self
    }

    pub(crate) fn with_failure(mut self, claim: ClaimRef) -> Self {
        self.failures.insert(claim);
        self
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn calls_for(&self, claim: ClaimRef) -> usize {
        let calls = self.counters.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.get(&claim).copied().unwrap_or(0)
    }

    pub(crate) fn total_calls(&self) -> usize {
        let calls = self.counters.calls.lock().unwrap_or_else(PoisonError::into_inner);
        calls.values().sum()
    }

    pub(crate) fn peak_in_flight(&self) -> usize {
        self.counters.peak_in_flight.load(Ordering::SeqCst)
    }

    fn record_call(&self, claim: ClaimRef) {
        let mut calls = self.counters.calls.lock().unwrap_or_else(PoisonError::into_inner);
        *calls.entry(claim).or_insert(0) += 1;
    }
}

impl ClaimDetailSource for StubClaims {
    async fn fetch_claim(&self, claim: ClaimRef) -> Result<Option<ClaimDetail>, UpstreamError> {
        self.record_call(claim);
        let current = self.counters.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.counters.peak_in_flight.fetch_max(current, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.counters.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failures.contains(&claim) {
            return Err(UpstreamError::Status {
                status: 500,
                body: "claim lookup exploded".to_string(),
            });
        }
        Ok(self.claims.get(&claim).cloned())
    }
}

#[derive(Debug, Clone)]
pub(crate) struct StubMessages {
    response: Result<Option<ValidationMessagesPage>, UpstreamError>,
    queries: Arc<Mutex<Vec<MessageQuery>>>,
}

impl StubMessages {
    pub(crate) fn returning(page: ValidationMessagesPage) -> Self {
        Self::with_response(Ok(Some(page)))
    }

    pub(crate) fn no_result() -> Self {
        Self::with_response(Ok(None))
    }

    pub(crate) fn failing(err: UpstreamError) -> Self {
        Self::with_response(Err(err))
    }

    fn with_response(response: Result<Option<ValidationMessagesPage>, UpstreamError>) -> Self {
        Self { response, queries: Arc::new(Mutex::new(Vec::new())) }
    }

    pub(crate) fn queries(&self) -> Vec<MessageQuery> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl ValidationMessageQuery for StubMessages {
    async fn fetch_messages(
        &self,
        query: &MessageQuery,
    ) -> Result<Option<ValidationMessagesPage>, UpstreamError> {
        self.queries.lock().unwrap_or_else(PoisonError::into_inner).push(query.clone());
        self.response.clone()
    }
}

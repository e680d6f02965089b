//! Scripted `OnboardingApi` for unit tests.

use std::collections::{BTreeMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;

use super::snapshot::{KycStatus, SnapshotPatch, StatusSnapshot};
use super::steps::StepId;
use crate::api::{
    KycDocument, OnboardingApi, PaymentInfoPayload, ProfilePayload, PublisherChoicePayload,
    SocialLinksPayload,
};
use crate::error::ApiError;

type StatusResult = Result<StatusSnapshot, ApiError>;

enum Scripted {
    Ready(StatusResult),
    Gated(oneshot::Receiver<StatusResult>),
}

/// Build a snapshot from progress flags, `kyc.can_skip` and `next_step`.
pub(crate) fn snapshot(
    flags: &[(&str, bool)],
    can_skip: Option<bool>,
    next_step: Option<&str>,
) -> StatusSnapshot {
    StatusSnapshot {
        progress: flags
            .iter()
            .map(|(k, v)| (k.to_string(), *v))
            .collect::<BTreeMap<_, _>>(),
        kyc: KycStatus {
            can_skip,
            status: None,
        },
        next_step: next_step.map(str::to_string),
        onboarding_step: None,
    }
}

/// Serves a current snapshot, with optional scripted one-off responses.
pub(crate) struct StubApi {
    status: Mutex<StatusSnapshot>,
    scripted: Mutex<VecDeque<Scripted>>,
    mutation_patch: Mutex<SnapshotPatch>,
    mutation_error: Mutex<Option<ApiError>>,
    mutation_gate: Mutex<Option<oneshot::Receiver<()>>>,
    calls: Mutex<Vec<String>>,
}

impl StubApi {
    pub(crate) fn with_status(status: StatusSnapshot) -> Arc<Self> {
        Arc::new(Self {
            status: Mutex::new(status),
            scripted: Mutex::new(VecDeque::new()),
            mutation_patch: Mutex::new(SnapshotPatch::default()),
            mutation_error: Mutex::new(None),
            mutation_gate: Mutex::new(None),
            calls: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn set_status(&self, status: StatusSnapshot) {
        *self.status.lock().unwrap() = status;
    }

    pub(crate) fn push_status_error(&self, err: ApiError) {
        self.scripted
            .lock()
            .unwrap()
            .push_back(Scripted::Ready(Err(err)));
    }

    /// The next `fetch_status` blocks until the returned sender fires.
    pub(crate) fn gate_next_status(&self) -> oneshot::Sender<StatusResult> {
        let (tx, rx) = oneshot::channel();
        self.scripted.lock().unwrap().push_back(Scripted::Gated(rx));
        tx
    }

    pub(crate) fn set_mutation_patch(&self, patch: SnapshotPatch) {
        *self.mutation_patch.lock().unwrap() = patch;
    }

    pub(crate) fn fail_next_mutation(&self, err: ApiError) {
        *self.mutation_error.lock().unwrap() = Some(err);
    }

    /// The next mutation blocks until the returned sender fires.
    pub(crate) fn gate_next_mutation(&self) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        *self.mutation_gate.lock().unwrap() = Some(rx);
        tx
    }

    pub(crate) fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Wait until `name` has been called at least `count` times.
    pub(crate) async fn wait_for_calls(&self, name: &str, count: usize) {
        let wait = async {
            loop {
                let seen = self.calls.lock().unwrap().iter().filter(|c| *c == name).count();
                if seen >= count {
                    return;
                }
                tokio::time::sleep(Duration::from_millis(2)).await;
            }
        };
        tokio::time::timeout(Duration::from_secs(5), wait)
            .await
            .expect("timed out waiting for stub call");
    }

    fn record(&self, call: impl Into<String>) {
        self.calls.lock().unwrap().push(call.into());
    }

    async fn mutation(&self, call: impl Into<String>) -> Result<SnapshotPatch, ApiError> {
        self.record(call);
        let gate = self.mutation_gate.lock().unwrap().take();
        if let Some(rx) = gate {
            let _ = rx.await;
        }
        match self.mutation_error.lock().unwrap().take() {
            Some(err) => Err(err),
            None => Ok(self.mutation_patch.lock().unwrap().clone()),
        }
    }
}

#[async_trait]
impl OnboardingApi for StubApi {
    async fn fetch_status(&self, _artist_id: &str) -> Result<StatusSnapshot, ApiError> {
        self.record("fetch_status");
        let next = self.scripted.lock().unwrap().pop_front();
        match next {
            Some(Scripted::Ready(result)) => result,
            Some(Scripted::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(ApiError::Transport("gate dropped".into()))),
            None => Ok(self.status.lock().unwrap().clone()),
        }
    }

    async fn skip_step(&self, _artist_id: &str, step: StepId) -> Result<SnapshotPatch, ApiError> {
        self.mutation(format!("skip_step:{step}")).await
    }

    async fn submit_profile(
        &self,
        _artist_id: &str,
        _payload: &ProfilePayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.mutation("submit_profile").await
    }

    async fn submit_social_links(
        &self,
        _artist_id: &str,
        _payload: &SocialLinksPayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.mutation("submit_social_links").await
    }

    async fn submit_payment_info(
        &self,
        _artist_id: &str,
        _payload: &PaymentInfoPayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.mutation("submit_payment_info").await
    }

    async fn choose_publisher(
        &self,
        _artist_id: &str,
        _payload: &PublisherChoicePayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.mutation("choose_publisher").await
    }

    async fn upload_kyc_document(
        &self,
        _artist_id: &str,
        _document: KycDocument,
    ) -> Result<SnapshotPatch, ApiError> {
        self.mutation("upload_kyc_document").await
    }

    async fn skip_verification(&self, _artist_id: &str) -> Result<SnapshotPatch, ApiError> {
        self.mutation("skip_verification").await
    }

    async fn complete_onboarding(&self, _artist_id: &str) -> Result<SnapshotPatch, ApiError> {
        self.mutation("complete_onboarding").await
    }
}

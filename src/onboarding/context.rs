//! Onboarding context — single owner of one artist's onboarding state.
//!
//! All reads and writes of the snapshot go through [`OnboardingContext`].
//! Other components hold an `Arc` to it and only ever see cloned state.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::{RwLock, broadcast};
use tracing::{debug, info, warn};

use super::resolver::{Progress, ResolvedStep, resolve_steps};
use super::snapshot::{SnapshotPatch, StatusSnapshot, SuggestedStep};
use super::steps::{StepId, StepRegistry};
use crate::api::{
    KycDocument, OnboardingApi, PaymentInfoPayload, ProfilePayload, PublisherChoicePayload,
    SocialLinksPayload,
};
use crate::error::{ApiError, OnboardingError};

/// Broadcast channel capacity for context events.
const EVENT_CAPACITY: usize = 64;

/// Point-in-time copy of the context's state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextState {
    pub status: Option<StatusSnapshot>,
    pub loading: bool,
    /// Normalized message of the last load failure.
    pub error: Option<String>,
    /// The wizard's cursor.
    pub current_step: Option<StepId>,
    pub last_loaded_at: Option<DateTime<Utc>>,
}

/// Change notifications for subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextEvent {
    StatusChanged,
    CursorChanged(Option<StepId>),
    Unmounted,
}

/// Coordinates onboarding state for one artist.
pub struct OnboardingContext {
    artist_id: String,
    api: Arc<dyn OnboardingApi>,
    registry: Arc<StepRegistry>,
    state: RwLock<ContextState>,
    /// Bumped by every refresh and every applied mutation; older refresh
    /// responses are discarded.
    generation: AtomicU64,
    mounted: AtomicBool,
    tx: broadcast::Sender<ContextEvent>,
}

impl OnboardingContext {
    /// Mount a context. `initial_cursor` is the last known cursor, if any.
    pub fn mount(
        artist_id: impl Into<String>,
        api: Arc<dyn OnboardingApi>,
        registry: Arc<StepRegistry>,
        initial_cursor: Option<StepId>,
    ) -> Arc<Self> {
        let (tx, _rx) = broadcast::channel(EVENT_CAPACITY);
        let artist_id = artist_id.into();
        let current_step = initial_cursor.filter(|s| registry.contains(*s));
        debug!(artist_id = %artist_id, cursor = ?current_step, "Onboarding context mounted");
        Arc::new(Self {
            artist_id,
            api,
            registry,
            state: RwLock::new(ContextState {
                current_step,
                ..Default::default()
            }),
            generation: AtomicU64::new(0),
            mounted: AtomicBool::new(true),
            tx,
        })
    }

    pub fn artist_id(&self) -> &str {
        &self.artist_id
    }

    pub fn registry(&self) -> &StepRegistry {
        &self.registry
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.load(Ordering::SeqCst)
    }

    /// Subscribe to state change events.
    pub fn subscribe(&self) -> broadcast::Receiver<ContextEvent> {
        self.tx.subscribe()
    }

    pub async fn state(&self) -> ContextState {
        self.state.read().await.clone()
    }

    pub async fn current_step(&self) -> Option<StepId> {
        self.state.read().await.current_step
    }

    /// Steps resolved against the current snapshot.
    pub async fn resolved_steps(&self) -> Vec<ResolvedStep> {
        let state = self.state.read().await;
        resolve_steps(self.registry.steps(), state.status.as_ref())
    }

    pub async fn progress(&self) -> Progress {
        Progress::of(&self.resolved_steps().await)
    }

    /// Fetch the snapshot and replace the current one.
    ///
    /// Never fails: a load failure clears the snapshot and sets `error`.
    /// Only the most recently issued refresh is applied.
    pub async fn refresh_status(&self) {
        if !self.is_mounted() {
            return;
        }

        // Taken under the lock so a mutation applied in between orders
        // strictly before or after this request.
        let generation = {
            let mut state = self.state.write().await;
            if !self.is_mounted() {
                return;
            }
            state.loading = true;
            self.generation.fetch_add(1, Ordering::SeqCst) + 1
        };
        debug!(artist_id = %self.artist_id, generation, "Fetching onboarding status");

        let result = self.api.fetch_status(&self.artist_id).await;

        if !self.is_mounted() {
            debug!(
                artist_id = %self.artist_id,
                generation,
                "Dropping status for unmounted context"
            );
            return;
        }

        let cursor_filled = {
            let mut state = self.state.write().await;
            if !self.is_mounted() || self.generation.load(Ordering::SeqCst) != generation {
                debug!(artist_id = %self.artist_id, generation, "Discarding stale status response");
                return;
            }

            match result {
                Ok(snapshot) => {
                    state.status = Some(snapshot);
                    state.error = None;
                    state.last_loaded_at = Some(Utc::now());
                }
                Err(e) => {
                    warn!(
                        artist_id = %self.artist_id,
                        error = %e,
                        "Failed to load onboarding status"
                    );
                    state.status = None;
                    state.error = Some(e.user_message());
                }
            }
            state.loading = false;
            self.fill_cursor(&mut state)
        };

        let _ = self.tx.send(ContextEvent::StatusChanged);
        if let Some(step) = cursor_filled {
            let _ = self.tx.send(ContextEvent::CursorChanged(Some(step)));
        }
    }

    /// Assign the cursor. Does not fetch.
    pub async fn set_current_step(&self, step: Option<StepId>) {
        if !self.is_mounted() {
            return;
        }
        let changed = {
            let mut state = self.state.write().await;
            let changed = state.current_step != step;
            state.current_step = step;
            changed
        };
        if changed {
            debug!(artist_id = %self.artist_id, cursor = ?step, "Cursor moved");
            let _ = self.tx.send(ContextEvent::CursorChanged(step));
        }
    }

    /// Mark an optional step as skipped on the backend.
    ///
    /// Failures are returned to the caller; the load `error` is untouched.
    pub async fn skip_step(&self, step: StepId) -> Result<(), OnboardingError> {
        if !step.has_skip_action() {
            return Err(OnboardingError::NotSkippable {
                step: step.to_string(),
            });
        }
        let api = Arc::clone(&self.api);
        let artist_id = self.artist_id.clone();
        self.mutate("skip", Some(step), async move {
            match step {
                StepId::Kyc => api.skip_verification(&artist_id).await,
                other => api.skip_step(&artist_id, other).await,
            }
        })
        .await
    }

    /// Terminal mutation. Navigation afterwards is the caller's job.
    pub async fn complete_onboarding(&self) -> Result<(), OnboardingError> {
        let result = self
            .mutate("complete", None, self.api.complete_onboarding(&self.artist_id))
            .await;
        if result.is_ok() {
            info!(artist_id = %self.artist_id, "Onboarding completed");
        }
        result
    }

    pub async fn submit_profile(&self, payload: &ProfilePayload) -> Result<(), OnboardingError> {
        self.mutate(
            "submit",
            Some(StepId::Profile),
            self.api.submit_profile(&self.artist_id, payload),
        )
        .await
    }

    pub async fn submit_social_links(
        &self,
        payload: &SocialLinksPayload,
    ) -> Result<(), OnboardingError> {
        self.mutate(
            "submit",
            Some(StepId::SocialMedia),
            self.api.submit_social_links(&self.artist_id, payload),
        )
        .await
    }

    pub async fn submit_payment_info(
        &self,
        payload: &PaymentInfoPayload,
    ) -> Result<(), OnboardingError> {
        self.mutate(
            "submit",
            Some(StepId::Payment),
            self.api.submit_payment_info(&self.artist_id, payload),
        )
        .await
    }

    pub async fn choose_publisher(
        &self,
        payload: &PublisherChoicePayload,
    ) -> Result<(), OnboardingError> {
        self.mutate(
            "submit",
            Some(StepId::Publisher),
            self.api.choose_publisher(&self.artist_id, payload),
        )
        .await
    }

    pub async fn upload_kyc_document(&self, document: KycDocument) -> Result<(), OnboardingError> {
        self.mutate(
            "submit",
            Some(StepId::Kyc),
            self.api.upload_kyc_document(&self.artist_id, document),
        )
        .await
    }

    /// Leave the onboarding flow: reset state and ignore late responses.
    pub async fn unmount(&self) {
        if !self.mounted.swap(false, Ordering::SeqCst) {
            return;
        }
        {
            let mut state = self.state.write().await;
            *state = ContextState::default();
        }
        debug!(artist_id = %self.artist_id, "Onboarding context unmounted");
        let _ = self.tx.send(ContextEvent::Unmounted);
    }

    /// Run a mutation and merge its result into the snapshot.
    async fn mutate<F>(
        &self,
        action: &'static str,
        step: Option<StepId>,
        call: F,
    ) -> Result<(), OnboardingError>
    where
        F: Future<Output = Result<SnapshotPatch, ApiError>>,
    {
        if !self.is_mounted() {
            return Err(OnboardingError::Unmounted);
        }

        let patch = match call.await {
            Ok(patch) => patch,
            Err(e) => {
                warn!(
                    artist_id = %self.artist_id,
                    action,
                    step = ?step,
                    error = %e,
                    "Onboarding mutation failed"
                );
                return Err(e.into());
            }
        };

        if !self.is_mounted() {
            debug!(
                artist_id = %self.artist_id,
                action,
                "Dropping mutation result for unmounted context"
            );
            return Err(OnboardingError::Unmounted);
        }

        let cursor_filled = {
            let mut state = self.state.write().await;
            if !self.is_mounted() {
                return Err(OnboardingError::Unmounted);
            }
            // Any refresh still in flight predates this result.
            self.generation.fetch_add(1, Ordering::SeqCst);
            state
                .status
                .get_or_insert_with(StatusSnapshot::default)
                .apply(patch);
            state.error = None;
            state.loading = false;
            self.fill_cursor(&mut state)
        };

        debug!(artist_id = %self.artist_id, action, step = ?step, "Onboarding mutation applied");
        let _ = self.tx.send(ContextEvent::StatusChanged);
        if let Some(step) = cursor_filled {
            let _ = self.tx.send(ContextEvent::CursorChanged(Some(step)));
        }
        Ok(())
    }

    /// One-shot cursor initialization from the server's suggestion.
    ///
    /// Only runs while the cursor is unset; `done` and unknown suggestions
    /// leave it unset.
    fn fill_cursor(&self, state: &mut ContextState) -> Option<StepId> {
        if state.current_step.is_some() {
            return None;
        }
        let suggested = state.status.as_ref()?.suggested_step()?;
        match suggested {
            SuggestedStep::Step(step) if self.registry.contains(step) => {
                state.current_step = Some(step);
                Some(step)
            }
            SuggestedStep::Unknown(raw) => {
                warn!(
                    artist_id = %self.artist_id,
                    suggested = %raw,
                    "Server suggested an unknown step"
                );
                None
            }
            _ => None,
        }
    }
}

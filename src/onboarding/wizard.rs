//! Wizard shell — navigation state machine over the onboarding context.
//!
//! The shell never touches the snapshot. It reads the context, keeps the
//! URL in step with the cursor, and turns next/back/skip into context calls.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::context::OnboardingContext;
use super::resolver::{Progress, ResolvedStep, first_required};
use super::route::{RouteMatch, parse_onboarding_path, step_path};
use super::steps::StepId;
use crate::error::OnboardingError;

/// What the wizard is showing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardState {
    Loading,
    /// Full-page load failure with a retry action.
    Error(String),
    Active(StepId),
    /// The wizard has navigated away from onboarding.
    Complete,
}

/// Why the wizard left the onboarding flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The backend already reports onboarding as done.
    AlreadyDone,
    /// The artist finished the last step.
    Completed,
}

/// Router capability the shell drives.
pub trait Navigator: Send + Sync {
    /// Push a new history entry.
    fn push(&self, path: &str);
    /// Replace the current history entry.
    fn replace(&self, path: &str);
    /// Leave onboarding entirely.
    fn leave(&self, reason: ExitReason);
}

pub struct WizardShell<N: Navigator> {
    context: Arc<OnboardingContext>,
    navigator: N,
    state: WizardState,
    inline_error: Option<String>,
    /// Step the current URL points at, as far as the shell knows.
    url_step: Option<StepId>,
    exited: bool,
}

impl<N: Navigator> WizardShell<N> {
    pub fn new(context: Arc<OnboardingContext>, navigator: N) -> Self {
        Self {
            context,
            navigator,
            state: WizardState::Loading,
            inline_error: None,
            url_step: None,
            exited: false,
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn context(&self) -> &Arc<OnboardingContext> {
        &self.context
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    /// Error from the last failed action, shown next to the control.
    pub fn inline_error(&self) -> Option<&str> {
        self.inline_error.as_deref()
    }

    pub fn active_step(&self) -> Option<StepId> {
        match self.state {
            WizardState::Active(step) => Some(step),
            _ => None,
        }
    }

    pub async fn resolved_steps(&self) -> Vec<ResolvedStep> {
        self.context.resolved_steps().await
    }

    pub async fn progress(&self) -> Progress {
        self.context.progress().await
    }

    /// Mount: apply the initial location, load status, then render.
    pub async fn start(&mut self, location: &str) -> &WizardState {
        self.apply_location(location).await;
        self.context.refresh_status().await;
        self.sync().await
    }

    /// External navigation (back/forward buttons, deep links).
    pub async fn on_location_change(&mut self, location: &str) -> &WizardState {
        if self.exited {
            return &self.state;
        }
        self.apply_location(location).await;
        self.sync().await
    }

    /// Re-evaluate the context into a wizard state.
    pub async fn sync(&mut self) -> &WizardState {
        if self.exited || !self.context.is_mounted() {
            return &self.state;
        }

        let ctx = self.context.state().await;

        if let Some(message) = ctx.error {
            self.state = WizardState::Error(message);
            return &self.state;
        }
        let Some(status) = ctx.status else {
            self.state = WizardState::Loading;
            return &self.state;
        };

        if status.is_done() && ctx.current_step.is_none() {
            info!(artist_id = %self.context.artist_id(), "Onboarding already done, leaving wizard");
            self.exit(ExitReason::AlreadyDone);
            return &self.state;
        }

        let registry = self.context.registry();
        let step = match ctx.current_step.filter(|s| registry.contains(*s)) {
            Some(step) => step,
            None => {
                let resolved = self.context.resolved_steps().await;
                let Some(step) = first_required(&resolved) else {
                    warn!("Onboarding registry is empty");
                    self.state = WizardState::Loading;
                    return &self.state;
                };
                self.context.set_current_step(Some(step)).await;
                step
            }
        };

        if self.url_step != Some(step) {
            self.navigator.replace(&step_path(step));
            self.url_step = Some(step);
        }
        self.state = WizardState::Active(step);
        &self.state
    }

    /// Retry after a load failure.
    pub async fn retry(&mut self) -> &WizardState {
        if matches!(self.state, WizardState::Error(_)) {
            self.context.refresh_status().await;
        }
        self.sync().await
    }

    pub fn can_go_back(&self) -> bool {
        self.active_step()
            .and_then(|step| self.context.registry().previous_before(step))
            .is_some()
    }

    /// Whether the active step offers a skip control.
    pub async fn can_skip(&self) -> bool {
        let Some(step) = self.active_step() else {
            return false;
        };
        step.has_skip_action() && !self.is_required(step).await
    }

    /// Advance to the following step, or complete onboarding after the last one.
    pub async fn next(&mut self) -> Result<(), OnboardingError> {
        let step = self.active_step().ok_or(OnboardingError::NotActive)?;
        self.advance_from(step).await
    }

    pub async fn back(&mut self) -> Result<(), OnboardingError> {
        let step = self.active_step().ok_or(OnboardingError::NotActive)?;
        let previous = self
            .context
            .registry()
            .previous_before(step)
            .ok_or(OnboardingError::NoPreviousStep)?;
        self.go_to(previous).await;
        Ok(())
    }

    /// Skip an optional step. Required steps are refused without a backend call.
    pub async fn skip(&mut self) -> Result<(), OnboardingError> {
        let step = self.active_step().ok_or(OnboardingError::NotActive)?;

        if self.is_required(step).await {
            let err = OnboardingError::StepRequired {
                step: step.to_string(),
            };
            self.inline_error = Some(err.to_string());
            return Err(err);
        }

        if let Err(e) = self.context.skip_step(step).await {
            warn!(step = %step, error = %e, "Skip failed, staying on step");
            self.inline_error = Some(e.to_string());
            return Err(e);
        }

        self.advance_from(step).await
    }

    async fn advance_from(&mut self, step: StepId) -> Result<(), OnboardingError> {
        match self.context.registry().next_after(step) {
            Some(next) => {
                self.go_to(next).await;
                Ok(())
            }
            None => self.finish().await,
        }
    }

    async fn finish(&mut self) -> Result<(), OnboardingError> {
        if let Err(e) = self.context.complete_onboarding().await {
            self.inline_error = Some(e.to_string());
            return Err(e);
        }
        self.exit(ExitReason::Completed);
        Ok(())
    }

    /// Own-control navigation: cursor first, then the URL.
    async fn go_to(&mut self, step: StepId) {
        self.context.set_current_step(Some(step)).await;
        self.navigator.push(&step_path(step));
        self.url_step = Some(step);
        self.inline_error = None;
        self.state = WizardState::Active(step);
        debug!(step = %step, "Wizard moved");
    }

    async fn apply_location(&mut self, location: &str) {
        match parse_onboarding_path(location) {
            RouteMatch::Step(step) if self.context.registry().contains(step) => {
                self.url_step = Some(step);
                self.inline_error = None;
                self.context.set_current_step(Some(step)).await;
            }
            RouteMatch::Step(step) => {
                warn!(step = %step, "URL step not in registry, keeping cursor");
                self.url_step = None;
            }
            RouteMatch::UnknownStep(raw) => {
                warn!(step = %raw, "Unknown step in URL, keeping cursor");
                self.url_step = None;
            }
            RouteMatch::Root => {
                self.url_step = None;
            }
            RouteMatch::Outside => {
                debug!(location, "Location outside onboarding");
            }
        }
    }

    async fn is_required(&self, step: StepId) -> bool {
        self.context
            .resolved_steps()
            .await
            .iter()
            .find(|s| s.id == step)
            .is_some_and(|s| s.is_required)
    }

    fn exit(&mut self, reason: ExitReason) {
        if !self.exited {
            self.exited = true;
            self.navigator.leave(reason);
        }
        self.state = WizardState::Complete;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::error::{ApiError, ErrorEnvelope};
    use crate::onboarding::snapshot::SnapshotPatch;
    use crate::onboarding::steps::StepRegistry;
    use crate::onboarding::test_support::{StubApi, snapshot};

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Nav {
        Push(String),
        Replace(String),
        Leave(ExitReason),
    }

    #[derive(Default)]
    struct RecordingNavigator {
        log: Mutex<Vec<Nav>>,
    }

    impl RecordingNavigator {
        fn log(&self) -> Vec<Nav> {
            self.log.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn push(&self, path: &str) {
            self.log.lock().unwrap().push(Nav::Push(path.to_string()));
        }
        fn replace(&self, path: &str) {
            self.log.lock().unwrap().push(Nav::Replace(path.to_string()));
        }
        fn leave(&self, reason: ExitReason) {
            self.log.lock().unwrap().push(Nav::Leave(reason));
        }
    }

    fn shell(api: Arc<StubApi>) -> WizardShell<RecordingNavigator> {
        let ctx =
            OnboardingContext::mount("artist-1", api, Arc::new(StepRegistry::artist()), None);
        WizardShell::new(ctx, RecordingNavigator::default())
    }

    #[tokio::test]
    async fn loads_into_server_suggested_step() {
        let api = StubApi::with_status(snapshot(
            &[("profile_completed", true)],
            Some(true),
            Some("kyc"),
        ));
        let mut wizard = shell(api);

        assert_eq!(wizard.state(), &WizardState::Loading);
        let state = wizard.start("/onboarding").await.clone();

        assert_eq!(state, WizardState::Active(StepId::Kyc));
        assert_eq!(
            wizard.navigator().log(),
            vec![Nav::Replace("/onboarding/kyc".into())]
        );
        assert!(wizard.can_skip().await);
        assert!(wizard.can_go_back());
    }

    #[tokio::test]
    async fn defaults_to_first_required_step() {
        let api = StubApi::with_status(snapshot(&[], None, None));
        let mut wizard = shell(api);
        wizard.start("/onboarding").await;
        assert_eq!(wizard.active_step(), Some(StepId::Profile));
        assert_eq!(wizard.context().current_step().await, Some(StepId::Profile));
    }

    #[tokio::test]
    async fn deep_link_overrides_suggestion() {
        let api = StubApi::with_status(snapshot(&[], None, Some("kyc")));
        let mut wizard = shell(api);
        wizard.start("/onboarding/payment").await;
        assert_eq!(wizard.active_step(), Some(StepId::Payment));
        // URL already matches, nothing to rewrite.
        assert!(wizard.navigator().log().is_empty());
    }

    #[tokio::test]
    async fn unknown_url_step_falls_back_to_cursor() {
        let api = StubApi::with_status(snapshot(&[], None, Some("publisher")));
        let mut wizard = shell(api);
        wizard.start("/onboarding/royalties").await;
        assert_eq!(wizard.active_step(), Some(StepId::Publisher));
        assert_eq!(
            wizard.navigator().log(),
            vec![Nav::Replace("/onboarding/publisher".into())]
        );
    }

    #[tokio::test]
    async fn next_and_back_push_urls() {
        let api = StubApi::with_status(snapshot(&[], None, Some("profile")));
        let mut wizard = shell(api);
        wizard.start("/onboarding/profile").await;

        wizard.next().await.unwrap();
        assert_eq!(wizard.active_step(), Some(StepId::SocialMedia));
        assert_eq!(wizard.context().current_step().await, Some(StepId::SocialMedia));

        wizard.back().await.unwrap();
        wizard.back().await.unwrap();
        assert_eq!(wizard.active_step(), Some(StepId::Welcome));
        assert!(!wizard.can_go_back());
        assert!(matches!(wizard.back().await, Err(OnboardingError::NoPreviousStep)));

        assert_eq!(
            wizard.navigator().log(),
            vec![
                Nav::Push("/onboarding/social-media".into()),
                Nav::Push("/onboarding/profile".into()),
                Nav::Push("/onboarding/welcome".into()),
            ]
        );
    }

    #[tokio::test]
    async fn required_step_skip_refused_before_network() {
        let api = StubApi::with_status(snapshot(&[], Some(false), Some("kyc")));
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;
        assert!(!wizard.can_skip().await);

        let err = wizard.skip().await.unwrap_err();
        assert!(matches!(err, OnboardingError::StepRequired { .. }));
        assert_eq!(wizard.active_step(), Some(StepId::Kyc));
        assert!(wizard.inline_error().is_some());
        assert_eq!(api.calls(), vec!["fetch_status"]);
    }

    #[tokio::test]
    async fn failed_skip_stays_on_step() {
        let api = StubApi::with_status(snapshot(&[], None, Some("social-media")));
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;

        api.fail_next_mutation(ApiError::Transport("connection reset".into()));
        let err = wizard.skip().await.unwrap_err();

        assert!(matches!(err, OnboardingError::Api(_)));
        assert_eq!(wizard.active_step(), Some(StepId::SocialMedia));
        assert_eq!(wizard.inline_error(), Some("connection reset"));
        assert_eq!(wizard.state(), &WizardState::Active(StepId::SocialMedia));
    }

    #[tokio::test]
    async fn skip_landing_after_unmount_does_not_navigate() {
        let api = StubApi::with_status(snapshot(&[], None, Some("social-media")));
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;
        let log_before = wizard.navigator().log();

        let ctx = Arc::clone(wizard.context());
        let gate = api.gate_next_mutation();
        let (result, ()) = tokio::join!(wizard.skip(), async {
            api.wait_for_calls("skip_step:social-media", 1).await;
            ctx.unmount().await;
            gate.send(()).unwrap();
        });

        assert!(matches!(result, Err(OnboardingError::Unmounted)));
        assert_eq!(wizard.active_step(), Some(StepId::SocialMedia));
        assert_eq!(wizard.navigator().log(), log_before);
    }

    #[tokio::test]
    async fn successful_skip_advances_and_clears_error() {
        let api = StubApi::with_status(snapshot(&[], None, Some("publisher")));
        api.set_mutation_patch(SnapshotPatch {
            progress: Some([("publisher_completed".to_string(), true)].into()),
            ..Default::default()
        });
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;

        wizard.skip().await.unwrap();
        assert_eq!(wizard.active_step(), Some(StepId::Kyc));
        assert!(wizard.inline_error().is_none());
        assert_eq!(api.calls(), vec!["fetch_status", "skip_step:publisher"]);
    }

    #[tokio::test]
    async fn next_on_last_step_completes() {
        let api = StubApi::with_status(snapshot(&[], Some(true), Some("kyc")));
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;

        wizard.next().await.unwrap();
        assert_eq!(wizard.state(), &WizardState::Complete);
        assert_eq!(
            wizard.navigator().log().last(),
            Some(&Nav::Leave(ExitReason::Completed))
        );
        assert_eq!(api.calls(), vec!["fetch_status", "complete_onboarding"]);
    }

    #[tokio::test]
    async fn completion_failure_is_inline() {
        let api = StubApi::with_status(snapshot(&[], Some(true), Some("kyc")));
        let mut wizard = shell(Arc::clone(&api));
        wizard.start("/onboarding").await;

        api.fail_next_mutation(ApiError::Status {
            endpoint: "complete".into(),
            status: 422,
            envelope: ErrorEnvelope {
                errors: Some(serde_json::json!({"payment": ["Payment details missing"]})),
                ..Default::default()
            },
        });
        assert!(wizard.next().await.is_err());
        assert_eq!(wizard.active_step(), Some(StepId::Kyc));
        assert_eq!(wizard.inline_error(), Some("Payment details missing"));
    }

    #[tokio::test]
    async fn done_without_cursor_redirects_once() {
        let mut snap = snapshot(&[], None, Some("done"));
        snap.onboarding_step = Some("done".into());
        let api = StubApi::with_status(snap);
        let mut wizard = shell(api);

        wizard.start("/onboarding").await;
        wizard.sync().await;
        wizard.on_location_change("/onboarding").await;

        assert_eq!(wizard.state(), &WizardState::Complete);
        assert_eq!(
            wizard.navigator().log(),
            vec![Nav::Leave(ExitReason::AlreadyDone)]
        );
    }

    #[tokio::test]
    async fn done_with_explicit_step_stays() {
        let api = StubApi::with_status(snapshot(&[], None, Some("done")));
        let mut wizard = shell(api);
        wizard.start("/onboarding/profile").await;
        assert_eq!(wizard.active_step(), Some(StepId::Profile));
    }

    #[tokio::test]
    async fn load_error_then_retry() {
        let api = StubApi::with_status(snapshot(&[], None, Some("payment")));
        api.push_status_error(ApiError::Transport("timed out".into()));
        let mut wizard = shell(Arc::clone(&api));

        let state = wizard.start("/onboarding").await.clone();
        assert_eq!(state, WizardState::Error("timed out".into()));
        assert!(wizard.next().await.is_err());

        let state = wizard.retry().await.clone();
        assert_eq!(state, WizardState::Active(StepId::Payment));
    }

    #[tokio::test]
    async fn browser_navigation_moves_cursor() {
        let api = StubApi::with_status(snapshot(&[], None, Some("payment")));
        let mut wizard = shell(api);
        wizard.start("/onboarding").await;

        wizard.on_location_change("/onboarding/social-media").await;
        assert_eq!(wizard.active_step(), Some(StepId::SocialMedia));
        assert_eq!(wizard.context().current_step().await, Some(StepId::SocialMedia));

        // Refresh must not yank the artist back to the suggestion.
        wizard.context().refresh_status().await;
        wizard.sync().await;
        assert_eq!(wizard.active_step(), Some(StepId::SocialMedia));
    }
}

//! Artist onboarding — step registry, snapshot resolution, the owning
//! context and the wizard navigation state machine.
//!
//! Data flows one way: the context fetches a [`StatusSnapshot`], the
//! resolver annotates the registry with it, and the wizard renders the step
//! under the context's cursor. Changes go back through context operations.

pub mod context;
pub mod resolver;
pub mod route;
pub mod snapshot;
pub mod steps;
pub mod wizard;

#[cfg(test)]
pub(crate) mod test_support;

pub use context::{ContextEvent, ContextState, OnboardingContext};
pub use resolver::{Progress, ResolvedStep, resolve_steps};
pub use route::{RouteMatch, parse_onboarding_path, step_path};
pub use snapshot::{Envelope, KycStatus, SnapshotPatch, StatusSnapshot, SuggestedStep};
pub use steps::{StepDefinition, StepId, StepRegistry};
pub use wizard::{ExitReason, Navigator, WizardShell, WizardState};

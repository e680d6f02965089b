//! URL contract: `/onboarding/:stepId?`.

use super::steps::StepId;

/// Root path of the onboarding flow.
pub const ONBOARDING_ROOT: &str = "/onboarding";

/// What a location means to the wizard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteMatch {
    /// Not an onboarding URL at all.
    Outside,
    /// `/onboarding` with no step parameter.
    Root,
    Step(StepId),
    /// `/onboarding/<slug>` where the slug is not a known step.
    UnknownStep(String),
}

/// Canonical path for a step.
pub fn step_path(step: StepId) -> String {
    format!("{ONBOARDING_ROOT}/{step}")
}

/// Match a location path (query string and fragment are ignored).
pub fn parse_onboarding_path(location: &str) -> RouteMatch {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default()
        .trim_end_matches('/');

    let Some(rest) = path.strip_prefix(ONBOARDING_ROOT) else {
        return RouteMatch::Outside;
    };
    if rest.is_empty() {
        return RouteMatch::Root;
    }
    let Some(param) = rest.strip_prefix('/') else {
        // e.g. `/onboardingfoo`
        return RouteMatch::Outside;
    };
    if param.contains('/') {
        return RouteMatch::UnknownStep(param.to_string());
    }
    match param.parse::<StepId>() {
        Ok(step) => RouteMatch::Step(step),
        Err(_) => RouteMatch::UnknownStep(param.to_string()),
    }
}

//! Progress resolver — combines step definitions with a snapshot.
//!
//! Pure functions only: no I/O, no shared state.

use serde::Serialize;

use super::snapshot::StatusSnapshot;
use super::steps::{StepDefinition, StepId};

/// A step definition annotated with one artist's progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedStep {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub is_completed: bool,
    pub is_required: bool,
}

/// Completion predicate for a step.
pub fn is_step_completed(id: StepId, snapshot: &StatusSnapshot) -> bool {
    match id {
        StepId::Welcome => true,
        StepId::Profile => snapshot.flag("profile_completed"),
        StepId::SocialMedia => {
            snapshot.flag("social_links_added") || snapshot.flag("social_media_completed")
        }
        StepId::Payment => {
            snapshot.flag("payment_info_added") || snapshot.flag("payment_completed")
        }
        StepId::Publisher => {
            snapshot.flag("publisher_selected") || snapshot.flag("publisher_completed")
        }
        StepId::Kyc => snapshot.flag("kyc_verified") || snapshot.flag("kyc_submitted"),
    }
}

/// Completion for a raw step slug. Unknown slugs are never complete.
pub fn completion_for_raw(raw: &str, snapshot: &StatusSnapshot) -> bool {
    raw.parse::<StepId>()
        .map(|id| is_step_completed(id, snapshot))
        .unwrap_or(false)
}

/// Required-ness of a step for this artist.
pub fn is_step_required(def: &StepDefinition, snapshot: Option<&StatusSnapshot>) -> bool {
    match (def.id, snapshot) {
        (StepId::Kyc, Some(snap)) => snap.kyc.can_skip == Some(false),
        _ => def.default_required,
    }
}

/// Resolve every definition against the snapshot, preserving order.
///
/// With no snapshot nothing is reported complete; callers treat that as loading.
pub fn resolve_steps(
    definitions: &[StepDefinition],
    snapshot: Option<&StatusSnapshot>,
) -> Vec<ResolvedStep> {
    definitions
        .iter()
        .map(|def| ResolvedStep {
            id: def.id,
            title: def.title.clone(),
            description: def.description.clone(),
            is_completed: snapshot.is_some_and(|snap| is_step_completed(def.id, snap)),
            is_required: is_step_required(def, snapshot),
        })
        .collect()
}

/// First required step in order, falling back to the first step.
pub fn first_required(steps: &[ResolvedStep]) -> Option<StepId> {
    steps
        .iter()
        .find(|s| s.is_required)
        .or_else(|| steps.first())
        .map(|s| s.id)
}

/// Completion progress across all steps, required or not.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Progress {
    pub completed: usize,
    pub total: usize,
    pub percent: f64,
}

impl Progress {
    pub fn of(steps: &[ResolvedStep]) -> Self {
        let completed = steps.iter().filter(|s| s.is_completed).count();
        let total = steps.len();
        let percent = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        Self {
            completed,
            total,
            percent,
        }
    }

    pub fn is_full(&self) -> bool {
        self.total > 0 && self.completed == self.total
    }
}

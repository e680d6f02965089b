//! Status snapshot — the server's point-in-time view of one artist's onboarding.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::steps::StepId;

/// Sentinel the backend uses for "nothing left to do".
pub const DONE_SENTINEL: &str = "done";

/// KYC block of the snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KycStatus {
    /// Whether the backend lets this account skip verification.
    #[serde(default)]
    pub can_skip: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// Onboarding status as returned by the backend.
///
/// Treated as an immutable value: a refresh replaces it wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Domain flags such as `profile_completed` or `kyc_verified`.
    #[serde(default)]
    pub progress: BTreeMap<String, bool>,
    #[serde(default)]
    pub kyc: KycStatus,
    #[serde(default)]
    pub next_step: Option<String>,
    #[serde(default)]
    pub onboarding_step: Option<String>,
}

/// Server-suggested next step, parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SuggestedStep {
    Step(StepId),
    Done,
    Unknown(String),
}

impl SuggestedStep {
    pub fn parse(raw: &str) -> Self {
        if raw == DONE_SENTINEL {
            return Self::Done;
        }
        match raw.parse::<StepId>() {
            Ok(id) => Self::Step(id),
            Err(_) => Self::Unknown(raw.to_string()),
        }
    }

    pub fn step(&self) -> Option<StepId> {
        match self {
            Self::Step(id) => Some(*id),
            _ => None,
        }
    }
}

impl StatusSnapshot {
    /// Value of a progress flag; missing flags read as `false`.
    pub fn flag(&self, name: &str) -> bool {
        self.progress.get(name).copied().unwrap_or(false)
    }

    /// `next_step`, falling back to `onboarding_step`.
    pub fn suggested_step(&self) -> Option<SuggestedStep> {
        self.next_step
            .as_deref()
            .or(self.onboarding_step.as_deref())
            .map(SuggestedStep::parse)
    }

    /// Whether the backend considers onboarding finished.
    pub fn is_done(&self) -> bool {
        matches!(self.suggested_step(), Some(SuggestedStep::Done))
    }

    /// Merge a mutation result into this snapshot.
    pub fn apply(&mut self, patch: SnapshotPatch) {
        if let Some(progress) = patch.progress {
            self.progress.extend(progress);
        }
        if let Some(kyc) = patch.kyc {
            self.kyc = kyc;
        }
        if let Some(next) = patch.next_step {
            self.next_step = Some(next);
        }
        if let Some(step) = patch.onboarding_step {
            self.onboarding_step = Some(step);
        }
    }
}

/// Partial snapshot returned by per-step mutations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<BTreeMap<String, bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kyc: Option<KycStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_step: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub onboarding_step: Option<String>,
}

impl From<StatusSnapshot> for SnapshotPatch {
    fn from(s: StatusSnapshot) -> Self {
        Self {
            progress: Some(s.progress),
            kyc: Some(s.kyc),
            next_step: s.next_step,
            onboarding_step: s.onboarding_step,
        }
    }
}

/// `{ data, message? }` wrapper around every successful backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

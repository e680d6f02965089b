//! Step registry — the static, ordered list of onboarding steps.

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OnboardingError;

/// Identifier of an onboarding step.
///
/// Serialized as the slug used in URLs and backend payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StepId {
    Welcome,
    Profile,
    SocialMedia,
    Payment,
    Publisher,
    Kyc,
}

impl StepId {
    pub const ALL: [StepId; 6] = [
        StepId::Welcome,
        StepId::Profile,
        StepId::SocialMedia,
        StepId::Payment,
        StepId::Publisher,
        StepId::Kyc,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Welcome => "welcome",
            Self::Profile => "profile",
            Self::SocialMedia => "social-media",
            Self::Payment => "payment",
            Self::Publisher => "publisher",
            Self::Kyc => "kyc",
        }
    }

    /// Whether the backend has a skip mutation for this step.
    pub fn has_skip_action(&self) -> bool {
        matches!(self, Self::SocialMedia | Self::Publisher | Self::Kyc)
    }
}

impl std::fmt::Display for StepId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StepId {
    type Err = OnboardingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|id| id.as_str() == s)
            .ok_or_else(|| OnboardingError::UnknownStep(s.to_string()))
    }
}

/// Static description of one step, independent of any user's progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepDefinition {
    pub id: StepId,
    pub title: String,
    pub description: String,
    pub default_required: bool,
}

impl StepDefinition {
    pub fn new(
        id: StepId,
        title: impl Into<String>,
        description: impl Into<String>,
        default_required: bool,
    ) -> Self {
        Self {
            id,
            title: title.into(),
            description: description.into(),
            default_required,
        }
    }
}

/// Ordered step definitions. Order is fixed at construction.
#[derive(Debug, Clone)]
pub struct StepRegistry {
    steps: Vec<StepDefinition>,
}

impl StepRegistry {
    /// Build a registry from definitions. Duplicate ids keep the first occurrence.
    pub fn new(definitions: impl IntoIterator<Item = StepDefinition>) -> Self {
        let mut steps: Vec<StepDefinition> = Vec::new();
        for def in definitions {
            if steps.iter().any(|s| s.id == def.id) {
                tracing::warn!(step = %def.id, "Duplicate step definition ignored");
                continue;
            }
            steps.push(def);
        }
        Self { steps }
    }

    /// The artist onboarding flow.
    pub fn artist() -> Self {
        Self::new([
            StepDefinition::new(
                StepId::Welcome,
                "Welcome",
                "Get to know how royalties are collected and paid out.",
                false,
            ),
            StepDefinition::new(
                StepId::Profile,
                "Artist profile",
                "Tell us your artist name, bio and where you are based.",
                true,
            ),
            StepDefinition::new(
                StepId::SocialMedia,
                "Social media",
                "Link your social accounts so stations can find you.",
                false,
            ),
            StepDefinition::new(
                StepId::Payment,
                "Payment details",
                "Add the account your royalty payouts go to.",
                true,
            ),
            StepDefinition::new(
                StepId::Publisher,
                "Publisher",
                "Choose a publisher or stay independent.",
                false,
            ),
            StepDefinition::new(
                StepId::Kyc,
                "Identity verification",
                "Upload an ID document to verify your identity.",
                true,
            ),
        ])
    }

    pub fn steps(&self) -> &[StepDefinition] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn get(&self, id: StepId) -> Option<&StepDefinition> {
        self.steps.iter().find(|s| s.id == id)
    }

    pub fn contains(&self, id: StepId) -> bool {
        self.position(id).is_some()
    }

    pub fn position(&self, id: StepId) -> Option<usize> {
        self.steps.iter().position(|s| s.id == id)
    }

    pub fn first(&self) -> Option<StepId> {
        self.steps.first().map(|s| s.id)
    }

    /// Step following `id` in registry order.
    pub fn next_after(&self, id: StepId) -> Option<StepId> {
        let idx = self.position(id)?;
        self.steps.get(idx + 1).map(|s| s.id)
    }

    /// Step preceding `id` in registry order.
    pub fn previous_before(&self, id: StepId) -> Option<StepId> {
        let idx = self.position(id)?;
        idx.checked_sub(1).and_then(|i| self.steps.get(i)).map(|s| s.id)
    }
}

impl Default for StepRegistry {
    fn default() -> Self {
        Self::artist()
    }
}

//! Request bodies for per-step mutations.

use serde::{Deserialize, Serialize};

/// Artist profile step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilePayload {
    pub artist_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub genres: Vec<String>,
}

/// Social media step. Unset links are omitted from the body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialLinksPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instagram: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub twitter: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facebook: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub youtube: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spotify: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<String>,
}

/// Where royalty payouts go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayoutMethod {
    BankTransfer,
    MobileMoney,
    Paypal,
}

/// Payment details step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInfoPayload {
    pub method: PayoutMethod,
    pub account_name: String,
    /// Bank account number, mobile wallet number or PayPal email depending on `method`.
    pub account_reference: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
}

/// Publisher step: either a publisher id or self-published.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherChoicePayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher_id: Option<String>,
    pub self_published: bool,
}

impl PublisherChoicePayload {
    pub fn publisher(id: impl Into<String>) -> Self {
        Self {
            publisher_id: Some(id.into()),
            self_published: false,
        }
    }

    pub fn self_published() -> Self {
        Self {
            publisher_id: None,
            self_published: true,
        }
    }
}

/// Identity document uploaded as multipart form data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KycDocument {
    /// e.g. `passport`, `national_id`, `drivers_license`.
    pub document_type: String,
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

//! Backend seam for onboarding.
//!
//! The context only talks to the backend through [`OnboardingApi`]; the
//! production implementation is [`HttpOnboardingApi`].

pub mod http;
pub mod payloads;

pub use http::HttpOnboardingApi;
pub use payloads::{
    KycDocument, PaymentInfoPayload, PayoutMethod, ProfilePayload, PublisherChoicePayload,
    SocialLinksPayload,
};

use async_trait::async_trait;

use crate::error::ApiError;
use crate::onboarding::snapshot::{SnapshotPatch, StatusSnapshot};
use crate::onboarding::steps::StepId;

/// Status fetch plus every per-step mutation.
///
/// Mutations return the backend's updated view as a patch to merge.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// Fetch the full onboarding snapshot for an artist.
    async fn fetch_status(&self, artist_id: &str) -> Result<StatusSnapshot, ApiError>;

    /// Mark an optional step as skipped.
    async fn skip_step(&self, artist_id: &str, step: StepId) -> Result<SnapshotPatch, ApiError>;

    async fn submit_profile(
        &self,
        artist_id: &str,
        payload: &ProfilePayload,
    ) -> Result<SnapshotPatch, ApiError>;

    async fn submit_social_links(
        &self,
        artist_id: &str,
        payload: &SocialLinksPayload,
    ) -> Result<SnapshotPatch, ApiError>;

    async fn submit_payment_info(
        &self,
        artist_id: &str,
        payload: &PaymentInfoPayload,
    ) -> Result<SnapshotPatch, ApiError>;

    async fn choose_publisher(
        &self,
        artist_id: &str,
        payload: &PublisherChoicePayload,
    ) -> Result<SnapshotPatch, ApiError>;

    /// Upload an identity document (multipart).
    async fn upload_kyc_document(
        &self,
        artist_id: &str,
        document: KycDocument,
    ) -> Result<SnapshotPatch, ApiError>;

    /// Skip identity verification, where the backend allows it.
    async fn skip_verification(&self, artist_id: &str) -> Result<SnapshotPatch, ApiError>;

    /// Terminal mutation: mark onboarding finished.
    async fn complete_onboarding(&self, artist_id: &str) -> Result<SnapshotPatch, ApiError>;
}

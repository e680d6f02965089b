//! `reqwest` implementation of [`OnboardingApi`].

use async_trait::async_trait;
use reqwest::Url;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::OnboardingApi;
use super::payloads::{
    KycDocument, PaymentInfoPayload, ProfilePayload, PublisherChoicePayload, SocialLinksPayload,
};
use crate::config::ClientConfig;
use crate::error::{ApiError, ErrorEnvelope};
use crate::onboarding::snapshot::{Envelope, SnapshotPatch, StatusSnapshot};
use crate::onboarding::steps::StepId;

/// Onboarding backend over HTTP.
///
/// Routes are rooted at `{base_url}/api/artists/{artist_id}/onboarding`.
pub struct HttpOnboardingApi {
    base_url: Url,
    api_token: Option<SecretString>,
    client: reqwest::Client,
}

impl HttpOnboardingApi {
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let invalid = |reason: String| ApiError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base_url = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(invalid("URL cannot carry a path".to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self {
            base_url,
            api_token: config.api_token.clone(),
            client,
        })
    }

    /// `path` is split on `/`; the artist id is always a single escaped segment.
    fn url(&self, artist_id: &str, path: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "artists"])
                .push(artist_id)
                .push("onboarding")
                .extend(path.split('/'));
        }
        url
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.api_token {
            Some(token) => req.bearer_auth(token.expose_secret()),
            None => req,
        }
    }

    /// Send a request and unwrap the `{ data }` envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        req: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let resp = self.authorize(req).send().await.map_err(|e| {
            tracing::warn!(endpoint, error = %e, "Onboarding request failed");
            ApiError::from(e)
        })?;

        let status = resp.status();
        let body = resp.bytes().await?;

        if !status.is_success() {
            let envelope: ErrorEnvelope = serde_json::from_slice(&body).unwrap_or_default();
            tracing::warn!(
                endpoint,
                status = status.as_u16(),
                message = ?envelope.message,
                "Onboarding request rejected"
            );
            return Err(ApiError::Status {
                endpoint: endpoint.to_string(),
                status: status.as_u16(),
                envelope,
            });
        }

        let envelope: Envelope<T> =
            serde_json::from_slice(&body).map_err(|e| ApiError::InvalidResponse {
                endpoint: endpoint.to_string(),
                reason: e.to_string(),
            })?;
        Ok(envelope.data)
    }

    async fn post_json<B: Serialize + Sync>(
        &self,
        artist_id: &str,
        path: &str,
        body: &B,
    ) -> Result<SnapshotPatch, ApiError> {
        let url = self.url(artist_id, path);
        tracing::debug!(artist_id, path, "POST onboarding mutation");
        self.send(path, self.client.post(url).json(body)).await
    }

    async fn post_empty(&self, artist_id: &str, path: &str) -> Result<SnapshotPatch, ApiError> {
        self.post_json(artist_id, path, &serde_json::json!({})).await
    }
}

#[async_trait]
impl OnboardingApi for HttpOnboardingApi {
    async fn fetch_status(&self, artist_id: &str) -> Result<StatusSnapshot, ApiError> {
        let url = self.url(artist_id, "status");
        self.send("status", self.client.get(url)).await
    }

    async fn skip_step(&self, artist_id: &str, step: StepId) -> Result<SnapshotPatch, ApiError> {
        if step == StepId::Kyc {
            return self.skip_verification(artist_id).await;
        }
        self.post_empty(artist_id, &format!("steps/{step}/skip")).await
    }

    async fn submit_profile(
        &self,
        artist_id: &str,
        payload: &ProfilePayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.post_json(artist_id, "profile", payload).await
    }

    async fn submit_social_links(
        &self,
        artist_id: &str,
        payload: &SocialLinksPayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.post_json(artist_id, "social-links", payload).await
    }

    async fn submit_payment_info(
        &self,
        artist_id: &str,
        payload: &PaymentInfoPayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.post_json(artist_id, "payment-info", payload).await
    }

    async fn choose_publisher(
        &self,
        artist_id: &str,
        payload: &PublisherChoicePayload,
    ) -> Result<SnapshotPatch, ApiError> {
        self.post_json(artist_id, "publisher", payload).await
    }

    async fn upload_kyc_document(
        &self,
        artist_id: &str,
        document: KycDocument,
    ) -> Result<SnapshotPatch, ApiError> {
        let KycDocument {
            document_type,
            file_name,
            content_type,
            bytes,
        } = document;

        let part = Part::bytes(bytes)
            .file_name(file_name.clone())
            .mime_str(&content_type)?;
        let form = Form::new()
            .text("document_type", document_type)
            .part("document", part);

        let url = self.url(artist_id, "kyc/documents");
        tracing::debug!(artist_id, file_name = %file_name, "Uploading KYC document");
        self.send("kyc/documents", self.client.post(url).multipart(form))
            .await
    }

    async fn skip_verification(&self, artist_id: &str) -> Result<SnapshotPatch, ApiError> {
        self.post_empty(artist_id, "kyc/skip").await
    }

    async fn complete_onboarding(&self, artist_id: &str) -> Result<SnapshotPatch, ApiError> {
        self.post_empty(artist_id, "complete").await
    }
}

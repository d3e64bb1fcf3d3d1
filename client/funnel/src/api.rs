//! Backend HTTP client — offer lookup, registration and payment finalize.
//!
//! Every call is a single request. There is no retry or back-off in here:
//! a failed call is returned to the caller, and retrying is the visitor
//! pressing the button again.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, Response};
use serde::Deserialize;
use tracing::debug;

use crate::config::{Config, DEFAULT_HTTP_TIMEOUT_SECS};
use crate::errors::{FunnelError, Result};
use crate::payment::PaymentProof;
use crate::submitter::RegistrationReference;
use crate::validator::ValidRegistration;

const OFFER_PATH: &str = "/api/v1/offers/current";
const REGISTER_PATH: &str = "/api/v1/save-progress";
const FINALIZE_PATH: &str = "/api/v1/finalize";

pub const IDEMPOTENCY_HEADER: &str = "Idempotency-Key";

// ─────────────────────────────────────────────────────────
// Response shapes
// ─────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OfferResponse {
    pub offer: Option<String>,
    pub price: Option<String>,
    pub active: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct RegistrationResponse {
    pub id: Option<String>,
}

// ─────────────────────────────────────────────────────────
// Client
// ─────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    idempotency_keys: bool,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = build_client(DEFAULT_HTTP_TIMEOUT_SECS)?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let client = build_client(config.http_timeout_secs)?;
        let mut api = Self::with_client(client, &config.base_url);
        api.idempotency_keys = config.idempotency_keys;
        Ok(api)
    }

    pub fn with_client(client: Client, base_url: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            idempotency_keys: true,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/v1/offers/current`
    ///
    /// A `null` body means no offer is running and comes back as `None`.
    pub async fn fetch_offer(&self) -> Result<Option<OfferResponse>> {
        let url = self.url(OFFER_PATH);
        let response = self.client.get(&url).send().await?;
        let response = check_status(response).await?;
        Ok(response.json().await?)
    }

    /// `POST /api/v1/save-progress`
    ///
    /// `idempotency_key` is only sent when keys are enabled for this client.
    pub async fn create_registration(
        &self,
        record: &ValidRegistration,
        idempotency_key: &str,
    ) -> Result<RegistrationReference> {
        let url = self.url(REGISTER_PATH);
        let mut request = self.client.post(&url).json(&record.payload());
        if self.idempotency_keys {
            request = request.header(IDEMPOTENCY_HEADER, idempotency_key);
        }
        let response = check_status(request.send().await?).await?;

        let body: RegistrationResponse = response
            .json()
            .await
            .map_err(|e| FunnelError::MalformedResponse(format!("registration body: {e}")))?;
        let reference = body
            .id
            .as_deref()
            .and_then(RegistrationReference::parse)
            .ok_or_else(|| {
                FunnelError::MalformedResponse("registration response has no id".to_string())
            })?;

        debug!("Registration created: {reference}");
        Ok(reference)
    }

    /// `POST /api/v1/finalize` as multipart `{ id, file }`.
    pub async fn finalize(
        &self,
        reference: &RegistrationReference,
        proof: &PaymentProof,
    ) -> Result<()> {
        let url = self.url(FINALIZE_PATH);
        let file = Part::bytes(proof.bytes().to_vec())
            .file_name(proof.file_name().to_string())
            .mime_str(proof.content_type())?;
        let form = Form::new()
            .text("id", reference.as_str().to_string())
            .part("file", file);

        let response = self.client.post(&url).multipart(form).send().await?;
        check_status(response).await?;
        debug!("Finalize accepted for {reference}");
        Ok(())
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn build_client(timeout_secs: u64) -> Result<Client> {
    Ok(Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()?)
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(FunnelError::Rejected {
        status: status.as_u16(),
        message,
    })
}

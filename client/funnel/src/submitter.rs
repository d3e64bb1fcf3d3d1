//! Registration handoff: send a validated record to the backend and record
//! the reference it answers with.

use std::fmt;

use sha2::{Digest, Sha256};
use tracing::info;
use url::form_urlencoded;

use crate::api::ApiClient;
use crate::errors::Result;
use crate::store::ProgressStore;
use crate::validator::ValidRegistration;

/// Opaque identifier the backend assigns to a registration. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegistrationReference(String);

impl RegistrationReference {
    /// Trimmed, non-empty reference or `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegistrationReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Stable key for a normalized record: identical submissions share a key,
/// so a deduplicating backend can collapse a double submit.
pub fn idempotency_key(record: &ValidRegistration) -> Result<String> {
    let canonical = serde_json::to_vec(&record.payload())?;
    Ok(hex::encode(Sha256::digest(&canonical)))
}

/// Create a registration and persist its reference.
///
/// The reference reaches the store only after the backend has answered
/// successfully. On failure nothing is written and the saved draft stays as
/// it was, so the visitor can retry. Each successful call creates a new
/// registration on a backend that does not honour idempotency keys.
pub async fn submit<S: ProgressStore>(
    api: &ApiClient,
    store: &mut S,
    record: &ValidRegistration,
) -> Result<RegistrationReference> {
    let key = idempotency_key(record)?;
    let reference = api.create_registration(record, &key).await?;
    store.save_reference(&reference)?;
    info!("Registration {reference} saved; proceed to payment");
    Ok(reference)
}

const PAYMENT_PATH: &str = "/payment";
const REFERENCE_PARAM: &str = "ref";

/// Link the Pay step is opened with; the reference is form-urlencoded.
pub fn payment_link(reference: &RegistrationReference) -> String {
    let query = form_urlencoded::Serializer::new(String::new())
        .append_pair(REFERENCE_PARAM, reference.as_str())
        .finish();
    format!("{PAYMENT_PATH}?{query}")
}

/// Extract and decode `ref` from a Pay-step link or query string such as
/// `?ref=R1`, `ref=R1` or `https://host/payment?ref=R1&x=y#top`.
pub fn reference_from_query(link: &str) -> Option<RegistrationReference> {
    let query = link.split_once('?').map_or(link, |(_, q)| q);
    let query = query.split_once('#').map_or(query, |(q, _)| q);
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == REFERENCE_PARAM)
        .and_then(|(_, value)| RegistrationReference::parse(&value))
}

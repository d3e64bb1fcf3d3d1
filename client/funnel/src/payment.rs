//! Payment-proof submission.
//!
//! ## State machine
//!
//! ```text
//! Idle ──select──► ProofSelected ──finalize──► Submitting ──► Succeeded
//!  ▲                  │    ▲                        │
//!  └─────clear────────┘    └──── retry ◄── Failed ◄─┘
//! ```
//!
//! Nothing here is persisted. The chosen file lives only in memory; a
//! restart drops back to `Idle` while the reference stays in the progress
//! store until a finalize succeeds.

use std::fmt;
use std::path::Path;

use tracing::{info, warn};

use crate::api::ApiClient;
use crate::errors::{FunnelError, Result};
use crate::store::ProgressStore;
use crate::submitter::RegistrationReference;

/// The single document type accepted besides images.
pub const DOCUMENT_TYPE: &str = "application/pdf";

/// Uploaded evidence of payment.
#[derive(Clone, PartialEq, Eq)]
pub struct PaymentProof {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

impl PaymentProof {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a proof from disk, deriving the MIME type from the extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "proof".to_string());
        Ok(Self::new(file_name, content_type_for(path), bytes))
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_accepted_type(&self) -> bool {
        let essence = self
            .content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        essence == DOCUMENT_TYPE || (essence.starts_with("image/") && essence.len() > "image/".len())
    }
}

impl fmt::Debug for PaymentProof {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PaymentProof")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

fn content_type_for(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        "pdf" => DOCUMENT_TYPE,
        "json" => "application/json",
        _ => "application/octet-stream",
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum PaymentState {
    #[default]
    Idle,
    ProofSelected(PaymentProof),
    Submitting(PaymentProof),
    Succeeded,
    /// Last attempt failed; the proof is kept so the visitor can retry.
    Failed { proof: PaymentProof, reason: String },
}

/// Field-less view of [`PaymentState`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentPhase {
    Idle,
    ProofSelected,
    Submitting,
    Succeeded,
    Failed,
}

impl PaymentState {
    pub fn phase(&self) -> PaymentPhase {
        match self {
            Self::Idle => PaymentPhase::Idle,
            Self::ProofSelected(_) => PaymentPhase::ProofSelected,
            Self::Submitting(_) => PaymentPhase::Submitting,
            Self::Succeeded => PaymentPhase::Succeeded,
            Self::Failed { .. } => PaymentPhase::Failed,
        }
    }
}

/// The navigation reference and the stored one disagree (or nothing is
/// stored). Reported, never blocking: the backend decides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMismatch {
    pub navigation: RegistrationReference,
    pub stored: Option<RegistrationReference>,
}

impl fmt::Display for ReferenceMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.stored {
            Some(stored) => write!(
                f,
                "Validation Error: paying for {} but this device registered {stored}",
                self.navigation
            ),
            None => write!(
                f,
                "Validation Error: no registration for {} was recorded on this device",
                self.navigation
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FinalizeOutcome {
    pub reference: RegistrationReference,
    pub mismatch: Option<ReferenceMismatch>,
}

#[derive(Debug, Default)]
pub struct PaymentFinalizer {
    state: PaymentState,
}

impl PaymentFinalizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &PaymentState {
        &self.state
    }

    pub fn phase(&self) -> PaymentPhase {
        self.state.phase()
    }

    pub fn is_submitting(&self) -> bool {
        self.phase() == PaymentPhase::Submitting
    }

    pub fn selected_proof(&self) -> Option<&PaymentProof> {
        match &self.state {
            PaymentState::ProofSelected(p)
            | PaymentState::Submitting(p)
            | PaymentState::Failed { proof: p, .. } => Some(p),
            PaymentState::Idle | PaymentState::Succeeded => None,
        }
    }

    /// Choose (or replace) the proof file. Anything but an image or a PDF
    /// is rejected and leaves the state untouched.
    pub fn select_proof(&mut self, proof: PaymentProof) -> Result<()> {
        match self.phase() {
            PaymentPhase::Submitting => return Err(FunnelError::Busy),
            PaymentPhase::Succeeded => {
                return Err(FunnelError::InvalidStep {
                    action: "select a payment proof",
                    step: "done",
                })
            }
            _ => {}
        }
        if !proof.is_accepted_type() {
            warn!(
                "Rejected proof {} of type {}",
                proof.file_name(),
                proof.content_type()
            );
            return Err(FunnelError::UnsupportedProof(proof.content_type.clone()));
        }
        self.state = PaymentState::ProofSelected(proof);
        Ok(())
    }

    /// Drop the chosen file.
    pub fn clear_proof(&mut self) {
        if matches!(
            self.phase(),
            PaymentPhase::ProofSelected | PaymentPhase::Failed
        ) {
            self.state = PaymentState::Idle;
        }
    }

    /// Forget an interrupted attempt, as a page reload would.
    pub fn reset(&mut self) {
        self.state = PaymentState::Idle;
    }

    /// Upload the selected proof for `navigation_ref`.
    ///
    /// A missing or different stored reference only produces a
    /// [`ReferenceMismatch`] warning; the upload still goes out. On success
    /// the progress store is cleared. On failure the proof is retained in
    /// [`PaymentState::Failed`] for a retry.
    pub async fn finalize<S: ProgressStore>(
        &mut self,
        api: &ApiClient,
        store: &mut S,
        navigation_ref: Option<&RegistrationReference>,
    ) -> Result<FinalizeOutcome> {
        match self.phase() {
            PaymentPhase::Submitting => return Err(FunnelError::Busy),
            PaymentPhase::Succeeded => {
                return Err(FunnelError::InvalidStep {
                    action: "finalize payment",
                    step: "done",
                })
            }
            PaymentPhase::Idle => return Err(FunnelError::MissingProof),
            PaymentPhase::ProofSelected | PaymentPhase::Failed => {}
        }
        let reference = navigation_ref.ok_or(FunnelError::MissingReference)?.clone();

        let stored = store.load_reference();
        let mismatch = (stored.as_ref() != Some(&reference)).then(|| ReferenceMismatch {
            navigation: reference.clone(),
            stored,
        });
        if let Some(m) = &mismatch {
            warn!("{m}");
        }

        let proof = self
            .selected_proof()
            .cloned()
            .ok_or(FunnelError::MissingProof)?;
        self.state = PaymentState::Submitting(proof.clone());

        match api.finalize(&reference, &proof).await {
            Ok(()) => {
                self.state = PaymentState::Succeeded;
                if let Err(e) = store.clear_all() {
                    warn!("Payment accepted but saved progress could not be cleared: {e}");
                }
                info!("Payment proof for {reference} accepted");
                Ok(FinalizeOutcome {
                    reference,
                    mismatch,
                })
            }
            Err(e) => {
                self.state = PaymentState::Failed {
                    proof,
                    reason: e.to_string(),
                };
                warn!("Payment verification failed for {reference}: {e}");
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryProgressStore;

    fn png() -> PaymentProof {
        PaymentProof::new("proof.png", "image/png", vec![0x89, b'P', b'N', b'G'])
    }

    fn offline_api() -> ApiClient {
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        ApiClient::new(&format!("http://127.0.0.1:{port}")).unwrap()
    }

    #[test]
    fn accepted_types() {
        assert!(png().is_accepted_type());
        assert!(PaymentProof::new("a.pdf", "application/pdf", vec![]).is_accepted_type());
        assert!(PaymentProof::new("a.jpg", "IMAGE/JPEG; q=1", vec![]).is_accepted_type());
        assert!(!PaymentProof::new("a.json", "application/json", vec![]).is_accepted_type());
        assert!(!PaymentProof::new("a", "image/", vec![]).is_accepted_type());
        assert!(!PaymentProof::new("a.docx", "", vec![]).is_accepted_type());
    }

    #[test]
    fn json_proof_is_rejected_from_idle() {
        let mut f = PaymentFinalizer::new();
        let err = f
            .select_proof(PaymentProof::new("a.json", "application/json", b"{}".to_vec()))
            .unwrap_err();
        assert!(matches!(err, FunnelError::UnsupportedProof(_)));
        assert_eq!(f.phase(), PaymentPhase::Idle);
    }

    #[test]
    fn json_proof_keeps_previous_selection() {
        let mut f = PaymentFinalizer::new();
        f.select_proof(png()).unwrap();
        assert!(f
            .select_proof(PaymentProof::new("a.json", "application/json", vec![]))
            .is_err());
        assert_eq!(f.phase(), PaymentPhase::ProofSelected);
        assert_eq!(f.selected_proof(), Some(&png()));
    }

    #[test]
    fn clear_proof_returns_to_idle() {
        let mut f = PaymentFinalizer::new();
        f.select_proof(png()).unwrap();
        f.clear_proof();
        assert_eq!(f.phase(), PaymentPhase::Idle);
        assert_eq!(f.selected_proof(), None);
    }

    #[tokio::test]
    async fn finalize_without_proof_is_refused() {
        let mut f = PaymentFinalizer::new();
        let mut store = MemoryProgressStore::new();
        let r = RegistrationReference::parse("R1").unwrap();
        let err = f
            .finalize(&offline_api(), &mut store, Some(&r))
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelError::MissingProof));
        assert_eq!(f.phase(), PaymentPhase::Idle);
    }

    #[tokio::test]
    async fn finalize_without_navigation_reference_is_refused() {
        let mut f = PaymentFinalizer::new();
        f.select_proof(png()).unwrap();
        let mut store = MemoryProgressStore::new();
        let err = f
            .finalize(&offline_api(), &mut store, None)
            .await
            .unwrap_err();
        assert!(matches!(err, FunnelError::MissingReference));
        assert_eq!(f.phase(), PaymentPhase::ProofSelected);
    }

    #[tokio::test]
    async fn transport_failure_keeps_proof_and_store() {
        let mut f = PaymentFinalizer::new();
        f.select_proof(png()).unwrap();
        let mut store = MemoryProgressStore::new();
        let r = RegistrationReference::parse("R1").unwrap();
        store.save_reference(&r).unwrap();

        let err = f
            .finalize(&offline_api(), &mut store, Some(&r))
            .await
            .unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(f.phase(), PaymentPhase::Failed);
        assert_eq!(f.selected_proof(), Some(&png()));
        assert_eq!(store.load_reference(), Some(r));
    }

    #[test]
    fn mismatch_message_names_both_references() {
        let m = ReferenceMismatch {
            navigation: RegistrationReference::parse("R2").unwrap(),
            stored: RegistrationReference::parse("R1"),
        };
        let text = m.to_string();
        assert!(text.starts_with("Validation Error"));
        assert!(text.contains("R2") && text.contains("R1"));
    }

    #[test]
    fn content_type_from_extension() {
        assert_eq!(content_type_for(Path::new("x/receipt.JPG")), "image/jpeg");
        assert_eq!(content_type_for(Path::new("receipt.pdf")), DOCUMENT_TYPE);
        assert_eq!(content_type_for(Path::new("receipt")), "application/octet-stream");
    }
}

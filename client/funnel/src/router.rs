//! Flow router: owns the session state and sequences the funnel
//! `Register ──► Pay ──► Done`.
//!
//! Every component gets the draft and reference from here explicitly.
//! Navigating to a step without the input it needs lands back on
//! `Register`; it is never an error.

use tracing::info;

use crate::api::ApiClient;
use crate::draft::{Field, RegistrationDraft};
use crate::errors::{FunnelError, Result};
use crate::offer::{fetch_current_offer, OfferStatus};
use crate::payment::{FinalizeOutcome, PaymentFinalizer, PaymentProof};
use crate::store::ProgressStore;
use crate::submitter::{self, RegistrationReference};
use crate::ticket::TicketRecord;
use crate::validator::{validate, ValidRegistration};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    Register,
    /// Opened with the reference carried by navigation (`?ref=`).
    Pay { reference: RegistrationReference },
    /// Ticket travels in memory only; a restart does not bring it back.
    Done { ticket: TicketRecord },
}

impl Step {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Register => "register",
            Self::Pay { .. } => "pay",
            Self::Done { .. } => "done",
        }
    }
}

pub struct FlowRouter<S: ProgressStore> {
    api: ApiClient,
    store: S,
    draft: RegistrationDraft,
    record: Option<ValidRegistration>,
    payment: PaymentFinalizer,
    step: Step,
}

impl<S: ProgressStore> FlowRouter<S> {
    /// Start a session on the Register step with the draft rehydrated from
    /// the store.
    pub fn mount(api: ApiClient, store: S) -> Self {
        let draft = store.load();
        if !draft.is_empty() {
            info!("Restored saved registration progress");
        }
        Self {
            api,
            store,
            draft,
            record: None,
            payment: PaymentFinalizer::new(),
            step: Step::Register,
        }
    }

    pub fn step(&self) -> &Step {
        &self.step
    }

    pub fn draft(&self) -> &RegistrationDraft {
        &self.draft
    }

    pub fn payment(&self) -> &PaymentFinalizer {
        &self.payment
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// True while a finalize call is in flight; the submit control must be
    /// disabled.
    pub fn is_busy(&self) -> bool {
        self.payment.is_submitting()
    }

    pub async fn offer(&self) -> OfferStatus {
        fetch_current_offer(&self.api).await
    }

    /// Update one form field and mirror the whole draft to the store.
    pub fn set_field(&mut self, field: Field, value: impl Into<String>) -> Result<()> {
        self.require_register("edit the form")?;
        self.draft.set(field, value);
        self.record = None;
        self.store.save(&self.draft)
    }

    /// Validate, create the registration, persist its reference and move to
    /// Pay. Validation errors come back as [`FunnelError::Validation`] with
    /// every violated rule.
    pub async fn submit_registration(&mut self) -> Result<RegistrationReference> {
        self.require_register("submit the registration")?;
        let record = validate(&self.draft).map_err(FunnelError::Validation)?;

        let reference = submitter::submit(&self.api, &mut self.store, &record).await?;

        self.record = Some(record);
        self.navigate(Step::Pay {
            reference: reference.clone(),
        });
        Ok(reference)
    }

    /// Enter the Pay step with the reference carried by navigation.
    pub fn open_payment(&mut self, reference: Option<RegistrationReference>) -> &Step {
        self.payment.reset();
        match reference {
            Some(reference) => self.navigate(Step::Pay { reference }),
            None => {
                info!("Payment opened without a reference; starting over");
                self.navigate(Step::Register);
            }
        }
        &self.step
    }

    /// Enter the Done step with the ticket carried by navigation.
    pub fn open_ticket(&mut self, ticket: Option<TicketRecord>) -> &Step {
        match ticket {
            Some(ticket) => self.navigate(Step::Done { ticket }),
            None => {
                info!("Ticket view opened without a ticket; starting over");
                self.navigate(Step::Register);
            }
        }
        &self.step
    }

    pub fn select_proof(&mut self, proof: PaymentProof) -> Result<()> {
        self.pay_reference("select a payment proof")?;
        self.payment.select_proof(proof)
    }

    pub fn clear_proof(&mut self) {
        self.payment.clear_proof();
    }

    /// Upload the selected proof. On success the store is already cleared
    /// and the router sits on Done with a fresh ticket, or on Register when
    /// this session holds no valid draft to issue one from.
    pub async fn finalize_payment(&mut self) -> Result<FinalizeOutcome> {
        let reference = self.pay_reference("finalize payment")?;
        let record = self
            .record
            .clone()
            .or_else(|| validate(&self.draft).ok());

        let outcome = self
            .payment
            .finalize(&self.api, &mut self.store, Some(&reference))
            .await?;

        self.draft = RegistrationDraft::default();
        self.record = None;
        match record {
            Some(record) => {
                let ticket = TicketRecord::issue(&record, &outcome.reference);
                self.navigate(Step::Done { ticket });
            }
            None => {
                info!(
                    "Payment {} accepted; no local draft to issue a ticket from",
                    outcome.reference
                );
                self.navigate(Step::Register);
            }
        }
        Ok(outcome)
    }

    fn navigate(&mut self, to: Step) {
        info!("Step {} -> {}", self.step.name(), to.name());
        if matches!(to, Step::Register) {
            self.payment = PaymentFinalizer::new();
        }
        self.step = to;
    }

    fn require_register(&self, action: &'static str) -> Result<()> {
        match self.step {
            Step::Register => Ok(()),
            _ => Err(FunnelError::InvalidStep {
                action,
                step: self.step.name(),
            }),
        }
    }

    fn pay_reference(&self, action: &'static str) -> Result<RegistrationReference> {
        match &self.step {
            Step::Pay { reference } => Ok(reference.clone()),
            other => Err(FunnelError::InvalidStep {
                action,
                step: other.name(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::OTHER;
    use crate::store::MemoryProgressStore;

    fn router() -> FlowRouter<MemoryProgressStore> {
        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        FlowRouter::mount(api, MemoryProgressStore::new())
    }

    #[test]
    fn edits_are_mirrored_and_rehydrated() {
        let mut r = router();
        r.set_field(Field::Name, "A").unwrap();
        r.set_field(Field::Year, OTHER).unwrap();
        r.set_field(Field::YearOther, "5th").unwrap();
        assert_eq!(r.store().load(), *r.draft());

        let api = ApiClient::new("http://127.0.0.1:1").unwrap();
        let reloaded = FlowRouter::mount(api, r.into_store());
        assert_eq!(reloaded.draft().name, "A");
        assert_eq!(reloaded.draft().year_other, "5th");
        assert_eq!(reloaded.step(), &Step::Register);
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_backend() {
        let mut r = router();
        r.set_field(Field::Name, "A").unwrap();
        let err = r.submit_registration().await.unwrap_err();
        let FunnelError::Validation(errors) = err else {
            panic!("expected validation errors, got {err:?}");
        };
        assert_eq!(errors.len(), 6);
        assert_eq!(r.step(), &Step::Register);
        assert_eq!(r.store().load_reference(), None);
    }

    #[test]
    fn pay_without_reference_starts_over() {
        let mut r = router();
        assert_eq!(r.open_payment(None), &Step::Register);
    }

    #[test]
    fn done_without_ticket_starts_over() {
        let mut r = router();
        r.open_payment(RegistrationReference::parse("R1"));
        assert_eq!(r.open_ticket(None), &Step::Register);
    }

    #[test]
    fn steps_guard_their_operations() {
        let mut r = router();
        let proof = PaymentProof::new("p.png", "image/png", vec![1]);
        assert!(matches!(
            r.select_proof(proof.clone()),
            Err(FunnelError::InvalidStep { step: "register", .. })
        ));

        r.open_payment(RegistrationReference::parse("R1"));
        assert!(matches!(
            r.set_field(Field::Name, "B"),
            Err(FunnelError::InvalidStep { step: "pay", .. })
        ));
        r.select_proof(proof).unwrap();
        assert!(r.payment().selected_proof().is_some());
        assert!(!r.is_busy());
    }
}

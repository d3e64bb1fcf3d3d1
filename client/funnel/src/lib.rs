//! Event registration funnel.
//!
//! A visitor fills in the registration form, is routed to a payment-proof
//! upload, and finally receives a ticket:
//!
//! | Step     | Produces                          | Consumes                     |
//! |----------|-----------------------------------|------------------------------|
//! | Register | draft (mirrored), reference       | —                            |
//! | Pay      | nothing persisted                 | reference (`?ref=`), proof   |
//! | Done     | —                                 | in-memory [`TicketRecord`]   |
//!
//! In-progress state survives restarts through a [`ProgressStore`] and is
//! cleared only once the backend accepts the payment proof. The backend is
//! the only source of truth; this crate never handles money, it records a
//! claimed payment and uploads the evidence for manual verification.

pub mod api;
pub mod config;
pub mod draft;
pub mod errors;
pub mod offer;
pub mod payment;
pub mod router;
pub mod store;
pub mod submitter;
pub mod ticket;
pub mod validator;

pub use api::ApiClient;
pub use config::Config;
pub use draft::{Branch, Choice, Degree, Field, RegistrationDraft, Year};
pub use errors::{FunnelError, Result};
pub use offer::{OfferSnapshot, OfferStatus};
pub use payment::{FinalizeOutcome, PaymentFinalizer, PaymentPhase, PaymentProof};
pub use router::{FlowRouter, Step};
pub use store::{FileProgressStore, MemoryProgressStore, ProgressStore};
pub use submitter::RegistrationReference;
pub use ticket::TicketRecord;
pub use validator::{validate, FieldError, ValidRegistration};

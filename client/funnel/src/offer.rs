//! Current price / discount lookup. Purely cosmetic: a failure here never
//! blocks registration or payment.

use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use crate::api::ApiClient;

/// Shown in place of the price when no offer could be fetched.
pub const PRICE_PLACEHOLDER: &str = "...";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfferSnapshot {
    /// Promotional label, e.g. "Early Bird". May be empty.
    pub label: String,
    pub price: String,
    pub active: bool,
    pub fetched_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OfferStatus {
    Available(OfferSnapshot),
    Unavailable,
}

impl OfferStatus {
    pub fn snapshot(&self) -> Option<&OfferSnapshot> {
        match self {
            Self::Available(s) => Some(s),
            Self::Unavailable => None,
        }
    }

    pub fn display_price(&self) -> String {
        match self.snapshot() {
            Some(s) if !s.price.is_empty() => format!("₹{}", s.price),
            _ => format!("₹{PRICE_PLACEHOLDER}"),
        }
    }

    /// Offer label worth showing next to the price, if any.
    pub fn badge(&self) -> Option<&str> {
        self.snapshot()
            .map(|s| s.label.as_str())
            .filter(|label| !label.is_empty())
    }
}

/// One read of the current offer. Any transport or decoding failure comes
/// back as [`OfferStatus::Unavailable`]. A backend with no running offer
/// answers `null`, which is an inactive snapshot rather than a failure.
pub async fn fetch_current_offer(api: &ApiClient) -> OfferStatus {
    match api.fetch_offer().await {
        Ok(Some(body)) => OfferStatus::Available(OfferSnapshot {
            label: body.offer.unwrap_or_default(),
            price: body.price.unwrap_or_default(),
            active: body.active.unwrap_or(false),
            fetched_at: Utc::now(),
        }),
        Ok(None) => {
            debug!("No offer is currently running");
            OfferStatus::Available(OfferSnapshot {
                label: String::new(),
                price: String::new(),
                active: false,
                fetched_at: Utc::now(),
            })
        }
        Err(e) => {
            warn!("Failed to fetch ticket price: {e}");
            OfferStatus::Unavailable
        }
    }
}

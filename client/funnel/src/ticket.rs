//! Finished ticket data handed to the renderer. Never persisted.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::draft::Enumerated;
use crate::submitter::RegistrationReference;
use crate::validator::ValidRegistration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketRecord {
    pub name: String,
    pub email: String,
    pub ticket_number: String,
    pub degree: String,
    pub year: String,
    pub branch: String,
    pub issued_at: DateTime<Utc>,
}

impl TicketRecord {
    /// Ticket for a finalized registration. Year and branch carry the
    /// effective values, i.e. the override text for `Other` selections.
    pub fn issue(record: &ValidRegistration, reference: &RegistrationReference) -> Self {
        Self {
            name: record.name.clone(),
            email: record.email.clone(),
            ticket_number: reference.as_str().to_string(),
            degree: record.degree.as_str().to_string(),
            year: record.year.effective().to_string(),
            branch: record.branch.effective().to_string(),
            issued_at: Utc::now(),
        }
    }

    pub fn file_name(&self) -> String {
        format!("TEDxNITKKR-Ticket-{}.pdf", self.ticket_number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draft::{RegistrationDraft, OTHER};
    use crate::validator::validate;

    #[test]
    fn ticket_uses_effective_choices_and_reference() {
        let record = validate(&RegistrationDraft {
            name: "A".into(),
            email: "a@b.com".into(),
            roll_number: "NA".into(),
            contact_number: "9999999999".into(),
            degree: "MCA/MTech".into(),
            year: "2nd".into(),
            branch: OTHER.into(),
            branch_other: "Chemical".into(),
            ..Default::default()
        })
        .unwrap();
        let reference = RegistrationReference::parse("R1").unwrap();

        let ticket = TicketRecord::issue(&record, &reference);
        assert_eq!(ticket.ticket_number, "R1");
        assert_eq!(ticket.degree, "MCA/MTech");
        assert_eq!(ticket.year, "2nd");
        assert_eq!(ticket.branch, "Chemical");
        assert_eq!(ticket.file_name(), "TEDxNITKKR-Ticket-R1.pdf");
    }
}

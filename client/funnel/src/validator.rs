//! Registration form validation.
//!
//! [`validate`] is pure: it never mutates the draft and reports every
//! violated rule in field-declaration order rather than stopping at the
//! first one.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::draft::{Branch, Choice, Degree, Enumerated, Field, RegistrationDraft, Year, OTHER};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9.!#$%&'*+/=?^_`{|}~-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*\.[A-Za-z]{2,}$")
        .expect("email pattern is valid")
});

static CONTACT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{10}$").expect("contact pattern is valid"));

/// A single violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl FieldError {
    fn new(field: Field, message: &'static str) -> Self {
        Self { field, message }
    }
}

/// A draft that passed every rule, with whitespace trimmed and the
/// `Other` overrides folded into typed choices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidRegistration {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub contact_number: String,
    pub degree: Degree,
    pub year: Choice<Year>,
    pub branch: Choice<Branch>,
}

/// Body of the registration request.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationPayload<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub roll_number: &'a str,
    pub contact_number: &'a str,
    pub degree: &'static str,
    pub year: &'static str,
    pub year_other: &'a str,
    pub branch: &'static str,
    pub branch_other: &'a str,
}

impl ValidRegistration {
    pub fn payload(&self) -> RegistrationPayload<'_> {
        RegistrationPayload {
            name: &self.name,
            email: &self.email,
            roll_number: &self.roll_number,
            contact_number: &self.contact_number,
            degree: self.degree.as_str(),
            year: self.year.selection(),
            year_other: self.year.override_text(),
            branch: self.branch.selection(),
            branch_other: self.branch.override_text(),
        }
    }
}

pub fn validate(draft: &RegistrationDraft) -> Result<ValidRegistration, Vec<FieldError>> {
    let mut errors = Vec::new();

    let name = draft.name.trim();
    if name.is_empty() {
        errors.push(FieldError::new(Field::Name, "Name is required"));
    }

    let email = draft.email.trim();
    if !EMAIL_RE.is_match(email) {
        errors.push(FieldError::new(Field::Email, "Invalid email address"));
    }

    let roll_number = draft.roll_number.trim();
    if roll_number.is_empty() {
        errors.push(FieldError::new(Field::RollNumber, "Roll number is required"));
    }

    let contact_number = draft.contact_number.trim();
    if !CONTACT_RE.is_match(contact_number) {
        errors.push(FieldError::new(Field::ContactNumber, "Invalid phone number"));
    }

    let degree = Degree::from_label(draft.degree.trim());
    if degree.is_none() {
        errors.push(FieldError::new(Field::Degree, "Please select a degree"));
    }

    let year = choose::<Year>(&draft.year, &draft.year_other)
        .map_err(|bad| errors.push(year_error(bad)))
        .ok();

    let branch = choose::<Branch>(&draft.branch, &draft.branch_other)
        .map_err(|bad| errors.push(branch_error(bad)))
        .ok();

    match (degree, year, branch) {
        (Some(degree), Some(year), Some(branch)) if errors.is_empty() => Ok(ValidRegistration {
            name: name.to_string(),
            email: email.to_string(),
            roll_number: roll_number.to_string(),
            contact_number: contact_number.to_string(),
            degree,
            year,
            branch,
        }),
        _ => Err(errors),
    }
}

enum ChoiceViolation {
    Unselected,
    MissingOverride,
}

fn choose<T: Enumerated>(selection: &str, override_text: &str) -> Result<Choice<T>, ChoiceViolation> {
    let selection = selection.trim();
    if selection == OTHER {
        let text = override_text.trim();
        if text.is_empty() {
            return Err(ChoiceViolation::MissingOverride);
        }
        return Ok(Choice::Custom(text.to_string()));
    }
    T::from_label(selection)
        .map(Choice::Enumerated)
        .ok_or(ChoiceViolation::Unselected)
}

fn year_error(v: ChoiceViolation) -> FieldError {
    match v {
        ChoiceViolation::Unselected => FieldError::new(Field::Year, "Please select a year"),
        ChoiceViolation::MissingOverride => {
            FieldError::new(Field::YearOther, "Please specify your year")
        }
    }
}

fn branch_error(v: ChoiceViolation) -> FieldError {
    match v {
        ChoiceViolation::Unselected => FieldError::new(Field::Branch, "Please select a branch"),
        ChoiceViolation::MissingOverride => {
            FieldError::new(Field::BranchOther, "Please specify your branch")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> RegistrationDraft {
        RegistrationDraft {
            name: "A".into(),
            email: "a@b.com".into(),
            roll_number: "NA".into(),
            contact_number: "9999999999".into(),
            degree: "BTech".into(),
            year: "1st".into(),
            branch: "NA".into(),
            ..Default::default()
        }
    }

    #[test]
    fn sample_draft_is_valid() {
        let valid = validate(&sample()).unwrap();
        assert_eq!(valid.degree, Degree::BTech);
        assert_eq!(valid.year, Choice::Enumerated(Year::First));
        assert_eq!(valid.branch.effective(), "NA");
    }

    #[test]
    fn empty_draft_reports_every_field_in_order() {
        let errors = validate(&RegistrationDraft::default()).unwrap_err();
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(
            fields,
            vec![
                Field::Name,
                Field::Email,
                Field::RollNumber,
                Field::ContactNumber,
                Field::Degree,
                Field::Year,
                Field::Branch,
            ]
        );
    }

    #[test]
    fn single_bad_field_yields_single_error() {
        let mut draft = sample();
        draft.contact_number = "12345".into();
        let errors = validate(&draft).unwrap_err();
        assert_eq!(errors, vec![FieldError::new(Field::ContactNumber, "Invalid phone number")]);
    }

    #[test]
    fn contact_number_must_be_exactly_ten_digits() {
        for bad in ["999999999", "99999999999", "99999 9999", "abcdefghij", "+919999999"] {
            let mut draft = sample();
            draft.contact_number = bad.into();
            assert!(validate(&draft).is_err(), "{bad} should be rejected");
        }
    }

    #[test]
    fn malformed_emails_are_rejected() {
        for bad in ["", "a", "a@", "@b.com", "a@b", "a b@c.com", "a@@b.com"] {
            let mut draft = sample();
            draft.email = bad.into();
            let errors = validate(&draft).unwrap_err();
            assert_eq!(errors[0].field, Field::Email, "{bad:?}");
        }
    }

    #[test]
    fn other_selection_substitutes_override_text() {
        let mut draft = sample();
        draft.year = OTHER.into();
        draft.year_other = "  5th  ".into();
        draft.branch = OTHER.into();
        draft.branch_other = "Chemical".into();

        let valid = validate(&draft).unwrap();
        assert_eq!(valid.year.effective(), "5th");
        assert_eq!(valid.branch.effective(), "Chemical");

        let payload = valid.payload();
        assert_eq!(payload.year, OTHER);
        assert_eq!(payload.year_other, "5th");
    }

    #[test]
    fn other_selection_without_override_is_an_error() {
        let mut draft = sample();
        draft.branch = OTHER.into();
        let errors = validate(&draft).unwrap_err();
        assert_eq!(
            errors,
            vec![FieldError::new(Field::BranchOther, "Please specify your branch")]
        );
    }

    #[test]
    fn unknown_selection_is_rejected() {
        let mut draft = sample();
        draft.degree = "PhD".into();
        draft.year = "5th".into();
        let errors = validate(&draft).unwrap_err();
        let fields: Vec<Field> = errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec![Field::Degree, Field::Year]);
    }

    #[test]
    fn validation_trims_and_leaves_draft_untouched() {
        let mut draft = sample();
        draft.name = "  Ada Lovelace ".into();
        let before = draft.clone();
        let valid = validate(&draft).unwrap();
        assert_eq!(valid.name, "Ada Lovelace");
        assert_eq!(draft, before);
    }

    const CHECKED: [Field; 7] = [
        Field::Name,
        Field::Email,
        Field::RollNumber,
        Field::ContactNumber,
        Field::Degree,
        Field::Year,
        Field::Branch,
    ];

    fn arb_label<T: Enumerated + std::fmt::Debug>() -> impl Strategy<Value = String> {
        prop::sample::select(T::ALL).prop_map(|v| v.as_str().to_string())
    }

    fn arb_valid_draft() -> impl Strategy<Value = RegistrationDraft> {
        (
            "[A-Za-z][A-Za-z ]{0,20}",
            "[a-z0-9.]{0,6}[a-z]@[a-z]{1,8}\\.(com|org|in)",
            "[A-Z0-9]{1,10}",
            "[0-9]{10}",
            arb_label::<Degree>(),
            arb_label::<Year>(),
            arb_label::<Branch>(),
        )
            .prop_map(
                |(name, email, roll_number, contact_number, degree, year, branch)| {
                    RegistrationDraft {
                        name,
                        email,
                        roll_number,
                        contact_number,
                        degree,
                        year,
                        branch,
                        ..Default::default()
                    }
                },
            )
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(64))]

        #[test]
        fn blanked_fields_are_reported_exactly_and_in_order(
            draft in arb_valid_draft(),
            blanked in prop::array::uniform7(any::<bool>()),
            blank in "[ \t]{0,3}",
        ) {
            let mut draft = draft;
            let mut expected = Vec::new();
            for (field, blanked) in CHECKED.into_iter().zip(blanked) {
                if blanked {
                    draft.set(field, blank.clone());
                    expected.push(field);
                }
            }

            let reported: Vec<Field> = match validate(&draft) {
                Ok(_) => Vec::new(),
                Err(errors) => errors.iter().map(|e| e.field).collect(),
            };
            prop_assert_eq!(reported, expected);
        }

        #[test]
        fn other_selections_take_trimmed_override_text(
            draft in arb_valid_draft(),
            year_text in "[A-Za-z0-9]{1,10}",
            branch_text in "[A-Za-z0-9][A-Za-z0-9 ]{0,12}",
            pad in " {0,3}",
        ) {
            let mut draft = draft;
            draft.year = OTHER.into();
            draft.year_other = format!("{pad}{year_text}{pad}");
            draft.branch = OTHER.into();
            draft.branch_other = format!("{pad}{branch_text}");

            let valid = validate(&draft).unwrap();
            prop_assert_eq!(valid.year.effective(), year_text.as_str());
            prop_assert_eq!(valid.branch.effective(), branch_text.trim());

            let payload = valid.payload();
            prop_assert_eq!(payload.year, OTHER);
            prop_assert_eq!(payload.branch, OTHER);
            prop_assert_eq!(payload.year_other, year_text.as_str());
        }
    }
}

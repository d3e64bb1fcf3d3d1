//! Registration form data: the mutable draft and the enumerated choices it
//! is validated against.

use serde::{Deserialize, Serialize};

/// Selection value meaning "none of the listed options; see the free-text
/// override field".
pub const OTHER: &str = "Other";

/// In-progress form state, exactly as typed by the visitor.
///
/// Serialized with the backend's camelCase field names; every field
/// defaults to empty so a partially written slot still rehydrates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegistrationDraft {
    pub name: String,
    pub email: String,
    pub roll_number: String,
    pub contact_number: String,
    pub degree: String,
    pub year: String,
    pub year_other: String,
    pub branch: String,
    pub branch_other: String,
}

/// Form fields in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    RollNumber,
    ContactNumber,
    Degree,
    Year,
    YearOther,
    Branch,
    BranchOther,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Name,
        Field::Email,
        Field::RollNumber,
        Field::ContactNumber,
        Field::Degree,
        Field::Year,
        Field::YearOther,
        Field::Branch,
        Field::BranchOther,
    ];

    /// Wire / storage key of the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::RollNumber => "rollNumber",
            Self::ContactNumber => "contactNumber",
            Self::Degree => "degree",
            Self::Year => "year",
            Self::YearOther => "yearOther",
            Self::Branch => "branch",
            Self::BranchOther => "branchOther",
        }
    }
}

impl RegistrationDraft {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Email => &self.email,
            Field::RollNumber => &self.roll_number,
            Field::ContactNumber => &self.contact_number,
            Field::Degree => &self.degree,
            Field::Year => &self.year,
            Field::YearOther => &self.year_other,
            Field::Branch => &self.branch,
            Field::BranchOther => &self.branch_other,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let value = value.into();
        match field {
            Field::Name => self.name = value,
            Field::Email => self.email = value,
            Field::RollNumber => self.roll_number = value,
            Field::ContactNumber => self.contact_number = value,
            Field::Degree => self.degree = value,
            Field::Year => self.year = value,
            Field::YearOther => self.year_other = value,
            Field::Branch => self.branch = value,
            Field::BranchOther => self.branch_other = value,
        }
    }

    /// True when no field has been touched.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// A closed set of selectable labels.
pub trait Enumerated: Sized + Copy + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|v| v.as_str() == label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Degree {
    BTech,
    McaMTech,
}

impl Enumerated for Degree {
    const ALL: &'static [Self] = &[Self::BTech, Self::McaMTech];

    fn as_str(&self) -> &'static str {
        match self {
            Self::BTech => "BTech",
            Self::McaMTech => "MCA/MTech",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Year {
    First,
    Second,
    Third,
    Fourth,
    NotApplicable,
}

impl Enumerated for Year {
    const ALL: &'static [Self] = &[
        Self::First,
        Self::Second,
        Self::Third,
        Self::Fourth,
        Self::NotApplicable,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::First => "1st",
            Self::Second => "2nd",
            Self::Third => "3rd",
            Self::Fourth => "4th",
            Self::NotApplicable => "NA",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    Electrical,
    Civil,
    AiMl,
    Mnc,
    Mba,
    Mca,
    Ece,
    NotApplicable,
}

impl Enumerated for Branch {
    const ALL: &'static [Self] = &[
        Self::Electrical,
        Self::Civil,
        Self::AiMl,
        Self::Mnc,
        Self::Mba,
        Self::Mca,
        Self::Ece,
        Self::NotApplicable,
    ];

    fn as_str(&self) -> &'static str {
        match self {
            Self::Electrical => "Electrical",
            Self::Civil => "Civil",
            Self::AiMl => "AI/ML",
            Self::Mnc => "MNC",
            Self::Mba => "MBA",
            Self::Mca => "MCA",
            Self::Ece => "ECE",
            Self::NotApplicable => "NA",
        }
    }
}

/// A selection from a fixed list, or free text entered after picking
/// [`OTHER`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice<T> {
    Enumerated(T),
    Custom(String),
}

impl<T: Enumerated> Choice<T> {
    /// The value that ends up on the registration and the ticket.
    pub fn effective(&self) -> &str {
        match self {
            Choice::Enumerated(v) => v.as_str(),
            Choice::Custom(text) => text,
        }
    }

    /// Label to send back in the primary selection field.
    pub fn selection(&self) -> &'static str {
        match self {
            Choice::Enumerated(v) => v.as_str(),
            Choice::Custom(_) => OTHER,
        }
    }

    /// Override text, empty unless the selection is [`OTHER`].
    pub fn override_text(&self) -> &str {
        match self {
            Choice::Enumerated(_) => "",
            Choice::Custom(text) => text,
        }
    }
}

use chrono::{Datelike, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Restriction or alert attached to a prisoner or a visitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RestrictionFlag {
    pub code: String,
    pub description: String,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
}

impl RestrictionFlag {
    pub fn new(code: &str, description: &str) -> Self {
        Self {
            code: code.to_string(),
            description: description.to_string(),
            expiry_date: None,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.code == "CLOSED"
    }

    pub fn is_ban(&self) -> bool {
        self.code == "BAN"
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrisonerProfile {
    pub prisoner_number: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub prison_id: String,
    pub location: Option<String>,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFlag>,
}

impl PrisonerProfile {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Approved social contact of a prisoner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorRecord {
    pub person_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub relationship: String,
    #[serde(default)]
    pub restrictions: Vec<RestrictionFlag>,
}

impl VisitorRecord {
    pub fn display_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    pub fn is_banned(&self) -> bool {
        self.restrictions.iter().any(RestrictionFlag::is_ban)
    }

    /// Visitors without a recorded date of birth count as adults.
    pub fn is_adult(&self, today: NaiveDate, adult_age: u32) -> bool {
        match self.date_of_birth {
            Some(dob) => age_on(dob, today) >= adult_age,
            None => true,
        }
    }
}

fn age_on(dob: NaiveDate, today: NaiveDate) -> u32 {
    let mut years = today.year() - dob.year();
    if (today.month(), today.day()) < (dob.month(), dob.day()) {
        years -= 1;
    }
    years.max(0) as u32
}

/// Prisoner numbers look like `A1234BC`.
pub fn is_valid_prisoner_number(value: &str) -> bool {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN
        .get_or_init(|| Regex::new(r"^[A-Z][0-9]{4}[A-Z]{2}$").expect("static pattern"))
        .is_match(value)
}

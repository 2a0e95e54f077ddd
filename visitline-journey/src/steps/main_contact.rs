use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use visitline_core::{Draft, MainContact};
use visitline_shared::Masked;

use super::{invalid, resync_hold, StepContext};
use crate::mode::{Navigation, Page};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

pub const SOMEONE_ELSE: &str = "someoneElse";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactOption {
    pub person_id: i64,
    pub name: String,
    pub relationship: String,
    pub adult: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MainContactView {
    pub visitors: Vec<ContactOption>,
    pub main_contact: Option<MainContact>,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MainContactForm {
    /// A selected visitor's person id, or `someoneElse`.
    pub contact: Option<String>,
    pub someone_else_name: Option<String>,
    pub phone_number_input: Option<String>,
}

pub fn view(session: &mut JourneySession) -> JourneyResult<MainContactView> {
    let flash = session.take_flash();
    let draft = session.draft()?;
    let visitors = draft
        .visitors
        .iter()
        .map(|v| ContactOption {
            person_id: v.person_id,
            name: v.name.clone(),
            relationship: v.relationship.clone(),
            adult: v.adult,
        })
        .collect();

    Ok(MainContactView {
        visitors,
        main_contact: draft.main_contact.clone(),
        errors: flash.errors,
        form_values: flash.form_values,
    })
}

pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    form: &MainContactForm,
) -> JourneyResult<Navigation> {
    let contact = match validate(form, session.draft()?) {
        Ok(contact) => contact,
        Err(errors) => return Ok(invalid(session, Page::MainContact, errors, form)),
    };

    let change = |draft: &mut Draft| draft.main_contact = Some(contact);
    if let Some(navigation) = resync_hold(ctx, session, Page::MainContact, form, change).await? {
        return Ok(navigation);
    }
    Ok(Navigation::Page(Page::RequestMethod))
}

fn validate(form: &MainContactForm, draft: &Draft) -> Result<MainContact, Vec<FieldError>> {
    let mut errors = Vec::new();

    let named = match form.contact.as_deref() {
        None | Some("") => {
            errors.push(FieldError::new("contact", "No main contact selected"));
            None
        }
        Some(SOMEONE_ELSE) => match non_blank(form.someone_else_name.as_deref()) {
            Some(name) => Some((None, name.to_string())),
            None => {
                errors.push(FieldError::new(
                    "someoneElseName",
                    "Enter the name of the main contact",
                ));
                None
            }
        },
        Some(id) => {
            let visitor = id
                .parse::<i64>()
                .ok()
                .and_then(|id| draft.visitors.iter().find(|v| v.person_id == id));
            match visitor {
                Some(visitor) => Some((Some(visitor.person_id), visitor.name.clone())),
                None => {
                    errors.push(FieldError::new("contact", "Invalid selection"));
                    None
                }
            }
        }
    };

    let phone = match non_blank(form.phone_number_input.as_deref()) {
        None => {
            errors.push(FieldError::new("phoneNumberInput", "Enter a phone number"));
            None
        }
        Some(raw) => match normalise_phone_number(raw) {
            Some(phone) => Some(phone),
            None => {
                errors.push(FieldError::new(
                    "phoneNumberInput",
                    "Enter a UK phone number, like 07700 900 982 or 01632 960 001",
                ));
                None
            }
        },
    };

    match (named, phone) {
        (Some((contact_id, contact_name)), Some(phone)) if errors.is_empty() => Ok(MainContact {
            contact_id,
            contact_name,
            phone_number: Some(Masked(phone)),
        }),
        _ => Err(errors),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// UK numbers only, with spacing and punctuation removed.
fn normalise_phone_number(raw: &str) -> Option<String> {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    let compact: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '-' | '(' | ')'))
        .collect();
    PATTERN
        .get_or_init(|| Regex::new(r"^(\+44|0)\d{9,10}$").expect("static pattern"))
        .is_match(&compact)
        .then_some(compact)
}

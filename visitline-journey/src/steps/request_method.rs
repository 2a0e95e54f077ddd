use serde::{Deserialize, Serialize};
use visitline_core::RequestMethod;

use super::invalid;
use crate::mode::{Navigation, Page};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MethodOption {
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMethodView {
    pub methods: Vec<MethodOption>,
    pub request_method: Option<RequestMethod>,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMethodForm {
    pub method: Option<String>,
}

pub fn view(session: &mut JourneySession) -> JourneyResult<RequestMethodView> {
    let flash = session.take_flash();
    Ok(RequestMethodView {
        methods: RequestMethod::ALL
            .iter()
            .map(|m| MethodOption { code: m.code(), description: m.description() })
            .collect(),
        request_method: session.draft()?.request_method,
        errors: flash.errors,
        form_values: flash.form_values,
    })
}

pub fn submit(session: &mut JourneySession, form: &RequestMethodForm) -> JourneyResult<Navigation> {
    let method = form.method.as_deref().and_then(|m| m.parse::<RequestMethod>().ok());
    let Some(method) = method else {
        let error = FieldError::new("method", "No request method selected");
        return Ok(invalid(session, Page::RequestMethod, vec![error], form));
    };
    session.draft_mut()?.request_method = Some(method);
    Ok(Navigation::Page(Page::CheckYourBooking))
}

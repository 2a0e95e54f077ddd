use serde::{Deserialize, Serialize};
use visitline_core::{AdditionalSupport, Draft, SupportType};

use super::{invalid, resync_hold, yes_no, StepContext};
use crate::mode::{Navigation, Page};
use crate::session::{FieldError, JourneySession};
use crate::JourneyResult;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSupportView {
    pub support_types: Vec<SupportType>,
    pub additional_support: Option<AdditionalSupport>,
    pub errors: Vec<FieldError>,
    pub form_values: serde_json::Value,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdditionalSupportForm {
    pub additional_support_required: Option<String>,
    #[serde(default)]
    pub additional_support: Vec<String>,
    pub other_support_details: Option<String>,
}

pub async fn view(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
) -> JourneyResult<AdditionalSupportView> {
    let flash = session.take_flash();
    let support_types = ctx.reservations.get_support_types().await?;
    Ok(AdditionalSupportView {
        support_types,
        additional_support: session.draft()?.additional_support.clone(),
        errors: flash.errors,
        form_values: flash.form_values,
    })
}

pub async fn submit(
    ctx: &StepContext<'_>,
    session: &mut JourneySession,
    form: &AdditionalSupportForm,
) -> JourneyResult<Navigation> {
    let support_types = ctx.reservations.get_support_types().await?;
    let support = match validate(form, &support_types) {
        Ok(support) => support,
        Err(errors) => return Ok(invalid(session, Page::AdditionalSupport, errors, form)),
    };

    let change = |draft: &mut Draft| draft.additional_support = Some(support);
    if let Some(navigation) =
        resync_hold(ctx, session, Page::AdditionalSupport, form, change).await?
    {
        return Ok(navigation);
    }
    Ok(Navigation::Page(Page::MainContact))
}

fn validate(
    form: &AdditionalSupportForm,
    support_types: &[SupportType],
) -> Result<AdditionalSupport, Vec<FieldError>> {
    let required = match yes_no(form.additional_support_required.as_deref()) {
        Some(required) => required,
        None => {
            return Err(vec![FieldError::new("additionalSupportRequired", "No answer selected")]);
        }
    };
    if !required {
        return Ok(AdditionalSupport::none());
    }

    if form.additional_support.is_empty() {
        return Err(vec![FieldError::new("additionalSupport", "No request selected")]);
    }
    let known = |code: &String| support_types.iter().any(|t| &t.code == code);
    if !form.additional_support.iter().all(known) {
        return Err(vec![FieldError::new("additionalSupport", "Invalid selection")]);
    }

    let mut codes: Vec<String> = Vec::new();
    for code in &form.additional_support {
        if !codes.contains(code) {
            codes.push(code.clone());
        }
    }
    let wants_other = codes.iter().any(|code| code == AdditionalSupport::OTHER);
    let details = form
        .other_support_details
        .as_deref()
        .map(str::trim)
        .filter(|details| !details.is_empty());

    let other_details = match (wants_other, details) {
        (true, None) => {
            return Err(vec![FieldError::new(
                "otherSupportDetails",
                "Enter details of the request",
            )]);
        }
        (true, Some(details)) => Some(details.to_string()),
        (false, _) => None,
    };

    Ok(AdditionalSupport { codes, other_details })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mode::Mode;
    use crate::testing::{reserved_draft, support_types, Call, Harness};
    use visitline_core::reservation::ValidationCode;

    fn form(required: &str, codes: &[&str], other: Option<&str>) -> AdditionalSupportForm {
        AdditionalSupportForm {
            additional_support_required: Some(required.to_string()),
            additional_support: codes.iter().map(|c| c.to_string()).collect(),
            other_support_details: other.map(str::to_string),
        }
    }

    #[test]
    fn test_validation_messages() {
        let types = support_types();
        let cases = [
            (AdditionalSupportForm::default(), "No answer selected"),
            (form("yes", &[], None), "No request selected"),
            (form("yes", &["TELEPORT"], None), "Invalid selection"),
            (form("yes", &["WHEELCHAIR", "OTHER"], Some("   ")), "Enter details of the request"),
        ];
        for (form, message) in cases {
            let errors = validate(&form, &types).unwrap_err();
            assert_eq!(errors[0].message, message);
        }
    }

    #[test]
    fn test_no_support_clears_codes() {
        let support =
            validate(&form("no", &["WHEELCHAIR"], Some("ignored")), &support_types()).unwrap();
        assert_eq!(support, AdditionalSupport::none());
    }

    #[test]
    fn test_other_details_kept_only_with_other() {
        let types = support_types();
        let support = validate(&form("yes", &["WHEELCHAIR"], Some("lift")), &types).unwrap();
        assert_eq!(support.other_details, None);

        let support = validate(&form("yes", &["OTHER"], Some(" lift access ")), &types).unwrap();
        assert_eq!(support.other_details.as_deref(), Some("lift access"));
    }

    #[tokio::test]
    async fn test_submit_saves_and_retargets_hold() {
        let harness = Harness::new();
        let mut session = JourneySession::default();
        session.start(reserved_draft());

        let answer = form("yes", &["WHEELCHAIR"], None);

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &answer).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::MainContact));
        assert_eq!(
            session.draft().unwrap().additional_support.as_ref().unwrap().codes,
            vec!["WHEELCHAIR".to_string()]
        );
        assert!(matches!(harness.reservations.calls().last(), Some(Call::ChangeReserved(_))));
    }

    #[tokio::test]
    async fn test_invalid_submit_keeps_previous_answer() {
        let harness = Harness::new();
        let mut session = JourneySession::default();
        session.start(reserved_draft());

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &form("yes", &[], None))
            .await
            .unwrap();

        assert_eq!(nav, Navigation::Page(Page::AdditionalSupport));
        assert_eq!(session.draft().unwrap().additional_support, Some(AdditionalSupport::none()));
        let flash = session.take_flash();
        assert_eq!(flash.form_values["additionalSupportRequired"], "yes");
    }

    #[tokio::test]
    async fn test_refused_hold_update_keeps_previous_answer() {
        let harness = Harness::new();
        harness.reservations.reject_next(vec![ValidationCode::NoVoBalance]);
        let mut session = JourneySession::default();
        session.start(reserved_draft());

        let answer = form("yes", &["WHEELCHAIR"], None);

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &answer).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::AdditionalSupport));
        assert_eq!(session.draft().unwrap().additional_support, Some(AdditionalSupport::none()));
        assert_eq!(session.take_flash().errors[0].field, "submit");
    }

    #[tokio::test]
    async fn test_slot_refusal_sends_back_to_date_and_time_without_answer() {
        let harness = Harness::new();
        harness.reservations.reject_next(vec![ValidationCode::NonAssociationVisits]);
        let mut session = JourneySession::default();
        session.start(reserved_draft());

        let answer = form("yes", &["WHEELCHAIR"], None);

        let nav = submit(&harness.ctx(Mode::Book), &mut session, &answer).await.unwrap();

        assert_eq!(nav, Navigation::Page(Page::SelectDateAndTime));
        assert_eq!(session.draft().unwrap(), &reserved_draft());
        assert_eq!(session.take_flash().errors[0].field, "visitDateAndTime");
    }
}

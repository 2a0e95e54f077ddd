pub use visitline_core::Mode;

/// Wizard pages, in journey order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    SelectVisitors,
    VisitType,
    SelectDateAndTime,
    SlotOverbooking,
    AdditionalSupport,
    MainContact,
    RequestMethod,
    CheckYourBooking,
    CommitOverbooking,
    Confirmation,
}

impl Page {
    pub const ALL: [Page; 10] = [
        Page::SelectVisitors,
        Page::VisitType,
        Page::SelectDateAndTime,
        Page::SlotOverbooking,
        Page::AdditionalSupport,
        Page::MainContact,
        Page::RequestMethod,
        Page::CheckYourBooking,
        Page::CommitOverbooking,
        Page::Confirmation,
    ];

    /// Stage the gate enforces before the page's controller runs.
    pub fn stage(self) -> u8 {
        match self {
            Page::SelectVisitors | Page::VisitType => 1,
            Page::SelectDateAndTime | Page::SlotOverbooking => 2,
            Page::AdditionalSupport => 3,
            Page::MainContact => 4,
            Page::RequestMethod | Page::CheckYourBooking | Page::CommitOverbooking => 5,
            Page::Confirmation => 6,
        }
    }

    pub fn slug(self) -> &'static str {
        match self {
            Page::SelectVisitors => "select-visitors",
            Page::VisitType => "visit-type",
            Page::SelectDateAndTime => "select-date-and-time",
            Page::SlotOverbooking => "select-date-and-time/overbooking",
            Page::AdditionalSupport => "additional-support",
            Page::MainContact => "select-main-contact",
            Page::RequestMethod => "request-method",
            Page::CheckYourBooking => "check-your-booking",
            Page::CommitOverbooking => "check-your-booking/overbooking",
            Page::Confirmation => "confirmation",
        }
    }
}

/// Mode plus the visit reference bound in the URL (update journeys only).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JourneyRoute {
    pub mode: Mode,
    pub reference: Option<String>,
}

impl JourneyRoute {
    pub fn book() -> Self {
        Self { mode: Mode::Book, reference: None }
    }

    pub fn update(reference: &str) -> Self {
        Self {
            mode: Mode::Update,
            reference: Some(reference.to_string()),
        }
    }

    pub fn prefix(&self) -> String {
        match (&self.mode, &self.reference) {
            (Mode::Update, Some(reference)) => format!("/visit/{}/update", reference),
            _ => "/book-a-visit".to_string(),
        }
    }

    pub fn url(&self, page: Page) -> String {
        format!("{}/{}", self.prefix(), page.slug())
    }
}

/// Pages outside the wizard a journey can send the user to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Landing {
    PrisonerSearch { error: Option<&'static str> },
    Home { error: &'static str },
    PrisonerProfile { prisoner_number: String, error: Option<&'static str> },
    VisitDetails { reference: String, error: &'static str },
}

impl Landing {
    pub fn url(&self) -> String {
        match self {
            Landing::PrisonerSearch { error: Some(error) } => {
                format!("/search/prisoner?error={}", error)
            }
            Landing::PrisonerSearch { error: None } => "/search/prisoner".to_string(),
            Landing::Home { error } => format!("/?error={}", error),
            Landing::PrisonerProfile { prisoner_number, error: Some(error) } => {
                format!("/prisoner/{}?error={}", prisoner_number, error)
            }
            Landing::PrisonerProfile { prisoner_number, error: None } => {
                format!("/prisoner/{}", prisoner_number)
            }
            Landing::VisitDetails { reference, error } => {
                format!("/visit/{}?error={}", reference, error)
            }
        }
    }
}

/// Where a controller sends the user next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    Page(Page),
    /// Jump into a journey other than the current route's (journey start).
    Journey(JourneyRoute, Page),
    Landing(Landing),
}

impl Navigation {
    pub fn url(&self, route: &JourneyRoute) -> String {
        match self {
            Navigation::Page(page) => route.url(*page),
            Navigation::Journey(target, page) => target.url(*page),
            Navigation::Landing(landing) => landing.url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_urls_by_mode() {
        let book = JourneyRoute::book();
        let update = JourneyRoute::update("ab-cd-ef-gh");

        assert_eq!(book.url(Page::SelectVisitors), "/book-a-visit/select-visitors");
        assert_eq!(
            update.url(Page::CommitOverbooking),
            "/visit/ab-cd-ef-gh/update/check-your-booking/overbooking"
        );
        assert_eq!(
            Navigation::Landing(Landing::PrisonerProfile {
                prisoner_number: "A1234BC".to_string(),
                error: Some("missing-visitors"),
            })
            .url(&book),
            "/prisoner/A1234BC?error=missing-visitors"
        );
    }

    #[test]
    fn test_stages_never_decrease_along_the_journey() {
        let stages: Vec<u8> = Page::ALL.iter().map(|p| p.stage()).collect();
        assert!(stages.windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(Page::Confirmation.stage(), 6);
    }
}

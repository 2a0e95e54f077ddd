use chrono::{Datelike, NaiveDate, NaiveDateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::visit::{SessionConflict, VisitRestriction, VisitSlot};

/// A visit session as listed by the reservation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitSession {
    pub session_template_reference: String,
    pub visit_room: String,
    pub start_timestamp: NaiveDateTime,
    pub end_timestamp: NaiveDateTime,
    pub open_visit_capacity: u32,
    pub open_visit_booked_count: u32,
    pub closed_visit_capacity: u32,
    pub closed_visit_booked_count: u32,
    #[serde(default)]
    pub session_conflicts: Vec<SessionConflict>,
}

/// Current counts for a single session, used for the late overbooking re-check.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SessionCapacity {
    pub open_capacity: u32,
    pub closed_capacity: u32,
    pub open_booked_count: u32,
    pub closed_booked_count: u32,
}

impl SessionCapacity {
    /// `(capacity, booked)` for the given visit type.
    pub fn for_restriction(&self, restriction: VisitRestriction) -> (u32, u32) {
        match restriction {
            VisitRestriction::Open => (self.open_capacity, self.open_booked_count),
            VisitRestriction::Closed => (self.closed_capacity, self.closed_booked_count),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TimeOfDay {
    Morning,
    Afternoon,
}

/// Filters the slot list was generated with, kept so a redisplay after a
/// validation error shows the identical list.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotFilters {
    pub time_of_day: Option<TimeOfDay>,
    pub day_of_week: Option<Weekday>,
}

impl SlotFilters {
    fn accepts(&self, slot: &VisitSlot) -> bool {
        let time_ok = match self.time_of_day {
            Some(TimeOfDay::Morning) => slot.is_morning(),
            Some(TimeOfDay::Afternoon) => !slot.is_morning(),
            None => true,
        };
        let day_ok = self
            .day_of_week
            .map_or(true, |day| slot.start_timestamp.weekday() == day);
        time_ok && day_ok
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotDay {
    pub date: NaiveDate,
    pub morning: Vec<VisitSlot>,
    pub afternoon: Vec<VisitSlot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotMonth {
    /// e.g. "February 2026"
    pub month: String,
    pub days: Vec<SlotDay>,
}

/// Slots offered on the date and time page, grouped by month and day.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlotList {
    pub months: Vec<SlotMonth>,
}

impl SlotList {
    pub fn slots(&self) -> impl Iterator<Item = &VisitSlot> {
        self.months
            .iter()
            .flat_map(|m| m.days.iter())
            .flat_map(|d| d.morning.iter().chain(d.afternoon.iter()))
    }

    fn slots_mut(&mut self) -> impl Iterator<Item = &mut VisitSlot> {
        self.months
            .iter_mut()
            .flat_map(|m| m.days.iter_mut())
            .flat_map(|d| d.morning.iter_mut().chain(d.afternoon.iter_mut()))
    }

    pub fn is_empty(&self) -> bool {
        self.slots().next().is_none()
    }

    pub fn len(&self) -> usize {
        self.slots().count()
    }
}

/// Builds the slot list for a visit type. Ids are assigned `"1"`, `"2"`, ...
/// in chronological order after filtering.
pub fn build_slot_list(
    sessions: &[VisitSession],
    prison_id: &str,
    restriction: VisitRestriction,
    filters: &SlotFilters,
) -> SlotList {
    let mut ordered: Vec<&VisitSession> = sessions.iter().collect();
    ordered.sort_by_key(|s| s.start_timestamp);

    let mut list = SlotList::default();
    let mut next_id = 1;

    for session in ordered {
        let (capacity, booked_count) = match restriction {
            VisitRestriction::Open => {
                (session.open_visit_capacity, session.open_visit_booked_count)
            }
            VisitRestriction::Closed => {
                (session.closed_visit_capacity, session.closed_visit_booked_count)
            }
        };
        if capacity == 0 {
            continue;
        }

        let mut slot = VisitSlot {
            id: String::new(),
            session_template_reference: session.session_template_reference.clone(),
            prison_id: prison_id.to_string(),
            start_timestamp: session.start_timestamp,
            end_timestamp: session.end_timestamp,
            capacity,
            booked_count,
            visit_room: session.visit_room.clone(),
            visit_restriction: restriction,
            session_conflicts: session.session_conflicts.clone(),
        };
        if !filters.accepts(&slot) {
            continue;
        }
        slot.id = next_id.to_string();
        next_id += 1;

        insert_slot(&mut list, slot);
    }

    list
}

fn insert_slot(list: &mut SlotList, slot: VisitSlot) {
    let date = slot.start_timestamp.date();
    let month_label = date.format("%B %Y").to_string();

    if list.months.last().map(|m| &m.month) != Some(&month_label) {
        list.months.push(SlotMonth {
            month: month_label,
            days: Vec::new(),
        });
    }
    let Some(month) = list.months.last_mut() else {
        return;
    };

    if month.days.last().map(|d| d.date) != Some(date) {
        month.days.push(SlotDay {
            date,
            morning: Vec::new(),
            afternoon: Vec::new(),
        });
    }
    let Some(day) = month.days.last_mut() else {
        return;
    };

    if slot.is_morning() {
        day.morning.push(slot);
    } else {
        day.afternoon.push(slot);
    }
}

/// Resolves a submitted slot id back to its full record.
pub fn get_selected_slot(list: &SlotList, id: &str) -> Option<VisitSlot> {
    list.slots().find(|slot| slot.id == id).cloned()
}

/// Finds the slot in `list` for the same remote session as `target`.
pub fn find_matching_slot<'a>(list: &'a SlotList, target: &VisitSlot) -> Option<&'a VisitSlot> {
    list.slots().find(|slot| slot.same_session(target))
}

/// When editing a booking, the booking itself occupies one place in its
/// original session. If the visit type is unchanged, free that place in the
/// listed counts; if it changed, the original count does not apply to the
/// new session type and nothing is adjusted.
///
/// Returns whether an adjustment was made.
pub fn adjust_for_original_slot(
    list: &mut SlotList,
    original: &VisitSlot,
    restriction: VisitRestriction,
) -> bool {
    if original.visit_restriction != restriction {
        return false;
    }
    match list.slots_mut().find(|slot| slot.same_session(original)) {
        Some(slot) => {
            slot.booked_count = slot.booked_count.saturating_sub(1);
            true
        }
        None => false,
    }
}

/// Message shown when an update changes the visit type.
pub fn restriction_change_message(
    original: Option<&VisitSlot>,
    current: VisitRestriction,
) -> Option<String> {
    let original = original?;
    if original.visit_restriction == current {
        return None;
    }
    Some(format!(
        "The visit type has changed from {} to {}.",
        original.visit_restriction.label(),
        current.label()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(
        reference: &str,
        day: u32,
        hour: u32,
        open: (u32, u32),
        closed: (u32, u32),
    ) -> VisitSession {
        let date = NaiveDate::from_ymd_opt(2026, 2, day).unwrap();
        VisitSession {
            session_template_reference: reference.to_string(),
            visit_room: "Visit room 1".to_string(),
            start_timestamp: date.and_hms_opt(hour, 0, 0).unwrap(),
            end_timestamp: date.and_hms_opt(hour + 1, 0, 0).unwrap(),
            open_visit_capacity: open.0,
            open_visit_booked_count: open.1,
            closed_visit_capacity: closed.0,
            closed_visit_booked_count: closed.1,
            session_conflicts: vec![],
        }
    }

    fn sessions() -> Vec<VisitSession> {
        vec![
            // 2026-02-16 is a Monday
            session("ref-c", 17, 14, (10, 0), (2, 0)),
            session("ref-a", 16, 10, (10, 9), (2, 2)),
            session("ref-b", 16, 14, (10, 3), (0, 0)),
        ]
    }

    #[test]
    fn test_build_slot_list_orders_and_groups() {
        let list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Open, &SlotFilters::default());

        assert_eq!(list.months.len(), 1);
        assert_eq!(list.months[0].month, "February 2026");
        assert_eq!(list.months[0].days.len(), 2);

        let first_day = &list.months[0].days[0];
        assert_eq!(first_day.morning.len(), 1);
        assert_eq!(first_day.afternoon.len(), 1);
        assert_eq!(first_day.morning[0].id, "1");
        assert_eq!(first_day.morning[0].session_template_reference, "ref-a");
        assert_eq!(first_day.afternoon[0].id, "2");
        assert_eq!(list.months[0].days[1].afternoon[0].id, "3");
    }

    #[test]
    fn test_closed_list_skips_sessions_without_closed_capacity() {
        let list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Closed, &SlotFilters::default());
        assert_eq!(list.len(), 2);
        let full = get_selected_slot(&list, "1").unwrap();
        assert_eq!(full.capacity, 2);
        assert_eq!(full.booked_count, 2);
        assert!(full.is_full());
    }

    #[test]
    fn test_filters_apply_before_ids() {
        let filters = SlotFilters {
            time_of_day: Some(TimeOfDay::Afternoon),
            day_of_week: Some(Weekday::Tue),
        };
        let list = build_slot_list(&sessions(), "HEI", VisitRestriction::Open, &filters);
        assert_eq!(list.len(), 1);
        let only = get_selected_slot(&list, "1").unwrap();
        assert_eq!(only.session_template_reference, "ref-c");
    }

    #[test]
    fn test_get_selected_slot_unknown_id() {
        let list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Open, &SlotFilters::default());
        assert!(get_selected_slot(&list, "99").is_none());
        assert!(get_selected_slot(&SlotList::default(), "1").is_none());
    }

    #[test]
    fn test_original_slot_adjusted_when_restriction_unchanged() {
        let mut list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Open, &SlotFilters::default());
        let mut original = get_selected_slot(&list, "1").unwrap();
        original.id = String::new();

        assert!(adjust_for_original_slot(&mut list, &original, VisitRestriction::Open));
        let adjusted = find_matching_slot(&list, &original).unwrap();
        assert_eq!(adjusted.booked_count, 8);
        assert_eq!(restriction_change_message(Some(&original), VisitRestriction::Open), None);
    }

    #[test]
    fn test_original_slot_not_reused_when_restriction_changes() {
        let open_list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Open, &SlotFilters::default());
        let original = get_selected_slot(&open_list, "1").unwrap();

        let mut closed_list =
            build_slot_list(&sessions(), "HEI", VisitRestriction::Closed, &SlotFilters::default());
        assert!(!adjust_for_original_slot(&mut closed_list, &original, VisitRestriction::Closed));

        let same_session = find_matching_slot(&closed_list, &original).unwrap();
        assert_eq!(same_session.booked_count, 2);
        assert_eq!(
            restriction_change_message(Some(&original), VisitRestriction::Closed).as_deref(),
            Some("The visit type has changed from open to closed.")
        );
    }

    #[test]
    fn test_session_capacity_for_restriction() {
        let capacity = SessionCapacity {
            open_capacity: 20,
            closed_capacity: 2,
            open_booked_count: 4,
            closed_booked_count: 2,
        };
        assert_eq!(capacity.for_restriction(VisitRestriction::Open), (20, 4));
        assert_eq!(capacity.for_restriction(VisitRestriction::Closed), (2, 2));
    }
}

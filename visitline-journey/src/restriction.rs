use visitline_core::{ClosedVisitReason, PrisonerIdentity, SelectedVisitor, VisitRestriction};

/// Outcome of deriving the visit type from the people involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestrictionDecision {
    Decided {
        restriction: VisitRestriction,
        reason: Option<ClosedVisitReason>,
    },
    /// The prisoner has a closed restriction but no visitor does: a member of
    /// staff must choose the visit type.
    NeedsVisitType,
}

pub fn derive_restriction(
    visitors: &[SelectedVisitor],
    prisoner: &PrisonerIdentity,
) -> RestrictionDecision {
    if visitors.iter().any(SelectedVisitor::has_closed_restriction) {
        return RestrictionDecision::Decided {
            restriction: VisitRestriction::Closed,
            reason: Some(ClosedVisitReason::Visitor),
        };
    }

    if prisoner.has_closed_restriction() {
        return RestrictionDecision::NeedsVisitType;
    }

    RestrictionDecision::Decided {
        restriction: VisitRestriction::Open,
        reason: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{prisoner_identity, selected_visitor};
    use visitline_core::RestrictionFlag;

    fn closed() -> Vec<RestrictionFlag> {
        vec![RestrictionFlag::new("CLOSED", "Closed")]
    }

    #[test]
    fn test_closed_visitor_forces_closed() {
        let visitors = vec![selected_visitor(4321, vec![]), selected_visitor(4322, closed())];
        assert_eq!(
            derive_restriction(&visitors, &prisoner_identity(vec![])),
            RestrictionDecision::Decided {
                restriction: VisitRestriction::Closed,
                reason: Some(ClosedVisitReason::Visitor),
            }
        );
    }

    #[test]
    fn test_closed_prisoner_needs_explicit_decision() {
        let visitors = vec![selected_visitor(4321, vec![])];
        assert_eq!(
            derive_restriction(&visitors, &prisoner_identity(closed())),
            RestrictionDecision::NeedsVisitType
        );
    }

    #[test]
    fn test_closed_visitor_takes_precedence_over_closed_prisoner() {
        let visitors = vec![selected_visitor(4321, closed())];
        assert!(matches!(
            derive_restriction(&visitors, &prisoner_identity(closed())),
            RestrictionDecision::Decided { restriction: VisitRestriction::Closed, .. }
        ));
    }

    #[test]
    fn test_no_closed_restrictions_is_open() {
        let visitors =
            vec![selected_visitor(4321, vec![RestrictionFlag::new("PREINF", "Previous info")])];
        assert_eq!(
            derive_restriction(&visitors, &prisoner_identity(vec![])),
            RestrictionDecision::Decided {
                restriction: VisitRestriction::Open,
                reason: None,
            }
        );
    }
}

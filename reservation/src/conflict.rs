use abi::{
    AvailabilityWindow, DateInterval, Reservation, ReservationConflict, ReservationConflictInfo,
    ReservationWindow,
};
use chrono::NaiveDate;

use crate::AvailabilityIndex;

/// Stays of one product that still hold their dates (pending or confirmed).
#[derive(Debug, Clone, Default)]
pub struct ConflictDetector {
    active: Vec<ReservationWindow>,
}

impl ConflictDetector {
    pub fn new(pid: &str, existing: &[Reservation]) -> Result<Self, abi::Error> {
        let active = existing
            .iter()
            .filter(|r| r.product_id == pid && r.is_active())
            .map(|r| r.window())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { active })
    }

    pub fn has_conflict(&self, proposed: &ReservationWindow) -> bool {
        self.active.iter().any(|w| w.conflicts_with(proposed))
    }

    pub fn conflicts(&self, proposed: &ReservationWindow) -> Vec<ReservationWindow> {
        self.active
            .iter()
            .filter(|w| w.conflicts_with(proposed))
            .cloned()
            .collect()
    }

    /// Occupied nights inside `window`, sorted by start.
    pub fn blocked_ranges(&self, window: &DateInterval) -> Vec<DateInterval> {
        let mut blocked: Vec<_> = self
            .active
            .iter()
            .filter_map(|w| w.nights().intersection(window))
            .collect();
        blocked.sort();
        blocked
    }

    /// Days of `window` no active stay occupies.
    pub fn free_ranges(&self, window: &DateInterval) -> Vec<DateInterval> {
        let mut free = Vec::new();
        // first day of the window not yet accounted for
        let mut next = Some(window.start());
        for blocked in self.blocked_ranges(window) {
            let Some(from) = next else { break };
            if blocked.start() > from {
                free.extend(
                    blocked
                        .start()
                        .pred_opt()
                        .and_then(|last| interval(from, last)),
                );
            }
            next = blocked.end().succ_opt().map(|day| day.max(from));
        }
        if let Some(from) = next {
            free.extend(interval(from, window.end()));
        }
        free
    }
}

fn interval(start: NaiveDate, end: NaiveDate) -> Option<DateInterval> {
    DateInterval::new(start, end).ok()
}

/// The full pre-insert check for a stay: it must fall inside one bookable
/// window, then it must not overlap any active reservation of the product.
pub fn check_reservable(
    windows: &[AvailabilityWindow],
    existing: &[Reservation],
    proposed: &ReservationWindow,
) -> Result<(), abi::Error> {
    let index = AvailabilityIndex::new(windows)?;
    if !index.covers(proposed) {
        return Err(abi::Error::OutsideAvailability(proposed.clone()));
    }

    let old = ConflictDetector::new(proposed.rid(), existing)?.conflicts(proposed);
    if !old.is_empty() {
        return Err(abi::Error::ConflictReservation(
            ReservationConflictInfo::Parsed(ReservationConflict {
                new: proposed.clone(),
                old,
            }),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::{parse_date, ReservationStatus};

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    fn stay(start: &str, end: &str) -> ReservationWindow {
        ReservationWindow::new("cabin-7", date(start), date(end)).unwrap()
    }

    fn rsvp(start: &str, end: &str, status: ReservationStatus) -> Reservation {
        let mut rsvp = Reservation::new_pending("alice", "cabin-7", date(start), date(end), "");
        rsvp.status = status as i32;
        rsvp
    }

    fn june() -> Vec<AvailabilityWindow> {
        vec![AvailabilityWindow::new_available(
            "cabin-7",
            date("2025-06-01"),
            date("2025-06-10"),
        )]
    }

    fn range(start: &str, end: &str) -> DateInterval {
        DateInterval::parse(start, end).unwrap()
    }

    #[test]
    fn overlapping_stay_should_conflict() {
        let existing = [rsvp("2025-06-02", "2025-06-05", ReservationStatus::Confirmed)];
        let detector = ConflictDetector::new("cabin-7", &existing).unwrap();
        assert!(detector.has_conflict(&stay("2025-06-04", "2025-06-08")));
        assert_eq!(
            detector.conflicts(&stay("2025-06-04", "2025-06-08")),
            vec![stay("2025-06-02", "2025-06-05")]
        );
    }

    #[test]
    fn touching_stays_should_not_conflict() {
        let existing = [rsvp("2025-06-02", "2025-06-05", ReservationStatus::Confirmed)];
        let detector = ConflictDetector::new("cabin-7", &existing).unwrap();
        assert!(!detector.has_conflict(&stay("2025-06-05", "2025-06-08")));
        assert!(!detector.has_conflict(&stay("2025-06-01", "2025-06-02")));
    }

    #[test]
    fn cancelled_and_foreign_stays_should_never_block() {
        let mut other_product = rsvp("2025-06-02", "2025-06-05", ReservationStatus::Pending);
        other_product.product_id = "loft-2".into();
        let existing = [
            rsvp("2025-06-02", "2025-06-05", ReservationStatus::Cancelled),
            other_product,
        ];
        let detector = ConflictDetector::new("cabin-7", &existing).unwrap();
        assert!(!detector.has_conflict(&stay("2025-06-02", "2025-06-05")));
    }

    #[test]
    fn check_should_report_availability_before_conflicts() {
        let existing = [rsvp("2025-06-08", "2025-06-10", ReservationStatus::Pending)];
        let proposed = stay("2025-06-08", "2025-06-12");
        assert_eq!(
            check_reservable(&june(), &existing, &proposed).unwrap_err(),
            abi::Error::OutsideAvailability(proposed)
        );
    }

    #[test]
    fn check_should_report_every_conflicting_range() {
        let existing = [
            rsvp("2025-06-02", "2025-06-04", ReservationStatus::Pending),
            rsvp("2025-06-05", "2025-06-07", ReservationStatus::Confirmed),
        ];
        let proposed = stay("2025-06-01", "2025-06-09");
        let err = check_reservable(&june(), &existing, &proposed).unwrap_err();
        assert_eq!(
            err,
            abi::Error::ConflictReservation(ReservationConflictInfo::Parsed(ReservationConflict {
                new: proposed,
                old: vec![stay("2025-06-02", "2025-06-04"), stay("2025-06-05", "2025-06-07")],
            }))
        );
    }

    #[test]
    fn check_should_pass_inside_window_without_conflicts() {
        assert!(check_reservable(&june(), &[], &stay("2025-06-02", "2025-06-05")).is_ok());
        assert!(check_reservable(&[], &[], &stay("2025-06-02", "2025-06-05")).is_err());
    }

    #[test]
    fn blocked_and_free_ranges_should_partition_window() {
        let existing = [
            rsvp("2025-06-05", "2025-06-07", ReservationStatus::Confirmed),
            rsvp("2025-06-02", "2025-06-04", ReservationStatus::Pending),
            rsvp("2025-05-28", "2025-06-02", ReservationStatus::Pending),
            rsvp("2025-06-07", "2025-06-09", ReservationStatus::Cancelled),
        ];
        let detector = ConflictDetector::new("cabin-7", &existing).unwrap();
        let window = range("2025-06-01", "2025-06-10");
        assert_eq!(
            detector.blocked_ranges(&window),
            vec![
                range("2025-06-01", "2025-06-01"),
                range("2025-06-02", "2025-06-03"),
                range("2025-06-05", "2025-06-06"),
            ]
        );
        assert_eq!(
            detector.free_ranges(&window),
            vec![range("2025-06-04", "2025-06-04"), range("2025-06-07", "2025-06-10")]
        );
    }

    #[test]
    fn fully_booked_window_should_have_no_free_range() {
        let existing = [rsvp("2025-06-01", "2025-06-11", ReservationStatus::Pending)];
        let detector = ConflictDetector::new("cabin-7", &existing).unwrap();
        assert!(detector
            .free_ranges(&range("2025-06-01", "2025-06-10"))
            .is_empty());
        assert_eq!(
            ConflictDetector::default().free_ranges(&range("2025-06-01", "2025-06-10")),
            vec![range("2025-06-01", "2025-06-10")]
        );
    }
}

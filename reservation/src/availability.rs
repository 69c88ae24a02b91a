use abi::{AvailabilityWindow, DateInterval, ReservationWindow};

/// Bookable windows of a product, kept exactly as authored: windows that are
/// not `AVAILABLE` are dropped, the rest keep their order and are neither
/// merged nor split, even when they overlap.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityIndex {
    windows: Vec<DateInterval>,
}

impl AvailabilityIndex {
    pub fn new(windows: &[AvailabilityWindow]) -> Result<Self, abi::Error> {
        let windows = windows
            .iter()
            .filter(|w| w.is_available())
            .map(|w| w.interval())
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { windows })
    }

    pub fn bookable_windows(&self) -> &[DateInterval] {
        &self.windows
    }

    /// A stay fits when one window holds both check-in and checkout.
    pub fn covers(&self, stay: &ReservationWindow) -> bool {
        let days = stay.days();
        self.windows.iter().any(|w| w.covers(&days))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use abi::{parse_date, WindowStatus};

    fn window(start: &str, end: &str, status: WindowStatus) -> AvailabilityWindow {
        AvailabilityWindow::new(
            "cabin-7",
            parse_date(start).unwrap(),
            parse_date(end).unwrap(),
            status,
        )
    }

    fn stay(start: &str, end: &str) -> ReservationWindow {
        ReservationWindow::new("cabin-7", parse_date(start).unwrap(), parse_date(end).unwrap())
            .unwrap()
    }

    #[test]
    fn index_should_keep_only_available_windows_in_order() {
        let index = AvailabilityIndex::new(&[
            window("2025-07-01", "2025-07-10", WindowStatus::Available),
            window("2025-06-01", "2025-06-10", WindowStatus::Unavailable),
            window("2025-06-01", "2025-06-10", WindowStatus::Available),
            window("2025-08-01", "2025-08-10", WindowStatus::Unknown),
        ])
        .unwrap();
        assert_eq!(
            index.bookable_windows(),
            &[
                DateInterval::parse("2025-07-01", "2025-07-10").unwrap(),
                DateInterval::parse("2025-06-01", "2025-06-10").unwrap(),
            ]
        );
    }

    #[test]
    fn overlapping_windows_should_pass_through() {
        let index = AvailabilityIndex::new(&[
            window("2025-06-01", "2025-06-10", WindowStatus::Available),
            window("2025-06-05", "2025-06-15", WindowStatus::Available),
        ])
        .unwrap();
        assert_eq!(index.bookable_windows().len(), 2);
        // a stay spanning both windows is not covered by either one
        assert!(!index.covers(&stay("2025-06-03", "2025-06-12")));
        assert!(index.covers(&stay("2025-06-06", "2025-06-12")));
    }

    #[test]
    fn covers_should_allow_checkout_on_last_day() {
        let index = AvailabilityIndex::new(&[window(
            "2025-06-01",
            "2025-06-10",
            WindowStatus::Available,
        )])
        .unwrap();
        assert!(index.covers(&stay("2025-06-01", "2025-06-10")));
        assert!(index.covers(&stay("2025-06-02", "2025-06-05")));
        assert!(!index.covers(&stay("2025-06-08", "2025-06-11")));
        assert!(!index.covers(&stay("2025-05-31", "2025-06-02")));
    }

    #[test]
    fn unavailable_windows_should_not_cover() {
        let index = AvailabilityIndex::new(&[window(
            "2025-06-01",
            "2025-06-10",
            WindowStatus::Unavailable,
        )])
        .unwrap();
        assert!(!index.covers(&stay("2025-06-02", "2025-06-05")));
    }

    #[test]
    fn malformed_window_should_fail() {
        let mut bad = window("2025-06-01", "2025-06-10", WindowStatus::Available);
        bad.end = "2025-13-01".into();
        assert!(matches!(
            AvailabilityIndex::new(&[bad]),
            Err(abi::Error::InvalidRange(_))
        ));
    }
}

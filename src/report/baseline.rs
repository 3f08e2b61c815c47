// Baseline ("initial reading") selection for a printer's window delta.

use crate::models::CounterReading;

/// Which rule produced the baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaselineRule {
    /// Latest reading in `[since - 1 day, since)`.
    PreviousDay,
    /// Latest reading anywhere before `since`.
    EarlierHistory,
    /// No prior reading: the first in-window reading stands in.
    FirstInWindow,
}

/// Picks the baseline reading for one printer. `first_in_window` is always
/// available: printers without an in-window reading never reach here.
pub fn resolve<'a>(
    previous_day: Option<&'a CounterReading>,
    earlier: Option<&'a CounterReading>,
    first_in_window: &'a CounterReading,
) -> (&'a CounterReading, BaselineRule) {
    if let Some(r) = previous_day {
        (r, BaselineRule::PreviousDay)
    } else if let Some(r) = earlier {
        (r, BaselineRule::EarlierHistory)
    } else {
        (first_in_window, BaselineRule::FirstInWindow)
    }
}

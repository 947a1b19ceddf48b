//! Confidence aggregation across detectors

use cca_model::Confidence;

/// Majority rule over per-detector confidences
///
/// - two or more `high` → `high`
/// - two or more `medium` → `medium` (this covers one `high` with two
///   `medium`)
/// - otherwise `low`
///
/// Cheap detectors never report `high` today, so in practice the result is
/// at most `medium`; `high` stays reserved for manual verification.
#[must_use]
pub fn aggregate_confidence(levels: &[Confidence]) -> Confidence {
    let high = levels.iter().filter(|c| **c == Confidence::High).count();
    let medium = levels.iter().filter(|c| **c == Confidence::Medium).count();

    if high >= 2 {
        Confidence::High
    } else if medium >= 2 {
        Confidence::Medium
    } else {
        Confidence::Low
    }
}

//! Delivery lead time: seconds spent in delivery statuses, reported only
//! for issues whose type and resolution are on the configured allow-lists.

use crate::config::DeliveryLeadTime;
use crate::dwell::StatusDwell;

/// Delivery lead time for a terminal snapshot.
///
/// Zero unless `issue_type` is in `config.types` and `resolution` is in
/// `config.resolutions`; otherwise the dwell total over `config.statuses`.
#[must_use]
pub fn delivery_lead_time(
    dwell: &StatusDwell,
    issue_type: &str,
    resolution: &str,
    config: &DeliveryLeadTime,
) -> i64 {
    if !config.types.contains(issue_type) || !config.resolutions.contains(resolution) {
        return 0;
    }
    dwell.sum_of(&config.statuses)
}

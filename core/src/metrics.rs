//! Admission metrics.
//!
//! Recorded through the `metrics` facade; the server installs the Prometheus
//! exporter. Without an installed recorder every call is a no-op.

use crate::error::ErrorKind;
use metrics::{counter, describe_counter, describe_histogram, histogram};
use std::time::Duration;

/// Tickets admitted.
pub const TICKETS_ADMITTED: &str = "helpdesk_tickets_admitted_total";
/// Admissions rejected, labelled by error kind.
pub const ADMISSIONS_REJECTED: &str = "helpdesk_admissions_rejected_total";
/// Desk slots given back by ticket edits.
pub const DESK_RELEASES: &str = "helpdesk_desk_releases_total";
/// Admission latency.
pub const ADMISSION_DURATION: &str = "helpdesk_admission_duration_seconds";

/// Register all metric descriptions.
pub fn register_metrics() {
    describe_counter!(TICKETS_ADMITTED, "Total number of tickets admitted to a desk");
    describe_counter!(
        ADMISSIONS_REJECTED,
        "Total number of ticket admissions rejected, by error kind"
    );
    describe_counter!(DESK_RELEASES, "Total number of desk slots released");
    describe_histogram!(ADMISSION_DURATION, "Time taken to decide a ticket admission");
}

/// Admission metrics recorder.
pub struct AdmissionMetrics;

impl AdmissionMetrics {
    /// Record a successful admission.
    pub fn record_admitted(duration: Duration) {
        counter!(TICKETS_ADMITTED).increment(1);
        histogram!(ADMISSION_DURATION).record(duration.as_secs_f64());
    }

    /// Record a rejected admission.
    pub fn record_rejected(kind: ErrorKind, duration: Duration) {
        counter!(ADMISSIONS_REJECTED, "kind" => kind.as_str()).increment(1);
        histogram!(ADMISSION_DURATION).record(duration.as_secs_f64());
    }

    /// Record a desk slot release.
    pub fn record_release() {
        counter!(DESK_RELEASES).increment(1);
    }
}

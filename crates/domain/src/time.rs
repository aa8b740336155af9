//! Time and timestamp helpers.

use chrono::{DateTime, Utc};

/// UTC timestamp used for event times and task visibility.
pub type Timestamp = DateTime<Utc>;

/// Return the current UTC time.
#[must_use]
pub fn now() -> Timestamp {
    Utc::now()
}

/// Return the current Unix time in seconds as a float.
///
/// This is the value exposed to template arithmetic as `now()` and the
/// representation used by `*_ts` record fields.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn unix_now() -> f64 {
    let ts = Utc::now();
    ts.timestamp() as f64 + f64::from(ts.timestamp_subsec_millis()) / 1000.0
}

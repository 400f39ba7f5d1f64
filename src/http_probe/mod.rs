pub mod deadline;
pub mod probe;
pub mod result;

use std::fmt::Write;

/// Flatten an error and its `source()` chain into a single log line.
pub fn report(mut err: &(dyn std::error::Error + 'static)) -> String {
    let mut s = format!("{}", err);
    while let Some(src) = err.source() {
        let _ = write!(s, ": caused by: {}", src);
        err = src;
    }
    s
}

pub mod prelude {
    pub use super::probe::{Prober, RedirectBlocked};
    pub use super::result::{FailureReason, ProbeOutcome, ProbeResult};
}

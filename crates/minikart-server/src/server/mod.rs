pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;
pub mod telemetry;

use minikart::{TimeSource, WallClock};

/// Current wall-clock time in Unix millis.
pub(crate) fn now_millis() -> u64 {
    WallClock.current_millis()
}

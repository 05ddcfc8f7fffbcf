// Logging and metrics setup

pub mod logging;
pub mod metrics;

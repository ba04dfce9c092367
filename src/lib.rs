// clippy lint unwrap
#![warn(clippy::unwrap_used)]
#![warn(clippy::pedantic)]
// ban unsafe
#![forbid(unsafe_code)]

pub mod buckets;
pub mod cli;
pub mod client;
pub mod configuration;
pub mod datasource;
pub mod error;
pub mod frame;
pub mod model;
pub mod telemetry;
pub mod tests;

#![forbid(unsafe_code)]

pub mod config;
pub mod datamodel;
pub mod http;
pub mod nut;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

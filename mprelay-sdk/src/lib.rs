//! Shared wire objects for the payment relay, plus HTTP clients for the
//! upstream payment-search API and the downstream collectors.

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![forbid(unsafe_code)]

#[cfg(feature = "client")]
pub mod client;
pub mod objects;

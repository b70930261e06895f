//! Configuration types for the relay.
//!
//! These types represent the validated runtime configuration. Reading the
//! environment and the optional TOML file is handled by the server crate.

mod account;
mod settings;

pub use account::{AccountConfig, Credential};
pub use settings::{RelaySettings, SeenCacheStrategy, WatermarkMode};

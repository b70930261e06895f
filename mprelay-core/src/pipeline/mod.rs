//! Pure per-cycle pipeline stages.
//!
//! - `filter`: decides whether a raw transaction is forwarded
//! - `normalizer`: maps a raw transaction into a [`NormalizedRecord`]
//! - `router`: groups accepted records by destination
//!
//! [`NormalizedRecord`]: mprelay_sdk::objects::NormalizedRecord

pub mod filter;
pub mod normalizer;
pub mod router;

pub use filter::{Accepted, Rejection, RejectionCounts, accept};
pub use normalizer::normalize;
pub use router::{RoutedBatches, route};

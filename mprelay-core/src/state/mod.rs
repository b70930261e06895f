//! Process-scoped relay state.
//!
//! Both pieces live in memory only and start over on every restart.

pub mod seen_cache;
pub mod watermark;

pub use seen_cache::SeenCache;
pub use watermark::Watermark;

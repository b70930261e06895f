pub mod record;
pub mod transaction;

pub use record::NormalizedRecord;
pub use transaction::RawTransaction;

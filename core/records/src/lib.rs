//! FILENAME: core/records/src/lib.rs
//! PURPOSE: Shared record types for the studio metrics engine.
//! CONTEXT: Everything upstream of aggregation lives here: the normalized
//! `Record` shape, categorical dimensions with their fallback labels, the
//! date normalizer and the per-domain field mapping used at ingestion.

pub mod date;
pub mod error;
pub mod mapping;
pub mod record;

// Re-export commonly used types at the crate root
pub use date::{month_key, normalize_date};
pub use error::RecordsError;
pub use mapping::FieldMapping;
pub use record::{Dimension, Record};

pub mod cache;
pub mod dns;
pub mod email;
pub mod engine;
pub mod pipeline;
pub mod registry;
pub mod segment;

pub use crate::domain::model::{EnrichedBatch, ProspectRecord, RecordBatch};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

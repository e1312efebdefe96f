pub mod aggregate;
pub mod dashboard;
pub mod engine;
pub mod export;
pub mod normalize;

pub use crate::domain::model::{ProtocolRecord, Record};
pub use crate::domain::ports::{ConfigProvider, Pipeline, RecordSource, Storage};
pub use crate::utils::error::Result;

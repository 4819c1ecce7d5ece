pub mod error;
pub mod money;
pub mod output;
pub mod pipeline;
pub mod plans;
pub mod resolve;
pub mod table;
pub mod targets;
pub mod zips;

pub use error::{ErrorKind, Result, SlcspError};
pub use pipeline::{run, PipelineConfig, RunSummary};

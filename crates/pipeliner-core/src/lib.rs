pub mod config;
pub mod data;
pub mod error;
pub mod paths;
pub mod pipelines;
pub mod processor;
pub mod reader;
pub mod writer;

pub use config::PipelineConfig;
pub use data::Data;
pub use error::{PipelineError, Result};
pub use paths::Paths;
pub use pipelines::{PipelineKind, PipelineSummary};
pub use processor::Processor;
pub use reader::Reader;
pub use writer::Writer;

pub mod archive;
pub mod catalog;
pub mod cli;
pub mod error;
pub mod export;
pub mod models;
pub mod processors;
pub mod readers;
pub mod settings;
pub mod utils;
pub mod writers;

pub use error::{ExportError, Result};
pub use export::{ExportPipeline, ExportResponse, ExportSummary};
pub use settings::ExportSettings;

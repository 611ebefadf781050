pub mod pipeline;
pub mod resolver;
pub mod response;
pub mod selector;

pub use pipeline::{ExportPipeline, ExportSummary};
pub use resolver::ParameterResolver;
pub use response::ExportResponse;
pub use selector::FileSelector;

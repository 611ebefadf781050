pub mod builder;
pub mod materializer;
pub mod temp_manager;

pub use builder::{ArchiveBuilder, TarGzBuilder};
pub use materializer::{StagingMaterializer, StagingReport};
pub use temp_manager::WorkingDirectory;

pub mod cancel;
pub mod clock;
pub mod constants;
pub mod coordinates;
pub mod filename;
pub mod progress;

pub use cancel::CancellationToken;
pub use clock::Clock;
pub use constants::*;
pub use coordinates::parse_bound;
pub use filename::{archive_filename, generate_workdir_name, is_safe_site_name};
pub use progress::ProgressReporter;

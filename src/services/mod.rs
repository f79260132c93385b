pub mod droid;
pub mod extractor;
pub mod paginator;
pub mod run_log;
pub mod sheet;

pub use droid::*;
pub use extractor::*;
pub use paginator::*;
pub use run_log::*;
pub use sheet::*;

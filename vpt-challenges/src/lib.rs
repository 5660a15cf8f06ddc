mod error;
pub use error::*;
pub mod viewpoint_coverage;

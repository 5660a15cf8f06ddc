mod coverage;
pub use coverage::*;
mod deadline;
pub use deadline::*;
pub mod greedy_insertion;
pub use greedy_insertion::{solve_challenge, BuildOutcome, Termination};

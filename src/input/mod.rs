//! Plan input.

mod plan_file;

pub use plan_file::PlanFile;

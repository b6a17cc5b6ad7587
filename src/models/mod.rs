pub mod common;
pub mod pagination;
pub mod participant;
pub mod prize;
pub mod stats;

pub use common::*;
pub use pagination::*;
pub use participant::*;
pub use prize::*;
pub use stats::*;

pub mod consensus;
pub mod tracker;

pub use consensus::*;
pub use tracker::*;

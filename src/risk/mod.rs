pub mod guardian;
pub mod ranking;
pub mod staking;

pub use guardian::*;
pub use ranking::*;
pub use staking::*;

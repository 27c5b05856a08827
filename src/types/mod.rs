pub mod card;
pub mod history;
pub mod outcome;

pub use card::*;
pub use history::*;
pub use outcome::*;

pub mod controller;
pub mod results;
pub mod session;
pub mod shoe;

pub use controller::*;
pub use results::*;
pub use session::*;
pub use shoe::*;

pub mod booking;
pub mod conflict;
pub mod store;

pub use booking::*;
pub use conflict::*;
pub use store::*;

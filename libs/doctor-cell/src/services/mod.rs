pub mod availability;
pub mod directory;
pub mod slots;

pub use availability::*;
pub use directory::*;
pub use slots::*;

pub mod handler;
pub mod llm;
pub mod prompt;
pub mod session;
pub mod tools;

pub use handler::*;
pub use llm::*;
pub use prompt::*;
pub use session::*;
pub use tools::*;

pub mod library;
pub mod registry;
pub mod types;
pub mod validator;

pub use library::RECORD_TYPES;
pub use registry::Models;
pub use types::*;
pub use validator::validate;

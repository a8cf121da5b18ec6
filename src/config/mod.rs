pub mod app;
pub mod settings;
pub mod var;

pub use app::*;
pub use settings::Config;
pub use var::*;

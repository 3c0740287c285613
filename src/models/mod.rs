pub mod install;
pub mod settings;
pub mod status;

pub use install::*;
pub use settings::*;
pub use status::*;

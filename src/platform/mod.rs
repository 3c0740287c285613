pub mod dialogs;
pub mod reachability;

pub use dialogs::{AppleScriptDialogs, Dialogs};
pub use reachability::{Probe, Reachability};

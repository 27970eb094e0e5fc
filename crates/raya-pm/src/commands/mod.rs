//! Package manager commands
//!
//! Implements the core commands: init, install, add, remove.

pub mod add;
pub mod init;
pub mod install;

pub use add::{add_package, remove_package};
pub use init::init_project;
pub use install::install_dependencies;

// ABOUTME: Command module aggregator for the coreauto CLI.
// ABOUTME: Re-exports bootstrap, deploy, validate and status command handlers.

mod aws_connection;
mod bootstrap;
mod deploy;
mod status;
mod validate;

pub use bootstrap::bootstrap;
pub use deploy::{DeployArgs, deploy};
pub use status::status;
pub use validate::validate;

// ABOUTME: Library root for coreauto, the Core Automation bootstrap and stack deployer.
// ABOUTME: Exposes configuration, the provider seam, stack reconciliation and the wizard.

pub mod bootstrap;
pub mod config;
pub mod credentials;
pub mod diagnostics;
pub mod error;
pub mod output;
pub mod prompt;
pub mod provider;
pub mod stack;
pub mod types;

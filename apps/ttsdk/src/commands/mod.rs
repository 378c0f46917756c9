//! Subcommand implementations for the ttsdk CLI.
//!
//! - [`install`] - Install the SDK, replacing any previous installation
//! - [`ensure`] - Install only when the layout is incomplete
//! - [`versions`] - List catalog versions
//! - [`doctor`] - Check installation health
//! - [`version`] - Display version information

pub mod doctor;
pub mod ensure;
pub mod install;
pub mod version;
pub mod versions;

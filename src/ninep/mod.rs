//! plan9port-backed implementations.
//!
//! This module provides the concrete [`Transport`](crate::traits::Transport)
//! and the event relay, both powered by running plan9port's `9p` and
//! `acmeevent` programs.  Commands are spawned from argument vectors; no
//! shell ever re-parses a payload.
//!
//! Nothing outside this module should spawn plan9port tools directly.

pub mod relay;
pub mod transport;

use crate::error::AcmeError;
use crate::window::WindowId;
use std::process::Command;

/// Build a [`Command`] from a configured argument vector.
///
/// `what` names the tool in the error when the vector is empty.
pub(crate) fn command(argv: &[String], what: &'static str) -> Result<Command, AcmeError> {
    let (program, args) = argv.split_first().ok_or(AcmeError::EmptyCommand(what))?;
    let mut cmd = Command::new(program);
    cmd.args(args);
    Ok(cmd)
}

/// The 9P path of one window resource, e.g. `acme/3/ctl`.
pub(crate) fn resource_path(service: &str, window: &WindowId, resource: &str) -> String {
    format!("{}/{}/{}", service, window, resource)
}

//! Error taxonomy shared by the window handle and the event relay.

use std::process::ExitStatus;

/// Errors produced while talking to acme through the external tools.
#[derive(Debug, thiserror::Error)]
pub enum AcmeError {
    /// No window id was given and the context variable was unset or empty.
    #[error("unable to determine active window: ${0} is not set")]
    UnresolvedWindow(String),

    /// The window id cannot be spliced into a resource path.
    #[error("invalid window id: {0:?}")]
    InvalidWindowId(String),

    /// A configured command line has no program.
    #[error("empty command line for {0}")]
    EmptyCommand(&'static str),

    /// The external program could not be started.
    #[error("failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The external program ran but reported failure.
    #[error("{program} on {path} exited with {status}: {stderr}")]
    Exit {
        program: String,
        path: String,
        status: ExitStatus,
        stderr: String,
    },

    /// A resource's contents were not valid UTF-8.
    #[error("{path} is not valid utf-8: {source}")]
    Decode {
        path: String,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The window tag holds no tokens at all.
    #[error("window tag is empty")]
    EmptyTag,

    /// The decoding pipeline closed its output.
    #[error("event stream ended")]
    StreamEnded,

    /// The relay has been stopped and cannot be resumed.
    #[error("event relay stopped")]
    RelayStopped,
}

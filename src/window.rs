//! Window handles: named reads and writes against one acme window.
//!
//! A [`Window`] is bound to a single [`WindowId`] for its whole lifetime and
//! every request it issues is addressed to that id.  Requests go through a
//! [`Transport`]; in production that is [`NinepTransport`], which runs one
//! `9p` process per call.

use crate::config::Config;
use crate::error::AcmeError;
use crate::ninep::transport::NinepTransport;
use crate::tag;
use crate::traits::Transport;
use log::debug;
use std::fmt;

/// Opaque token naming one open acme window.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(String);

impl WindowId {
    /// Wrap an explicit id.
    ///
    /// Rejects ids that are empty or contain `/`, since the id becomes one
    /// component of a resource path.
    pub fn new(id: impl Into<String>) -> Result<Self, AcmeError> {
        let id = id.into();
        let trimmed = id.trim();
        if trimmed.is_empty() || trimmed.contains('/') {
            return Err(AcmeError::InvalidWindowId(id));
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Use `explicit` if given, otherwise the process environment's `var`.
    pub fn resolve(explicit: Option<WindowId>, var: &str) -> Result<Self, AcmeError> {
        Self::resolve_with(explicit, var, |key| std::env::var(key).ok())
    }

    /// Use `explicit` if given, otherwise ask `lookup` for `var`.
    ///
    /// An unset or blank value fails with [`AcmeError::UnresolvedWindow`].
    pub fn resolve_with<F>(explicit: Option<WindowId>, var: &str, lookup: F) -> Result<Self, AcmeError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        if let Some(id) = explicit {
            return Ok(id);
        }
        match lookup(var) {
            Some(value) if !value.trim().is_empty() => {
                debug!("window id {} taken from ${}", value.trim(), var);
                Self::new(value)
            }
            _ => Err(AcmeError::UnresolvedWindow(var.to_string())),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for WindowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<u32> for WindowId {
    fn from(id: u32) -> Self {
        Self(id.to_string())
    }
}

/// Messages understood by a window's `ctl` file.  See acme(4).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CtlMessage {
    /// Clear the modified indicator.
    Clean,
    /// Set the modified indicator.
    Dirty,
    /// Remove the user-added part of the tag.
    ClearTag,
    /// Reload the window from its file.
    Get,
    /// Write the window to its file.
    Put,
    /// Scroll so that dot is visible.
    Show,
    /// Close the window, refusing if it is dirty.
    Del,
    /// Close the window unconditionally.
    Delete,
    /// Rename the window.
    Name(String),
}

impl fmt::Display for CtlMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CtlMessage::Clean => write!(f, "clean"),
            CtlMessage::Dirty => write!(f, "dirty"),
            CtlMessage::ClearTag => write!(f, "cleartag"),
            CtlMessage::Get => write!(f, "get"),
            CtlMessage::Put => write!(f, "put"),
            CtlMessage::Show => write!(f, "show"),
            CtlMessage::Del => write!(f, "del"),
            CtlMessage::Delete => write!(f, "delete"),
            CtlMessage::Name(name) => write!(f, "name {}", name),
        }
    }
}

/// Handle on one acme window.
pub struct Window<T: Transport = NinepTransport> {
    id: WindowId,
    transport: T,
}

impl Window<NinepTransport> {
    /// Open the window `explicit`, or the one named by the configured
    /// context variable when `explicit` is `None`.
    pub fn open(explicit: Option<WindowId>, config: &Config) -> Result<Self, AcmeError> {
        let id = WindowId::resolve(explicit, &config.winid_var)?;
        Ok(Self::new(id, NinepTransport::new(config.transport.clone())))
    }
}

impl<T: Transport> Window<T> {
    pub fn new(id: WindowId, transport: T) -> Self {
        Self { id, transport }
    }

    pub fn id(&self) -> &WindowId {
        &self.id
    }

    /// Read the contents of a control resource as UTF-8 text.
    ///
    /// Depending on the resource, acme may restrict what can be read or
    /// written; see acme(4).
    pub fn read(&self, resource: &str) -> Result<String, AcmeError> {
        self.transport.read(&self.id, resource)
    }

    /// Write `payload` verbatim to a control resource.
    pub fn write(&self, resource: &str, payload: &str) -> Result<(), AcmeError> {
        self.transport.write(&self.id, resource, payload.as_bytes())
    }

    /// Send one message to the `ctl` file.
    pub fn ctl(&self, message: CtlMessage) -> Result<(), AcmeError> {
        self.write("ctl", &format!("{}\n", message))
    }

    /// Mark the window as clean.
    ///
    /// Only the indicator changes; unsaved edits are not written out.
    pub fn mark_clean(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Clean)
    }

    /// Mark the window as dirty without touching the buffer or the file.
    pub fn mark_dirty(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Dirty)
    }

    /// Remove all custom tags, i.e. everything after the `|`.  acme's own
    /// default tags cannot be removed.
    pub fn clear_tags(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::ClearTag)
    }

    pub fn reload(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Get)
    }

    pub fn save(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Put)
    }

    pub fn show(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Show)
    }

    /// Close the window.  acme refuses if it has unsaved changes.
    pub fn close(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Del)
    }

    /// Close the window, discarding unsaved changes.
    pub fn force_close(&self) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Delete)
    }

    pub fn set_name(&self, name: &str) -> Result<(), AcmeError> {
        self.ctl(CtlMessage::Name(name.to_string()))
    }

    pub fn tag(&self) -> Result<String, AcmeError> {
        self.read("tag")
    }

    pub fn body(&self) -> Result<String, AcmeError> {
        self.read("body")
    }

    /// The body split on `\n`.  A trailing newline yields a final empty line.
    pub fn body_lines(&self) -> Result<Vec<String>, AcmeError> {
        Ok(self.body()?.split('\n').map(str::to_string).collect())
    }

    /// Append text to the end of the body.
    pub fn append_body(&self, text: &str) -> Result<(), AcmeError> {
        self.write("body", text)
    }

    /// The window's file or directory name and its custom tags.
    pub fn name_and_tags(&self) -> Result<(String, Vec<String>), AcmeError> {
        Ok(tag::split_name_and_tags(&self.tag()?))
    }

    /// The window's name, assuming it contains no spaces.
    pub fn window_name(&self) -> Result<String, AcmeError> {
        let tag = self.tag()?;
        tag::window_name(&tag)
            .map(str::to_string)
            .ok_or(AcmeError::EmptyTag)
    }
}

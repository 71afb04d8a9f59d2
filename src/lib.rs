//! **acmectl** — programmatic control of acme windows.
//!
//! acme exposes every window as a directory of control files (`ctl`, `tag`,
//! `body`, `event`, …) served over 9P.  This crate drives those files by
//! running plan9port's `9p` client, and turns a window's event file into a
//! pull-based stream by piping it through `acmeevent`.
//!
//! # Architecture
//!
//! * [`window::Window`] — named reads and writes against one window, bound
//!   to a [`window::WindowId`] resolved explicitly or from `$winid`.
//! * [`traits::Transport`] — the seam between window operations and the
//!   mechanism that reaches acme, so the tag and `ctl` logic is testable
//!   without a running editor.
//! * [`ninep::relay::EventRelay`] — owns the `9p read … | acmeevent`
//!   pipeline for one window and yields [`event::Event`]s on demand.
//!
//! Concrete plan9port-backed implementations live in [`ninep`].
//!
//! # Example
//!
//! ```no_run
//! use acmectl::config::Config;
//! use acmectl::window::Window;
//!
//! let config = Config::default();
//! let win = Window::open(None, &config)?;
//! let (name, tags) = win.name_and_tags()?;
//! println!("{} {:?}", name.trim(), tags);
//! win.mark_clean()?;
//! # Ok::<(), acmectl::error::AcmeError>(())
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod ninep;
pub mod tag;
pub mod traits;
pub mod window;

//! Pull-based view over a window's event stream.
//!
//! # Pipeline
//!
//! On the first pull the relay spawns
//!
//! ```text
//! 9p read acme/<id>/event | acmeevent
//! ```
//!
//! wiring the reader's stdout straight into the decoder's stdin (no shell
//! involved).  Each subsequent pull blocks until the decoder prints one
//! line and hands it back as an [`Event`].
//!
//! # Lifecycle
//!
//! ```text
//! Unstarted ──first pull──▶ Running ──stop / end of stream──▶ Stopped
//!     └──────────────────────stop─────────────────────────────────┘
//! ```
//!
//! `Stopped` is terminal; a new relay is needed to listen again.
//!
//! # Ownership
//!
//! While running, the relay holds the window's event file open, and acme
//! delivers events to only one reader.  A relay that is never stopped would
//! starve every other listener, so dropping the relay stops it.  Opening two
//! relays on the same window at once is not supported.
//!
//! Events are only observed.  Passing an event back to acme (so that, say,
//! a button-2 click still executes) needs a write on the same open event
//! file, which a separate one-shot `9p write` cannot provide.
//!
//! # Filtering
//!
//! [`EventRelay::with_filter`] restricts every pull to events matching an
//! [`EventFilter`]; [`EventRelay::next_matching`] takes an ad-hoc
//! predicate.  Lines that do not parse as `acmeevent` output are skipped
//! by both.
//!
//! # Failures
//!
//! When the stream ends, both children are reaped.  If either exited
//! unsuccessfully (acme not running, no such window, …) the pull returns
//! [`AcmeError::Exit`] with the child's stderr instead of
//! [`AcmeError::StreamEnded`].

use super::{command, resource_path};
use crate::config::{Config, PipelineConfig};
use crate::error::AcmeError;
use crate::event::{Event, EventFilter, EventRecord};
use crate::window::WindowId;
use log::{debug, info, warn};
use std::io::{BufRead, BufReader, Read};
use std::process::{Child, ChildStdout, ExitStatus, Stdio};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

/// How long a child may take to exit once the decoder's output has closed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// The two running children and the decoder's output.
struct Pipeline {
    path: String,
    reader: Child,
    reader_program: String,
    reader_stderr: Option<JoinHandle<String>>,
    decoder: Child,
    decoder_program: String,
    decoder_stderr: Option<JoinHandle<String>>,
    lines: BufReader<ChildStdout>,
}

impl Pipeline {
    fn spawn(config: &PipelineConfig, window: &WindowId) -> Result<Self, AcmeError> {
        let path = resource_path(&config.service, window, "event");
        let reader_program = config.ninep.first().cloned().unwrap_or_default();
        let decoder_program = config.acmeevent.first().cloned().unwrap_or_default();
        debug!("spawning {} read {} | {}", reader_program, path, decoder_program);

        // Validate both command lines before starting anything.
        let mut reader_cmd = command(&config.ninep, "9p")?;
        let mut decoder_cmd = command(&config.acmeevent, "acmeevent")?;

        let mut reader = reader_cmd
            .arg("read")
            .arg(&path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AcmeError::Spawn {
                program: reader_program.clone(),
                source,
            })?;
        let reader_stderr = drain_stderr(&mut reader);

        let Some(raw) = reader.stdout.take() else {
            kill_and_reap(&mut reader, "event reader");
            return Err(AcmeError::Io(std::io::Error::other("event reader has no stdout")));
        };

        let mut decoder = match decoder_cmd
            .stdin(Stdio::from(raw))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(source) => {
                kill_and_reap(&mut reader, "event reader");
                return Err(AcmeError::Spawn {
                    program: decoder_program,
                    source,
                });
            }
        };
        let decoder_stderr = drain_stderr(&mut decoder);

        let Some(decoded) = decoder.stdout.take() else {
            kill_and_reap(&mut reader, "event reader");
            kill_and_reap(&mut decoder, "event decoder");
            return Err(AcmeError::Io(std::io::Error::other("event decoder has no stdout")));
        };

        Ok(Self {
            path,
            reader,
            reader_program,
            reader_stderr,
            decoder,
            decoder_program,
            decoder_stderr,
            lines: BufReader::new(decoded),
        })
    }

    /// Reap both children after the decoder's output closed and report the
    /// first one that failed.  The decoder is checked first: when it dies,
    /// the reader usually follows with a broken pipe.
    fn finish(mut self) -> Result<(), AcmeError> {
        let decoder_status = settle(&mut self.decoder, "event decoder");
        let reader_status = settle(&mut self.reader, "event reader");

        if let Some(status) = decoder_status.filter(|s| !s.success()) {
            return Err(AcmeError::Exit {
                program: self.decoder_program,
                path: self.path,
                status,
                stderr: collect(self.decoder_stderr.take()),
            });
        }
        if let Some(status) = reader_status.filter(|s| !s.success()) {
            return Err(AcmeError::Exit {
                program: self.reader_program,
                path: self.path,
                status,
                stderr: collect(self.reader_stderr.take()),
            });
        }
        Ok(())
    }

    /// Terminate both children.  Errors are logged and otherwise ignored:
    /// a child that already exited cannot be killed twice.
    fn shutdown(mut self) {
        kill_and_reap(&mut self.reader, "event reader");
        kill_and_reap(&mut self.decoder, "event decoder");
    }
}

/// Read a child's stderr to the end on a background thread, so a chatty
/// child never blocks on a full pipe.
fn drain_stderr(child: &mut Child) -> Option<JoinHandle<String>> {
    let mut stderr = child.stderr.take()?;
    Some(std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).trim().to_string()
    }))
}

fn collect(drain: Option<JoinHandle<String>>) -> String {
    drain.and_then(|h| h.join().ok()).unwrap_or_default()
}

/// Wait up to [`EXIT_GRACE`] for `child` to exit on its own.  A child that
/// is still running afterwards is killed and reported as `None`.
fn settle(child: &mut Child, what: &str) -> Option<ExitStatus> {
    let deadline = Instant::now() + EXIT_GRACE;
    loop {
        match child.try_wait() {
            Ok(Some(status)) => return Some(status),
            Ok(None) if Instant::now() < deadline => {
                std::thread::sleep(Duration::from_millis(10));
            }
            Ok(None) => {
                debug!("{} (pid {}) outlived the stream, killing", what, child.id());
                kill_and_reap(child, what);
                return None;
            }
            Err(e) => {
                warn!("wait for {} (pid {}): {}", what, child.id(), e);
                return None;
            }
        }
    }
}

fn kill_and_reap(child: &mut Child, what: &str) {
    if let Err(e) = child.kill() {
        debug!("kill {} (pid {}): {}", what, child.id(), e);
    }
    if let Err(e) = child.wait() {
        warn!("reap {} (pid {}): {}", what, child.id(), e);
    }
}

enum RelayState {
    Unstarted,
    Running(Pipeline),
    Stopped,
}

/// Pull-based event session for one window.
///
/// Pulls take `&mut self`, so only one can be in flight at a time.
pub struct EventRelay {
    window: WindowId,
    config: PipelineConfig,
    filter: Option<EventFilter>,
    state: RelayState,
}

impl EventRelay {
    /// Create a relay for `window`.  Nothing is spawned until the first
    /// [`next_event`](Self::next_event).
    pub fn new(window: WindowId, config: &PipelineConfig) -> Self {
        Self {
            window,
            config: config.clone(),
            filter: None,
            state: RelayState::Unstarted,
        }
    }

    /// Create a relay for `explicit`, or for the window named by the
    /// configured context variable when `explicit` is `None`.
    pub fn open(explicit: Option<WindowId>, config: &Config) -> Result<Self, AcmeError> {
        let window = WindowId::resolve(explicit, &config.winid_var)?;
        Ok(Self::new(window, &config.transport))
    }

    /// Only deliver events matching `filter`, from every pull and from
    /// iteration.  Unparseable lines are dropped.
    pub fn with_filter(mut self, filter: EventFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn window(&self) -> &WindowId {
        &self.window
    }

    pub fn is_running(&self) -> bool {
        matches!(self.state, RelayState::Running(_))
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, RelayState::Stopped)
    }

    /// Block until the next event (passing the filter, if any) arrives.
    ///
    /// Starts the pipeline on first use.  There is no timeout: on a quiet
    /// window this waits indefinitely.  When the decoder closes its output
    /// the relay stops itself and returns [`AcmeError::StreamEnded`], or
    /// [`AcmeError::Exit`] if a child failed; every pull after a stop
    /// returns [`AcmeError::RelayStopped`].
    pub fn next_event(&mut self) -> Result<Event, AcmeError> {
        loop {
            let event = self.next_line()?;
            let Some(filter) = &self.filter else {
                return Ok(event);
            };
            match event.parse() {
                Ok(record) if filter.matches(&record) => return Ok(event),
                Ok(_) => debug!("filtered out: {}", event),
                Err(e) => debug!("skipping line: {}", e),
            }
        }
    }

    /// Block until an event satisfying `wanted` arrives, returning it along
    /// with its decoded fields.
    pub fn next_matching<F>(&mut self, mut wanted: F) -> Result<(Event, EventRecord), AcmeError>
    where
        F: FnMut(&EventRecord) -> bool,
    {
        loop {
            let event = self.next_event()?;
            match event.parse() {
                Ok(record) if wanted(&record) => return Ok((event, record)),
                Ok(_) => {}
                Err(e) => debug!("skipping line: {}", e),
            }
        }
    }

    /// One raw line from the decoder.
    fn next_line(&mut self) -> Result<Event, AcmeError> {
        if let RelayState::Unstarted = self.state {
            let pipeline = Pipeline::spawn(&self.config, &self.window)?;
            info!("event relay started for window {}", self.window);
            self.state = RelayState::Running(pipeline);
        }

        let pipeline = match &mut self.state {
            RelayState::Running(pipeline) => pipeline,
            _ => return Err(AcmeError::RelayStopped),
        };

        let mut buf = Vec::new();
        match pipeline.lines.read_until(b'\n', &mut buf) {
            Ok(0) => Err(self.end_of_stream()),
            Ok(_) => {
                let line = String::from_utf8(buf).map_err(|source| AcmeError::Decode {
                    path: pipeline.path.clone(),
                    source,
                })?;
                let line = line.trim_end_matches(['\n', '\r']);
                debug!("event: {}", line);
                Ok(Event::new(line))
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Move to `Stopped` after the decoder closed its output, and explain
    /// why the stream ended.
    fn end_of_stream(&mut self) -> AcmeError {
        info!("event stream for window {} ended", self.window);
        match std::mem::replace(&mut self.state, RelayState::Stopped) {
            RelayState::Running(pipeline) => match pipeline.finish() {
                Ok(()) => AcmeError::StreamEnded,
                Err(e) => e,
            },
            RelayState::Unstarted | RelayState::Stopped => AcmeError::StreamEnded,
        }
    }

    /// Terminate the pipeline.
    ///
    /// Idempotent: stopping an unstarted or already stopped relay does
    /// nothing beyond making it terminal.  A pull already blocked in another
    /// stack frame is not interrupted; only further pulls are prevented.
    pub fn stop(&mut self) {
        match std::mem::replace(&mut self.state, RelayState::Stopped) {
            RelayState::Running(pipeline) => {
                info!("stopping event relay for window {}", self.window);
                pipeline.shutdown();
            }
            RelayState::Unstarted | RelayState::Stopped => {}
        }
    }
}

impl Iterator for EventRelay {
    type Item = Result<Event, AcmeError>;

    /// Yields events until the relay stops.  A clean end of stream ends the
    /// iteration; a failed child is yielded once as an error first.
    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Err(AcmeError::StreamEnded) | Err(AcmeError::RelayStopped) => None,
            other => Some(other),
        }
    }
}

impl Drop for EventRelay {
    fn drop(&mut self) {
        self.stop();
    }
}

//  Tests

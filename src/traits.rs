//! The seam between window operations and the mechanism that reaches acme.
//!
//! [`Window`](crate::window::Window) only depends on [`Transport`]; the
//! concrete `9p`-backed implementation lives in [`ninep`](crate::ninep) and
//! tests substitute a recorder.

use crate::error::AcmeError;
use crate::window::WindowId;

/// Reads and writes one window's control resources.
///
/// Every call is a complete, blocking request: open, transfer, close.  No
/// state survives between calls, which is why acme's `addr` file is not
/// usable through this trait.
pub trait Transport {
    /// Return the full contents of `resource` for `window`.
    fn read(&self, window: &WindowId, resource: &str) -> Result<String, AcmeError>;

    /// Write `payload` verbatim to `resource` for `window`.
    fn write(&self, window: &WindowId, resource: &str, payload: &[u8]) -> Result<(), AcmeError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn read(&self, window: &WindowId, resource: &str) -> Result<String, AcmeError> {
        (**self).read(window, resource)
    }

    fn write(&self, window: &WindowId, resource: &str, payload: &[u8]) -> Result<(), AcmeError> {
        (**self).write(window, resource, payload)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// A test double that records every request and serves canned reads.
    #[derive(Debug, Default)]
    pub(crate) struct RecorderTransport {
        pub(crate) files: HashMap<String, String>,
        pub(crate) reads: RefCell<Vec<(String, String)>>,
        pub(crate) writes: RefCell<Vec<(String, String, String)>>,
    }

    impl RecorderTransport {
        pub(crate) fn with_file(mut self, resource: &str, contents: &str) -> Self {
            self.files.insert(resource.into(), contents.into());
            self
        }
    }

    impl Transport for RecorderTransport {
        fn read(&self, window: &WindowId, resource: &str) -> Result<String, AcmeError> {
            self.reads
                .borrow_mut()
                .push((window.to_string(), resource.to_string()));
            Ok(self.files.get(resource).cloned().unwrap_or_default())
        }

        fn write(
            &self,
            window: &WindowId,
            resource: &str,
            payload: &[u8],
        ) -> Result<(), AcmeError> {
            self.writes.borrow_mut().push((
                window.to_string(),
                resource.to_string(),
                String::from_utf8_lossy(payload).into_owned(),
            ));
            Ok(())
        }
    }

    #[test]
    fn recorder_logs_requests() {
        let t = RecorderTransport::default().with_file("tag", "x.go | Put");
        let id = WindowId::new("3").unwrap();
        assert_eq!(t.read(&id, "tag").unwrap(), "x.go | Put");
        t.write(&id, "ctl", b"clean\n").unwrap();
        assert_eq!(t.reads.borrow()[0], ("3".into(), "tag".into()));
        assert_eq!(
            t.writes.borrow()[0],
            ("3".into(), "ctl".into(), "clean\n".into())
        );
    }
}

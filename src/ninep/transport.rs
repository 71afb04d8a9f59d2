//! [`Transport`] implementation backed by the `9p` command.
//!
//! Each request runs `9p read <path>` or `9p write <path>` to completion.
//! Write payloads travel on the child's stdin, so arbitrary text is safe.

use super::{command, resource_path};
use crate::config::PipelineConfig;
use crate::error::AcmeError;
use crate::traits::Transport;
use crate::window::WindowId;
use log::debug;
use std::io::Write;
use std::process::{Output, Stdio};

/// `9p`-backed transport.
///
/// No connection is held; every call spawns a short-lived process.
#[derive(Debug, Clone, Default)]
pub struct NinepTransport {
    config: PipelineConfig,
}

impl NinepTransport {
    pub fn new(config: PipelineConfig) -> Self {
        Self { config }
    }

    fn program(&self) -> String {
        self.config.ninep.first().cloned().unwrap_or_default()
    }

    /// Fail unless the child exited successfully.
    fn check(&self, path: &str, output: &Output) -> Result<(), AcmeError> {
        if output.status.success() {
            return Ok(());
        }
        Err(AcmeError::Exit {
            program: self.program(),
            path: path.to_string(),
            status: output.status,
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        })
    }
}

impl Transport for NinepTransport {
    fn read(&self, window: &WindowId, resource: &str) -> Result<String, AcmeError> {
        let path = resource_path(&self.config.service, window, resource);
        debug!("9p read {}", path);

        let output = command(&self.config.ninep, "9p")?
            .arg("read")
            .arg(&path)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| AcmeError::Spawn {
                program: self.program(),
                source,
            })?;
        self.check(&path, &output)?;

        String::from_utf8(output.stdout).map_err(|source| AcmeError::Decode { path, source })
    }

    fn write(&self, window: &WindowId, resource: &str, payload: &[u8]) -> Result<(), AcmeError> {
        let path = resource_path(&self.config.service, window, resource);
        debug!("9p write {} ({} bytes)", path, payload.len());

        let mut child = command(&self.config.ninep, "9p")?
            .arg("write")
            .arg(&path)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| AcmeError::Spawn {
                program: self.program(),
                source,
            })?;

        // Feed stdin on its own thread while stdout and stderr drain, so a
        // child that writes before it reads cannot wedge both sides.  The
        // writer drops stdin when done, which lets 9p see end of input.
        let stdin = child.stdin.take();
        let (sent, output) = std::thread::scope(|s| {
            let writer = s.spawn(move || match stdin {
                Some(mut stdin) => stdin.write_all(payload),
                None => Ok(()),
            });
            let output = child.wait_with_output();
            let sent = writer
                .join()
                .unwrap_or_else(|_| Err(std::io::Error::other("stdin writer panicked")));
            (sent, output)
        });
        let output = output?;
        // A child that quit early also broke the pipe; its exit status says why.
        self.check(&path, &output)?;
        sent.map_err(AcmeError::from)
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Monotonic counter to generate unique log paths per test.
    static TEST_ID: AtomicU32 = AtomicU32::new(0);

    fn tmp_log_path() -> PathBuf {
        let id = TEST_ID.fetch_add(1, Ordering::SeqCst);
        std::env::temp_dir().join(format!(
            "acmectl-transport-{}-{}.log",
            std::process::id(),
            id
        ))
    }

    fn transport(ninep: &[&str]) -> NinepTransport {
        NinepTransport::new(PipelineConfig {
            ninep: ninep.iter().map(|s| s.to_string()).collect(),
            ..PipelineConfig::default()
        })
    }

    fn win() -> WindowId {
        WindowId::new("7").unwrap()
    }

    #[test]
    fn read_returns_child_stdout() {
        // `echo` stands in for 9p and prints its own arguments.
        let t = transport(&["echo"]);
        assert_eq!(t.read(&win(), "tag").unwrap(), "read acme/7/tag\n");
    }

    #[test]
    fn configured_prefix_and_service_are_used() {
        let t = NinepTransport::new(PipelineConfig {
            ninep: vec!["echo".into(), "-n".into()],
            service: "acme2".into(),
            ..PipelineConfig::default()
        });
        assert_eq!(t.read(&win(), "body").unwrap(), "read acme2/7/body");
    }

    #[test]
    fn non_zero_exit_is_an_error() {
        let t = transport(&["false"]);
        match t.read(&win(), "tag") {
            Err(AcmeError::Exit { program, path, status, .. }) => {
                assert_eq!(program, "false");
                assert_eq!(path, "acme/7/tag");
                assert!(!status.success());
            }
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn stderr_is_reported_on_failure() {
        let t = transport(&["sh", "-c", "echo 'no such window' >&2; exit 1", "fake-9p"]);
        match t.write(&win(), "ctl", b"clean\n") {
            Err(AcmeError::Exit { stderr, .. }) => assert_eq!(stderr, "no such window"),
            other => panic!("expected exit error, got {:?}", other),
        }
    }

    #[test]
    fn missing_program_is_a_spawn_error() {
        let t = transport(&["/nonexistent/acmectl-test/9p"]);
        assert!(matches!(
            t.read(&win(), "tag"),
            Err(AcmeError::Spawn { .. })
        ));
    }

    #[test]
    fn empty_command_is_rejected() {
        let t = transport(&[]);
        assert!(matches!(
            t.read(&win(), "tag"),
            Err(AcmeError::EmptyCommand("9p"))
        ));
    }

    #[test]
    fn invalid_utf8_is_a_decode_error() {
        let t = transport(&["printf", "\\377\\376"]);
        assert!(matches!(
            t.read(&win(), "body"),
            Err(AcmeError::Decode { .. })
        ));
    }

    #[test]
    fn large_payload_with_chatty_stderr_completes() {
        // The child fills its stderr pipe before reading stdin; both
        // directions exceed the kernel pipe buffer.
        let t = transport(&[
            "sh",
            "-c",
            "head -c 200000 /dev/zero >&2; cat > /dev/null",
            "fake-9p",
        ]);
        let payload = vec![b'x'; 200_000];
        t.write(&win(), "body", &payload).unwrap();
    }

    #[test]
    fn write_passes_args_and_payload_through_stdin() {
        let log = tmp_log_path();
        let script = format!(
            "printf '%s\\n' \"$*\" > '{}'; cat >> '{}'",
            log.display(),
            log.display()
        );
        let t = transport(&["sh", "-c", &script, "fake-9p"]);

        let payload = "it's $HOME; `rm -rf /` | tee\n";
        t.write(&win(), "body", payload.as_bytes()).unwrap();

        let logged = std::fs::read_to_string(&log).unwrap();
        assert_eq!(logged, format!("write acme/7/body\n{}", payload));
        let _ = std::fs::remove_file(&log);
    }
}

use std::{
    io,
    process::{Child, Command},
    sync::{Arc, Mutex},
    thread,
    time::{Duration, Instant},
};

use pipesh_core::Host;

mockall::mock! {
    pub TestHost {}

    impl Host for TestHost {
        fn env_vars(&self) -> Vec<(String, String)>;
        fn spawn(&mut self, command: &mut Command) -> io::Result<Child>;
    }
}

/// Returns the environment reported by test hosts.
pub(crate) fn test_env() -> Vec<(String, String)> {
    vec![(
        "PATH".to_owned(),
        std::env::var("PATH").unwrap_or_else(|_| "/usr/bin:/bin".to_owned()),
    )]
}

/// Constructs a host that never spawns any process.
pub(crate) fn inert_host() -> MockTestHost {
    let mut host = MockTestHost::new();
    host.expect_env_vars().returning(test_env);
    host.expect_spawn().never();
    host
}

/// Constructs a host that spawns processes for real and records their ids.
pub(crate) fn recording_host() -> (MockTestHost, Arc<Mutex<Vec<u32>>>) {
    let pids = Arc::new(Mutex::new(Vec::new()));
    let recorded = Arc::clone(&pids);
    let mut host = MockTestHost::new();
    host.expect_env_vars().returning(test_env);
    host.expect_spawn().returning(move |command| {
        let child = command.spawn()?;
        recorded.lock().unwrap().push(child.id());
        Ok(child)
    });
    (host, pids)
}

/// Asserts that none of the processes exist anymore, not even as zombies.
///
/// Only checked where `/proc` is available.
pub(crate) fn assert_reaped(pids: &[u32]) {
    if !cfg!(target_os = "linux") {
        return;
    }

    for pid in pids {
        assert!(
            !std::path::Path::new(&format!("/proc/{pid}")).exists(),
            "process {pid} is still running"
        );
    }
}

/// Asserts that a process, which need not be a child of this process, exits
/// within a few seconds. A zombie awaiting its parent counts as exited.
///
/// Only checked where `/proc` is available.
pub(crate) fn assert_terminated(pid: u32) {
    if !cfg!(target_os = "linux") {
        return;
    }

    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        let stat = std::fs::read_to_string(format!("/proc/{pid}/stat"));
        // The state follows the parenthesized command name.
        let exited = match &stat {
            Err(_) => true,
            Ok(stat) => stat
                .rsplit_once(')')
                .map_or(false, |(_, rest)| rest.trim_start().starts_with(['Z', 'X'])),
        };
        if exited {
            return;
        }

        assert!(Instant::now() < deadline, "process {pid} is still running");
        thread::sleep(Duration::from_millis(20));
    }
}

/// A writer that always fails.
pub(crate) struct BrokenWriter;

impl io::Write for BrokenWriter {
    fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }

    fn flush(&mut self) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
    }
}

/// Output as a string without surrounding whitespace.
pub(crate) fn trimmed(output: Vec<u8>) -> String {
    String::from_utf8_lossy(&output).trim().to_owned()
}

use std::{
    io,
    process::{Child, Command},
};

use crate::env::os_environment;

/// A host is the engine's interface to the operating system.
///
/// The host provides the environment that processes inherit, and spawns the
/// processes of a pipeline.
pub trait Host: Send {
    /// Returns the environment variables that processes inherit.
    fn env_vars(&self) -> Vec<(String, String)>;

    /// Spawns a child process.
    ///
    /// The process should be started without waiting for it to complete.
    fn spawn(&mut self, command: &mut Command) -> io::Result<Child>;
}

/// A host wrapping the Rust standard library.
#[derive(Debug, Default)]
pub struct StdHost;

impl Host for StdHost {
    fn env_vars(&self) -> Vec<(String, String)> {
        os_environment()
    }

    fn spawn(&mut self, command: &mut Command) -> io::Result<Child> {
        command.spawn()
    }
}

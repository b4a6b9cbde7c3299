use std::{io, time::Duration};

use pipesh_core::StreamError;
use thiserror::Error;

pub type ExecResult<T> = Result<T, ExecError>;

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("pipeline is empty")]
    EmptyPipeline,
    #[error("failed to start '{program}': {source}")]
    ProcessStart {
        program: String,
        #[source]
        source: io::Error,
    },
    /// The last stage exited with a non-zero code. `output` holds whatever
    /// was captured before the exit, and is empty unless output was captured.
    #[error("'{program}' exited with status {code}")]
    ExitStatus {
        program: String,
        code: i32,
        output: Vec<u8>,
    },
    #[error("pipeline timed out after {0:?}")]
    Timeout(Duration),
    #[error("failed to create pipe: {0}")]
    CreatePipe(#[source] io::Error),
    #[error("failed to wait for process: {0}")]
    Wait(#[source] io::Error),
    #[error("failed to echo command: {0}")]
    Echo(#[source] io::Error),
    #[error(transparent)]
    Stream(#[from] StreamError),
}

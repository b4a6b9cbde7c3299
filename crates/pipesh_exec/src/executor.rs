use std::{
    io::{self, Read, Write},
    process::{Child, Stdio},
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use os_pipe::{PipeReader, PipeWriter};
use pipesh_core::{Host, Input, Invocation, Output, Stream};
use wait_timeout::ChildExt;

use crate::{
    error::{ExecError, ExecResult},
    exit::{EXIT_GENERAL_ERROR, EXIT_SUCCESS},
};

/// Standard streams of a pipeline.
///
/// `stdin` feeds the first stage and `stdout` receives the output of the last
/// stage. Every stage writes its errors to `stderr`.
#[derive(Debug)]
pub struct StandardStreams {
    pub stdin: Stream,
    pub stdout: Stream,
    pub stderr: Stream,
}

impl Default for StandardStreams {
    fn default() -> Self {
        Self {
            stdin: Stream::Null,
            stdout: Stream::Inherit,
            stderr: Stream::Inherit,
        }
    }
}

/// Exit codes of a completed pipeline, in pipeline order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitInfo {
    pub codes: Vec<i32>,
}

impl ExitInfo {
    /// Returns the exit code of the last stage.
    pub fn code(&self) -> i32 {
        self.codes.last().copied().unwrap_or(EXIT_SUCCESS)
    }

    pub fn success(&self) -> bool {
        self.code() == EXIT_SUCCESS
    }
}

/// Processes and copy threads of a started pipeline.
#[derive(Default)]
struct Running {
    children: Vec<Child>,
    pumps: Vec<JoinHandle<()>>,
    /// Whether each child leads its own process group.
    grouped: bool,
}

impl Running {
    /// Kills and reaps all processes. Copy threads are left to finish on
    /// their own once the processes' pipe ends are closed.
    ///
    /// When the children lead process groups, their descendants are killed
    /// as well.
    fn terminate(&mut self) {
        for child in &mut self.children {
            #[cfg(unix)]
            if self.grouped {
                // A group outlives its leader while any member remains.
                unsafe {
                    libc::kill(-(child.id() as libc::pid_t), libc::SIGKILL);
                }
            }

            let _ = child.kill(); // Results are safe to ignore.
            let _ = child.wait();
        }
    }

    fn join_pumps(&mut self) {
        for pump in std::mem::take(&mut self.pumps) {
            let _ = pump.join();
        }
    }
}

/// Starts pipelines of invocations and waits for them to complete.
pub struct PipelineExecutor<'a> {
    host: &'a mut dyn Host,
    timeout: Option<Duration>,
}

impl<'a> PipelineExecutor<'a> {
    /// Constructs an executor. A zero timeout disables the timeout.
    pub fn new(host: &'a mut dyn Host, timeout: Option<Duration>) -> Self {
        Self {
            host,
            timeout: timeout.filter(|timeout| !timeout.is_zero()),
        }
    }

    /// Executes a pipeline, blocking until all stages have exited.
    ///
    /// All stages are started, in order, before waiting on any of them. If a
    /// stage cannot be started, the stages that were already started are
    /// terminated and no further stages are started. If the timeout expires,
    /// all stages are terminated.
    pub fn execute(
        &mut self,
        pipeline: &[Invocation],
        streams: &mut StandardStreams,
    ) -> ExecResult<ExitInfo> {
        if pipeline.is_empty() {
            return Err(ExecError::EmptyPipeline);
        }

        let deadline = self.timeout.map(|timeout| (timeout, Instant::now() + timeout));
        let mut running = Running {
            grouped: cfg!(unix) && deadline.is_some(),
            ..Running::default()
        };
        if let Err(error) = self.start(pipeline, streams, &mut running) {
            running.terminate();
            return Err(error);
        }

        wait(running, deadline)
    }

    fn start(
        &mut self,
        pipeline: &[Invocation],
        streams: &mut StandardStreams,
        running: &mut Running,
    ) -> ExecResult<()> {
        let mut stages = pipeline.iter().peekable();
        let mut previous_stdout: Option<PipeReader> = None;

        while let Some(invocation) = stages.next() {
            let is_last = stages.peek().is_none();
            let mut cmd = invocation.to_command();

            // A stage that may be timed out gets its own process group, so that
            // processes it forks can be terminated along with it.
            #[cfg(unix)]
            if running.grouped {
                std::os::unix::process::CommandExt::process_group(&mut cmd, 0);
            }

            // The first stage reads from the pipeline's input. All other stages
            // read from their predecessor.
            match previous_stdout.take() {
                Some(reader) => cmd.stdin(reader),
                None => cmd.stdin(connect_input(streams.stdin.input()?, running)?),
            };

            // Create a new pipe for all but the last stage.
            if is_last {
                cmd.stdout(connect_output(streams.stdout.output()?, running)?);
            } else {
                let (reader, writer) = pipe()?;
                cmd.stdout(writer);
                previous_stdout = Some(reader);
            }

            cmd.stderr(connect_output(streams.stderr.output()?, running)?);

            log::debug!("starting process: {}", invocation);
            let child = self
                .host
                .spawn(&mut cmd)
                .map_err(|source| ExecError::ProcessStart {
                    program: invocation.program().to_owned(),
                    source,
                })?;
            running.children.push(child);

            // Release this process' copies of the stage's pipe ends, so that
            // readers observe EOF once the child exits.
            drop(cmd);
        }

        Ok(())
    }
}

/// Waits for all processes to exit, terminating them if the deadline passes.
fn wait(mut running: Running, deadline: Option<(Duration, Instant)>) -> ExecResult<ExitInfo> {
    let mut codes = vec![EXIT_SUCCESS; running.children.len()];

    // Iterate backwards to ensure clean termination of the final stage.
    for index in (0..running.children.len()).rev() {
        let child = &mut running.children[index];
        let result = match deadline {
            None => child.wait().map(Some),
            Some((_, deadline)) => {
                child.wait_timeout(deadline.saturating_duration_since(Instant::now()))
            }
        };

        match result {
            Ok(Some(status)) => codes[index] = status.code().unwrap_or(EXIT_GENERAL_ERROR),
            Ok(None) => {
                let timeout = deadline.map(|(timeout, _)| timeout).unwrap_or_default();
                log::debug!("pipeline timed out after {:?}, terminating", timeout);
                running.terminate();
                return Err(ExecError::Timeout(timeout));
            }
            Err(error) => {
                running.terminate();
                return Err(ExecError::Wait(error));
            }
        }
    }

    running.join_pumps();
    Ok(ExitInfo { codes })
}

fn pipe() -> ExecResult<(PipeReader, PipeWriter)> {
    os_pipe::pipe().map_err(ExecError::CreatePipe)
}

/// Returns a [`Stdio`] for an input, copying feeds into a pipe on a separate
/// thread.
fn connect_input(input: Input, running: &mut Running) -> ExecResult<Stdio> {
    match input {
        Input::Direct(stdio) => Ok(stdio),
        Input::Feed(mut source) => {
            let (reader, mut writer) = pipe()?;
            running.pumps.push(thread::spawn(move || {
                // The reading process may exit early. A broken pipe is expected.
                let _ = io::copy(&mut source, &mut writer);
            }));
            Ok(Stdio::from(reader))
        }
    }
}

/// Returns a [`Stdio`] for an output, copying from a pipe into sinks on a
/// separate thread.
fn connect_output(output: Output, running: &mut Running) -> ExecResult<Stdio> {
    match output {
        Output::Direct(stdio) => Ok(stdio),
        Output::Sink(sink) => {
            let (reader, writer) = pipe()?;
            running.pumps.push(drain(reader, sink));
            Ok(Stdio::from(writer))
        }
    }
}

fn drain(mut reader: impl Read + Send + 'static, mut sink: Box<dyn Write + Send>) -> JoinHandle<()> {
    thread::spawn(move || {
        let _ = io::copy(&mut reader, &mut sink);
        let _ = sink.flush();
    })
}

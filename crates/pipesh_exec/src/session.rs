use std::{
    collections::HashMap,
    io::Write,
    path::PathBuf,
    time::Duration,
};

use pipesh_core::{
    AliasTable, Arg, Host, Invocation, InvocationBuilder, StdHost, Stream, StreamError,
};

use crate::{
    error::{ExecError, ExecResult},
    executor::{ExitInfo, PipelineExecutor, StandardStreams},
};

/// Environment variables copied from the host when a session is created.
const INHERITED_VARS: &[&str] = &["PATH"];

/// Prompt written before each command when [`Session::show_cmd`] is enabled.
const PROMPT: &str = "[pipesh]$";

/// The state of a session's pipeline.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// No commands have been added since the session was created.
    Idle,
    /// Commands have been added, but not yet executed.
    Building,
    /// The pipeline has been executed. The next command starts a new pipeline.
    Started,
}

/// A session holds a pipeline under construction along with the defaults
/// that apply to its commands.
///
/// Commands added to a session are piped together until the pipeline is
/// executed. Adding a command to an executed pipeline discards it and starts
/// a new one.
pub struct Session {
    pipeline: Vec<Invocation>,
    state: State,
    dir: Option<PathBuf>,
    env: HashMap<String, String>,
    aliases: AliasTable,
    streams: StandardStreams,
    timeout: Option<Duration>,
    show_cmd: bool,
    host: Box<dyn Host>,
}

impl Session {
    /// Creates a session on the standard library host.
    pub fn new() -> Self {
        Self::with_host(Box::new(StdHost))
    }

    /// Creates a session on a specific host.
    ///
    /// The session environment is initialized with a snapshot of the host's
    /// `PATH`.
    pub fn with_host(host: Box<dyn Host>) -> Self {
        let env = host
            .env_vars()
            .into_iter()
            .filter(|(key, _)| INHERITED_VARS.contains(&key.as_str()))
            .collect();

        Self {
            pipeline: Vec::new(),
            state: State::Idle,
            dir: None,
            env,
            aliases: AliasTable::default(),
            streams: StandardStreams::default(),
            timeout: None,
            show_cmd: false,
            host,
        }
    }

    /// Replaces the session environment, including the inherited `PATH`.
    ///
    /// ```no_run
    /// # use std::collections::HashMap;
    /// # use pipesh_exec::Session;
    /// let session = Session::new().with_env(HashMap::from([
    ///     ("PATH".to_owned(), "/usr/bin:/bin".to_owned()),
    /// ]));
    /// ```
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = env;
        self
    }

    /// Creates a session that reads from the current process' stdin.
    pub fn interactive() -> Self {
        let mut session = Self::new();
        session.set_stdin(Stream::Inherit);
        session
    }

    /// Appends a command to the session's pipeline.
    ///
    /// Each value is either an argument, a sequence of arguments, or a
    /// directive such as [`pipesh_core::Dir`]. Values without an argument
    /// representation are ignored.
    pub fn command<I>(&mut self, name: &str, args: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        let invocation = InvocationBuilder::new(name).args(args).build(
            self.dir.as_deref(),
            self.host.env_vars(),
            &self.env,
            &self.aliases,
        );

        self.begin_command();
        self.pipeline.push(invocation);
        self
    }

    /// Appends a command and runs the pipeline.
    pub fn call<I>(&mut self, name: &str, args: I) -> ExecResult<()>
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        self.command(name, args).run()
    }

    /// Registers an alias for commands added after this call.
    pub fn alias<I, S>(&mut self, alias: &str, program: &str, args: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.register(alias, program, args);
        self
    }

    pub fn set_env<K: Into<String>, V: Into<String>>(&mut self, key: K, value: V) -> &mut Self {
        self.env.insert(key.into(), value.into());
        self
    }

    pub fn unset_env(&mut self, key: &str) -> &mut Self {
        self.env.remove(key);
        self
    }

    /// Sets the working directory for commands added after this call.
    pub fn set_dir<P: Into<PathBuf>>(&mut self, dir: P) -> &mut Self {
        self.dir = Some(dir.into());
        self
    }

    /// Uses an in-memory value as the pipeline's input.
    pub fn set_input<B: Into<Vec<u8>>>(&mut self, input: B) -> &mut Self {
        self.set_stdin(Stream::Bytes(input.into()))
    }

    pub fn set_stdin(&mut self, stdin: Stream) -> &mut Self {
        self.streams.stdin = stdin;
        self
    }

    pub fn set_stdout(&mut self, stdout: Stream) -> &mut Self {
        self.streams.stdout = stdout;
        self
    }

    pub fn set_stderr(&mut self, stderr: Stream) -> &mut Self {
        self.streams.stderr = stderr;
        self
    }

    /// Limits the time that a pipeline may run. A zero duration disables the
    /// limit.
    pub fn set_timeout(&mut self, timeout: Duration) -> &mut Self {
        self.timeout = Some(timeout).filter(|timeout| !timeout.is_zero());
        self
    }

    /// Echoes each command to stderr before it is started.
    pub fn show_cmd(&mut self, enabled: bool) -> &mut Self {
        self.show_cmd = enabled;
        self
    }

    pub fn env(&self) -> &HashMap<String, String> {
        &self.env
    }

    pub fn pipeline(&self) -> &[Invocation] {
        &self.pipeline
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Executes the pipeline and returns the exit codes of its stages.
    ///
    /// A non-zero exit code is not considered an error.
    pub fn execute(&mut self) -> ExecResult<ExitInfo> {
        self.begin_execution()?;

        if self.show_cmd {
            let mut stderr = self.streams.stderr.diagnostic_writer()?;
            for invocation in &self.pipeline {
                writeln!(stderr, "{} {}", PROMPT, invocation).map_err(ExecError::Echo)?;
            }
            stderr.flush().map_err(ExecError::Echo)?;
        }

        PipelineExecutor::new(self.host.as_mut(), self.timeout)
            .execute(&self.pipeline, &mut self.streams)
    }

    /// Executes the pipeline. A non-zero exit code from the last stage is an
    /// error.
    pub fn run(&mut self) -> ExecResult<()> {
        let info = self.execute()?;
        if info.success() {
            return Ok(());
        }

        let program = self
            .pipeline
            .last()
            .map(|invocation| invocation.program().to_owned())
            .unwrap_or_default();
        Err(ExecError::ExitStatus {
            program,
            code: info.code(),
            output: Vec::new(),
        })
    }

    /// Runs the pipeline and returns its stdout.
    ///
    /// If the last stage exits with a non-zero code, the captured stdout is
    /// returned in [`ExecError::ExitStatus`].
    pub fn output(&mut self) -> ExecResult<Vec<u8>> {
        self.output_to(Stream::buffer())
    }

    /// Runs the pipeline and returns its stdout and stderr, combined.
    pub fn combined_output(&mut self) -> ExecResult<Vec<u8>> {
        let buffer = Stream::buffer();
        let shared = buffer.try_clone().map_err(StreamError::CloneFailed)?;
        let stderr = std::mem::replace(&mut self.streams.stderr, shared);
        let result = self.output_to(buffer);
        self.streams.stderr = stderr;
        result
    }

    /// Runs the pipeline with stdout temporarily replaced by `buffer`.
    fn output_to(&mut self, buffer: Stream) -> ExecResult<Vec<u8>> {
        let stdout = std::mem::replace(&mut self.streams.stdout, buffer);
        let result = self.run();
        let captured = std::mem::replace(&mut self.streams.stdout, stdout)
            .take_buffer()
            .unwrap_or_default();

        match result {
            Ok(()) => Ok(captured),
            Err(ExecError::ExitStatus { program, code, .. }) => Err(ExecError::ExitStatus {
                program,
                code,
                output: captured,
            }),
            Err(error) => Err(error),
        }
    }

    /// Transition for adding a command.
    fn begin_command(&mut self) {
        if self.state == State::Started {
            self.pipeline.clear();
        }
        self.state = State::Building;
    }

    /// Transition for executing the pipeline.
    fn begin_execution(&mut self) -> ExecResult<()> {
        match self.state {
            State::Idle => Err(ExecError::EmptyPipeline),
            State::Building | State::Started => {
                self.state = State::Started;
                Ok(())
            }
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

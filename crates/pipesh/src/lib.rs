//! Build and run pipelines of external processes.
//!
//! ```no_run
//! use pipesh::{args, Dir};
//!
//! // Like `echo hello | wc -c`.
//! let count = pipesh::command("echo", ["hello"])
//!     .command("wc", ["-c"])
//!     .output()?;
//!
//! // Like `(cd /; pwd)`.
//! pipesh::command("pwd", args![Dir::new("/")]).run()?;
//! # Ok::<(), pipesh::ExecError>(())
//! ```

pub use pipesh_core::{
    args, env, AliasEntry, AliasTable, Arg, Dir, Env, Host, Invocation, InvocationBuilder,
    StdHost, Stream, StreamError,
};
pub use pipesh_exec::{
    ExecError, ExecResult, ExitInfo, PipelineExecutor, Session, StandardStreams, State,
    EXIT_GENERAL_ERROR, EXIT_SUCCESS,
};

/// Creates a new session with a single command.
pub fn command<I>(name: &str, args: I) -> Session
where
    I: IntoIterator,
    I::Item: Into<Arg>,
{
    let mut session = Session::new();
    session.command(name, args);
    session
}

/// Creates a new session that uses `input` as the input of its pipeline.
pub fn echo<S: Into<String>>(input: S) -> Session {
    let mut session = Session::new();
    session.set_input(input.into());
    session
}

/// Creates a new session that reads from the current process' stdin.
pub fn interactive_session() -> Session {
    Session::interactive()
}

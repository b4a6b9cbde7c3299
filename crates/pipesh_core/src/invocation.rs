use std::{
    collections::HashMap,
    fmt::Display,
    path::{Path, PathBuf},
    process,
};

use crate::{
    env::{merge_environment, split_entry},
    AliasTable, Arg, Directives,
};

/// A fully resolved process launch.
///
/// Invocations are immutable once built.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Invocation {
    program: String,
    args: Vec<String>,
    dir: Option<PathBuf>,
    env: Vec<String>,
}

impl Invocation {
    /// Returns the program name, after alias expansion.
    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Returns the working directory. `None` means the current process'
    /// working directory.
    pub fn dir(&self) -> Option<&Path> {
        self.dir.as_deref()
    }

    /// Returns the complete process environment as `NAME=VALUE` entries.
    pub fn env(&self) -> &[String] {
        &self.env
    }

    /// Returns a [`process::Command`] for this invocation.
    ///
    /// The command's environment is exactly [`Invocation::env()`]. Standard
    /// streams are left for the caller to configure.
    pub fn to_command(&self) -> process::Command {
        let mut cmd = process::Command::new(&self.program);
        cmd.args(&self.args);
        cmd.env_clear();
        cmd.envs(self.env.iter().map(|entry| split_entry(entry)));
        if let Some(dir) = &self.dir {
            cmd.current_dir(dir);
        }
        cmd
    }
}

impl Display for Invocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// Assembles an [`Invocation`] from a program name and a list of values.
pub struct InvocationBuilder {
    program: String,
    args: Vec<String>,
    directives: Directives,
}

impl InvocationBuilder {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            directives: Directives::default(),
        }
    }

    /// Resolves a single value into the invocation's arguments or directives.
    pub fn arg<A: Into<Arg>>(mut self, arg: A) -> Self {
        arg.into().resolve(&mut self.args, &mut self.directives);
        self
    }

    /// Resolves a sequence of values in order.
    pub fn args<I>(mut self, args: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Arg>,
    {
        for arg in args {
            arg.into().resolve(&mut self.args, &mut self.directives);
        }
        self
    }

    /// Finalizes the invocation.
    ///
    /// A directory directive takes precedence over `default_dir`. The
    /// environment is merged from `base`, `session_env` and any environment
    /// directives, in increasing order of precedence. Aliases are expanded
    /// last, so that alias arguments precede the resolved arguments.
    pub fn build<I, K, V>(
        self,
        default_dir: Option<&Path>,
        base: I,
        session_env: &HashMap<String, String>,
        aliases: &AliasTable,
    ) -> Invocation
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let Self {
            mut program,
            mut args,
            directives,
        } = self;

        let dir = directives
            .dir
            .or_else(|| default_dir.map(Path::to_path_buf));
        let env = merge_environment(base, session_env, &directives.env);
        aliases.expand(&mut program, &mut args);

        Invocation {
            program,
            args,
            dir,
            env,
        }
    }
}

use std::collections::HashMap;

use pipesh_core::{args, Dir};

use crate::{tests::utils::inert_host, ExecError, Session, State};

fn session() -> Session {
    Session::with_host(Box::new(inert_host()))
}

fn programs(session: &Session) -> Vec<&str> {
    session
        .pipeline()
        .iter()
        .map(|invocation| invocation.program())
        .collect()
}

#[test]
fn new_session_is_idle() {
    let session = session();
    assert_eq!(session.state(), State::Idle);
    assert!(session.pipeline().is_empty());
}

#[test]
fn new_session_inherits_path_only() {
    let session = session();
    let keys: Vec<_> = session.env().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["PATH"]);
}

#[test]
fn caller_env_replaces_inherited_env() {
    let session = session().with_env(HashMap::from([("LANG".to_owned(), "C".to_owned())]));
    let keys: Vec<_> = session.env().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["LANG"]);
}

#[test]
fn caller_env_reaches_invocations_on_any_host() {
    let mut session = session().with_env(HashMap::from([("LANG".to_owned(), "C".to_owned())]));
    session.command("env", args![]);

    let env = session.pipeline()[0].env();
    assert!(env.contains(&"LANG=C".to_owned()));
}

#[test]
fn commands_are_piped_in_call_order() {
    let mut session = session();
    session
        .command("a", args![])
        .command("b", args![])
        .command("c", args![]);

    assert_eq!(session.state(), State::Building);
    assert_eq!(programs(&session), vec!["a", "b", "c"]);
}

#[test]
fn empty_pipeline_is_not_executed() {
    let mut session = session();
    assert!(matches!(session.execute(), Err(ExecError::EmptyPipeline)));
    assert!(matches!(session.run(), Err(ExecError::EmptyPipeline)));
    assert!(matches!(session.output(), Err(ExecError::EmptyPipeline)));
    assert_eq!(session.state(), State::Idle);
}

#[test]
fn session_dir_applies_to_later_commands() {
    let mut session = session();
    session.command("before", args![]);
    session.set_dir("/tmp");
    session.command("after", args![]);
    session.command("override", args![Dir::new("/")]);

    let dirs: Vec<_> = session
        .pipeline()
        .iter()
        .map(|invocation| invocation.dir().map(|dir| dir.to_string_lossy().into_owned()))
        .collect();
    assert_eq!(
        dirs,
        vec![None, Some("/tmp".to_owned()), Some("/".to_owned())]
    );
}

#[test]
fn alias_is_resolved_when_command_is_added() {
    let mut session = session();
    session.alias("ll", "ls", ["-la"]);
    session.command("ll", ["/tmp"]).command("ls", ["-la", "/tmp"]);

    let pipeline = session.pipeline();
    assert_eq!(pipeline[0].program(), pipeline[1].program());
    assert_eq!(pipeline[0].args(), pipeline[1].args());
    assert_eq!(pipeline[0].dir(), pipeline[1].dir());
}

#[test]
fn session_env_is_part_of_invocation() {
    let mut session = session();
    session.set_env("PIPESH_TEST", "value");
    session.command("env", args![]);
    session.unset_env("PIPESH_TEST");
    session.command("env", args![]);

    let pipeline = session.pipeline();
    assert!(pipeline[0].env().contains(&"PIPESH_TEST=value".to_owned()));
    assert!(!pipeline[1]
        .env()
        .iter()
        .any(|entry| entry.starts_with("PIPESH_TEST=")));
}

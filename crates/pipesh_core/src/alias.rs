use std::collections::HashMap;

/// The expansion of an alias: a program followed by fixed leading arguments.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AliasEntry {
    pub program: String,
    pub args: Vec<String>,
}

/// Aliases keyed by their name.
///
/// Lookups are exact-name matches. Expansions are never expanded again.
#[derive(Clone, Debug, Default)]
pub struct AliasTable {
    aliases: HashMap<String, AliasEntry>,
}

impl AliasTable {
    /// Registers an alias. Any previous alias with the same name is replaced.
    pub fn register<I, S>(&mut self, alias: &str, program: &str, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let entry = AliasEntry {
            program: program.to_owned(),
            args: args.into_iter().map(Into::into).collect(),
        };
        self.aliases.insert(alias.to_owned(), entry);
    }

    /// Returns the expansion of an alias.
    pub fn resolve(&self, name: &str) -> Option<&AliasEntry> {
        self.aliases.get(name)
    }

    /// Removes an alias, returning its expansion.
    pub fn remove(&mut self, name: &str) -> Option<AliasEntry> {
        self.aliases.remove(name)
    }

    /// Replaces `program` by its alias expansion, if any, and prepends the
    /// alias' fixed arguments to `args`.
    pub fn expand(&self, program: &mut String, args: &mut Vec<String>) {
        if let Some(entry) = self.resolve(program) {
            *program = entry.program.clone();
            args.splice(0..0, entry.args.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_alias() {
        let mut table = AliasTable::default();
        table.register("ll", "ls", ["-l", "-a"]);

        let mut program = String::from("ll");
        let mut args = vec![String::from("/tmp")];
        table.expand(&mut program, &mut args);

        assert_eq!(program, "ls");
        assert_eq!(args, vec!["-l", "-a", "/tmp"]);
    }

    #[test]
    fn expand_unknown_is_noop() {
        let table = AliasTable::default();
        let mut program = String::from("ls");
        let mut args = vec![String::from("/")];
        table.expand(&mut program, &mut args);

        assert_eq!(program, "ls");
        assert_eq!(args, vec!["/"]);
    }

    #[test]
    fn expansion_is_not_recursive() {
        let mut table = AliasTable::default();
        table.register("a", "b", Vec::<String>::new());
        table.register("b", "c", ["-x"]);

        let mut program = String::from("a");
        let mut args = Vec::new();
        table.expand(&mut program, &mut args);

        assert_eq!(program, "b");
        assert!(args.is_empty());
    }

    #[test]
    fn register_replaces_and_remove() {
        let mut table = AliasTable::default();
        table.register("g", "git", ["status"]);
        table.register("g", "git", ["log"]);
        assert_eq!(table.resolve("g").map(|entry| entry.args.clone()), Some(vec!["log".into()]));

        assert!(table.remove("g").is_some());
        assert_eq!(table.resolve("g"), None);
    }
}

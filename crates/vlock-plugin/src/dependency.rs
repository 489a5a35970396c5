//! Dependency relations a plugin can declare on other plugins.

use std::fmt;

/// The six relations a plugin may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DependencyKind {
    /// Hooks of this plugin run after the named plugin's.
    Succeeds,
    /// Hooks of this plugin run before the named plugin's.
    Precedes,
    /// The named plugin is loaded as well; failing to load it is fatal.
    Requires,
    /// The named plugin must have been requested explicitly.
    Needs,
    /// Without the named plugin this plugin is dropped.
    Depends,
    /// The named plugin must not be loaded together with this one.
    Conflicts,
}

impl DependencyKind {
    /// All relations, in the order they are queried.
    pub const ALL: [Self; 6] = [
        Self::Succeeds,
        Self::Precedes,
        Self::Requires,
        Self::Needs,
        Self::Depends,
        Self::Conflicts,
    ];

    /// The relation's name, as used for module symbols and script arguments.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Succeeds => "succeeds",
            Self::Precedes => "precedes",
            Self::Requires => "requires",
            Self::Needs => "needs",
            Self::Depends => "depends",
            Self::Conflicts => "conflicts",
        }
    }

    /// Null-terminated symbol name exported by modules.
    pub fn symbol(self) -> &'static [u8] {
        match self {
            Self::Succeeds => b"succeeds\0",
            Self::Precedes => b"precedes\0",
            Self::Requires => b"requires\0",
            Self::Needs => b"needs\0",
            Self::Depends => b"depends\0",
            Self::Conflicts => b"conflicts\0",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for DependencyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The names a plugin lists under each relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependencies {
    lists: [Vec<String>; 6],
}

impl Dependencies {
    /// No declared relations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Names declared under `kind`.
    pub fn get(&self, kind: DependencyKind) -> &[String] {
        &self.lists[kind.index()]
    }

    /// Replaces the names declared under `kind`.
    pub fn set(&mut self, kind: DependencyKind, names: Vec<String>) {
        self.lists[kind.index()] = names;
    }

    /// Builder-style variant of [`Dependencies::set`].
    pub fn with<I, S>(mut self, kind: DependencyKind, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set(kind, names.into_iter().map(Into::into).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_are_terminated_names() {
        for kind in DependencyKind::ALL {
            let symbol = kind.symbol();
            assert_eq!(&symbol[..symbol.len() - 1], kind.as_str().as_bytes());
            assert_eq!(symbol.last(), Some(&0));
        }
    }

    #[test]
    fn lists_are_independent() {
        let deps = Dependencies::new()
            .with(DependencyKind::Requires, ["a", "b"])
            .with(DependencyKind::Conflicts, ["c"]);

        assert_eq!(deps.get(DependencyKind::Requires), ["a", "b"]);
        assert_eq!(deps.get(DependencyKind::Conflicts), ["c"]);
        assert!(deps.get(DependencyKind::Needs).is_empty());
    }
}

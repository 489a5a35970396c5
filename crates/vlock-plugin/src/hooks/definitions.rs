//! The lifecycle hooks dispatched to plugins.

use std::fmt;

/// Enumeration of all hook points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Hook {
    /// The screen is about to be locked.
    Start,
    /// The screen has been unlocked, or locking is being rolled back.
    End,
    /// The user asked for (or idled into) a screen saver.
    Save,
    /// A key was pressed while saving.
    SaveAbort,
}

impl Hook {
    /// Every hook, in declaration order.
    pub const ALL: [Self; 4] = [Self::Start, Self::End, Self::Save, Self::SaveAbort];

    /// Wire and symbol name of the hook.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "vlock_start",
            Self::End => "vlock_end",
            Self::Save => "vlock_save",
            Self::SaveAbort => "vlock_save_abort",
        }
    }

    /// Null-terminated symbol name exported by modules.
    pub fn symbol(self) -> &'static [u8] {
        match self {
            Self::Start => b"vlock_start\0",
            Self::End => b"vlock_end\0",
            Self::Save => b"vlock_save\0",
            Self::SaveAbort => b"vlock_save_abort\0",
        }
    }

    pub(crate) fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Hook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn symbols_match_names() {
        for hook in Hook::ALL {
            let symbol = hook.symbol();
            assert_eq!(&symbol[..symbol.len() - 1], hook.to_string().as_bytes());
            assert_eq!(symbol.last(), Some(&0));
        }
    }

    #[test]
    fn indices_are_distinct() {
        let mut seen = [false; 4];
        for hook in Hook::ALL {
            assert!(!std::mem::replace(&mut seen[hook.index()], true));
        }
    }
}

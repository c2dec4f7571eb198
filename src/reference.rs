use std::fmt::{Display, Formatter};

/// A reference to an SDD node owned by a [`SddManager`][crate::manager::SddManager].
///
/// # Terminal Values
///
/// - `SddId::FALSE` (⊥): the false terminal
/// - `SddId::TRUE` (⊤): the true terminal
///
/// Probabilistic TRUE nodes bound to a variable are ordinary (non-terminal) ids.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[repr(transparent)]
pub struct SddId(u32);

impl SddId {
    pub const FALSE: SddId = SddId(0);

    pub const TRUE: SddId = SddId(1);

    pub const fn new(index: u32) -> Self {
        SddId(index)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Returns the index for array access.
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Returns true for the two singleton terminals.
    pub const fn is_constant(self) -> bool {
        self.0 <= 1
    }

    pub const fn is_false(self) -> bool {
        self.0 == 0
    }

    pub const fn is_true(self) -> bool {
        self.0 == 1
    }
}

impl Display for SddId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.0 {
            0 => write!(f, "⊥"),
            1 => write!(f, "⊤"),
            _ => write!(f, "#{}", self.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminals() {
        assert!(SddId::FALSE.is_false());
        assert!(SddId::FALSE.is_constant());
        assert!(SddId::TRUE.is_true());
        assert!(!SddId::new(7).is_constant());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", SddId::FALSE), "⊥");
        assert_eq!(format!("{}", SddId::TRUE), "⊤");
        assert_eq!(format!("{}", SddId::new(42)), "#42");
    }
}

//! Type-safe wrappers for literals and vtree positions.
//!
//! Literals and vtree ids are both small integers in the file formats, so
//! they get their own newtypes here to keep them from being mixed up with
//! node handles or traversal indices.
use std::fmt;
use std::ops::Neg;

/// A signed literal over a 1-indexed variable.
///
/// Positive values denote the positive literal `x`, negative values denote `¬x`.
///
/// # Invariants
///
/// - The raw value is never 0 (variables are 1-indexed)
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Literal(i32);

impl Literal {
    /// Creates a literal from its signed representation.
    ///
    /// # Panics
    ///
    /// Panics if `value == 0`.
    pub fn new(value: i32) -> Self {
        assert_ne!(value, 0, "Literal must be non-zero");
        Literal(value)
    }

    /// Positive literal of `var`.
    pub fn positive(var: u32) -> Self {
        Literal::new(var as i32)
    }

    /// Negative literal of `var`.
    pub fn negative(var: u32) -> Self {
        Literal::new(-(var as i32))
    }

    /// Returns the variable of this literal.
    pub fn var(self) -> u32 {
        self.0.unsigned_abs()
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Returns the signed representation used by the file formats.
    pub fn get(self) -> i32 {
        self.0
    }
}

impl Neg for Literal {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Literal(-self.0)
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_negative() {
            write!(f, "¬x{}", self.var())
        } else {
            write!(f, "x{}", self.var())
        }
    }
}

/// A vtree node identifier.
///
/// The value is the in-order position of the node in its vtree, which is also
/// the id used by the libsdd `.vtree` and `.sdd` file formats.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct VtreeId(u32);

impl VtreeId {
    pub const fn new(position: u32) -> Self {
        VtreeId(position)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for VtreeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

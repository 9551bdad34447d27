use std::fmt::{Display, Formatter};
use std::ops::Neg;

/// Signed DIMACS-style literal: magnitude is the 1-based variable, sign is the polarity.
///
/// [`Lit::ZERO`] is not a literal but the "unassigned" marker used inside an
/// [`Assignment`](crate::assignment::Assignment).
#[derive(Debug, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
#[repr(transparent)]
pub struct Lit(i32);

impl Lit {
    pub const ZERO: Lit = Lit(0);

    pub const fn new(val: i32) -> Self {
        debug_assert!(val != 0, "literal must not be zero, use Lit::ZERO instead");
        Lit(val)
    }

    /// Literal of the variable at 0-based position `index`.
    pub const fn from_index(index: usize, positive: bool) -> Self {
        let var = index as i32 + 1;
        if positive {
            Lit(var)
        } else {
            Lit(-var)
        }
    }

    pub const fn get(self) -> i32 {
        self.0
    }

    pub const fn var(self) -> u32 {
        self.get().unsigned_abs()
    }

    /// 0-based position of the variable inside an assignment.
    pub const fn index(self) -> usize {
        debug_assert!(self.0 != 0, "Lit::ZERO has no index");
        self.var() as usize - 1
    }

    pub const fn sign(self) -> i32 {
        self.get().signum()
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.get())
    }
}

impl<L> From<&L> for Lit
where
    L: Into<Lit> + Copy,
{
    fn from(val: &L) -> Self {
        (*val).into()
    }
}

impl From<i32> for Lit {
    fn from(val: i32) -> Self {
        Self::new(val)
    }
}

// Into<i32>
impl From<Lit> for i32 {
    fn from(lit: Lit) -> Self {
        lit.get()
    }
}

// -Lit
impl Neg for Lit {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self::new(-self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lit_new() {
        let lit = Lit::new(42);
        assert_eq!(lit.get(), 42);
        assert_eq!(lit.var(), 42);
        assert_eq!(lit.index(), 41);
    }

    #[test]
    fn test_lit_display() {
        assert_eq!(format!("{}", Lit::new(-7)), "-7");
    }

    #[test]
    fn test_lit_from_index() {
        assert_eq!(Lit::from_index(0, true), Lit::new(1));
        assert_eq!(Lit::from_index(4, false), Lit::new(-5));
        assert!(!Lit::from_index(4, false).is_positive());
    }

    #[test]
    fn test_lit_from_i32_ref() {
        let lit: Lit = (&-3).into();
        assert_eq!(lit.sign(), -1);
        assert_eq!(lit.var(), 3);
    }

    #[test]
    fn test_lit_neg() {
        let lit = Lit::new(42);
        assert_eq!((-lit).get(), -42);
        assert_eq!(-(-lit), lit);
    }

    #[test]
    fn test_lit_zero() {
        assert!(Lit::ZERO.is_zero());
        assert!(!Lit::new(1).is_zero());
    }
}

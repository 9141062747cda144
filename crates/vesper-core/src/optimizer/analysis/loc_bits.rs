//! Fixed-capacity bitsets over tracked-location indices.
//!
//! The alias analysis assigns each tracked location a dense index below
//! [`LocBits::CAPACITY`]; conflict sets, category sets, and query answers
//! are all [`LocBits`] values, so set algebra is single-word bit math.

use std::fmt;
use std::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign};

/// A set of tracked-location indices, at most [`LocBits::CAPACITY`] of them.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct LocBits(u64);

impl LocBits {
    /// Upper bound on tracked locations per analysis run.
    pub const CAPACITY: u32 = 64;

    pub const EMPTY: LocBits = LocBits(0);

    pub fn single(index: u32) -> LocBits {
        debug_assert!(index < Self::CAPACITY);
        LocBits(1 << index)
    }

    pub fn set(&mut self, index: u32) {
        debug_assert!(index < Self::CAPACITY);
        self.0 |= 1 << index;
    }

    #[must_use]
    pub fn with(self, index: u32) -> LocBits {
        debug_assert!(index < Self::CAPACITY);
        LocBits(self.0 | (1 << index))
    }

    pub fn test(self, index: u32) -> bool {
        index < Self::CAPACITY && self.0 & (1 << index) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Iterate set indices in ascending order.
    pub fn iter(self) -> Indices {
        Indices(self.0)
    }
}

/// Iterator over the indices of a [`LocBits`].
pub struct Indices(u64);

impl Iterator for Indices {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        if self.0 == 0 {
            return None;
        }
        let index = self.0.trailing_zeros();
        self.0 &= self.0 - 1;
        Some(index)
    }
}

impl IntoIterator for LocBits {
    type Item = u32;
    type IntoIter = Indices;

    fn into_iter(self) -> Indices {
        self.iter()
    }
}

impl BitOr for LocBits {
    type Output = LocBits;
    fn bitor(self, rhs: LocBits) -> LocBits {
        LocBits(self.0 | rhs.0)
    }
}

impl BitOrAssign for LocBits {
    fn bitor_assign(&mut self, rhs: LocBits) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for LocBits {
    type Output = LocBits;
    fn bitand(self, rhs: LocBits) -> LocBits {
        LocBits(self.0 & rhs.0)
    }
}

impl BitAndAssign for LocBits {
    fn bitand_assign(&mut self, rhs: LocBits) {
        self.0 &= rhs.0;
    }
}

impl fmt::Display for LocBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (n, index) in self.iter().enumerate() {
            if n > 0 {
                write!(f, ",")?;
            }
            write!(f, "{index}")?;
        }
        write!(f, "}}")
    }
}

impl fmt::Debug for LocBits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_and_query() {
        let mut bits = LocBits::EMPTY;
        assert!(bits.is_empty());
        bits.set(0);
        bits.set(5);
        bits |= LocBits::single(63);

        assert!(bits.test(0));
        assert!(bits.test(5));
        assert!(bits.test(63));
        assert!(!bits.test(4));
        assert_eq!(bits.count(), 3);
        assert_eq!(bits.iter().collect::<Vec<_>>(), vec![0, 5, 63]);
    }

    #[test]
    fn test_intersection() {
        let a = LocBits::single(1).with(2).with(3);
        let b = LocBits::single(3).with(4);
        assert_eq!(a & b, LocBits::single(3));
        assert_eq!((a & b).count(), 1);
    }

    #[test]
    fn test_display() {
        assert_eq!(LocBits::EMPTY.to_string(), "{}");
        assert_eq!(LocBits::single(0).with(3).with(5).to_string(), "{0,3,5}");
    }
}

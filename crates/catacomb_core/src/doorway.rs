//! # Doorway Sets
//!
//! A compact set of [`Direction`]s, one bit per code. A doorway is either
//! present or absent; there is no third state.

use std::fmt;

use crate::direction::{Direction, Side, DIRECTION_COUNT};

/// Set of doorway directions.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct DoorwaySet {
    bits: u16,
}

impl DoorwaySet {
    /// Mask covering all 14 directions.
    const MASK: u16 = (1 << DIRECTION_COUNT) - 1;

    /// The empty set.
    #[inline]
    #[must_use]
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Builds a set from directions.
    #[must_use]
    pub fn of(directions: &[Direction]) -> Self {
        directions.iter().copied().collect()
    }

    /// Returns true if `direction` is in the set.
    #[inline]
    #[must_use]
    pub const fn contains(self, direction: Direction) -> bool {
        self.bits & (1 << direction.code()) != 0
    }

    /// Adds or removes `direction`.
    #[inline]
    pub fn set(&mut self, direction: Direction, present: bool) {
        if present {
            self.bits |= 1 << direction.code();
        } else {
            self.bits &= !(1 << direction.code());
        }
    }

    /// Adds `direction`.
    #[inline]
    pub fn insert(&mut self, direction: Direction) {
        self.set(direction, true);
    }

    /// Removes every direction.
    #[inline]
    pub fn clear(&mut self) {
        self.bits = 0;
    }

    /// Returns true if no direction is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.bits == 0
    }

    /// Number of directions present.
    #[inline]
    #[must_use]
    pub const fn len(self) -> usize {
        self.bits.count_ones() as usize
    }

    /// Returns true if every direction of `other` is also in `self`.
    #[inline]
    #[must_use]
    pub const fn is_superset(self, other: Self) -> bool {
        self.bits & other.bits == other.bits
    }

    /// Union of both sets.
    #[inline]
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self { bits: self.bits | other.bits }
    }

    /// Present directions in code order.
    pub fn iter(self) -> impl Iterator<Item = Direction> {
        Direction::ALL.into_iter().filter(move |d| self.contains(*d))
    }

    /// Present directions on `side`, clockwise.
    #[must_use]
    pub fn on_side(self, side: Side) -> Vec<Direction> {
        side.members()
            .iter()
            .copied()
            .filter(|d| self.contains(*d))
            .collect()
    }

    /// Every direction reflected across its face. See [`Direction::mirror`].
    #[must_use]
    pub fn mirrored(self) -> Self {
        self.iter().map(Direction::mirror).collect()
    }

    /// 14-byte presence vector indexed by direction code (1 = present).
    #[must_use]
    pub fn to_raw(self) -> [u8; DIRECTION_COUNT] {
        let mut raw = [0u8; DIRECTION_COUNT];
        for d in self.iter() {
            raw[d.index()] = 1;
        }
        raw
    }

    /// Reads a presence vector. Any non-zero byte counts as present; bytes
    /// past the 14th are ignored and missing bytes count as absent.
    #[must_use]
    pub fn from_raw(raw: &[u8]) -> Self {
        raw.iter()
            .take(DIRECTION_COUNT)
            .enumerate()
            .filter(|&(_, &b)| b != 0)
            .filter_map(|(code, _)| u8::try_from(code).ok().and_then(Direction::from_code))
            .collect()
    }

    /// Raw bit pattern (bit n = code n).
    #[inline]
    #[must_use]
    pub const fn bits(self) -> u16 {
        self.bits
    }

    /// Builds from a bit pattern, dropping bits above code 13.
    #[inline]
    #[must_use]
    pub const fn from_bits(bits: u16) -> Self {
        Self { bits: bits & Self::MASK }
    }
}

impl FromIterator<Direction> for DoorwaySet {
    fn from_iter<I: IntoIterator<Item = Direction>>(iter: I) -> Self {
        let mut set = Self::empty();
        for d in iter {
            set.insert(d);
        }
        set
    }
}

impl Extend<Direction> for DoorwaySet {
    fn extend<I: IntoIterator<Item = Direction>>(&mut self, iter: I) {
        for d in iter {
            self.insert(d);
        }
    }
}

impl fmt::Debug for DoorwaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl fmt::Display for DoorwaySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.iter().map(Direction::short_name).collect();
        write!(f, "{{{}}}", names.join(","))
    }
}

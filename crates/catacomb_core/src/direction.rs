//! # Direction Model
//!
//! Doorways sit on one of 14 discrete directions:
//!
//! ```text
//!              NNW  N  NNE
//!          WNW +----------+ ENE
//!            W |   room   | E        UP / DOWN on the ceiling / floor
//!          WSW +----------+ ESE
//!              SSW  S  SSE
//! ```
//!
//! The 12 horizontal directions are folded into 4 cardinal sides of 3
//! directions each. UP and DOWN form their own sides (top, bottom).
//!
//! ## Codes
//!
//! Codes 0 to 11 run clockwise from N, so rotation is plain modular
//! arithmetic. UP is 12, DOWN is 13. Codes index the 14-byte doorway vector
//! stored in template files and in the relational store.

use std::fmt;

/// Number of directions (and slots in a doorway vector).
pub const DIRECTION_COUNT: usize = 14;

/// Number of horizontal directions (the rotation ring).
pub const HORIZONTAL_COUNT: usize = 12;

/// One of the 14 doorway directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum Direction {
    /// North.
    N = 0,
    /// North by northeast.
    Nne = 1,
    /// East by northeast.
    Ene = 2,
    /// East.
    E = 3,
    /// East by southeast.
    Ese = 4,
    /// South by southeast.
    Sse = 5,
    /// South.
    S = 6,
    /// South by southwest.
    Ssw = 7,
    /// West by southwest.
    Wsw = 8,
    /// West.
    W = 9,
    /// West by northwest.
    Wnw = 10,
    /// North by northwest.
    Nnw = 11,
    /// Ceiling.
    Up = 12,
    /// Floor.
    Down = 13,
}

/// Rotation sense for [`Direction::rotate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rotation {
    /// N towards E.
    Clockwise,
    /// N towards W.
    CounterClockwise,
}

/// A face of a room: 4 cardinal faces plus top and bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Side {
    /// NNW, N, NNE.
    North = 0,
    /// ENE, E, ESE.
    East = 1,
    /// SSE, S, SSW.
    South = 2,
    /// WSW, W, WNW.
    West = 3,
    /// UP.
    Top = 4,
    /// DOWN.
    Bottom = 5,
}

/// Long names, indexed by code.
const LONG_NAMES: [&str; DIRECTION_COUNT] = [
    "north",
    "north-northeast",
    "east-northeast",
    "east",
    "east-southeast",
    "south-southeast",
    "south",
    "south-southwest",
    "west-southwest",
    "west",
    "west-northwest",
    "north-northwest",
    "up",
    "down",
];

/// Short names, indexed by code.
const SHORT_NAMES: [&str; DIRECTION_COUNT] = [
    "N", "NNE", "ENE", "E", "ESE", "SSE", "S", "SSW", "WSW", "W", "WNW", "NNW", "UP", "DOWN",
];

/// Members of each side, clockwise, indexed by side code.
const SIDE_MEMBERS: [&[Direction]; 6] = [
    &[Direction::Nnw, Direction::N, Direction::Nne],
    &[Direction::Ene, Direction::E, Direction::Ese],
    &[Direction::Sse, Direction::S, Direction::Ssw],
    &[Direction::Wsw, Direction::W, Direction::Wnw],
    &[Direction::Up],
    &[Direction::Down],
];

impl Direction {
    /// All directions in code order.
    pub const ALL: [Self; DIRECTION_COUNT] = [
        Self::N,
        Self::Nne,
        Self::Ene,
        Self::E,
        Self::Ese,
        Self::Sse,
        Self::S,
        Self::Ssw,
        Self::Wsw,
        Self::W,
        Self::Wnw,
        Self::Nnw,
        Self::Up,
        Self::Down,
    ];

    /// The four cardinal directions.
    pub const CARDINALS: [Self; 4] = [Self::N, Self::E, Self::S, Self::W];

    /// Stable integer code (0-13).
    #[inline]
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Slot in a doorway vector.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Converts from a code. Returns `None` outside 0-13.
    #[inline]
    #[must_use]
    pub const fn from_code(code: u8) -> Option<Self> {
        if (code as usize) < DIRECTION_COUNT {
            Some(Self::ALL[code as usize])
        } else {
            None
        }
    }

    /// Returns true for UP and DOWN.
    #[inline]
    #[must_use]
    pub const fn is_vertical(self) -> bool {
        matches!(self, Self::Up | Self::Down)
    }

    /// The side this direction belongs to.
    #[must_use]
    pub const fn side(self) -> Side {
        match self {
            Self::Nnw | Self::N | Self::Nne => Side::North,
            Self::Ene | Self::E | Self::Ese => Side::East,
            Self::Sse | Self::S | Self::Ssw => Side::South,
            Self::Wsw | Self::W | Self::Wnw => Side::West,
            Self::Up => Side::Top,
            Self::Down => Side::Bottom,
        }
    }

    /// Rotates around the vertical axis by `steps` positions of the
    /// 12-direction ring. UP and DOWN are fixed points.
    #[must_use]
    pub const fn rotate(self, rotation: Rotation, steps: usize) -> Self {
        if self.is_vertical() {
            return self;
        }
        let steps = steps % HORIZONTAL_COUNT;
        let code = self as usize;
        let rotated = match rotation {
            Rotation::Clockwise => (code + steps) % HORIZONTAL_COUNT,
            Rotation::CounterClockwise => (code + HORIZONTAL_COUNT - steps) % HORIZONTAL_COUNT,
        };
        Self::ALL[rotated]
    }

    /// Reflects this direction across the face it sits on.
    ///
    /// A doorway `d` on a neighbor lines up with `d.mirror()` on the room
    /// facing it: the side flips, the lateral offset along the face stays.
    #[must_use]
    pub const fn mirror(self) -> Self {
        match self {
            Self::N => Self::S,
            Self::Nne => Self::Sse,
            Self::Ene => Self::Wnw,
            Self::E => Self::W,
            Self::Ese => Self::Wsw,
            Self::Sse => Self::Nne,
            Self::S => Self::N,
            Self::Ssw => Self::Nnw,
            Self::Wsw => Self::Ese,
            Self::W => Self::E,
            Self::Wnw => Self::Ene,
            Self::Nnw => Self::Ssw,
            Self::Up => Self::Down,
            Self::Down => Self::Up,
        }
    }

    /// Long lowercase name (`north-northeast`).
    #[must_use]
    pub const fn name(self) -> &'static str {
        LONG_NAMES[self as usize]
    }

    /// Short uppercase name (`NNE`).
    #[must_use]
    pub const fn short_name(self) -> &'static str {
        SHORT_NAMES[self as usize]
    }

    /// Parses a long or short name, case-insensitive.
    ///
    /// Separators (`-`, `_`, space) are ignored in long names, so
    /// `north-northeast`, `NORTH_NORTH_EAST` and `NorthNorthEast` all parse.
    /// Returns `None` for anything else.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        let folded: String = name
            .chars()
            .filter(|c| !matches!(c, '-' | '_' | ' '))
            .map(|c| c.to_ascii_lowercase())
            .collect();
        if folded.is_empty() {
            return None;
        }

        Self::ALL.into_iter().find(|d| {
            d.short_name().eq_ignore_ascii_case(&folded) || d.name().replace('-', "") == folded
        })
    }

    /// Parses a batch of names.
    ///
    /// # Errors
    ///
    /// Returns every unparseable entry, in input order, if any entry fails.
    pub fn parse_list<S: AsRef<str>>(names: &[S]) -> Result<Vec<Self>, Vec<String>> {
        let mut parsed = Vec::with_capacity(names.len());
        let mut invalid = Vec::new();
        for name in names {
            match Self::parse(name.as_ref()) {
                Some(d) => parsed.push(d),
                None => invalid.push(name.as_ref().to_string()),
            }
        }
        if invalid.is_empty() {
            Ok(parsed)
        } else {
            Err(invalid)
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl Side {
    /// All sides.
    pub const ALL: [Self; 6] = [
        Self::North,
        Self::East,
        Self::South,
        Self::West,
        Self::Top,
        Self::Bottom,
    ];

    /// The four horizontal sides.
    pub const HORIZONTAL: [Self; 4] = [Self::North, Self::East, Self::South, Self::West];

    /// Side of a direction. Same as [`Direction::side`].
    #[inline]
    #[must_use]
    pub const fn of(direction: Direction) -> Self {
        direction.side()
    }

    /// Directions on this side, clockwise.
    #[inline]
    #[must_use]
    pub const fn members(self) -> &'static [Direction] {
        SIDE_MEMBERS[self as usize]
    }

    /// The facing side.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::North => Self::South,
            Self::South => Self::North,
            Self::East => Self::West,
            Self::West => Self::East,
            Self::Top => Self::Bottom,
            Self::Bottom => Self::Top,
        }
    }

    /// The direction at the middle of this side (N, E, S, W, UP, DOWN).
    #[must_use]
    pub const fn center(self) -> Direction {
        match self {
            Self::North => Direction::N,
            Self::East => Direction::E,
            Self::South => Direction::S,
            Self::West => Direction::W,
            Self::Top => Direction::Up,
            Self::Bottom => Direction::Down,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::North => "north",
            Self::East => "east",
            Self::South => "south",
            Self::West => "west",
            Self::Top => "top",
            Self::Bottom => "bottom",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_stable() {
        for (code, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.index(), code);
            assert_eq!(Direction::from_code(code as u8), Some(*d));
        }
        assert_eq!(Direction::from_code(14), None);
        assert_eq!(Direction::Up.code(), 12);
        assert_eq!(Direction::Down.code(), 13);
    }

    #[test]
    fn test_sides_partition_the_domain() {
        let mut seen = [0u8; DIRECTION_COUNT];
        for side in Side::ALL {
            for d in side.members() {
                assert_eq!(d.side(), side, "{d} listed under {side}");
                seen[d.index()] += 1;
            }
        }
        assert!(seen.iter().all(|&n| n == 1), "coverage: {seen:?}");
    }

    #[test]
    fn test_opposite_sides_are_inverses() {
        for side in Side::ALL {
            assert_ne!(side.opposite(), side);
            assert_eq!(side.opposite().opposite(), side);
        }
        assert_eq!(Side::North.opposite(), Side::South);
        assert_eq!(Side::East.opposite(), Side::West);
    }

    #[test]
    fn test_mirror_flips_side() {
        for d in Direction::ALL {
            assert_eq!(d.mirror().mirror(), d);
            assert_eq!(d.mirror().side(), d.side().opposite());
        }
        assert_eq!(Direction::Sse.mirror(), Direction::Nne);
        assert_eq!(Direction::Ssw.mirror(), Direction::Nnw);
        assert_eq!(Direction::Up.mirror(), Direction::Down);
    }

    #[test]
    fn test_rotation_ring() {
        assert_eq!(Direction::N.rotate(Rotation::Clockwise, 3), Direction::E);
        assert_eq!(Direction::N.rotate(Rotation::CounterClockwise, 3), Direction::W);
        assert_eq!(Direction::Nnw.rotate(Rotation::Clockwise, 1), Direction::N);
        assert_eq!(Direction::N.rotate(Rotation::CounterClockwise, 1), Direction::Nnw);
        assert_eq!(Direction::Up.rotate(Rotation::Clockwise, 5), Direction::Up);

        for d in Direction::ALL {
            assert_eq!(d.rotate(Rotation::Clockwise, 12), d);
            for steps in 0..24 {
                let there = d.rotate(Rotation::Clockwise, steps);
                assert_eq!(there.rotate(Rotation::CounterClockwise, steps), d);
            }
        }
    }

    #[test]
    fn test_quarter_turn_maps_sides() {
        for d in Direction::ALL.iter().filter(|d| !d.is_vertical()) {
            let turned = d.rotate(Rotation::Clockwise, 3);
            let expected = match d.side() {
                Side::North => Side::East,
                Side::East => Side::South,
                Side::South => Side::West,
                _ => Side::North,
            };
            assert_eq!(turned.side(), expected, "{d} -> {turned}");
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!(Direction::parse("n"), Some(Direction::N));
        assert_eq!(Direction::parse("NNE"), Some(Direction::Nne));
        assert_eq!(Direction::parse("north-northeast"), Some(Direction::Nne));
        assert_eq!(Direction::parse("NORTH_NORTH_EAST"), Some(Direction::Nne));
        assert_eq!(Direction::parse("WestSouthWest"), Some(Direction::Wsw));
        assert_eq!(Direction::parse("Down"), Some(Direction::Down));
        assert_eq!(Direction::parse("northish"), None);
        assert_eq!(Direction::parse(""), None);

        for d in Direction::ALL {
            assert_eq!(Direction::parse(d.name()), Some(d));
            assert_eq!(Direction::parse(d.short_name()), Some(d));
        }
    }

    #[test]
    fn test_parse_list_reports_every_bad_entry() {
        assert_eq!(
            Direction::parse_list(&["n", "up"]),
            Ok(vec![Direction::N, Direction::Up])
        );
        assert_eq!(
            Direction::parse_list(&["n", "sideways", "e", "nowhere"]),
            Err(vec!["sideways".to_string(), "nowhere".to_string()])
        );
    }
}

//! # Library Records
//!
//! Read-mostly catalog entries that live independently of any coordinate:
//! room templates, room sets and widgets.

use std::fmt;

use crate::doorway::DoorwaySet;
use crate::room::RoomKey;
use crate::themes::Themes;

/// Store-assigned id of a library template.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TemplateId(pub i64);

impl TemplateId {
    /// Interprets a stored id where 0 (or less) means "no template".
    #[must_use]
    pub const fn from_stored(raw: i64) -> Option<Self> {
        if raw > 0 {
            Some(Self(raw))
        } else {
            None
        }
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A library room template: what the assembly draws from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateRecord {
    /// Store id, `None` until first saved.
    pub id: Option<TemplateId>,
    /// Template file name, relative to the library directory.
    pub filename: String,
    /// Display name.
    pub name: String,
    /// Doorways the template exposes.
    pub doorways: DoorwaySet,
    /// Allowed themes.
    pub themes: Themes,
}

impl TemplateRecord {
    /// Creates an unsaved record.
    #[must_use]
    pub fn new(filename: impl Into<String>, name: impl Into<String>, doorways: DoorwaySet) -> Self {
        Self {
            id: None,
            filename: filename.into(),
            name: name.into(),
            doorways,
            themes: Themes::default(),
        }
    }

    /// Sets the themes.
    #[must_use]
    pub fn with_themes(mut self, themes: Themes) -> Self {
        self.themes = themes;
        self
    }

    /// Returns true if every doorway in `required` is present.
    #[must_use]
    pub fn satisfies(&self, required: DoorwaySet) -> bool {
        self.doorways.is_superset(required)
    }
}

/// A rectangular group of rooms handled as one unit.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoomSet {
    /// Store id, `None` until first saved.
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Lowest corner room.
    pub origin: RoomKey,
    /// Extent in rooms along X.
    pub size_x: u32,
    /// Extent in rooms along Y.
    pub size_y: u32,
    /// Extent in rooms along Z.
    pub size_z: u32,
}

impl RoomSet {
    /// Creates an unsaved room set.
    #[must_use]
    pub fn new(name: impl Into<String>, origin: RoomKey, size: (u32, u32, u32)) -> Self {
        Self {
            id: None,
            name: name.into(),
            origin,
            size_x: size.0,
            size_y: size.1,
            size_z: size.2,
        }
    }

    /// Number of rooms covered.
    #[must_use]
    pub const fn room_count(&self) -> u64 {
        self.size_x as u64 * self.size_y as u64 * self.size_z as u64
    }

    /// Returns true if `room` lies inside the set.
    #[must_use]
    pub fn contains(&self, room: &RoomKey) -> bool {
        let inside = |value: i64, origin: i64, size: u32| {
            value >= origin && value < origin + i64::from(size)
        };
        room.world == self.origin.world
            && inside(i64::from(room.x), i64::from(self.origin.x), self.size_x)
            && inside(i64::from(room.y), i64::from(self.origin.y), self.size_y)
            && inside(i64::from(room.z), i64::from(self.origin.z), self.size_z)
    }
}

/// A small decorative structure placed inside rooms.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Widget {
    /// Store id, `None` until first saved.
    pub id: Option<i64>,
    /// Display name.
    pub name: String,
    /// Template file name.
    pub filename: String,
    /// Allowed themes.
    pub themes: Themes,
}

impl Widget {
    /// Creates an unsaved widget.
    #[must_use]
    pub fn new(name: impl Into<String>, filename: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            filename: filename.into(),
            themes: Themes::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::direction::Direction;

    #[test]
    fn test_template_id_stored_form() {
        assert_eq!(TemplateId::from_stored(0), None);
        assert_eq!(TemplateId::from_stored(7), Some(TemplateId(7)));
        assert_eq!(TemplateId::from_stored(-2), None);
    }

    #[test]
    fn test_satisfies() {
        let record = TemplateRecord::new(
            "hall.room",
            "Hall",
            DoorwaySet::of(&[Direction::N, Direction::Down, Direction::E]),
        );
        assert!(record.satisfies(DoorwaySet::of(&[Direction::N, Direction::Down])));
        assert!(!record.satisfies(DoorwaySet::of(&[Direction::Up])));
    }

    #[test]
    fn test_room_set_contains() {
        let set = RoomSet::new("vault", RoomKey::new("w", 2, 4, -1), (2, 3, 2));
        assert_eq!(set.room_count(), 12);
        assert!(set.contains(&RoomKey::new("w", 3, 6, 0)));
        assert!(!set.contains(&RoomKey::new("w", 4, 6, 0)));
        assert!(!set.contains(&RoomKey::new("w", 2, 3, -1)));
        assert!(!set.contains(&RoomKey::new("other", 2, 4, -1)));
    }
}

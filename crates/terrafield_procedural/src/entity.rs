//! # Entity Index Types
//!
//! What the grid needs to know about the things it tracks.
//!
//! The grid never owns entities. An entity exposes its position and a
//! back-reference slot through [`Occupant`]; the grid reads the position and
//! writes the slot. Each cell records an [`Occupancy`] per member so that
//! proximity queries can answer without calling back into the entity.

use terrafield_shared::Vec2;

use crate::cell::CellCoord;

/// Stable identifier of a tracked entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

impl EntityId {
    /// Creates a new entity id.
    #[inline]
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id.
    #[inline]
    #[must_use]
    pub const fn value(self) -> u64 {
        self.0
    }
}

/// Capability tag carried by every occupancy record.
///
/// The index stores it for the behavior layer; it never branches on it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum EntityKind {
    /// Moving creature; consumes flow and steering queries.
    Animal = 0,
    /// Plant spawned by terrain generation.
    Plant = 1,
    /// Anything else.
    #[default]
    Other = 2,
}

/// One entity's membership record inside a cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Occupancy {
    /// Entity id.
    pub id: EntityId,
    /// Capability tag.
    pub kind: EntityKind,
    /// Position recorded at the last add/update.
    pub position: Vec2,
}

/// An entity the grid can index.
pub trait Occupant {
    /// Stable id; must not change while tracked.
    fn entity_id(&self) -> EntityId;

    /// Capability tag.
    fn kind(&self) -> EntityKind {
        EntityKind::Other
    }

    /// Current world position.
    fn position(&self) -> Vec2;

    /// Cell the grid last placed this entity in, or `None` if untracked.
    fn current_cell(&self) -> Option<CellCoord>;

    /// Written by the grid only.
    fn set_current_cell(&mut self, cell: Option<CellCoord>);

    /// Snapshot used for cell membership.
    fn occupancy(&self) -> Occupancy {
        Occupancy {
            id: self.entity_id(),
            kind: self.kind(),
            position: self.position(),
        }
    }
}

/// Minimal [`Occupant`]: an id, a kind, a position, and the back-reference.
///
/// Useful for hosts without their own entity type, and in tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Body {
    /// Entity id.
    pub id: EntityId,
    /// Capability tag.
    pub kind: EntityKind,
    /// World position.
    pub position: Vec2,
    cell: Option<CellCoord>,
}

impl Body {
    /// Creates an untracked body.
    #[must_use]
    pub const fn new(id: EntityId, kind: EntityKind, position: Vec2) -> Self {
        Self {
            id,
            kind,
            position,
            cell: None,
        }
    }

    /// Moves the body. Call `Grid::update_entity` afterwards.
    pub fn move_to(&mut self, position: Vec2) {
        self.position = position;
    }
}

impl Occupant for Body {
    fn entity_id(&self) -> EntityId {
        self.id
    }

    fn kind(&self) -> EntityKind {
        self.kind
    }

    fn position(&self) -> Vec2 {
        self.position
    }

    fn current_cell(&self) -> Option<CellCoord> {
        self.cell
    }

    fn set_current_cell(&mut self, cell: Option<CellCoord>) {
        self.cell = cell;
    }
}

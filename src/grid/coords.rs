//! Hex coordinates and directions
//!
//! Cells are addressed two ways: by offset column/row (storage order) and
//! by axial coordinates (distance math and neighbor stepping). Axial x runs
//! east, axial z runs north-east; the third cube coordinate y = -x - z is
//! derived on demand.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One of the six edge directions of a hex cell, starting north-east and
/// advancing clockwise.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HexDirection {
    NE = 0,
    E = 1,
    SE = 2,
    SW = 3,
    W = 4,
    NW = 5,
}

impl HexDirection {
    /// All six directions in dispatch order
    pub const ALL: [HexDirection; 6] = [
        HexDirection::NE,
        HexDirection::E,
        HexDirection::SE,
        HexDirection::SW,
        HexDirection::W,
        HexDirection::NW,
    ];

    #[inline]
    fn from_index(index: usize) -> HexDirection {
        Self::ALL[index % 6]
    }

    /// The direction pointing the opposite way
    #[inline]
    pub fn opposite(self) -> HexDirection {
        Self::from_index(self as usize + 3)
    }

    /// One step counterclockwise
    #[inline]
    pub fn previous(self) -> HexDirection {
        Self::from_index(self as usize + 5)
    }

    /// One step clockwise
    #[inline]
    pub fn next(self) -> HexDirection {
        Self::from_index(self as usize + 1)
    }

    /// Two steps counterclockwise
    #[inline]
    pub fn previous2(self) -> HexDirection {
        Self::from_index(self as usize + 4)
    }

    /// Two steps clockwise
    #[inline]
    pub fn next2(self) -> HexDirection {
        Self::from_index(self as usize + 2)
    }

    /// Axial (x, z) delta of one step in this direction
    #[inline]
    pub(crate) fn axial_delta(self) -> (i32, i32) {
        match self {
            HexDirection::NE => (0, 1),
            HexDirection::E => (1, 0),
            HexDirection::SE => (1, -1),
            HexDirection::SW => (0, -1),
            HexDirection::W => (-1, 0),
            HexDirection::NW => (-1, 1),
        }
    }
}

/// Relationship between the elevations of two adjacent cells
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexEdgeType {
    /// Same elevation
    Flat,
    /// Exactly one level apart; rendered as terraces
    Slope,
    /// More than one level apart; rendered as a sheer face
    Cliff,
}

impl HexEdgeType {
    /// Classify the edge between two elevations
    pub fn between(elevation1: i32, elevation2: i32) -> HexEdgeType {
        match (elevation1 - elevation2).abs() {
            0 => HexEdgeType::Flat,
            1 => HexEdgeType::Slope,
            _ => HexEdgeType::Cliff,
        }
    }
}

/// Axial hex coordinates
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HexCoordinates {
    x: i32,
    z: i32,
}

impl HexCoordinates {
    pub fn new(x: i32, z: i32) -> HexCoordinates {
        HexCoordinates { x, z }
    }

    /// Convert from offset (column, row) storage coordinates
    pub fn from_offset(x: i32, z: i32) -> HexCoordinates {
        HexCoordinates { x: x - z / 2, z }
    }

    #[inline]
    pub fn x(self) -> i32 {
        self.x
    }

    #[inline]
    pub fn z(self) -> i32 {
        self.z
    }

    /// Derived cube coordinate; the three always sum to zero
    #[inline]
    pub fn y(self) -> i32 {
        -self.x - self.z
    }

    /// Offset (column, row) equivalent of these coordinates
    pub fn to_offset(self) -> (i32, i32) {
        (self.x + self.z / 2, self.z)
    }

    /// Coordinates one step away in `direction`
    pub fn step(self, direction: HexDirection) -> HexCoordinates {
        let (dx, dz) = direction.axial_delta();
        HexCoordinates {
            x: self.x + dx,
            z: self.z + dz,
        }
    }

    /// Cell-hop distance to another coordinate.
    ///
    /// On wrapping maps (`wrap_size` > 0, in cells) the shorter of the
    /// direct route and the east/west wrapped routes wins.
    pub fn distance_to(self, other: HexCoordinates, wrap_size: i32) -> i32 {
        let horizontal = |other: HexCoordinates| -> i32 {
            (self.x - other.x).abs() + (self.y() - other.y()).abs()
        };

        let mut xy = horizontal(other);
        if wrap_size > 0 {
            let east = HexCoordinates::new(other.x + wrap_size, other.z);
            let wrapped = horizontal(east);
            if wrapped < xy {
                xy = wrapped;
            } else {
                let west = HexCoordinates::new(other.x - wrap_size, other.z);
                let wrapped = horizontal(west);
                if wrapped < xy {
                    xy = wrapped;
                }
            }
        }
        (xy + (self.z - other.z).abs()) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_arithmetic_wraps() {
        assert_eq!(HexDirection::NE.opposite(), HexDirection::SW);
        assert_eq!(HexDirection::NW.next(), HexDirection::NE);
        assert_eq!(HexDirection::NE.previous(), HexDirection::NW);
        assert_eq!(HexDirection::E.next2(), HexDirection::SW);
        assert_eq!(HexDirection::E.previous2(), HexDirection::NW);
    }

    #[test]
    fn opposite_deltas_cancel() {
        for d in HexDirection::ALL {
            let (dx, dz) = d.axial_delta();
            let (ox, oz) = d.opposite().axial_delta();
            assert_eq!((dx + ox, dz + oz), (0, 0));
        }
    }

    #[test]
    fn offset_round_trip() {
        for z in 0..8 {
            for x in 0..8 {
                let c = HexCoordinates::from_offset(x, z);
                assert_eq!(c.to_offset(), (x, z));
                assert_eq!(c.x() + c.y() + c.z(), 0);
            }
        }
    }

    #[test]
    fn distance_counts_hops() {
        let a = HexCoordinates::new(0, 0);
        assert_eq!(a.distance_to(HexCoordinates::new(3, 0), 0), 3);
        assert_eq!(a.distance_to(HexCoordinates::new(0, 2), 0), 2);
        // A mixed move that cube distance resolves to 3 hops
        assert_eq!(a.distance_to(HexCoordinates::new(2, 1), 0), 3);
        for d in HexDirection::ALL {
            assert_eq!(a.distance_to(a.step(d), 0), 1);
        }
    }

    #[test]
    fn wrapped_distance_takes_short_way_around() {
        let west_edge = HexCoordinates::from_offset(0, 0);
        let east_edge = HexCoordinates::from_offset(19, 0);
        assert_eq!(west_edge.distance_to(east_edge, 0), 19);
        assert_eq!(west_edge.distance_to(east_edge, 20), 1);
    }

    #[test]
    fn edge_type_classification() {
        assert_eq!(HexEdgeType::between(2, 2), HexEdgeType::Flat);
        assert_eq!(HexEdgeType::between(2, 3), HexEdgeType::Slope);
        assert_eq!(HexEdgeType::between(3, 2), HexEdgeType::Slope);
        assert_eq!(HexEdgeType::between(0, 4), HexEdgeType::Cliff);
    }
}

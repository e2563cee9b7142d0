//! Hierarchical cells on the unit sphere.
//!
//! The sphere is projected onto the six faces of a cube, each face is recursively split into four
//! children down to level 30, and every cell is numbered along a Hilbert curve. A [`CellId`] packs
//! the face (3 bits), the curve position and a trailing marker bit into a `u64`; its
//! [token](CellId::to_token) is the hex form with trailing zeros stripped, so coarser cells have
//! shorter tokens and a token prefix identifies an ancestor region.

mod lookup;
mod region;

pub use region::{Cap, LatLng, LatLngRect, SphericalLoop};

use lookup::{INVERT_MASK, LOOKUP, LOOKUP_BITS, SWAP_MASK};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Deepest cell level (leaf cells).
pub const MAX_LEVEL: u8 = 30;

const FACE_BITS: u32 = 3;
const POS_BITS: u32 = 2 * MAX_LEVEL as u32 + 1;
const MAX_SIZE: i64 = 1 << MAX_LEVEL;

/// Identifier of a cell at any level.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellId(u64);

impl CellId {
    /// Wraps a raw 64-bit id without validating it.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    /// Raw 64-bit id.
    pub fn raw(&self) -> u64 {
        self.0
    }

    /// Top level cell covering a whole cube face.
    pub fn from_face(face: u8) -> Self {
        Self(((face as u64) << POS_BITS) + lsb_for_level(0))
    }

    /// Leaf cell containing the given direction. The vector does not need to be normalized.
    pub fn from_point(point: &Vector3<f64>) -> Self {
        let (face, u, v) = xyz_to_face_uv(point);
        Self::from_face_ij(face, st_to_ij(uv_to_st(u)), st_to_ij(uv_to_st(v)))
    }

    /// Leaf cell containing the location.
    pub fn from_lat_lng(lat_lng: &LatLng) -> Self {
        Self::from_point(&lat_lng.to_point())
    }

    /// Leaf cell at the given face and leaf coordinates.
    pub fn from_face_ij(face: u8, i: i64, j: i64) -> Self {
        let mut n = (face as u64) << (POS_BITS - 1);
        let mut bits = face as usize & SWAP_MASK;
        let mask = (1 << LOOKUP_BITS) - 1;

        for k in (0..8).rev() {
            bits += (((i >> (k * LOOKUP_BITS)) as usize) & mask) << (LOOKUP_BITS + 2);
            bits += (((j >> (k * LOOKUP_BITS)) as usize) & mask) << 2;
            bits = LOOKUP.pos[bits] as usize;
            n |= ((bits >> 2) as u64) << (k * 2 * LOOKUP_BITS);
            bits &= SWAP_MASK | INVERT_MASK;
        }

        Self(n * 2 + 1)
    }

    /// Leaf cell for coordinates that may lie just outside of the face, wrapped onto the
    /// adjacent face.
    fn from_face_ij_wrap(face: u8, i: i64, j: i64) -> Self {
        let i = i.clamp(-1, MAX_SIZE);
        let j = j.clamp(-1, MAX_SIZE);

        let scale = 1.0 / MAX_SIZE as f64;
        let limit = 1.0 + f64::EPSILON;
        let u = (scale * ((i << 1) + 1 - MAX_SIZE) as f64).clamp(-limit, limit);
        let v = (scale * ((j << 1) + 1 - MAX_SIZE) as f64).clamp(-limit, limit);

        let (face, u, v) = xyz_to_face_uv(&face_uv_to_xyz(face, u, v));
        Self::from_face_ij(face, st_to_ij(0.5 * (u + 1.0)), st_to_ij(0.5 * (v + 1.0)))
    }

    fn from_face_ij_same(face: u8, i: i64, j: i64, same_face: bool) -> Self {
        if same_face {
            Self::from_face_ij(face, i, j)
        } else {
            Self::from_face_ij_wrap(face, i, j)
        }
    }

    /// Cube face of the cell, 0 to 5.
    pub fn face(&self) -> u8 {
        (self.0 >> POS_BITS) as u8
    }

    /// Lowest set bit, which encodes the level.
    pub fn lsb(&self) -> u64 {
        self.0 & self.0.wrapping_neg()
    }

    /// Subdivision level, 0 for face cells and [`MAX_LEVEL`] for leaves.
    pub fn level(&self) -> u8 {
        MAX_LEVEL - (self.0.trailing_zeros() / 2) as u8
    }

    /// Returns true if the face is in range and the level marker sits at an even bit.
    pub fn is_valid(&self) -> bool {
        self.face() < 6 && (self.lsb() & 0x1555_5555_5555_5555) != 0
    }

    /// Returns true for cells at [`MAX_LEVEL`].
    pub fn is_leaf(&self) -> bool {
        self.0 & 1 != 0
    }

    /// Ancestor at the given level. `level` must not be deeper than the cell itself.
    pub fn parent(&self, level: u8) -> Self {
        let lsb = lsb_for_level(level);
        Self((self.0 & lsb.wrapping_neg()) | lsb)
    }

    /// First leaf cell inside this cell.
    pub fn range_min(&self) -> Self {
        Self(self.0 - (self.lsb() - 1))
    }

    /// Last leaf cell inside this cell.
    pub fn range_max(&self) -> Self {
        Self(self.0 + (self.lsb() - 1))
    }

    /// Returns true if `other` is this cell or one of its descendants.
    pub fn contains(&self, other: &CellId) -> bool {
        self.range_min() <= *other && *other <= self.range_max()
    }

    /// Face, leaf coordinates and Hilbert curve orientation of the cell.
    pub fn face_ij_orientation(&self) -> (u8, i64, i64, usize) {
        let face = self.face();
        let mut orientation = face as usize & SWAP_MASK;
        let mut i = 0i64;
        let mut j = 0i64;
        let mut nbits = MAX_LEVEL as usize - 7 * LOOKUP_BITS;

        for k in (0..8).rev() {
            let shift = k * 2 * LOOKUP_BITS + 1;
            orientation += (((self.0 >> shift) as usize) & ((1 << (2 * nbits)) - 1)) << 2;
            orientation = LOOKUP.ij[orientation] as usize;
            i += ((orientation >> (LOOKUP_BITS + 2)) as i64) << (k * LOOKUP_BITS);
            j += (((orientation >> 2) & ((1 << LOOKUP_BITS) - 1)) as i64) << (k * LOOKUP_BITS);
            orientation &= SWAP_MASK | INVERT_MASK;
            nbits = LOOKUP_BITS;
        }

        if self.lsb() & 0x1111_1111_1111_1110 != 0 {
            orientation ^= SWAP_MASK;
        }

        (face, i, j, orientation)
    }

    /// Cells at `level` that share the cell vertex closest to this cell.
    ///
    /// Normally four cells are returned; three when the vertex is a cube corner. `level` must be
    /// coarser than the level of this cell.
    pub fn vertex_neighbors(&self, level: u8) -> Vec<CellId> {
        let half_size = size_ij(level + 1);
        let size = half_size << 1;
        let (face, i, j, _) = self.face_ij_orientation();

        let (i_offset, i_same) = if i & half_size != 0 {
            (size, i + size < MAX_SIZE)
        } else {
            (-size, i - size >= 0)
        };
        let (j_offset, j_same) = if j & half_size != 0 {
            (size, j + size < MAX_SIZE)
        } else {
            (-size, j - size >= 0)
        };

        let mut neighbors = vec![
            self.parent(level),
            Self::from_face_ij_same(face, i + i_offset, j, i_same).parent(level),
            Self::from_face_ij_same(face, i, j + j_offset, j_same).parent(level),
        ];

        if i_same || j_same {
            neighbors.push(
                Self::from_face_ij_same(face, i + i_offset, j + j_offset, i_same && j_same)
                    .parent(level),
            );
        }

        neighbors
    }

    /// Hex form of the id without trailing zeros; `"X"` for the zero id.
    pub fn to_token(&self) -> String {
        let hex = format!("{:016x}", self.0);
        let token = hex.trim_end_matches('0');
        if token.is_empty() {
            "X".to_string()
        } else {
            token.to_string()
        }
    }

    /// All six face cells.
    pub fn faces() -> Vec<CellId> {
        (0..6).map(Self::from_face).collect()
    }
}

impl Display for CellId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_token())
    }
}

fn lsb_for_level(level: u8) -> u64 {
    1 << (2 * (MAX_LEVEL - level) as u64)
}

fn size_ij(level: u8) -> i64 {
    1 << (MAX_LEVEL - level)
}

fn uv_to_st(u: f64) -> f64 {
    if u >= 0.0 {
        0.5 * (1.0 + 3.0 * u).sqrt()
    } else {
        1.0 - 0.5 * (1.0 - 3.0 * u).sqrt()
    }
}

fn st_to_ij(s: f64) -> i64 {
    ((MAX_SIZE as f64 * s).floor() as i64).clamp(0, MAX_SIZE - 1)
}

fn face_of(point: &Vector3<f64>) -> u8 {
    let (ax, ay, az) = (point.x.abs(), point.y.abs(), point.z.abs());
    let axis = if ax > ay {
        if ax > az {
            0
        } else {
            2
        }
    } else if ay > az {
        1
    } else {
        2
    };

    if point[axis] < 0.0 {
        axis as u8 + 3
    } else {
        axis as u8
    }
}

fn valid_face_xyz_to_uv(face: u8, p: &Vector3<f64>) -> (f64, f64) {
    match face {
        0 => (p.y / p.x, p.z / p.x),
        1 => (-p.x / p.y, p.z / p.y),
        2 => (-p.x / p.z, -p.y / p.z),
        3 => (p.z / p.x, p.y / p.x),
        4 => (p.z / p.y, -p.x / p.y),
        _ => (-p.y / p.z, -p.x / p.z),
    }
}

fn xyz_to_face_uv(point: &Vector3<f64>) -> (u8, f64, f64) {
    let face = face_of(point);
    let (u, v) = valid_face_xyz_to_uv(face, point);
    (face, u, v)
}

fn face_uv_to_xyz(face: u8, u: f64, v: f64) -> Vector3<f64> {
    match face {
        0 => Vector3::new(1.0, u, v),
        1 => Vector3::new(-u, 1.0, v),
        2 => Vector3::new(-u, -v, 1.0),
        3 => Vector3::new(-1.0, -v, -u),
        4 => Vector3::new(v, -1.0, -u),
        _ => Vector3::new(v, u, -1.0),
    }
}

const _: () = assert!(FACE_BITS + POS_BITS == 64);

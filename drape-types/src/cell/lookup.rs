//! Hilbert curve lookup tables translating between `(i, j)` leaf coordinates and curve positions,
//! four bits of each coordinate at a time.

use lazy_static::lazy_static;

pub(super) const LOOKUP_BITS: usize = 4;
pub(super) const SWAP_MASK: usize = 0x01;
pub(super) const INVERT_MASK: usize = 0x02;

const TABLE_SIZE: usize = 1 << (2 * LOOKUP_BITS + 2);

const POS_TO_IJ: [[usize; 4]; 4] = [[0, 1, 3, 2], [0, 2, 3, 1], [3, 2, 0, 1], [3, 1, 0, 2]];
const POS_TO_ORIENTATION: [usize; 4] = [SWAP_MASK, 0, 0, INVERT_MASK | SWAP_MASK];

pub(super) struct Lookup {
    pub pos: [u16; TABLE_SIZE],
    pub ij: [u16; TABLE_SIZE],
}

lazy_static! {
    pub(super) static ref LOOKUP: Lookup = Lookup::build();
}

impl Lookup {
    fn build() -> Self {
        let mut lookup = Self {
            pos: [0; TABLE_SIZE],
            ij: [0; TABLE_SIZE],
        };

        for orientation in [0, SWAP_MASK, INVERT_MASK, SWAP_MASK | INVERT_MASK] {
            lookup.fill(0, 0, 0, orientation, 0, orientation);
        }

        lookup
    }

    fn fill(
        &mut self,
        level: usize,
        i: usize,
        j: usize,
        orig_orientation: usize,
        pos: usize,
        orientation: usize,
    ) {
        if level == LOOKUP_BITS {
            let ij = (i << LOOKUP_BITS) + j;
            self.pos[(ij << 2) + orig_orientation] = ((pos << 2) + orientation) as u16;
            self.ij[(pos << 2) + orig_orientation] = ((ij << 2) + orientation) as u16;
            return;
        }

        let r = POS_TO_IJ[orientation];
        for (index, step) in r.iter().enumerate() {
            self.fill(
                level + 1,
                (i << 1) + (step >> 1),
                (j << 1) + (step & 1),
                orig_orientation,
                (pos << 2) + index,
                orientation ^ POS_TO_ORIENTATION[index],
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tables_are_inverse() {
        for ij in 0..(1 << (2 * LOOKUP_BITS)) {
            for orientation in 0..4 {
                let pos = LOOKUP.pos[(ij << 2) + orientation] as usize;
                let back = LOOKUP.ij[((pos >> 2) << 2) + orientation] as usize;
                assert_eq!(back >> 2, ij);
                assert_eq!(back & 3, pos & 3);
            }
        }
    }
}

use ndarray::{Array2, ArrayView2};

/// 4-neighbourhood offsets (row, column)
const NEIGHBOURS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Counter of contiguous burn patches in a classification mask.
///
/// Keeps its work buffers between calls so that counting patches for every
/// cell of a tile does not allocate per cell once the largest window size
/// has been seen.
#[derive(Debug, Default)]
pub struct PatchCounter {
    pending: Array2<bool>,
    stack: Vec<(usize, usize)>,
}

impl PatchCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of maximal 4-connected groups of `true` cells in `mask`.
    ///
    /// Diagonal neighbours do not join patches. `mask` is copied and never
    /// modified.
    pub fn count(&mut self, mask: ArrayView2<bool>) -> usize {
        if self.pending.dim() == mask.dim() {
            self.pending.assign(&mask);
        } else {
            self.pending = mask.to_owned();
        }
        self.stack.clear();

        let (rows, cols) = self.pending.dim();
        let mut patches = 0;
        for row in 0..rows {
            for col in 0..cols {
                if self.pending[[row, col]] {
                    patches += 1;
                    self.clear_patch(row, col);
                }
            }
        }
        patches
    }

    /// Clear every cell 4-connected to `(row, col)` using an explicit stack
    fn clear_patch(&mut self, row: usize, col: usize) {
        let (rows, cols) = self.pending.dim();
        self.pending[[row, col]] = false;
        self.stack.push((row, col));

        while let Some((r, c)) = self.stack.pop() {
            for (dr, dc) in NEIGHBOURS {
                let nr = r as isize + dr;
                let nc = c as isize + dc;
                if nr < 0 || nc < 0 || nr >= rows as isize || nc >= cols as isize {
                    continue;
                }
                let (nr, nc) = (nr as usize, nc as usize);
                if self.pending[[nr, nc]] {
                    self.pending[[nr, nc]] = false;
                    self.stack.push((nr, nc));
                }
            }
        }
    }
}

/// Count 4-connected patches of `true` cells
pub fn count_patches(mask: ArrayView2<bool>) -> usize {
    PatchCounter::new().count(mask)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Array2};

    #[test]
    fn test_empty_mask() {
        let mask = Array2::from_elem((5, 5), false);
        assert_eq!(count_patches(mask.view()), 0);
        assert_eq!(count_patches(Array2::<bool>::from_elem((0, 0), false).view()), 0);
    }

    #[test]
    fn test_single_block() {
        let mut mask = Array2::from_elem((5, 5), false);
        for r in 1..4 {
            for c in 1..4 {
                mask[[r, c]] = true;
            }
        }
        assert_eq!(count_patches(mask.view()), 1);
    }

    #[test]
    fn test_diagonal_cells_are_separate() {
        let mask = array![[true, false], [false, true]];
        assert_eq!(count_patches(mask.view()), 2);
    }

    #[test]
    fn test_horizontal_neighbours_join() {
        let mask = array![[false, false, false], [true, true, false]];
        assert_eq!(count_patches(mask.view()), 1);
    }

    #[test]
    fn test_mask_is_not_modified() {
        let mask = array![[true, true], [false, true]];
        let before = mask.clone();
        let mut counter = PatchCounter::new();
        assert_eq!(counter.count(mask.view()), 1);
        assert_eq!(mask, before);
        // buffers are reused for a second mask of the same shape
        assert_eq!(counter.count(array![[true, false], [false, false]].view()), 1);
    }

    #[test]
    fn test_large_spiral_does_not_overflow() {
        // one snake-shaped patch covering most of a 1381x1381 window
        let n = 1381;
        let mut mask = Array2::from_elem((n, n), false);
        for r in (0..n).step_by(2) {
            for c in 0..n {
                mask[[r, c]] = true;
            }
            if r + 1 < n {
                let link = if (r / 2) % 2 == 0 { n - 1 } else { 0 };
                mask[[r + 1, link]] = true;
            }
        }
        assert_eq!(count_patches(mask.view()), 1);
    }

    #[test]
    fn test_checkerboard() {
        let mask = Array2::from_shape_fn((6, 6), |(r, c)| (r + c) % 2 == 0);
        assert_eq!(count_patches(mask.view()), 18);
    }
}

use crate::grid::Grid;

/// Number of cells scanned around a pixel's own cell, itself included.
pub(crate) const NEIGHBORHOOD: usize = 9;

impl Grid {
    /// Cell owning the point. Points past the far edge clamp to the last cell.
    pub(crate) fn cell_of(&self, x: f32, y: f32) -> (usize, usize) {
        let (cw, ch) = self.cell_size();
        let o = self.origin();
        let col = ((x - o.x) / cw).floor().max(0.0) as usize;
        let row = ((y - o.y) / ch).floor().max(0.0) as usize;
        (col.min(self.cols() - 1), row.min(self.rows() - 1))
    }

    /// The 3x3 block centered on `(col, row)`, wrapping around both edges
    /// of each axis. On a grid narrower than 3 some entries repeat.
    pub(crate) fn neighborhood(&self, col: usize, row: usize) -> [(usize, usize); NEIGHBORHOOD] {
        let mut out = [(0, 0); NEIGHBORHOOD];
        let mut i = 0;
        for dr in -1..=1 {
            for dc in -1..=1 {
                out[i] = (
                    wrap(col as isize + dc, self.cols()),
                    wrap(row as isize + dr, self.rows()),
                );
                i += 1;
            }
        }
        out
    }
}

fn wrap(i: isize, n: usize) -> usize {
    i.rem_euclid(n as isize) as usize
}

use rand::Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub(crate) struct Vec2 {
    pub(crate) x: f32,
    pub(crate) y: f32,
}

impl Vec2 {
    pub(crate) fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
    pub(crate) fn add(self, o: Vec2) -> Self {
        Self::new(self.x + o.x, self.y + o.y)
    }
    pub(crate) fn dist2(self, o: Vec2) -> f32 {
        let dx = o.x - self.x;
        let dy = o.y - self.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned rectangle, half-open on the far edges.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Rect {
    pub(crate) x: f32,
    pub(crate) y: f32,
    pub(crate) w: f32,
    pub(crate) h: f32,
}

impl Rect {
    #[cfg(test)]
    pub(crate) fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x < self.x + self.w && p.y >= self.y && p.y < self.y + self.h
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Seed {
    pub(crate) pos: Vec2,
    pub(crate) vel: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Cell {
    pub(crate) bounds: Rect,
    pub(crate) seed: Seed,
}

impl Cell {
    /// Moves the seed one step and bounces it off the cell walls.
    ///
    /// The flip happens after the move, so a seed may sit up to one
    /// velocity step past a wall for a single frame before heading back.
    fn step(&mut self) {
        let b = self.bounds;
        let s = &mut self.seed;
        s.pos = s.pos.add(s.vel);

        if s.pos.x <= b.x || s.pos.x >= b.x + b.w {
            s.vel.x = -s.vel.x;
        }
        if s.pos.y <= b.y || s.pos.y >= b.y + b.h {
            s.vel.y = -s.vel.y;
        }
    }
}

/// Uniform partition of the render surface, one seed per cell.
///
/// Cells are stored row-major: `row * cols + col`.
pub(crate) struct Grid {
    cols: usize,
    rows: usize,
    origin: Vec2,
    cell_w: f32,
    cell_h: f32,
    cells: Vec<Cell>,
}

impl Grid {
    /// Splits `[min, max)` into `cols x rows` equal cells and drops a seed at a
    /// random spot in each, with both velocity components drawn from
    /// `[-max_speed, max_speed]`.
    pub(crate) fn new<R: Rng>(
        cols: usize,
        rows: usize,
        min: Vec2,
        max: Vec2,
        max_speed: f32,
        rng: &mut R,
    ) -> Self {
        let cell_w = (max.x - min.x) / cols as f32;
        let cell_h = (max.y - min.y) / rows as f32;

        let mut cells = Vec::with_capacity(cols * rows);
        for row in 0..rows {
            for col in 0..cols {
                let bounds = Rect {
                    x: min.x + col as f32 * cell_w,
                    y: min.y + row as f32 * cell_h,
                    w: cell_w,
                    h: cell_h,
                };
                let seed = Seed {
                    pos: random_point_in(bounds, rng),
                    vel: random_velocity(max_speed, rng),
                };
                cells.push(Cell { bounds, seed });
            }
        }

        Self {
            cols,
            rows,
            origin: min,
            cell_w,
            cell_h,
            cells,
        }
    }

    /// One frame of seed motion.
    pub(crate) fn advance(&mut self) {
        for cell in &mut self.cells {
            cell.step();
        }
    }

    /// Throws every seed to a fresh random spot and heading; bounds stay put.
    pub(crate) fn reseed<R: Rng>(&mut self, max_speed: f32, rng: &mut R) {
        for cell in &mut self.cells {
            cell.seed = Seed {
                pos: random_point_in(cell.bounds, rng),
                vel: random_velocity(max_speed, rng),
            };
        }
    }

    pub(crate) fn cols(&self) -> usize {
        self.cols
    }
    pub(crate) fn rows(&self) -> usize {
        self.rows
    }
    pub(crate) fn origin(&self) -> Vec2 {
        self.origin
    }
    pub(crate) fn cell_size(&self) -> (f32, f32) {
        (self.cell_w, self.cell_h)
    }

    pub(crate) fn cell(&self, col: usize, row: usize) -> &Cell {
        &self.cells[row * self.cols + col]
    }

    #[cfg(test)]
    pub(crate) fn cell_mut(&mut self, col: usize, row: usize) -> &mut Cell {
        &mut self.cells[row * self.cols + col]
    }

    pub(crate) fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter()
    }
}

fn random_point_in<R: Rng>(b: Rect, rng: &mut R) -> Vec2 {
    Vec2::new(
        rng.gen_range(b.x..b.x + b.w),
        rng.gen_range(b.y..b.y + b.h),
    )
}

fn random_velocity<R: Rng>(v: f32, rng: &mut R) -> Vec2 {
    if v <= 0.0 {
        return Vec2::default();
    }
    Vec2::new(rng.gen_range(-v..=v), rng.gen_range(-v..=v))
}

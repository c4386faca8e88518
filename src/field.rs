use crate::grid::{Grid, Vec2};
use anyhow::{Context, Result};

/// Knobs read by [`compute`] once per frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct RenderParams {
    pub(crate) divisor: i32,
    pub(crate) invert: bool,
}

impl Default for RenderParams {
    fn default() -> Self {
        Self {
            divisor: 7,
            invert: false,
        }
    }
}

impl RenderParams {
    pub(crate) fn raise_divisor(&mut self) {
        self.divisor = self.divisor.saturating_add(1);
    }
    pub(crate) fn lower_divisor(&mut self) {
        self.divisor = self.divisor.saturating_sub(1).max(1);
    }
    pub(crate) fn toggle_invert(&mut self) {
        self.invert = !self.invert;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Pixel {
    pub(crate) x: u32,
    pub(crate) y: u32,
    pub(crate) gray: u8,
}

impl Pixel {
    pub(crate) fn rgb(&self) -> (u8, u8, u8) {
        (self.gray, self.gray, self.gray)
    }
}

/// One entry per surface pixel, row-major. Positions are fixed at creation;
/// only `gray` changes from frame to frame.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct PixelBuffer {
    w: u32,
    h: u32,
    px: Vec<Pixel>,
}

impl PixelBuffer {
    pub(crate) fn new(w: u32, h: u32) -> Result<Self> {
        let n = (w as usize)
            .checked_mul(h as usize)
            .context("pixel buffer size overflows usize")?;

        let mut px = Vec::new();
        px.try_reserve_exact(n)
            .with_context(|| format!("allocating {}x{} pixel buffer", w, h))?;
        for y in 0..h {
            for x in 0..w {
                px.push(Pixel { x, y, gray: 0 });
            }
        }
        Ok(Self { w, h, px })
    }

    pub(crate) fn width(&self) -> u32 {
        self.w
    }
    pub(crate) fn height(&self) -> u32 {
        self.h
    }

    pub(crate) fn get(&self, x: u32, y: u32) -> &Pixel {
        &self.px[(y as usize) * (self.w as usize) + (x as usize)]
    }

    #[cfg(test)]
    pub(crate) fn pixels(&self) -> &[Pixel] {
        &self.px
    }
}

/// Smallest squared distance from `p` to a seed in its cell or the 8 around it.
pub(crate) fn nearest_dist2(grid: &Grid, p: Vec2) -> f32 {
    let (col, row) = grid.cell_of(p.x, p.y);
    grid.neighborhood(col, row)
        .iter()
        .map(|&(c, r)| p.dist2(grid.cell(c, r).seed.pos))
        .fold(f32::INFINITY, f32::min)
}

/// Maps a squared distance to a gray level.
pub(crate) fn intensity(dist2: f32, params: &RenderParams) -> u8 {
    let div = params.divisor.max(1) as f32;
    // `as` saturates, so huge distances land on i32::MAX instead of wrapping
    let mut v = (dist2 / div).floor() as i32;
    if params.invert {
        v = 255i32.saturating_sub(v);
    }
    v.clamp(0, 255) as u8
}

/// Recolors every pixel from the current seed positions.
pub(crate) fn compute(buf: &mut PixelBuffer, grid: &Grid, params: &RenderParams) {
    for p in &mut buf.px {
        let d = nearest_dist2(grid, Vec2::new(p.x as f32, p.y as f32));
        p.gray = intensity(d, params);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Seed;
    use rand::{rngs::StdRng, SeedableRng};
    use test_log::test;

    fn still(x: f32, y: f32) -> Seed {
        Seed {
            pos: Vec2::new(x, y),
            vel: Vec2::default(),
        }
    }

    fn two_by_two() -> Grid {
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = Grid::new(
            2,
            2,
            Vec2::default(),
            Vec2::new(100.0, 100.0),
            0.0,
            &mut rng,
        );
        g.cell_mut(0, 0).seed = still(10.0, 10.0);
        g.cell_mut(1, 0).seed = still(75.0, 25.0);
        g.cell_mut(0, 1).seed = still(25.0, 75.0);
        g.cell_mut(1, 1).seed = still(75.0, 75.0);
        g
    }

    fn default_grid(seed: u64) -> Grid {
        let mut rng = StdRng::seed_from_u64(seed);
        Grid::new(
            15,
            12,
            Vec2::default(),
            Vec2::new(1250.0, 700.0),
            0.6,
            &mut rng,
        )
    }

    #[test]
    fn buffer_positions_are_row_major() {
        let b = PixelBuffer::new(3, 2).unwrap();
        assert_eq!(b.pixels().len(), 6);
        assert_eq!((b.width(), b.height()), (3, 2));
        assert_eq!(b.pixels()[4], Pixel { x: 1, y: 1, gray: 0 });
        assert_eq!(b.get(2, 1).x, 2);
        assert_eq!(b.get(2, 1).y, 1);
    }

    #[test]
    fn near_pixel_is_darker_than_far_pixel() {
        let g = two_by_two();
        let mut b = PixelBuffer::new(100, 100).unwrap();
        let params = RenderParams {
            divisor: 1,
            invert: false,
        };
        compute(&mut b, &g, &params);
        assert!(b.get(5, 5).gray < b.get(95, 95).gray);
    }

    #[test]
    fn pixel_on_a_seed_is_black_or_white() {
        let g = two_by_two();
        let mut b = PixelBuffer::new(100, 100).unwrap();

        let mut params = RenderParams::default();
        compute(&mut b, &g, &params);
        assert_eq!(b.get(10, 10).gray, 0);

        params.toggle_invert();
        compute(&mut b, &g, &params);
        assert_eq!(b.get(10, 10).gray, 255);
    }

    #[test]
    fn nearest_looks_across_the_cell_wall() {
        let mut g = two_by_two();
        g.cell_mut(1, 0).seed = still(95.0, 45.0);
        // (52,10) lives in cell (1,0) but (0,0)'s seed is the closest
        let d = nearest_dist2(&g, Vec2::new(52.0, 10.0));
        assert_eq!(d, 42.0 * 42.0);
    }

    #[test]
    fn edge_cells_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(0);
        let mut g = Grid::new(
            4,
            1,
            Vec2::default(),
            Vec2::new(40.0, 10.0),
            0.0,
            &mut rng,
        );
        g.cell_mut(0, 0).seed = still(9.0, 5.0);
        g.cell_mut(1, 0).seed = still(19.0, 5.0);
        g.cell_mut(2, 0).seed = still(29.0, 5.0);
        g.cell_mut(3, 0).seed = still(30.0, 5.0);

        let mut b = PixelBuffer::new(40, 10).unwrap();
        compute(&mut b, &g, &RenderParams::default());
        assert_eq!(b.get(0, 5).gray, 81 / 7);
        assert_eq!(b.get(39, 5).gray, 81 / 7);
    }

    #[test]
    fn recompute_without_advance_is_idempotent() {
        let g = default_grid(11);
        let params = RenderParams::default();
        let mut a = PixelBuffer::new(250, 140).unwrap();
        let mut b = a.clone();
        compute(&mut a, &g, &params);
        compute(&mut b, &g, &params);
        compute(&mut b, &g, &params);
        assert_eq!(a, b);
    }

    #[test]
    fn advance_changes_the_field() {
        let mut g = default_grid(12);
        let params = RenderParams::default();
        let mut a = PixelBuffer::new(1250, 700).unwrap();
        compute(&mut a, &g, &params);
        let before = a.clone();
        for _ in 0..20 {
            g.advance();
        }
        compute(&mut a, &g, &params);
        assert_ne!(before, a);
    }

    #[test]
    fn compute_leaves_positions_alone() {
        let g = default_grid(13);
        let mut b = PixelBuffer::new(125, 70).unwrap();
        compute(&mut b, &g, &RenderParams::default());
        for (i, p) in b.pixels().iter().enumerate() {
            assert_eq!(p.x as usize, i % 125);
            assert_eq!(p.y as usize, i / 125);
        }
    }

    #[test]
    fn intensity_is_monotonic_in_distance() {
        for divisor in [1, 2, 7, 13, 100] {
            let params = RenderParams {
                divisor,
                invert: false,
            };
            let mut last = 0u8;
            let mut d = 0.0f32;
            while d < 5_000.0 {
                let v = intensity(d, &params);
                assert!(v >= last, "divisor {} at {}", divisor, d);
                last = v;
                d += 0.37;
            }
        }
    }

    #[test]
    fn invert_mirrors_the_raw_value() {
        let plain = RenderParams {
            divisor: 7,
            invert: false,
        };
        let inv = RenderParams {
            divisor: 7,
            invert: true,
        };
        for d in [0.0, 6.9, 7.0, 700.0, 1785.0, 1792.0, 20_000.0] {
            let raw = (d / 7.0f32).floor() as i32;
            assert_eq!(intensity(d, &plain) as i32, raw.clamp(0, 255));
            assert_eq!(intensity(d, &inv) as i32, (255 - raw).clamp(0, 255));
        }
    }

    #[test]
    fn floors_rather_than_rounds() {
        let params = RenderParams {
            divisor: 7,
            invert: false,
        };
        assert_eq!(intensity(13.9, &params), 1);
        assert_eq!(intensity(14.0, &params), 2);
    }

    #[test]
    fn extreme_inputs_stay_in_range() {
        for divisor in [i32::MIN, -3, 0, 1, i32::MAX] {
            for invert in [false, true] {
                let params = RenderParams { divisor, invert };
                for d in [0.0, 1.0, 1e9, f32::MAX, f32::INFINITY] {
                    let _ = intensity(d, &params);
                }
            }
        }
        let params = RenderParams {
            divisor: 1,
            invert: true,
        };
        assert_eq!(intensity(f32::INFINITY, &params), 0);
    }

    #[test]
    fn divisor_never_drops_below_one() {
        let mut p = RenderParams {
            divisor: 2,
            invert: false,
        };
        p.lower_divisor();
        p.lower_divisor();
        p.lower_divisor();
        assert_eq!(p.divisor, 1);
        p.raise_divisor();
        assert_eq!(p.divisor, 2);
    }
}

use anyhow::{bail, Result};
use clap::Parser;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

pub(crate) const SCREEN_WIDTH: u32 = 1250;
pub(crate) const SCREEN_HEIGHT: u32 = 700;
pub(crate) const GRID_COLS: usize = 15;
pub(crate) const GRID_ROWS: usize = 12;
pub(crate) const DIVISOR: i32 = 7;
pub(crate) const SEED_VELOCITY: f32 = 0.6;
pub(crate) const SPEED: f32 = 2.0;

#[derive(Parser, Debug)]
#[command(name = "organic-noise", about = "Moving Worley noise in the terminal")]
pub(crate) struct Args {
    /// field width in pixels
    #[arg(long, default_value_t = SCREEN_WIDTH)]
    width: u32,

    /// field height in pixels
    #[arg(long, default_value_t = SCREEN_HEIGHT)]
    height: u32,

    /// grid columns (one seed per cell)
    #[arg(long, default_value_t = GRID_COLS)]
    cols: usize,

    /// grid rows
    #[arg(long, default_value_t = GRID_ROWS)]
    rows: usize,

    /// distance divisor (bigger = darker, softer falloff)
    #[arg(long, default_value_t = DIVISOR)]
    divisor: i32,

    /// start with inverted polarity
    #[arg(long)]
    invert: bool,

    /// max seed speed per axis, in pixels per frame
    #[arg(long, default_value_t = SEED_VELOCITY)]
    velocity: f32,

    /// initial value of the speed readout
    #[arg(long, default_value_t = SPEED)]
    speed: f32,

    /// rng seed (defaults to wall clock)
    #[arg(long)]
    seed: Option<u64>,

    /// frame cap, 0 = uncapped
    #[arg(long, default_value_t = 0)]
    max_fps: u32,

    /// start with the grid overlay on
    #[arg(long)]
    grid: bool,

    /// hide the status line on start
    #[arg(long)]
    no_hud: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Settings {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) cols: usize,
    pub(crate) rows: usize,
    pub(crate) divisor: i32,
    pub(crate) invert: bool,
    pub(crate) velocity: f32,
    pub(crate) speed: f32,
    pub(crate) seed: u64,
    pub(crate) max_fps: u32,
    pub(crate) show_grid: bool,
    pub(crate) show_hud: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            width: SCREEN_WIDTH,
            height: SCREEN_HEIGHT,
            cols: GRID_COLS,
            rows: GRID_ROWS,
            divisor: DIVISOR,
            invert: false,
            velocity: SEED_VELOCITY,
            speed: SPEED,
            seed: 0xC0FFEE_u64,
            max_fps: 0,
            show_grid: false,
            show_hud: true,
        }
    }
}

impl Settings {
    pub(crate) fn from_args(args: Args) -> Result<Self> {
        let seed = args.seed.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .unwrap_or(Duration::from_secs(0))
                .as_secs()
        });

        let s = Self {
            width: args.width,
            height: args.height,
            cols: args.cols,
            rows: args.rows,
            divisor: args.divisor,
            invert: args.invert,
            velocity: args.velocity,
            speed: args.speed,
            seed,
            max_fps: args.max_fps,
            show_grid: args.grid,
            show_hud: !args.no_hud,
        };
        s.validate()?;
        Ok(s)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        if self.width == 0 || self.height == 0 {
            bail!("surface must be at least 1x1, got {}x{}", self.width, self.height);
        }
        if self.cols == 0 || self.rows == 0 {
            bail!("grid must be at least 1x1, got {}x{}", self.cols, self.rows);
        }
        if self.cols > self.width as usize || self.rows > self.height as usize {
            bail!(
                "grid {}x{} is finer than the {}x{} surface",
                self.cols,
                self.rows,
                self.width,
                self.height
            );
        }
        if self.divisor < 1 {
            bail!("divisor must be >= 1, got {}", self.divisor);
        }
        if !self.velocity.is_finite() || self.velocity < 0.0 {
            bail!("velocity must be a finite, non-negative number");
        }
        Ok(())
    }

    pub(crate) fn frame_budget(&self) -> Option<Duration> {
        if self.max_fps == 0 {
            None
        } else {
            Some(Duration::from_nanos(1_000_000_000 / self.max_fps as u64))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    fn parse(argv: &[&str]) -> Result<Settings> {
        let mut full = vec!["organic-noise"];
        full.extend_from_slice(argv);
        Settings::from_args(Args::try_parse_from(full)?)
    }

    #[test]
    fn defaults_match_startup_constants() {
        let s = parse(&["--seed", "1"]).unwrap();
        assert_eq!(s.width, 1250);
        assert_eq!(s.height, 700);
        assert_eq!((s.cols, s.rows), (15, 12));
        assert_eq!(s.divisor, 7);
        assert!(!s.invert);
        assert_eq!(s.velocity, 0.6);
        assert_eq!(s.seed, 1);
        assert!(s.show_hud);
        assert!(!s.show_grid);
        assert_eq!(s.frame_budget(), None);
    }

    #[test]
    fn flags_override_defaults() {
        let s = parse(&[
            "--width", "200", "--height", "100", "--cols", "4", "--rows", "2", "--invert",
            "--grid", "--no-hud", "--max-fps", "50",
        ])
        .unwrap();
        assert_eq!((s.width, s.height, s.cols, s.rows), (200, 100, 4, 2));
        assert!(s.invert && s.show_grid && !s.show_hud);
        assert_eq!(s.frame_budget(), Some(Duration::from_millis(20)));
    }

    #[test]
    fn rejects_degenerate_dimensions() {
        assert!(parse(&["--width", "0"]).is_err());
        assert!(parse(&["--cols", "0"]).is_err());
        assert!(parse(&["--width", "10", "--cols", "11"]).is_err());
    }

    #[test]
    fn rejects_bad_divisor_and_velocity() {
        assert!(parse(&["--divisor", "0"]).is_err());
        assert!(parse(&["--velocity", "-1"]).is_err());
        assert!(Settings {
            velocity: f32::NAN,
            ..Settings::default()
        }
        .validate()
        .is_err());
    }
}

use crate::config::Settings;
use crate::field::{compute, PixelBuffer, RenderParams};
use crate::grid::{Grid, Vec2};
use crate::input::{collect_actions, Action};
use crate::render::Terminal;
use rand::{rngs::StdRng, SeedableRng};
use std::time::{Duration, Instant};

const SPEED_STEP: f32 = 0.1;

/// Everything the keyboard can change between frames.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Controls {
    pub(crate) params: RenderParams,
    pub(crate) paused: bool,
    /// Shown in the HUD only; seed motion is always one velocity step per frame.
    pub(crate) speed: f32,
    pub(crate) show_grid: bool,
    pub(crate) show_hud: bool,
    pub(crate) quit: bool,
    pub(crate) reseed: bool,
}

impl Controls {
    pub(crate) fn new(s: &Settings) -> Self {
        Self {
            params: RenderParams {
                divisor: s.divisor,
                invert: s.invert,
            },
            paused: false,
            speed: s.speed,
            show_grid: s.show_grid,
            show_hud: s.show_hud,
            quit: false,
            reseed: false,
        }
    }

    /// Resize is handled by the terminal, everything else lands here.
    pub(crate) fn apply(&mut self, a: Action) {
        match a {
            Action::Quit => self.quit = true,
            Action::ToggleGrid => self.show_grid = !self.show_grid,
            Action::ToggleInvert => self.params.toggle_invert(),
            Action::TogglePause => self.paused = !self.paused,
            Action::ToggleHud => self.show_hud = !self.show_hud,
            Action::SpeedUp => self.speed += SPEED_STEP,
            Action::SlowDown => self.speed -= SPEED_STEP,
            Action::RaiseDivisor => self.params.raise_divisor(),
            Action::LowerDivisor => self.params.lower_divisor(),
            Action::Reseed => self.reseed = true,
            Action::Resized(..) => {}
        }
    }

    fn hud(&self, fps: f32) -> String {
        format!(
            "divisor:{:<3} invert:{:<3} paused:{:<3} speed:{:<4.1} fps:{:<6.1}  (o/p divisor) (i invert) (space pause) (f/s speed) (g grid) (r reseed) (h hud) (q quit)",
            self.params.divisor,
            if self.params.invert { "on" } else { "off" },
            if self.paused { "yes" } else { "no" },
            self.speed,
            fps
        )
    }
}

/// Frames per second over half-second windows.
pub(crate) struct FpsCounter {
    window_start: Instant,
    frames: u32,
    fps: f32,
}

impl FpsCounter {
    const WINDOW: Duration = Duration::from_millis(500);

    pub(crate) fn new(now: Instant) -> Self {
        Self {
            window_start: now,
            frames: 0,
            fps: 0.0,
        }
    }

    /// Counts a frame. Returns the new rate when a window closes.
    pub(crate) fn tick(&mut self, now: Instant) -> Option<f32> {
        self.frames += 1;
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed < Self::WINDOW {
            return None;
        }
        self.fps = self.frames as f32 / elapsed.as_secs_f32();
        self.frames = 0;
        self.window_start = now;
        Some(self.fps)
    }

    pub(crate) fn fps(&self) -> f32 {
        self.fps
    }
}

/// The simulation half of the loop: seeds, pixels and the knobs that drive them.
pub(crate) struct Scene {
    pub(crate) grid: Grid,
    pub(crate) pixels: PixelBuffer,
    pub(crate) controls: Controls,
    rng: StdRng,
    velocity: f32,
}

impl Scene {
    pub(crate) fn new(s: &Settings) -> anyhow::Result<Self> {
        let mut rng = StdRng::seed_from_u64(s.seed);
        let grid = Grid::new(
            s.cols,
            s.rows,
            Vec2::new(0.0, 0.0),
            Vec2::new(s.width as f32, s.height as f32),
            s.velocity,
            &mut rng,
        );
        let pixels = PixelBuffer::new(s.width, s.height)?;
        let mut scene = Self {
            grid,
            pixels,
            controls: Controls::new(s),
            rng,
            velocity: s.velocity,
        };
        scene.recompute();
        Ok(scene)
    }

    /// One frame after input: move seeds unless paused, then rebuild the field.
    pub(crate) fn step(&mut self) {
        if self.controls.reseed {
            self.controls.reseed = false;
            self.grid.reseed(self.velocity, &mut self.rng);
            log::debug!("reseeded {} cells", self.grid.cols() * self.grid.rows());
        }
        if !self.controls.paused {
            self.grid.advance();
        }
        self.recompute();
    }

    fn recompute(&mut self) {
        compute(&mut self.pixels, &self.grid, &self.controls.params);
    }
}

pub(crate) fn run(settings: Settings) -> anyhow::Result<()> {
    log::info!(
        "surface {}x{}, grid {}x{}, divisor {}, seed {}",
        settings.width,
        settings.height,
        settings.cols,
        settings.rows,
        settings.divisor,
        settings.seed
    );

    let mut scene = Scene::new(&settings)?;
    let budget = settings.frame_budget();
    let surface = (settings.width, settings.height);

    let mut term = Terminal::begin()?;
    term.set_title("Organic Noise")?;
    let mut fps = FpsCounter::new(Instant::now());

    while !scene.controls.quit {
        let frame_start = Instant::now();

        for a in collect_actions()? {
            if let Action::Resized(c, r) = a {
                term.resize(c, r)?;
            }
            scene.controls.apply(a);
        }
        if scene.controls.quit {
            break;
        }

        scene.step();

        let top = if scene.controls.show_hud { 1 } else { 0 };
        if scene.controls.show_hud {
            let line = scene.controls.hud(fps.fps());
            term.cur.paint_text(0, &line);
        }
        term.cur.paint_field(&scene.pixels, top);
        if scene.controls.show_grid {
            term.cur.paint_grid(&scene.grid, surface, top);
        }
        term.present()?;

        if let Some(rate) = fps.tick(Instant::now()) {
            term.set_title(&format!("Organic Noise | Fps:{:.1}", rate))?;
        }

        if let Some(budget) = budget {
            let spent = frame_start.elapsed();
            if spent < budget {
                std::thread::sleep(budget - spent);
            }
        }
    }

    log::info!("bye");
    Ok(())
}

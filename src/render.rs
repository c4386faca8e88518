use crate::field::PixelBuffer;
use crate::grid::Grid;
use anyhow::Context;
use crossterm::{
    cursor, execute, queue,
    style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor},
    terminal::{
        self, BeginSynchronizedUpdate, Clear, ClearType, DisableLineWrap, EnableLineWrap,
        EndSynchronizedUpdate, EnterAlternateScreen, LeaveAlternateScreen, SetTitle,
    },
};
use std::io::{self, Write};

/// Upper half block: fg paints the top pixel row, bg the bottom one.
const HALF: char = '▀';

const OVERLAY_LINE: Color = Color::White;
const OVERLAY_SEED: Color = Color::Rgb { r: 255, g: 0, b: 0 };
const HUD_FG: Color = Color::Rgb { r: 210, g: 220, b: 245 };
const HUD_BG: Color = Color::Black;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct TermCell {
    pub(crate) ch: char,
    pub(crate) fg: Color,
    pub(crate) bg: Color,
}

impl Default for TermCell {
    fn default() -> Self {
        Self {
            ch: ' ',
            fg: Color::White,
            bg: Color::Black,
        }
    }
}

/// What the terminal should look like after the next flush.
pub(crate) struct Frame {
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    pub(crate) cells: Vec<TermCell>,
}

impl Frame {
    pub(crate) fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![TermCell::default(); (cols as usize) * (rows as usize)],
        }
    }

    fn idx(&self, x: u16, y: u16) -> usize {
        (y as usize) * (self.cols as usize) + (x as usize)
    }

    #[cfg(test)]
    pub(crate) fn get(&self, x: u16, y: u16) -> TermCell {
        self.cells[self.idx(x, y)]
    }

    fn set(&mut self, x: u16, y: u16, c: TermCell) {
        if x < self.cols && y < self.rows {
            let i = self.idx(x, y);
            self.cells[i] = c;
        }
    }

    /// Stamps a glyph over whatever is there, keeping the cell's background.
    fn stamp(&mut self, x: u16, y: u16, ch: char, fg: Color) {
        if x < self.cols && y < self.rows {
            let i = self.idx(x, y);
            self.cells[i].ch = ch;
            self.cells[i].fg = fg;
        }
    }

    /// Nearest-neighbour scale of the pixel buffer into rows `top..rows`,
    /// two pixel rows per terminal row.
    pub(crate) fn paint_field(&mut self, buf: &PixelBuffer, top: u16) {
        let view = Viewport::new(self.cols, self.rows, top, buf.width(), buf.height());
        if view.is_empty() {
            return;
        }

        for ty in 0..view.rows {
            let y_top = view.src_y(ty as u32 * 2);
            let y_bot = view.src_y(ty as u32 * 2 + 1);
            for tx in 0..self.cols {
                let x = view.src_x(tx as u32);
                let (tr, tg, tb) = buf.get(x, y_top).rgb();
                let (br, bg, bb) = buf.get(x, y_bot).rgb();
                self.set(
                    tx,
                    top + ty,
                    TermCell {
                        ch: HALF,
                        fg: Color::Rgb {
                            r: tr,
                            g: tg,
                            b: tb,
                        },
                        bg: Color::Rgb {
                            r: br,
                            g: bg,
                            b: bb,
                        },
                    },
                );
            }
        }
    }

    /// Cell outlines and seed markers on top of the field.
    pub(crate) fn paint_grid(&mut self, grid: &Grid, surface: (u32, u32), top: u16) {
        let view = Viewport::new(self.cols, self.rows, top, surface.0, surface.1);
        if view.is_empty() {
            return;
        }

        let (cw, ch) = grid.cell_size();
        let o = grid.origin();

        let mut line_cols = Vec::with_capacity(grid.cols() + 1);
        for k in 0..=grid.cols() {
            line_cols.push(view.term_x(o.x + k as f32 * cw));
        }
        let mut line_rows = Vec::with_capacity(grid.rows() + 1);
        for k in 0..=grid.rows() {
            line_rows.push(view.term_y(o.y + k as f32 * ch));
        }

        for &ty in &line_rows {
            for tx in 0..self.cols {
                self.stamp(tx, top + ty, '─', OVERLAY_LINE);
            }
        }
        for &tx in &line_cols {
            for ty in 0..view.rows {
                let glyph = if line_rows.contains(&ty) { '┼' } else { '│' };
                self.stamp(tx, top + ty, glyph, OVERLAY_LINE);
            }
        }

        for cell in grid.cells() {
            let p = cell.seed.pos;
            self.stamp(view.term_x(p.x), top + view.term_y(p.y), '●', OVERLAY_SEED);
        }
    }

    /// One status line at `y`, padded or cut to the frame width.
    pub(crate) fn paint_text(&mut self, y: u16, text: &str) {
        let mut chars = text.chars();
        for x in 0..self.cols {
            let ch = chars.next().unwrap_or(' ');
            self.set(
                x,
                y,
                TermCell {
                    ch,
                    fg: HUD_FG,
                    bg: HUD_BG,
                },
            );
        }
    }
}

/// Maps between surface pixels and the terminal rows below the HUD.
struct Viewport {
    cols: u16,
    rows: u16,
    src_w: u32,
    src_h: u32,
}

impl Viewport {
    fn new(cols: u16, rows: u16, top: u16, src_w: u32, src_h: u32) -> Self {
        Self {
            cols,
            rows: rows.saturating_sub(top),
            src_w,
            src_h,
        }
    }

    fn is_empty(&self) -> bool {
        self.cols == 0 || self.rows == 0 || self.src_w == 0 || self.src_h == 0
    }

    fn sub_rows(&self) -> u32 {
        self.rows as u32 * 2
    }

    fn src_x(&self, tx: u32) -> u32 {
        bucket_center(tx, self.cols as u32, self.src_w)
    }

    fn src_y(&self, sub: u32) -> u32 {
        bucket_center(sub, self.sub_rows(), self.src_h)
    }

    fn term_x(&self, x: f32) -> u16 {
        let t = (x / self.src_w as f32 * self.cols as f32).floor();
        (t.max(0.0) as u16).min(self.cols - 1)
    }

    fn term_y(&self, y: f32) -> u16 {
        let sub = (y / self.src_h as f32 * self.sub_rows() as f32).floor();
        ((sub.max(0.0) as u32 / 2) as u16).min(self.rows - 1)
    }
}

/// Source index at the middle of bucket `i` when `len` items are split into `n` buckets.
fn bucket_center(i: u32, n: u32, len: u32) -> u32 {
    let v = ((2 * i as u64 + 1) * len as u64) / (2 * n as u64);
    (v as u32).min(len - 1)
}

/// Owns the terminal for the lifetime of the loop; restores it on drop.
pub(crate) struct Terminal {
    out: io::Stdout,
    pub(crate) cols: u16,
    pub(crate) rows: u16,
    prev: Frame,
    pub(crate) cur: Frame,
    full_repaint: bool,
}

impl Terminal {
    pub(crate) fn begin() -> anyhow::Result<Self> {
        let mut out = io::stdout();
        terminal::enable_raw_mode().context("enabling raw mode")?;
        execute!(
            out,
            EnterAlternateScreen,
            DisableLineWrap,
            cursor::Hide,
            Clear(ClearType::All)
        )
        .context("entering alternate screen")?;

        let (cols, rows) = terminal::size()?;
        log::debug!("terminal {}x{}", cols, rows);
        Ok(Self {
            out,
            cols,
            rows,
            prev: Frame::new(cols, rows),
            cur: Frame::new(cols, rows),
            full_repaint: true,
        })
    }

    pub(crate) fn resize(&mut self, cols: u16, rows: u16) -> anyhow::Result<()> {
        if cols == self.cols && rows == self.rows {
            return Ok(());
        }
        log::debug!("resize {}x{} -> {}x{}", self.cols, self.rows, cols, rows);
        self.cols = cols;
        self.rows = rows;
        self.prev = Frame::new(cols, rows);
        self.cur = Frame::new(cols, rows);
        self.full_repaint = true;
        execute!(self.out, ResetColor, Clear(ClearType::All))?;
        Ok(())
    }

    pub(crate) fn set_title(&mut self, title: &str) -> anyhow::Result<()> {
        execute!(self.out, SetTitle(title))?;
        Ok(())
    }

    /// Writes the cells that changed since the last flush.
    pub(crate) fn present(&mut self) -> anyhow::Result<()> {
        queue!(self.out, BeginSynchronizedUpdate)?;

        let mut last_fg = None;
        let mut last_bg = None;
        let mut cursor_at: Option<(u16, u16)> = None;

        for y in 0..self.rows {
            for x in 0..self.cols {
                let i = self.cur.idx(x, y);
                let c = self.cur.cells[i];
                if !self.full_repaint && c == self.prev.cells[i] {
                    continue;
                }

                if cursor_at != Some((x, y)) {
                    queue!(self.out, cursor::MoveTo(x, y))?;
                }
                if last_fg != Some(c.fg) {
                    queue!(self.out, SetForegroundColor(c.fg))?;
                    last_fg = Some(c.fg);
                }
                if last_bg != Some(c.bg) {
                    queue!(self.out, SetBackgroundColor(c.bg))?;
                    last_bg = Some(c.bg);
                }
                queue!(self.out, Print(c.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }

        queue!(self.out, ResetColor, EndSynchronizedUpdate)?;
        self.out.flush()?;
        self.prev.cells.copy_from_slice(&self.cur.cells);
        self.full_repaint = false;
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = execute!(
            self.out,
            EndSynchronizedUpdate,
            ResetColor,
            cursor::Show,
            EnableLineWrap,
            LeaveAlternateScreen
        );
        let _ = terminal::disable_raw_mode();
    }
}

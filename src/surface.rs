// Copyright (c) 2026 rezky_nightky

use crate::frame::{Cell, Frame};
use crate::palette::Palette;

/// Drawing surface the engine renders into. Coordinates are engine pixels,
/// y increasing downward; `alpha` is the composite 0..=255 opacity already
/// folded together from cell fade and column fade. Hue is the surface's
/// business.
pub trait Surface {
    fn clear(&mut self);
    /// Soft halo under a glyph. Always issued before the glyph it belongs to.
    fn draw_glow(&mut self, x: f32, y: f32, radius: f32, alpha: u8);
    fn draw_glyph(&mut self, x: f32, y: f32, glyph: char, alpha: u8);
}

/// Maps engine pixel space onto the terminal cell grid: one glyph row per
/// terminal row, one column per terminal column. A soft glow has no direct
/// terminal equivalent, so it renders as a bold glyph in the palette's
/// brightest shade.
pub struct TermSurface<'a> {
    frame: &'a mut Frame,
    palette: &'a Palette,
    cell_w: f32,
    cell_h: f32,
    glow_at: Option<(u16, u16)>,
}

impl<'a> TermSurface<'a> {
    pub fn new(frame: &'a mut Frame, palette: &'a Palette, cell_w: f32, cell_h: f32) -> Self {
        Self {
            frame,
            palette,
            cell_w,
            cell_h,
            glow_at: None,
        }
    }

    fn grid_pos(&self, x: f32, y: f32) -> Option<(u16, u16)> {
        if y < 0.0 || x < 0.0 {
            return None;
        }
        let col = (x / self.cell_w).round();
        let row = (y / self.cell_h).floor();
        if col >= self.frame.width as f32 || row >= self.frame.height as f32 {
            return None;
        }
        Some((col as u16, row as u16))
    }
}

impl Surface for TermSurface<'_> {
    fn clear(&mut self) {
        self.frame.clear(self.palette.bg);
        self.glow_at = None;
    }

    fn draw_glow(&mut self, x: f32, y: f32, radius: f32, _alpha: u8) {
        if radius <= 0.0 {
            return;
        }
        self.glow_at = self.grid_pos(x, y);
    }

    fn draw_glyph(&mut self, x: f32, y: f32, glyph: char, alpha: u8) {
        let Some((col, row)) = self.grid_pos(x, y) else {
            self.glow_at = None;
            return;
        };
        if alpha == 0 {
            self.glow_at = None;
            return;
        }

        let glowing = self.glow_at.take() == Some((col, row));
        let fg = if glowing {
            self.palette.glow
        } else {
            self.palette.shade(alpha)
        };
        self.frame.set(
            col,
            row,
            Cell {
                ch: glyph,
                fg,
                bg: self.palette.bg,
                bold: glowing,
            },
        );
    }
}

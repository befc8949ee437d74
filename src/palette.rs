// Copyright (c) 2026 rezky_nightky

use crossterm::style::Color;

use crate::runtime::{ColorMode, ColorScheme};

const RAMP_STEPS: usize = 32;

/// Alpha-indexed shade ramp for one hue, darkest to brightest, plus the
/// near-white head color used for glowing cells.
#[derive(Clone, Debug)]
pub struct Palette {
    ramp: Vec<Color>,
    pub glow: Option<Color>,
    pub bg: Option<Color>,
}

impl Palette {
    pub fn build(scheme: ColorScheme, mode: ColorMode) -> Self {
        if mode == ColorMode::Mono {
            return Self {
                ramp: Vec::new(),
                glow: None,
                bg: None,
            };
        }

        let (base_r, base_g, base_b) = scheme.base_rgb();
        let mut ramp = Vec::with_capacity(RAMP_STEPS);
        for i in 0..RAMP_STEPS {
            let t = i as f32 / (RAMP_STEPS - 1) as f32;
            let rgb = (scale(base_r, t), scale(base_g, t), scale(base_b, t));
            ramp.push(encode(mode, rgb));
        }

        let glow_rgb = (
            blend_to_white(base_r, 0.75),
            blend_to_white(base_g, 0.75),
            blend_to_white(base_b, 0.75),
        );

        Self {
            ramp,
            glow: Some(encode(mode, glow_rgb)),
            bg: Some(Color::Black),
        }
    }

    /// Shade for a composite alpha; `None` means the terminal default
    /// (mono mode).
    pub fn shade(&self, alpha: u8) -> Option<Color> {
        if self.ramp.is_empty() {
            return None;
        }
        let idx = (alpha as usize * (self.ramp.len() - 1) + 127) / 255;
        Some(self.ramp[idx])
    }
}

fn scale(v: u8, t: f32) -> u8 {
    (v as f32 * t).round().clamp(0.0, 255.0) as u8
}

fn blend_to_white(v: u8, t: f32) -> u8 {
    (v as f32 + (255.0 - v as f32) * t).round().clamp(0.0, 255.0) as u8
}

fn encode(mode: ColorMode, (r, g, b): (u8, u8, u8)) -> Color {
    match mode {
        ColorMode::TrueColor => Color::Rgb { r, g, b },
        _ => Color::AnsiValue(nearest_ansi256(r, g, b)),
    }
}

/// Nearest entry in the xterm 256-color table, considering both the 6x6x6
/// cube and the grayscale band.
fn nearest_ansi256(r: u8, g: u8, b: u8) -> u8 {
    const LEVELS: [u8; 6] = [0, 95, 135, 175, 215, 255];

    let level_of = |v: u8| -> usize {
        let mut best = 0usize;
        for (i, &l) in LEVELS.iter().enumerate() {
            if (v as i32 - l as i32).abs() < (v as i32 - LEVELS[best] as i32).abs() {
                best = i;
            }
        }
        best
    };

    let (ri, gi, bi) = (level_of(r), level_of(g), level_of(b));
    let cube_idx = 16 + 36 * ri as u8 + 6 * gi as u8 + bi as u8;
    let cube_err = sq_err(r, g, b, LEVELS[ri], LEVELS[gi], LEVELS[bi]);

    let luma = ((r as u16 + g as u16 + b as u16) / 3) as i32;
    let gray_step = ((luma - 8) / 10).clamp(0, 23);
    let gray_val = (8 + 10 * gray_step) as u8;
    let gray_idx = 232 + gray_step as u8;
    let gray_err = sq_err(r, g, b, gray_val, gray_val, gray_val);

    if gray_err < cube_err {
        gray_idx
    } else {
        cube_idx
    }
}

fn sq_err(r: u8, g: u8, b: u8, cr: u8, cg: u8, cb: u8) -> i32 {
    let dr = r as i32 - cr as i32;
    let dg = g as i32 - cg as i32;
    let db = b as i32 - cb as i32;
    dr * dr + dg * dg + db * db
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truecolor_ramp_runs_black_to_base() {
        let p = Palette::build(ColorScheme::Green, ColorMode::TrueColor);
        assert_eq!(p.shade(0), Some(Color::Rgb { r: 0, g: 0, b: 0 }));
        assert_eq!(p.shade(255), Some(Color::Rgb { r: 0, g: 255, b: 70 }));
    }

    #[test]
    fn shade_is_monotone_in_alpha_index() {
        let p = Palette::build(ColorScheme::Amber, ColorMode::TrueColor);
        let lo = p.shade(10);
        let hi = p.shade(250);
        assert_ne!(lo, hi);
    }

    #[test]
    fn mono_palette_has_no_colors() {
        let p = Palette::build(ColorScheme::Green, ColorMode::Mono);
        assert_eq!(p.shade(0), None);
        assert_eq!(p.shade(255), None);
        assert_eq!(p.glow, None);
        assert_eq!(p.bg, None);
    }

    #[test]
    fn ansi256_nails_the_corners() {
        assert_eq!(nearest_ansi256(0, 0, 0), 16);
        assert_eq!(nearest_ansi256(255, 255, 255), 231);
        assert_eq!(nearest_ansi256(255, 0, 0), 196);
    }
}

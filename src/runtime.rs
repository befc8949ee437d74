// Copyright (c) 2026 rezky_nightky

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorMode {
    Mono,
    Color256,
    TrueColor,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorScheme {
    Green,
    Amber,
    Cyan,
    Purple,
    Red,
    Blue,
    White,
}

impl ColorScheme {
    pub fn base_rgb(self) -> (u8, u8, u8) {
        match self {
            ColorScheme::Green => (0, 255, 70),
            ColorScheme::Amber => (255, 176, 0),
            ColorScheme::Cyan => (0, 229, 255),
            ColorScheme::Purple => (186, 85, 255),
            ColorScheme::Red => (255, 60, 60),
            ColorScheme::Blue => (64, 128, 255),
            ColorScheme::White => (230, 230, 230),
        }
    }
}

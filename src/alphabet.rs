// Copyright (c) 2026 rezky_nightky

use rand::{
    distr::{Distribution, Uniform},
    rngs::StdRng,
};

/// The glyph set the original wallpaper renders: space, a handful of ASCII
/// punctuation and digits, and half-width-looking katakana.
const MATRIX_GLYPHS: &str = "\u{0020}\u{0022}\u{002A}\u{002B}\u{003A}\u{003C}\u{A78A}\u{003E}\
012345789z|\u{00A6}\u{254C}\u{25AA}\
アウオセナホムメモヤワシエカキケコサスソタツテニヌネハヒマミヨラリー\u{FF1D}";

const ASCII_GLYPHS: &str = " \"*+:<=>012345789z|!#$%&(){}[]?/\\^~";

/// Fixed, ordered glyph set with uniform sampling. Stateless and shared
/// read-only; the RNG is always passed in by the caller.
#[derive(Clone, Debug)]
pub struct Alphabet {
    glyphs: Vec<char>,
    index: Uniform<usize>,
}

impl Alphabet {
    pub fn new(glyphs: Vec<char>) -> Result<Self, String> {
        if glyphs.is_empty() {
            return Err("alphabet must contain at least one glyph".to_string());
        }
        let index = Uniform::new_inclusive(0, glyphs.len() - 1)
            .map_err(|e| format!("alphabet index range: {}", e))?;
        Ok(Self { glyphs, index })
    }

    pub fn matrix() -> Self {
        Self::new(MATRIX_GLYPHS.chars().collect()).expect("builtin set is non-empty")
    }

    pub fn ascii() -> Self {
        Self::new(ASCII_GLYPHS.chars().collect()).expect("builtin set is non-empty")
    }

    #[allow(dead_code)]
    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn sample(&self, rng: &mut StdRng) -> char {
        self.glyphs[self.index.sample(rng)]
    }
}

// Copyright (c) 2026 rezky_nightky

use std::io::IsTerminal;

use clap::Parser;

use crate::runtime::ColorScheme;

#[derive(Parser, Debug, Clone)]
#[command(name = "glyphfall", version, about = "Digital rain for the terminal")]
pub struct Args {
    #[arg(
        short = 'c',
        long = "color",
        default_value = "green",
        help_heading = "APPEARANCE",
        help = "Color theme (see --list-colors)"
    )]
    pub color: String,

    #[arg(
        long = "colormode",
        help_heading = "APPEARANCE",
        help = "Force color depth: 0=mono, 8=256-color, 24=truecolor"
    )]
    pub colormode: Option<u8>,

    #[arg(
        long = "charset",
        default_value = "auto",
        help_heading = "APPEARANCE",
        help = "Glyph set: auto, matrix, ascii"
    )]
    pub charset: String,

    #[arg(
        short = 'f',
        long = "fps",
        default_value_t = 60.0,
        help_heading = "PERFORMANCE",
        help = "Target FPS (min 1 max 240)"
    )]
    pub fps: f64,

    #[arg(
        long = "duration",
        help_heading = "GENERAL",
        help = "Stop after N seconds (min 0.1 max 86400)"
    )]
    pub duration: Option<f64>,

    #[arg(
        long = "seed",
        help_heading = "GENERAL",
        help = "Seed the simulation RNG for a reproducible run"
    )]
    pub seed: Option<u64>,

    #[arg(
        short = 's',
        long = "screensaver",
        help_heading = "GENERAL",
        help = "Exit on the first key press"
    )]
    pub screensaver: bool,

    #[arg(long = "list-colors", help_heading = "HELP", help = "List color themes")]
    pub list_colors: bool,

    #[arg(long = "info", help_heading = "HELP", help = "Print build information")]
    pub info: bool,
}

pub fn color_enabled_stdout() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if matches!(std::env::var("CLICOLOR").ok().as_deref(), Some("0")) {
        return false;
    }
    std::io::stdout().is_terminal()
}

pub fn parse_color_scheme(s: &str) -> Result<ColorScheme, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "green" | "matrix" => Ok(ColorScheme::Green),
        "amber" | "gold" | "yellow" => Ok(ColorScheme::Amber),
        "cyan" => Ok(ColorScheme::Cyan),
        "purple" | "violet" => Ok(ColorScheme::Purple),
        "red" => Ok(ColorScheme::Red),
        "blue" => Ok(ColorScheme::Blue),
        "white" | "gray" | "grey" => Ok(ColorScheme::White),
        _ => Err(format!("invalid color: {} (see --list-colors)", s)),
    }
}

/// Which builtin glyph set the host hands to the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GlyphSetChoice {
    Auto,
    Matrix,
    Ascii,
}

pub fn parse_glyph_set(s: &str) -> Result<GlyphSetChoice, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "auto" => Ok(GlyphSetChoice::Auto),
        "matrix" | "katakana" => Ok(GlyphSetChoice::Matrix),
        "ascii" => Ok(GlyphSetChoice::Ascii),
        _ => Err(format!("unsupported charset: {} (auto, matrix, ascii)", s)),
    }
}

pub fn print_list_colors() {
    if color_enabled_stdout() {
        println!("\x1b[1;36mCOLOR THEMES:\x1b[0m");
    } else {
        println!("COLOR THEMES:");
    }
    for name in ["green", "amber", "cyan", "purple", "red", "blue", "white"] {
        println!("  {}", name);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheme_names_parse_with_aliases() {
        assert_eq!(parse_color_scheme("green").unwrap(), ColorScheme::Green);
        assert_eq!(parse_color_scheme("MATRIX").unwrap(), ColorScheme::Green);
        assert_eq!(parse_color_scheme("gold").unwrap(), ColorScheme::Amber);
        assert!(parse_color_scheme("plaid").is_err());
    }

    #[test]
    fn glyph_set_names_parse() {
        assert_eq!(parse_glyph_set("auto").unwrap(), GlyphSetChoice::Auto);
        assert_eq!(parse_glyph_set("katakana").unwrap(), GlyphSetChoice::Matrix);
        assert!(parse_glyph_set("klingon").is_err());
    }

    #[test]
    fn args_parse_defaults() {
        let args = Args::try_parse_from(["glyphfall"]).unwrap();
        assert_eq!(args.color, "green");
        assert_eq!(args.charset, "auto");
        assert_eq!(args.fps, 60.0);
        assert!(args.seed.is_none());
    }

    #[test]
    fn args_parse_overrides() {
        let args =
            Args::try_parse_from(["glyphfall", "-c", "cyan", "--fps", "30", "--seed", "42"])
                .unwrap();
        assert_eq!(args.color, "cyan");
        assert_eq!(args.fps, 30.0);
        assert_eq!(args.seed, Some(42));
    }
}

// Copyright (c) 2026 rezky_nightky

mod alphabet;
mod config;
mod engine;
mod frame;
mod palette;
mod runtime;
mod surface;
mod terminal;

use std::env;
use std::time::{Duration, Instant};

#[cfg(unix)]
use std::thread;

use clap::Parser;
use crossterm::event::{Event, KeyCode, KeyEventKind};
use rand::{rngs::StdRng, SeedableRng};

#[cfg(unix)]
use signal_hook::consts::{SIGHUP, SIGINT, SIGTERM};
#[cfg(unix)]
use signal_hook::iterator::Signals;

use crate::alphabet::Alphabet;
use crate::config::{parse_color_scheme, parse_glyph_set, print_list_colors, Args, GlyphSetChoice};
use crate::engine::Engine;
use crate::frame::Frame;
use crate::palette::Palette;
use crate::runtime::{ColorMode, ColorScheme};
use crate::surface::TermSurface;
use crate::terminal::{restore_terminal_best_effort, Terminal};

/// Engine pixel size of one glyph. One glyph row maps to one terminal row
/// (`TEXT_SIZE` px tall) and one column to `TEXT_SIZE * 0.9` px across.
const TEXT_SIZE: f32 = 10.0;

fn require_f64_range(name: &str, v: f64, min: f64, max: f64) -> f64 {
    if !v.is_finite() || v < min || v > max {
        eprintln!("failed to apply {} {} (min {} max {})", name, v, min, max);
        std::process::exit(1);
    }
    v
}

fn default_to_ascii() -> bool {
    let lang = env::var("LANG").unwrap_or_default();
    !lang.to_ascii_uppercase().contains("UTF")
}

fn detect_color_mode(args: &Args) -> ColorMode {
    if let Some(m) = args.colormode {
        return match m {
            0 => ColorMode::Mono,
            8 => ColorMode::Color256,
            24 => ColorMode::TrueColor,
            _ => {
                eprintln!("invalid --colormode: {} (allowed: 0,8,24)", m);
                std::process::exit(1);
            }
        };
    }

    let colorterm = env::var("COLORTERM")
        .unwrap_or_default()
        .to_ascii_lowercase();
    if colorterm.contains("truecolor") || colorterm.contains("24bit") {
        return ColorMode::TrueColor;
    }
    let term = env::var("TERM").unwrap_or_default().to_ascii_lowercase();
    if term == "dumb" {
        return ColorMode::Mono;
    }
    ColorMode::Color256
}

fn pick_alphabet(choice: GlyphSetChoice) -> Alphabet {
    match choice {
        GlyphSetChoice::Matrix => Alphabet::matrix(),
        GlyphSetChoice::Ascii => Alphabet::ascii(),
        GlyphSetChoice::Auto => {
            if default_to_ascii() {
                Alphabet::ascii()
            } else {
                Alphabet::matrix()
            }
        }
    }
}

fn surface_px(cols: u16, rows: u16) -> (u32, u32) {
    let width = cols as u32 * (TEXT_SIZE * 0.9) as u32;
    let height = rows as u32 * TEXT_SIZE as u32;
    (width.max(1), height.max(1))
}

fn main() -> std::io::Result<()> {
    std::panic::set_hook(Box::new(|info| {
        restore_terminal_best_effort();
        eprintln!("{}", info);
    }));

    #[cfg(unix)]
    {
        if let Ok(mut signals) = Signals::new([SIGINT, SIGTERM, SIGHUP]) {
            thread::spawn(move || {
                if let Some(sig) = signals.forever().next() {
                    restore_terminal_best_effort();
                    std::process::exit(128 + sig);
                }
            });
        }
    }

    #[cfg(windows)]
    {
        if let Err(e) = ctrlc::set_handler(|| {
            restore_terminal_best_effort();
            std::process::exit(130);
        }) {
            eprintln!("failed to install Ctrl-C handler: {}", e);
        }
    }

    let args = Args::parse();

    if args.list_colors {
        print_list_colors();
        return Ok(());
    }

    if args.info {
        println!("Version: v{}", env!("CARGO_PKG_VERSION"));
        println!("Build: {}", env!("GLYPHFALL_BUILD"));
        println!("License: {}", env!("CARGO_PKG_LICENSE"));
        println!("Source: {}", env!("CARGO_PKG_REPOSITORY"));
        return Ok(());
    }

    let target_fps = require_f64_range("--fps", args.fps, 1.0, 240.0);
    let duration_s = args
        .duration
        .map(|s| require_f64_range("--duration", s, 0.1, 86400.0));

    let mut scheme = match parse_color_scheme(&args.color) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let glyph_set = match parse_glyph_set(&args.charset) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let color_mode = detect_color_mode(&args);

    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };
    let mut engine = match Engine::new(pick_alphabet(glyph_set), TEXT_SIZE, rng) {
        Ok(e) => e,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    let mut term = Terminal::new()?;
    let (cols, rows) = term.size()?;
    let (w, h) = surface_px(cols, rows);
    if let Err(e) = engine.initialize(w, h) {
        drop(term);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let mut palette = Palette::build(scheme, color_mode);
    let mut frame = Frame::new(cols, rows, palette.bg);

    let start_time = Instant::now();
    let end_time = duration_s.map(|s| start_time + Duration::from_secs_f64(s));
    let target_period = Duration::from_secs_f64(1.0 / target_fps);
    let mut next_frame = Instant::now();
    let mut running = true;
    let mut paused = false;

    while running {
        if end_time.is_some_and(|end| Instant::now() >= end) {
            break;
        }

        let mut pending_resize: Option<(u16, u16)> = None;
        loop {
            while Terminal::poll_event(Duration::from_millis(0))? {
                match Terminal::read_event()? {
                    Event::Resize(nw, nh) => pending_resize = Some((nw, nh)),
                    Event::Key(k) if k.kind == KeyEventKind::Press => {
                        if args.screensaver {
                            running = false;
                            break;
                        }
                        match k.code {
                            KeyCode::Esc | KeyCode::Char('q') => running = false,
                            KeyCode::Char(' ') => {
                                let (w, h) = surface_px(frame.width, frame.height);
                                // Dims already validated; re-seed in place.
                                let _ = engine.initialize(w, h);
                            }
                            KeyCode::Char('p') => {
                                paused = !paused;
                                if !paused {
                                    next_frame = Instant::now();
                                }
                            }
                            KeyCode::Char('1') => scheme = ColorScheme::Green,
                            KeyCode::Char('2') => scheme = ColorScheme::Amber,
                            KeyCode::Char('3') => scheme = ColorScheme::Cyan,
                            KeyCode::Char('4') => scheme = ColorScheme::Purple,
                            KeyCode::Char('5') => scheme = ColorScheme::Red,
                            KeyCode::Char('6') => scheme = ColorScheme::Blue,
                            KeyCode::Char('7') => scheme = ColorScheme::White,
                            _ => {}
                        }
                        palette = Palette::build(scheme, color_mode);
                    }
                    _ => {}
                }
            }

            if !running || pending_resize.is_some() {
                break;
            }

            let now = Instant::now();
            if now >= next_frame {
                break;
            }
            let mut timeout = next_frame - now;
            if let Some(end) = end_time {
                if now >= end {
                    break;
                }
                timeout = timeout.min(end - now);
            }
            let _ = Terminal::poll_event(timeout)?;
        }

        if !running {
            break;
        }

        if let Some((nw, nh)) = pending_resize {
            let (w, h) = surface_px(nw, nh);
            if let Err(e) = engine.initialize(w, h) {
                drop(term);
                eprintln!("{}", e);
                std::process::exit(1);
            }
            frame = Frame::new(nw, nh, palette.bg);
        }

        // A paused host simply stops ticking; the engine has no pause of
        // its own.
        if !paused {
            engine.step();
            {
                let mut surface = TermSurface::new(
                    &mut frame,
                    &palette,
                    engine.column_width(),
                    engine.text_size(),
                );
                engine.render(&mut surface);
            }
            term.draw(&frame)?;
        }

        next_frame += target_period;
        let now = Instant::now();
        if now > next_frame {
            next_frame = now;
        }
    }

    Ok(())
}

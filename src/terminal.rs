// Copyright (c) 2026 rezky_nightky

use std::io::{stdout, Result, Stdout, Write};

use crossterm::{
    cursor, event,
    style::{
        Attribute, Color, Print, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
    },
    terminal, ExecutableCommand, QueueableCommand,
};

use crate::frame::{Cell, Frame};

/// Pen state of the real terminal, tracked so style escapes are only
/// emitted on change.
#[derive(Clone, Copy)]
struct Pen {
    fg: Option<Color>,
    bg: Option<Color>,
    bold: bool,
}

pub struct Terminal {
    stdout: Stdout,
    last: Option<Frame>,
    run: String,
}

impl Terminal {
    pub fn new() -> Result<Self> {
        let mut out = stdout();
        terminal::enable_raw_mode()?;
        let init: Result<()> = (|| {
            out.execute(terminal::EnterAlternateScreen)?;
            out.execute(cursor::Hide)?;
            let _ = out.execute(terminal::DisableLineWrap);
            out.execute(terminal::Clear(terminal::ClearType::All))?;
            out.flush()?;
            Ok(())
        })();
        if let Err(e) = init {
            restore_terminal_best_effort();
            return Err(e);
        }
        Ok(Self {
            stdout: out,
            last: None,
            run: String::with_capacity(128),
        })
    }

    pub fn size(&self) -> Result<(u16, u16)> {
        terminal::size()
    }

    pub fn poll_event(timeout: std::time::Duration) -> Result<bool> {
        event::poll(timeout)
    }

    pub fn read_event() -> Result<event::Event> {
        event::read()
    }

    /// Write a frame, emitting only the cells that differ from what is
    /// already on screen. A size change forces a full repaint.
    pub fn draw(&mut self, frame: &Frame) -> Result<()> {
        let prev = self.last.take();
        let full = !matches!(
            &prev,
            Some(l) if l.width == frame.width && l.height == frame.height
        );
        if full {
            self.stdout
                .queue(terminal::Clear(terminal::ClearType::All))?;
        }

        let mut pen = Pen {
            fg: None,
            bg: None,
            bold: false,
        };
        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;

        let width = frame.width as usize;
        for y in 0..frame.height {
            let row = &frame.cells()[y as usize * width..(y as usize + 1) * width];
            let last_row = prev
                .as_ref()
                .filter(|_| !full)
                .map(|l| &l.cells()[y as usize * width..(y as usize + 1) * width]);

            let mut x = 0usize;
            while x < width {
                let changed = |i: usize| match last_row {
                    Some(lr) => lr[i] != row[i],
                    None => true,
                };
                if !changed(x) {
                    x += 1;
                    continue;
                }

                // Extend the run while the style stays put.
                let style = (row[x].fg, row[x].bg, row[x].bold);
                let mut end = x + 1;
                while end < width
                    && changed(end)
                    && (row[end].fg, row[end].bg, row[end].bold) == style
                {
                    end += 1;
                }

                self.stdout.queue(cursor::MoveTo(x as u16, y))?;
                self.set_pen(&mut pen, &row[x])?;
                self.run.clear();
                for cell in &row[x..end] {
                    self.run.push(cell.ch);
                }
                self.stdout.queue(Print(self.run.as_str()))?;
                x = end;
            }
        }

        self.stdout.queue(SetAttribute(Attribute::Reset))?;
        self.stdout.queue(ResetColor)?;
        self.stdout.flush()?;
        self.last = Some(frame.clone());
        Ok(())
    }

    fn set_pen(&mut self, pen: &mut Pen, cell: &Cell) -> Result<()> {
        if cell.fg != pen.fg {
            self.stdout
                .queue(SetForegroundColor(cell.fg.unwrap_or(Color::Reset)))?;
            pen.fg = cell.fg;
        }
        if cell.bg != pen.bg {
            self.stdout
                .queue(SetBackgroundColor(cell.bg.unwrap_or(Color::Reset)))?;
            pen.bg = cell.bg;
        }
        if cell.bold != pen.bold {
            self.stdout.queue(SetAttribute(if cell.bold {
                Attribute::Bold
            } else {
                Attribute::NormalIntensity
            }))?;
            pen.bold = cell.bold;
        }
        Ok(())
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        restore_terminal_best_effort();
    }
}

pub fn restore_terminal_best_effort() {
    let mut out = stdout();
    let _ = out.execute(SetAttribute(Attribute::Reset));
    let _ = out.execute(ResetColor);
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::EnableLineWrap);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
    let _ = out.flush();
}

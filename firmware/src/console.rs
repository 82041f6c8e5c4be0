//! RTT console standing in for the crash screens.
//!
//! Text is logged line by line; the QR code is logged as rows of `#`, two
//! characters per module so it keeps its aspect ratio in a terminal.

use core::fmt::{self, Write as _};

use crashdump_core::platform::{CodeMatrix, Color, Display, Extent, Surface};
use defmt::{println, warn};
use heapless::String;

/// Nominal console size in character cells.
const COLUMNS: u32 = 80;
const ROWS: u32 = 30;
/// Widest symbol is 177 modules.
const MAX_MODULES: u32 = 177;
const CODE_ROW_LEN: usize = 2 * MAX_MODULES as usize;

/// Lines longer than this are cut; the summary is at most 30 columns wide.
const LINE_LEN: usize = 96;

pub struct RttConsole;

impl RttConsole {
    fn tag(surface: Surface) -> &'static str {
        match surface {
            Surface::Primary => "screen",
            Surface::Secondary => "code",
        }
    }
}

/// Collects formatted text and logs one line per newline.
struct LineSink {
    tag: &'static str,
    line: String<LINE_LEN>,
}

impl LineSink {
    fn emit(&mut self) {
        println!("{=str}: {=str}", self.tag, self.line.as_str());
        self.line.clear();
    }
}

impl fmt::Write for LineSink {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for ch in s.chars() {
            if ch == '\n' {
                self.emit();
            } else {
                // Overlong lines are clipped.
                let _ = self.line.push(ch);
            }
        }
        Ok(())
    }
}

impl Display for RttConsole {
    fn clear(&mut self, surface: Surface, _color: Color) {
        println!("{=str}: ----", Self::tag(surface));
    }

    fn draw_text(
        &mut self,
        surface: Surface,
        _x: u32,
        y: u32,
        _foreground: Color,
        _background: Color,
        text: fmt::Arguments<'_>,
    ) {
        let mut sink = LineSink {
            tag: Self::tag(surface),
            line: String::new(),
        };
        println!("{=str}: @{=u32}", sink.tag, y);
        let _ = sink.write_fmt(text);
        if !sink.line.is_empty() {
            sink.emit();
        }
    }

    fn measure_text(&self, text: &str) -> Extent {
        let mut width = 0u32;
        let mut height = 0u32;
        for line in text.lines() {
            width = width.max(line.chars().count() as u32);
            height += 1;
        }
        Extent::new(width, height.max(1))
    }

    fn surface_size(&self, surface: Surface) -> Extent {
        match surface {
            Surface::Primary => Extent::new(COLUMNS, ROWS),
            Surface::Secondary => Extent::new(MAX_MODULES, MAX_MODULES),
        }
    }

    fn draw_code<C>(&mut self, surface: Surface, code: &C)
    where
        C: CodeMatrix + ?Sized,
    {
        let size = code.size();
        if size > MAX_MODULES {
            warn!("crash: code of {=u32} modules exceeds console", size);
            return;
        }
        println!("{=str}: {=u32}x{=u32}", Self::tag(surface), size, size);
        let mut row: String<CODE_ROW_LEN> = String::new();
        for y in 0..size {
            row.clear();
            for x in 0..size {
                let cell = if code.is_dark(x, y) { "##" } else { "  " };
                let _ = row.push_str(cell);
            }
            println!("{=str}", row.as_str());
        }
    }
}

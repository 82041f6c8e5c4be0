//! Host stand-ins for the two crash screens.
//!
//! The primary surface is a grid of character cells. The secondary surface is
//! a pixel grid rendered two pixel rows per character with half blocks, which
//! keeps QR modules roughly square in a terminal.

use std::fmt::{self, Write as _};
use std::io::{self, Stdout, Write};

use crashdump_core::platform::{
    CodeMatrix, CodePlacement, Color, Display, Extent, Surface,
};
use crossterm::style::{self, Print, SetBackgroundColor, SetForegroundColor};
use crossterm::{cursor, execute, queue, terminal};
use tracing::{debug, warn};

pub const PRIMARY_COLUMNS: u32 = 48;
pub const PRIMARY_ROWS: u32 = 24;
/// Side of the secondary surface in pixels; fits a version 40 symbol.
pub const SECONDARY_PIXELS: u32 = 184;

/// Character-cell canvas.
pub struct TextCanvas {
    extent: Extent,
    cells: Vec<char>,
}

impl TextCanvas {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            cells: vec![' '; (extent.width * extent.height) as usize],
        }
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    /// Writes `text` at `(x, y)`; newlines return to column `x`. Clipped.
    pub fn put_text(&mut self, x: u32, y: u32, text: &str) {
        for (row, line) in (y..self.extent.height).zip(text.split('\n')) {
            for (column, ch) in (x..self.extent.width).zip(line.chars()) {
                self.cells[(row * self.extent.width + column) as usize] = ch;
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        self.cells
            .chunks(self.extent.width as usize)
            .map(|row| row.iter().collect::<String>().trim_end().to_owned())
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Monochrome pixel canvas.
pub struct PixelCanvas {
    extent: Extent,
    dark: Vec<bool>,
}

impl PixelCanvas {
    pub fn new(extent: Extent) -> Self {
        Self {
            extent,
            dark: vec![false; (extent.width * extent.height) as usize],
        }
    }

    pub fn fill(&mut self, dark: bool) {
        self.dark.fill(dark);
    }

    pub fn is_dark(&self, x: u32, y: u32) -> bool {
        x < self.extent.width
            && y < self.extent.height
            && self.dark[(y * self.extent.width + x) as usize]
    }

    fn fill_rect(&mut self, x: u32, y: u32, side: u32) {
        for py in y..y.saturating_add(side).min(self.extent.height) {
            for px in x..x.saturating_add(side).min(self.extent.width) {
                self.dark[(py * self.extent.width + px) as usize] = true;
            }
        }
    }

    pub fn lines(&self) -> impl Iterator<Item = String> + '_ {
        (0..self.extent.height.div_ceil(2)).map(move |row| {
            let line: String = (0..self.extent.width)
                .map(|x| match (self.is_dark(x, row * 2), self.is_dark(x, row * 2 + 1)) {
                    (true, true) => '█',
                    (true, false) => '▀',
                    (false, true) => '▄',
                    (false, false) => ' ',
                })
                .collect();
            line.trim_end().to_owned()
        })
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for line in self.lines() {
            out.push_str(&line);
            out.push('\n');
        }
        out
    }
}

/// Both surfaces held in memory.
pub struct CanvasDisplay {
    primary: TextCanvas,
    secondary: PixelCanvas,
    foreground: Color,
    background: Color,
}

impl CanvasDisplay {
    pub fn new() -> Self {
        Self {
            primary: TextCanvas::new(Extent::new(PRIMARY_COLUMNS, PRIMARY_ROWS)),
            secondary: PixelCanvas::new(Extent::new(SECONDARY_PIXELS, SECONDARY_PIXELS)),
            foreground: Color::FOREGROUND,
            background: Color::BACKGROUND,
        }
    }

    pub fn primary(&self) -> &TextCanvas {
        &self.primary
    }

    pub fn secondary(&self) -> &PixelCanvas {
        &self.secondary
    }
}

impl Default for CanvasDisplay {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for CanvasDisplay {
    fn clear(&mut self, surface: Surface, color: Color) {
        match surface {
            Surface::Primary => {
                self.background = color;
                self.primary.clear();
            }
            Surface::Secondary => self.secondary.fill(false),
        }
    }

    fn draw_text(
        &mut self,
        surface: Surface,
        x: u32,
        y: u32,
        foreground: Color,
        background: Color,
        text: fmt::Arguments<'_>,
    ) {
        let mut rendered = String::new();
        // Writing into a String cannot fail.
        let _ = rendered.write_fmt(text);
        match surface {
            Surface::Primary => {
                self.foreground = foreground;
                self.background = background;
                self.primary.put_text(x, y, &rendered);
            }
            Surface::Secondary => debug!("text on the code surface ignored: {rendered}"),
        }
    }

    fn measure_text(&self, text: &str) -> Extent {
        let width = text.lines().map(|line| line.chars().count()).max().unwrap_or(0);
        let height = text.lines().count().max(1);
        Extent::new(
            u32::try_from(width).unwrap_or(u32::MAX),
            u32::try_from(height).unwrap_or(u32::MAX),
        )
    }

    fn surface_size(&self, surface: Surface) -> Extent {
        match surface {
            Surface::Primary => self.primary.extent,
            Surface::Secondary => self.secondary.extent,
        }
    }

    fn draw_code<C>(&mut self, surface: Surface, code: &C)
    where
        C: CodeMatrix + ?Sized,
    {
        if surface != Surface::Secondary {
            warn!("codes are only drawn on the secondary surface");
            return;
        }
        let size = code.size();
        let placement = CodePlacement::fit(self.secondary.extent, size);
        if !placement.fits() {
            warn!(modules = size, "code does not fit the secondary surface");
            return;
        }
        for y in 0..size {
            for x in 0..size {
                if code.is_dark(x, y) {
                    self.secondary.fill_rect(
                        placement.x + x * placement.scale,
                        placement.y + y * placement.scale,
                        placement.scale,
                    );
                }
            }
        }
    }
}

fn to_terminal(color: Color) -> style::Color {
    let [_, r, g, b] = color.0.to_be_bytes();
    style::Color::Rgb { r, g, b }
}

/// Puts the terminal into raw mode on the alternate screen.
pub fn enter_terminal() -> io::Result<()> {
    terminal::enable_raw_mode()?;
    execute!(io::stdout(), terminal::EnterAlternateScreen, cursor::Hide)
}

/// Leaves the alternate screen. Errors are ignored; this runs on the way out.
pub fn restore_terminal() {
    let _ = execute!(io::stdout(), cursor::Show, terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();
}

/// Terminal renderer: primary surface on the left, code on the right in
/// dark-on-light blocks.
pub struct TerminalDisplay {
    canvas: CanvasDisplay,
    out: Stdout,
}

impl TerminalDisplay {
    pub fn enter() -> io::Result<Self> {
        enter_terminal()?;
        Ok(Self {
            canvas: CanvasDisplay::new(),
            out: io::stdout(),
        })
    }

    fn repaint(&mut self) {
        if let Err(err) = self.try_repaint() {
            warn!("terminal repaint failed: {err}");
        }
    }

    fn try_repaint(&mut self) -> io::Result<()> {
        let (columns, rows) = terminal::size()?;
        let code_column = u16::try_from(PRIMARY_COLUMNS + 2).unwrap_or(u16::MAX);
        let fg = to_terminal(self.canvas.foreground);
        let bg = to_terminal(self.canvas.background);

        queue!(self.out, terminal::Clear(terminal::ClearType::All))?;
        for (row, line) in self.canvas.primary.lines().enumerate() {
            let Ok(row) = u16::try_from(row) else { break };
            if row >= rows {
                break;
            }
            queue!(
                self.out,
                cursor::MoveTo(0, row),
                SetForegroundColor(fg),
                SetBackgroundColor(bg),
                Print(format!("{line:<width$}", width = PRIMARY_COLUMNS as usize))
            )?;
        }

        let room = usize::from(columns.saturating_sub(code_column));
        for (row, line) in self.canvas.secondary.lines().enumerate() {
            let Ok(row) = u16::try_from(row) else { break };
            if row >= rows || room == 0 {
                break;
            }
            let width = room.min(SECONDARY_PIXELS as usize);
            let clipped: String = line.chars().take(width).collect();
            queue!(
                self.out,
                cursor::MoveTo(code_column, row),
                SetForegroundColor(style::Color::Black),
                SetBackgroundColor(style::Color::White),
                Print(format!("{clipped:<width$}"))
            )?;
        }
        queue!(self.out, style::ResetColor)?;
        self.out.flush()
    }
}

impl Display for TerminalDisplay {
    fn clear(&mut self, surface: Surface, color: Color) {
        self.canvas.clear(surface, color);
        self.repaint();
    }

    fn draw_text(
        &mut self,
        surface: Surface,
        x: u32,
        y: u32,
        foreground: Color,
        background: Color,
        text: fmt::Arguments<'_>,
    ) {
        self.canvas.draw_text(surface, x, y, foreground, background, text);
        self.repaint();
    }

    fn measure_text(&self, text: &str) -> Extent {
        self.canvas.measure_text(text)
    }

    fn surface_size(&self, surface: Surface) -> Extent {
        self.canvas.surface_size(surface)
    }

    fn draw_code<C>(&mut self, surface: Surface, code: &C)
    where
        C: CodeMatrix + ?Sized,
    {
        self.canvas.draw_code(surface, code);
        self.repaint();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Checker(u32);

    impl CodeMatrix for Checker {
        fn size(&self) -> u32 {
            self.0
        }

        fn is_dark(&self, x: u32, y: u32) -> bool {
            (x + y) % 2 == 0
        }
    }

    #[test]
    fn text_is_clipped_to_the_canvas() {
        let mut canvas = TextCanvas::new(Extent::new(4, 2));
        canvas.put_text(1, 1, "abcdef\nxyz");
        assert_eq!(canvas.render(), "\n abc\n");
    }

    #[test]
    fn text_outside_the_canvas_is_dropped() {
        let mut canvas = TextCanvas::new(Extent::new(4, 2));
        canvas.put_text(9, 0, "hidden");
        canvas.put_text(0, 1, "ab\ncd\nef");
        assert_eq!(canvas.render(), "\nab\n");
    }

    #[test]
    fn measure_counts_lines_and_widest_row() {
        let display = CanvasDisplay::new();
        assert_eq!(display.measure_text("ab\nabcd\n\n"), Extent::new(4, 3));
        assert_eq!(display.measure_text(""), Extent::new(0, 1));
    }

    #[test]
    fn code_is_scaled_and_centred() {
        let mut display = CanvasDisplay::new();
        display.draw_code(Surface::Secondary, &Checker(21));
        // 184 / (21 + 4) = 7 pixels per module; (184 - 147) / 2 = 18.
        assert!(display.secondary().is_dark(18, 18));
        assert!(display.secondary().is_dark(24, 24));
        assert!(!display.secondary().is_dark(25, 18));
        assert!(!display.secondary().is_dark(17, 17));
    }

    #[test]
    fn half_blocks_pair_pixel_rows() {
        let mut canvas = PixelCanvas::new(Extent::new(2, 2));
        canvas.fill_rect(0, 0, 1);
        canvas.fill_rect(1, 1, 1);
        assert_eq!(canvas.render(), "▀▄\n");
    }
}

//! True-color terminal output of a [`TileBuffer`].
//!
//! Two tile rows share one text line: the upper tile is the foreground of
//! `▀`, the lower tile its background. Escape codes are emitted only when a
//! color changes from the previous cell.

use std::io::{self, Write};

use crossterm::queue;
use crossterm::style::{Color, Print, ResetColor, SetBackgroundColor, SetForegroundColor};

use super::buffer::TileBuffer;
use super::palette::Palette;
use crate::types::{Rgba, TileColor};

const UPPER_HALF: char = '\u{2580}';

#[inline]
fn to_color(palette: &Palette, tile: Option<TileColor>) -> Color {
    match tile {
        Some(tile) => {
            let Rgba { r, g, b, .. } = palette.get(tile);
            Color::Rgb { r, g, b }
        }
        None => Color::Reset,
    }
}

/// Writes half-block lines while tracking the last emitted colors.
#[derive(Debug)]
pub struct HalfBlockRenderer {
    palette: Palette,
    last_fg: Option<Color>,
    last_bg: Option<Color>,
}

impl HalfBlockRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            last_fg: None,
            last_bg: None,
        }
    }

    /// Forget tracked colors. Call at the start of each frame.
    pub fn reset(&mut self) {
        self.last_fg = None;
        self.last_bg = None;
    }

    /// Render tile rows `[first_row, first_row + 2 * lines)` as `lines` text lines.
    pub fn render<W: Write>(
        &mut self,
        w: &mut W,
        buffer: &TileBuffer,
        first_row: u32,
        lines: u32,
    ) -> io::Result<()> {
        self.reset();
        for line in 0..lines {
            let top = first_row + 2 * line;
            if top >= buffer.height() {
                break;
            }
            for column in 0..buffer.width() {
                let fg = to_color(&self.palette, buffer.get(top, column));
                let bg = to_color(&self.palette, buffer.get(top + 1, column));
                if self.last_fg != Some(fg) {
                    queue!(w, SetForegroundColor(fg))?;
                    self.last_fg = Some(fg);
                }
                if self.last_bg != Some(bg) {
                    queue!(w, SetBackgroundColor(bg))?;
                    self.last_bg = Some(bg);
                }
                queue!(w, Print(UPPER_HALF))?;
            }
            queue!(w, ResetColor, Print("\r\n"))?;
            self.reset();
        }
        w.flush()
    }

    /// Render the whole buffer.
    pub fn render_all<W: Write>(&mut self, w: &mut W, buffer: &TileBuffer) -> io::Result<()> {
        self.render(w, buffer, 0, buffer.height().div_ceil(2))
    }
}

/// One line per tile color: a colored swatch and its name.
pub fn render_legend<W: Write>(w: &mut W, palette: &Palette, counts: &[u64]) -> io::Result<()> {
    for (color, count) in TileColor::ALL.iter().zip(counts) {
        queue!(
            w,
            SetForegroundColor(to_color(palette, Some(*color))),
            Print("\u{2588}\u{2588}"),
            ResetColor,
            Print(format!(" {:<22} {count}\r\n", color.name()))
        )?;
    }
    w.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::PixelSink;

    fn render_to_string(buffer: &TileBuffer) -> String {
        let mut out = Vec::new();
        HalfBlockRenderer::new(Palette::classic())
            .render_all(&mut out, buffer)
            .unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_half_blocks() {
        let mut buffer = TileBuffer::new(2, 2);
        buffer.set_tile(0, 0, TileColor::Private);
        buffer.set_tile(0, 1, TileColor::Private);
        buffer.set_tile(1, 0, TileColor::Shared);

        let out = render_to_string(&buffer);
        assert_eq!(out.matches(UPPER_HALF).count(), 2);
        assert_eq!(out.matches("\r\n").count(), 1);
        // Magenta foreground is emitted once for both cells
        assert_eq!(out.matches("\x1b[38;2;255;0;255m").count(), 1);
        assert!(out.contains("\x1b[48;2;255;255;0m"));
    }

    #[test]
    fn test_odd_height() {
        let mut buffer = TileBuffer::new(1, 3);
        buffer.set_tile(2, 0, TileColor::Gap);
        let out = render_to_string(&buffer);
        assert_eq!(out.matches("\r\n").count(), 2);
        assert!(out.contains("\x1b[38;2;0;0;255m"));
    }

    #[test]
    fn test_legend() {
        let mut out = Vec::new();
        let counts = [0u64; TileColor::COUNT];
        render_legend(&mut out, &Palette::classic(), &counts).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("private"));
        assert_eq!(out.matches("\r\n").count(), TileColor::COUNT);
    }
}

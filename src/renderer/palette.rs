//! Tile color palettes.

use crate::types::{Rgba, TileColor};

/// Maps each [`TileColor`] to a concrete color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    colors: [Rgba; TileColor::COUNT],
}

impl Palette {
    /// The mosaic's classic colors.
    pub const fn classic() -> Self {
        Self {
            colors: [
                Rgba::DARK_GRAY,     // NotPresent
                Rgba::GREEN,         // HighReuse
                Rgba::DARK_GREEN,    // FileBacked
                Rgba::LIGHT_MAGENTA, // HugePage
                Rgba::MAGENTA,       // Private
                Rgba::YELLOW,        // Shared
                Rgba::DARK_RED,      // Anomalous
                Rgba::WHITE,         // Unclassified
                Rgba::BLUE,          // Gap
                Rgba::BLACK,         // Separator
            ],
        }
    }

    #[inline]
    pub fn get(&self, color: TileColor) -> Rgba {
        self.colors[color.id() as usize]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::classic()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classic_colors() {
        let palette = Palette::classic();
        assert_eq!(palette.get(TileColor::Private), Rgba::MAGENTA);
        assert_eq!(palette.get(TileColor::Shared), Rgba::YELLOW);
        assert_eq!(palette.get(TileColor::Gap), Rgba::BLUE);
        assert_eq!(palette.get(TileColor::Separator), Rgba::BLACK);
    }
}

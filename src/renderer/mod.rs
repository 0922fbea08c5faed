//! Tile renderer - the painting side of the mosaic.
//!
//! The layout pass only emits `(row, column, color)` assignments through
//! [`PixelSink`](crate::layout::PixelSink). This module holds sinks and
//! output code built on top of that:
//!
//! - [`TileBuffer`] - dense grid that collects assignments
//! - [`Palette`] - tile color to RGB
//! - [`HalfBlockRenderer`] - true-color terminal output via crossterm

pub mod ansi;
pub mod buffer;
pub mod palette;

pub use ansi::{HalfBlockRenderer, render_legend};
pub use buffer::TileBuffer;
pub use palette::Palette;

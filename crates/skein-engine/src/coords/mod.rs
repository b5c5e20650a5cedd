//! World-space geometry and color primitives.

mod color;
mod rect;

pub use color::Color;
pub use rect::Rect2D;

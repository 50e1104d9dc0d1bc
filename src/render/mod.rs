pub mod canvas;
pub mod font;

pub use canvas::{Canvas, Color, BLACK, WHITE};
pub use font::HudFont;

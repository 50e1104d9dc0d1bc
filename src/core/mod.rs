pub mod controls;
pub mod dino;
pub mod engine;
pub mod features;
pub mod geometry;
pub mod pong;
pub mod scoreboard;

pub use crate::domain::model::{GameKind, GameOutcome, GestureFrame, ModelInfo};
pub use crate::domain::ports::{Controls, Display, Game, GestureSource};
pub use crate::utils::error::Result;

pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod render;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use config::ArcadeConfig;
pub use core::{dino::DinoGame, engine::ArcadeEngine, pong::PongGame};
pub use utils::error::{ArcadeError, Result};

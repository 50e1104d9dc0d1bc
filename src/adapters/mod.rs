// Adapters layer: 具體的外部系統實作（相機、模型程序、顯示器、replay 檔）

pub mod camera;
pub mod display;
pub mod edge_impulse;
pub mod eim;
pub mod replay;

pub use camera::{CameraConfig, FfmpegCamera};
pub use display::{FramebufferDisplay, HeadlessDisplay};
pub use edge_impulse::EdgeImpulseSource;
pub use eim::EimRunner;
pub use replay::ReplaySource;

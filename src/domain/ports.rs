use crate::domain::model::{GameOutcome, GameStatus, GestureFrame, ModelInfo};
use crate::render::{Canvas, HudFont};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Instant;

/// 手勢來源：相機 + 模型，或是錄好的 replay
#[async_trait]
pub trait GestureSource: Send {
    fn model_info(&self) -> &ModelInfo;

    /// `Ok(None)` 代表來源已結束
    async fn next_frame(&mut self) -> Result<Option<GestureFrame>>;

    async fn stop(&mut self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<S: GestureSource + ?Sized> GestureSource for Box<S> {
    fn model_info(&self) -> &ModelInfo {
        (**self).model_info()
    }

    async fn next_frame(&mut self) -> Result<Option<GestureFrame>> {
        (**self).next_frame().await
    }

    async fn stop(&mut self) -> Result<()> {
        (**self).stop().await
    }
}

pub trait Display: Send {
    fn size(&self) -> (u32, u32);
    fn present(&mut self, canvas: &Canvas) -> Result<()>;
}

/// 手勢 → 遊戲指令。手勢 task 呼叫 `observe`，遊戲迴圈呼叫 `take`
pub trait Controls: Send + 'static {
    type Command: Default + Send;

    fn observe(&mut self, frame: &GestureFrame, now: Instant);
    fn take(&mut self, now: Instant) -> Self::Command;
    fn last_gesture(&self) -> Option<&str>;
}

/// 畫 HUD 需要的額外資訊
#[derive(Default)]
pub struct Hud<'a> {
    pub font: Option<&'a HudFont>,
    pub last_gesture: Option<String>,
    pub best_score: Option<u32>,
}

pub trait Game: Send {
    type Controls: Controls;

    fn title(&self) -> &str;
    fn size(&self) -> (u32, u32);
    fn fps(&self) -> u32;
    fn controls(&self, model: &ModelInfo) -> Self::Controls;
    fn step(
        &mut self,
        command: <Self::Controls as Controls>::Command,
        now: Instant,
    ) -> GameStatus;
    fn draw(&self, canvas: &mut Canvas, hud: &Hud<'_>);
    fn outcome(&self) -> GameOutcome;

    fn draw_game_over(&self, canvas: &mut Canvas, hud: &Hud<'_>) {
        canvas.fill([235, 235, 235]);
        if let Some(font) = hud.font {
            let px = 48.0;
            let y = (canvas.height() as f32 / 2.0 - font.line_height(px) / 2.0) as i32;
            canvas.draw_text_centered(font, "GAME OVER", y, px, [200, 0, 0]);
        }
    }
}

//! 模拟时钟

use std::cell::Cell;

use book_runtime::Clock;

/// 模拟时钟
///
/// 真实时间不受时间缩放影响；游戏时间按缩放累加。
#[derive(Debug)]
pub struct SimClock {
    real: Cell<f64>,
    game: Cell<f64>,
    scale: Cell<f32>,
}

impl SimClock {
    pub fn new() -> Self {
        Self {
            real: Cell::new(0.0),
            game: Cell::new(0.0),
            scale: Cell::new(1.0),
        }
    }

    /// 推进一个调度周期
    pub fn advance(&self, dt: f64) {
        self.real.set(self.real.get() + dt);
        self.game
            .set(self.game.get() + dt * f64::from(self.scale.get()));
    }

    /// 累计的游戏时间（秒）
    pub fn game_time_seconds(&self) -> f64 {
        self.game.get()
    }
}

impl Default for SimClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SimClock {
    fn real_time_seconds(&self) -> f64 {
        self.real.get()
    }

    fn set_time_scale(&self, scale: f32) {
        self.scale.set(scale);
    }

    fn time_scale(&self) -> f32 {
        self.scale.get()
    }
}

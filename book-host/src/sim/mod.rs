//! # Sim 模块
//!
//! 无窗口环境下的模拟后端：时钟、骨骼动画引擎、场景加载器。
//!
//! 所有模拟器都是可克隆的共享句柄（`Rc<RefCell<..>>`），宿主持有一份用于推进时间，
//! 另一份交给编排器作为协作者。

mod animation;
mod clock;
mod scene;

pub use animation::SimAnimationEngine;
pub use clock::SimClock;
pub use scene::SimSceneLoader;

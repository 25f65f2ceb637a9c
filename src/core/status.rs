//! 状态快照板：保存最近一次推送的过程事件
//!
//! 编排循环每发出一个事件就同步写入一份到这里，供 `/api/status` 之类的
//! 快照查询使用；从未跑过 run 时为 Idle（None）。读写都是短临界区，
//! 用 std RwLock 即可，不需要异步锁。

use std::sync::{Arc, RwLock};

use crate::flow::RunEvent;

/// 最近事件快照的共享句柄，可在多个 run / 多个消费者间克隆
#[derive(Clone, Default)]
pub struct StatusBoard {
    latest: Arc<RwLock<Option<RunEvent>>>,
}

impl StatusBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一个刚发出的事件（覆盖旧值）
    pub fn record(&self, event: &RunEvent) {
        if let Ok(mut guard) = self.latest.write() {
            *guard = Some(event.clone());
        }
    }

    /// 最近一次事件；None 表示从未执行过任何 run（Idle）
    pub fn latest(&self) -> Option<RunEvent> {
        self.latest.read().ok().and_then(|g| g.clone())
    }

    /// 是否处于 Idle（尚无任何事件）
    pub fn is_idle(&self) -> bool {
        self.latest().is_none()
    }
}

//! Mock 执行器（用于测试，无需浏览器）
//!
//! 按脚本依次返回预置结果或故障，并记录收到的子任务描述，
//! 便于断言编排循环的调用顺序与重试次数。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::actuator::{Actuator, ActuatorRun};

/// 脚本化 Mock 执行器
#[derive(Debug, Default)]
pub struct MockActuator {
    script: Mutex<VecDeque<Result<ActuatorRun, String>>>,
    seen: Mutex<Vec<String>>,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一次成功结果（仅最终结论）
    pub fn push_final(&self, text: impl Into<String>) {
        self.script
            .lock()
            .expect("mock lock")
            .push_back(Ok(ActuatorRun::final_only(text)));
    }

    /// 追加一次成功结果（仅步骤提取文本）
    pub fn push_extracts(&self, extracts: Vec<String>) {
        self.script
            .lock()
            .expect("mock lock")
            .push_back(Ok(ActuatorRun::extracts_only(extracts)));
    }

    /// 追加一次空结果（既无结论也无提取）
    pub fn push_empty(&self) {
        self.script
            .lock()
            .expect("mock lock")
            .push_back(Ok(ActuatorRun::default()));
    }

    /// 追加一次故障
    pub fn push_fault(&self, reason: impl Into<String>) {
        self.script
            .lock()
            .expect("mock lock")
            .push_back(Err(reason.into()));
    }

    /// 已收到的子任务描述（按调用顺序）
    pub fn seen_descriptions(&self) -> Vec<String> {
        self.seen.lock().expect("mock lock").clone()
    }

    /// 总调用次数
    pub fn call_count(&self) -> usize {
        self.seen.lock().expect("mock lock").len()
    }
}

#[async_trait]
impl Actuator for MockActuator {
    async fn run(&self, description: &str) -> Result<ActuatorRun, String> {
        self.seen
            .lock()
            .expect("mock lock")
            .push(description.to_string());
        let next = self.script.lock().expect("mock lock").pop_front();
        match next {
            Some(result) => result,
            None => Err("mock actuator: script exhausted".to_string()),
        }
    }
}

//! Mock LLM 客户端（用于测试，无需 API）
//!
//! 按脚本依次返回预置回复；队列取空后返回固定的兜底回复。
//! 可注入失败（push_failure）以验证规划 / 总结阶段的终止路径。

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::{LlmClient, Message};

/// 脚本化 Mock 客户端：依次弹出预置回复，并记录每次调用的末条用户消息
#[derive(Debug, Default)]
pub struct MockLlmClient {
    responses: Mutex<VecDeque<Result<String, String>>>,
    fallback: String,
    seen_prompts: Mutex<Vec<String>>,
}

impl MockLlmClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// 固定兜底回复（脚本耗尽后使用）
    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = fallback.into();
        self
    }

    /// 追加一条脚本回复
    pub fn push_response(&self, response: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Ok(response.into()));
    }

    /// 追加一次调用失败
    pub fn push_failure(&self, reason: impl Into<String>) {
        self.responses
            .lock()
            .expect("mock lock")
            .push_back(Err(reason.into()));
    }

    /// 每次调用收到的末条用户消息内容（按调用顺序）
    pub fn seen_prompts(&self) -> Vec<String> {
        self.seen_prompts.lock().expect("mock lock").clone()
    }

    /// 总调用次数
    pub fn call_count(&self) -> usize {
        self.seen_prompts.lock().expect("mock lock").len()
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String, String> {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| matches!(m.role, crate::llm::Role::User))
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.seen_prompts.lock().expect("mock lock").push(last_user);

        let next = self.responses.lock().expect("mock lock").pop_front();
        match next {
            Some(result) => result,
            None => Ok(self.fallback.clone()),
        }
    }
}

//! Summarizer：把累计发现汇总成直接回答原始意图的最终答案
//!
//! 一次性步骤，不重试；LLM 故障作为 SummaryFailed 终止 run。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// 总结 system prompt
pub const SUMMARIZE_SYSTEM_PROMPT: &str = "\
You are a helpful research assistant. Given the collected findings from
several browsing sub-tasks, produce a clear, concise summary that directly
answers the user's original intent.";

/// Summarizer：持有 LLM 与 system prompt
pub struct Summarizer {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Summarizer {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: SUMMARIZE_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// 汇总意图与全部发现为一段最终答案
    pub async fn summarize(&self, intent: &str, findings: &[String]) -> Result<String, AgentError> {
        let findings_text = findings.join("\n---\n");
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(format!(
                "Original intent: {}\n\nFindings:\n{}",
                intent, findings_text
            )),
        ];
        self.llm
            .complete(&messages)
            .await
            .map_err(AgentError::SummaryFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[tokio::test]
    async fn test_summarize_returns_llm_text() {
        let llm = MockLlmClient::new();
        llm.push_response("final answer");
        let summarizer = Summarizer::new(Arc::new(llm));

        let summary = summarizer
            .summarize("intent", &["a".to_string(), "b".to_string()])
            .await
            .unwrap();
        assert_eq!(summary, "final answer");
    }

    #[tokio::test]
    async fn test_llm_fault_propagates() {
        let llm = MockLlmClient::new();
        llm.push_failure("down");
        let summarizer = Summarizer::new(Arc::new(llm));

        let err = summarizer.summarize("intent", &[]).await.unwrap_err();
        assert!(matches!(err, AgentError::SummaryFailed(_)));
    }
}

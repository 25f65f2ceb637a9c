//! Verifier：对子任务的一次尝试给出裁决
//!
//! 执行成功的任务交给 LLM 质检，期望结构化裁决 JSON；输出不可解析或
//! LLM 本身故障时一律放行（fail open——绝不因下游解析问题卡住一个
//! 成功结果）。执行出故障的任务不消耗 LLM：还有重试预算就 Retry，
//! 否则 Accept（强制完成，继续重试没有意义）。

use std::sync::Arc;

use serde::Deserialize;

use crate::core::AgentError;
use crate::flow::state::{SubTask, TaskStatus};
use crate::llm::{LlmClient, Message};

/// 质检 system prompt：要求输出裁决 JSON
pub const VERIFY_SYSTEM_PROMPT: &str = "\
You are a quality-assurance reviewer for a browser automation agent.
Given the sub-task description and its result (or error), decide:
  - \"ok\"    -> the result is satisfactory, move on.
  - \"retry\" -> the result is wrong or empty, retry the sub-task.
  - \"adjust\" -> the sub-task description needs rewording; provide the new description.

Respond with a JSON object: {\"verdict\": \"ok\"|\"retry\"|\"adjust\", \"new_description\": \"...\"}";

/// 裁决：放行 / 原样重试 / 改写描述后重试
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Verdict {
    Accept,
    Retry,
    Adjust(String),
}

#[derive(Debug, Deserialize)]
struct RawVerdict {
    verdict: String,
    #[serde(default)]
    new_description: Option<String>,
}

/// 从 LLM 输出中提取裁决 JSON（容忍 ```json 围栏与前后多余文字）
pub fn parse_verdict_output(output: &str) -> Result<Verdict, AgentError> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        &trimmed[start..=end]
    } else {
        trimmed
    };

    let raw: RawVerdict = serde_json::from_str(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))?;

    Ok(match raw.verdict.as_str() {
        "retry" => Verdict::Retry,
        // adjust 但没给新描述，等价于原样重试
        "adjust" => raw
            .new_description
            .filter(|d| !d.trim().is_empty())
            .map(Verdict::Adjust)
            .unwrap_or(Verdict::Retry),
        // "ok" 与未知裁决一律放行
        _ => Verdict::Accept,
    })
}

/// Verifier：持有 LLM 与 system prompt
pub struct Verifier {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Verifier {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: VERIFY_SYSTEM_PROMPT.to_string(),
        }
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// 对子任务的最新一次尝试给出裁决
    ///
    /// 执行成功的任务带着结果交 LLM 质检；故障任务走确定性分支，
    /// LLM 路径不读取错误文本。
    pub async fn verify(&self, task: &SubTask, max_retries: u32) -> Verdict {
        match task.status {
            TaskStatus::Failed => {
                // 故障路径是确定性的，不消耗 LLM
                if task.retries < max_retries {
                    Verdict::Retry
                } else {
                    Verdict::Accept
                }
            }
            _ => {
                let outcome = task.result.as_deref().unwrap_or("(no result)");
                let message = format!("Sub-task: {}\nResult: {}", task.description, outcome);
                let messages = vec![
                    Message::system(self.system_prompt.clone()),
                    Message::user(message),
                ];
                match self.llm.complete(&messages).await {
                    Ok(output) => match parse_verdict_output(&output) {
                        Ok(verdict) => verdict,
                        Err(e) => {
                            tracing::warn!(error = %e, "verdict unparseable, accepting result");
                            Verdict::Accept
                        }
                    },
                    Err(e) => {
                        tracing::warn!(error = %e, "verifier LLM fault, accepting result");
                        Verdict::Accept
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    fn done_task(result: &str) -> SubTask {
        let mut task = SubTask::new(0, "check price");
        task.status = TaskStatus::Done;
        task.result = Some(result.to_string());
        task
    }

    #[test]
    fn test_parse_ok_verdict() {
        let v = parse_verdict_output(r#"{"verdict": "ok"}"#).unwrap();
        assert_eq!(v, Verdict::Accept);
    }

    #[test]
    fn test_parse_adjust_verdict() {
        let v =
            parse_verdict_output(r#"{"verdict": "adjust", "new_description": "open page 2"}"#)
                .unwrap();
        assert_eq!(v, Verdict::Adjust("open page 2".to_string()));
    }

    #[test]
    fn test_parse_adjust_without_description_is_retry() {
        let v = parse_verdict_output(r#"{"verdict": "adjust"}"#).unwrap();
        assert_eq!(v, Verdict::Retry);
    }

    #[test]
    fn test_parse_unknown_verdict_is_accept() {
        let v = parse_verdict_output(r#"{"verdict": "maybe"}"#).unwrap();
        assert_eq!(v, Verdict::Accept);
    }

    #[tokio::test]
    async fn test_fail_open_on_invalid_json() {
        let llm = MockLlmClient::new();
        llm.push_response("garbage, not json");
        let verifier = Verifier::new(Arc::new(llm));

        let verdict = verifier.verify(&done_task("result"), 3).await;
        assert_eq!(verdict, Verdict::Accept);
    }

    #[tokio::test]
    async fn test_fail_open_on_llm_fault() {
        let llm = MockLlmClient::new();
        llm.push_failure("timeout");
        let verifier = Verifier::new(Arc::new(llm));

        let verdict = verifier.verify(&done_task("result"), 3).await;
        assert_eq!(verdict, Verdict::Accept);
    }

    #[tokio::test]
    async fn test_llm_prompt_carries_task_result() {
        let llm = Arc::new(MockLlmClient::new().with_fallback(r#"{"verdict": "ok"}"#));
        let verifier = Verifier::new(llm.clone());

        verifier.verify(&done_task("price is 42"), 3).await;

        let prompts = llm.seen_prompts();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("check price"));
        assert!(prompts[0].contains("price is 42"));
    }

    #[tokio::test]
    async fn test_failed_task_with_budget_is_retry() {
        let llm = MockLlmClient::new();
        let verifier = Verifier::new(Arc::new(llm));

        let mut task = SubTask::new(0, "x");
        task.status = TaskStatus::Failed;
        task.retries = 1;

        let verdict = verifier.verify(&task, 3).await;
        assert_eq!(verdict, Verdict::Retry);
    }

    #[tokio::test]
    async fn test_failed_task_does_not_consume_llm() {
        let llm = Arc::new(MockLlmClient::new());
        let verifier = Verifier::new(llm.clone());

        let mut task = SubTask::new(0, "x");
        task.status = TaskStatus::Failed;
        task.retries = 3;

        let verdict = verifier.verify(&task, 3).await;
        assert_eq!(verdict, Verdict::Accept);
        assert_eq!(llm.call_count(), 0);
    }
}

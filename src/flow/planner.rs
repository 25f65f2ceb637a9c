//! Planner：将自由意图分解为有序子任务列表
//!
//! 调用 LLM 期望得到 JSON 字符串数组；解析失败时必须兜底为
//! 「整个意图作为单个子任务」，保证非空意图下编排层总有 ≥1 个子任务。
//! 本层不重试：LLM 故障作为 PlanningFailed 向调用方传播。

use std::sync::Arc;

use crate::core::AgentError;
use crate::llm::{LlmClient, Message};

/// 规划 system prompt：要求只输出 JSON 字符串数组
pub const PLAN_SYSTEM_PROMPT: &str = "\
You are a browsing-task planner. Given the user's intent, decompose it into
a minimal ordered list of concrete browser sub-tasks.

Respond ONLY with a JSON array of strings — each string is one sub-task.
Example: [\"Search eBay for RTX 5070\", \"Open the cheapest listing\"]";

/// 从 LLM 输出中提取 JSON 数组并解析为字符串列表
/// （容忍 ```json 围栏与数组前后的多余文字）
pub fn parse_plan_output(output: &str) -> Result<Vec<String>, AgentError> {
    let trimmed = output.trim();

    let json_str = if let Some(start) = trimmed.find("```json") {
        let rest = &trimmed[start + 7..];
        rest.find("```")
            .map(|end| rest[..end].trim())
            .unwrap_or_else(|| rest.trim())
    } else if let (Some(start), Some(end)) = (trimmed.find('['), trimmed.rfind(']')) {
        &trimmed[start..=end]
    } else {
        trimmed
    };

    serde_json::from_str::<Vec<String>>(json_str)
        .map_err(|e| AgentError::JsonParseError(format!("{}: {}", e, json_str)))
}

/// Planner：持有 LLM 与 system prompt，plan(intent) 返回有序子任务描述
pub struct Planner {
    llm: Arc<dyn LlmClient>,
    system_prompt: String,
}

impl Planner {
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self {
            llm,
            system_prompt: PLAN_SYSTEM_PROMPT.to_string(),
        }
    }

    /// 覆盖默认 system prompt（如从 config/prompts 加载）
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    /// 分解意图；LLM 故障 → PlanningFailed，输出不可解析 → 单任务兜底
    pub async fn plan(&self, intent: &str) -> Result<Vec<String>, AgentError> {
        let messages = vec![
            Message::system(self.system_prompt.clone()),
            Message::user(intent.to_string()),
        ];
        let output = self
            .llm
            .complete(&messages)
            .await
            .map_err(AgentError::PlanningFailed)?;

        match parse_plan_output(&output) {
            Ok(tasks) => Ok(tasks),
            Err(e) => {
                tracing::warn!(error = %e, "plan output unparseable, falling back to single task");
                Ok(vec![intent.to_string()])
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::MockLlmClient;

    #[test]
    fn test_parse_plain_array() {
        let tasks = parse_plan_output(r#"["open page", "read price"]"#).unwrap();
        assert_eq!(tasks, vec!["open page", "read price"]);
    }

    #[test]
    fn test_parse_fenced_array_with_prose() {
        let output = "Here is the plan:\n```json\n[\"a\", \"b\"]\n```\nGood luck!";
        let tasks = parse_plan_output(output).unwrap();
        assert_eq!(tasks, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_invalid_is_error() {
        assert!(parse_plan_output("I cannot help with that").is_err());
    }

    #[tokio::test]
    async fn test_fallback_on_invalid_json() {
        let llm = MockLlmClient::new();
        llm.push_response("not a json array at all");
        let planner = Planner::new(Arc::new(llm));

        let tasks = planner.plan("find cheapest RTX 5070").await.unwrap();
        assert_eq!(tasks, vec!["find cheapest RTX 5070".to_string()]);
    }

    #[tokio::test]
    async fn test_llm_fault_propagates() {
        let llm = MockLlmClient::new();
        llm.push_failure("connection refused");
        let planner = Planner::new(Arc::new(llm));

        let err = planner.plan("anything").await.unwrap_err();
        assert!(matches!(err, AgentError::PlanningFailed(_)));
    }
}

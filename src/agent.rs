//! Headless Agent 运行时
//!
//! 供二进制与嵌入方调用的无界面逻辑：create_agent_components 按配置
//! 构建 Planner / Executor / Verifier / Summarizer，run_intent /
//! run_intent_stream 对单条意图跑完整编排流程并返回最终总结。

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::actuator::Actuator;
use crate::config::{AppConfig, LlmSection};
use crate::core::{AgentError, StatusBoard};
use crate::flow::{
    run_flow, Executor, Planner, RunEvent, RunSession, Summarizer, Verifier,
};
use crate::llm::{LlmClient, OpenAiClient};

/// 预构建的 Agent 组件，可在多个 run 间共享
pub struct AgentComponents {
    pub planner: Planner,
    pub executor: Executor,
    pub verifier: Verifier,
    pub summarizer: Summarizer,
    pub max_retries: u32,
}

/// 从配置创建 OpenAI 兼容 LLM 客户端（端点、密钥环境变量、温度、超时）
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    Arc::new(
        OpenAiClient::new(
            cfg.llm.base_url.as_deref(),
            &cfg.llm.model,
            resolve_api_key(&cfg.llm).as_deref(),
        )
        .with_temperature(cfg.llm.temperature)
        .with_request_timeout(Duration::from_secs(cfg.llm.timeouts.request)),
    )
}

/// 按 [llm] api_key_env 指定的环境变量读取 API Key，未配置时用 OPENAI_API_KEY
fn resolve_api_key(llm: &LlmSection) -> Option<String> {
    let var = llm.api_key_env.as_deref().unwrap_or("OPENAI_API_KEY");
    std::env::var(var).ok()
}

/// 可选的 prompt 覆盖文件：config/prompts/{plan,verify,summarize}.txt
fn load_prompt_override(name: &str) -> Option<String> {
    [
        format!("config/prompts/{}.txt", name),
        format!("../config/prompts/{}.txt", name),
    ]
    .into_iter()
    .find_map(|p| std::fs::read_to_string(p).ok())
}

/// 创建 Agent 组件：三个 LLM 步骤共享同一个客户端，执行器由调用方传入
/// （显式所有权句柄，不用全局单例）
pub fn create_agent_components(
    cfg: &AppConfig,
    llm: Arc<dyn LlmClient>,
    actuator: Arc<dyn Actuator>,
) -> AgentComponents {
    let mut planner = Planner::new(llm.clone());
    if let Some(prompt) = load_prompt_override("plan") {
        planner = planner.with_system_prompt(prompt);
    }

    let mut verifier = Verifier::new(llm.clone());
    if let Some(prompt) = load_prompt_override("verify") {
        verifier = verifier.with_system_prompt(prompt);
    }

    let mut summarizer = Summarizer::new(llm);
    if let Some(prompt) = load_prompt_override("summarize") {
        summarizer = summarizer.with_system_prompt(prompt);
    }

    AgentComponents {
        planner,
        executor: Executor::new(actuator)
            .with_step_extract_limit(cfg.browser.step_extract_limit),
        verifier,
        summarizer,
        max_retries: cfg.agent.max_retries,
    }
}

/// 处理单条意图（无事件推送），返回最终总结文本
pub async fn run_intent(
    components: &AgentComponents,
    intent: &str,
) -> Result<String, AgentError> {
    let session = RunSession::new(
        &components.planner,
        &components.executor,
        &components.verifier,
        &components.summarizer,
        CancellationToken::new(),
    );
    let result = run_flow(&session, intent, components.max_retries).await?;
    Ok(result.summary)
}

/// 流式处理单条意图：通过 event_tx 推送每步快照与终止事件，
/// 同步镜像到 status 供快照查询
pub async fn run_intent_stream(
    components: &AgentComponents,
    intent: &str,
    event_tx: &UnboundedSender<RunEvent>,
    status: &StatusBoard,
    cancel_token: CancellationToken,
) -> Result<String, AgentError> {
    let session = RunSession::new(
        &components.planner,
        &components.executor,
        &components.verifier,
        &components.summarizer,
        cancel_token,
    )
    .with_event_tx(event_tx)
    .with_status(status);
    let result = run_flow(&session, intent, components.max_retries).await?;
    Ok(result.summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_api_key_honours_configured_env_var() {
        std::env::set_var("MAGPIE_TEST_LLM_KEY", "sk-test");
        let llm = LlmSection {
            api_key_env: Some("MAGPIE_TEST_LLM_KEY".to_string()),
            ..LlmSection::default()
        };
        assert_eq!(resolve_api_key(&llm).as_deref(), Some("sk-test"));
        std::env::remove_var("MAGPIE_TEST_LLM_KEY");
    }

    #[test]
    fn test_resolve_api_key_missing_var_is_none() {
        let llm = LlmSection {
            api_key_env: Some("MAGPIE_TEST_LLM_KEY_UNSET".to_string()),
            ..LlmSection::default()
        };
        assert!(resolve_api_key(&llm).is_none());
    }
}

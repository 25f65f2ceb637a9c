//! Agent 错误类型
//!
//! 区分两类失败：子任务级失败（ActuatorFailed，由编排循环内的重试策略消化，
//! 不会终止整个 run）与 run 级失败（PlanningFailed / SummaryFailed / Cancelled，
//! 直接作为终止原因向调用方传播）。

use thiserror::Error;

/// Agent 运行过程中可能出现的错误（LLM、解析、执行器、配置等）
#[derive(Error, Debug)]
pub enum AgentError {
    /// 规划阶段 LLM 调用失败（一次性步骤，不重试，终止 run）
    #[error("Planning failed: {0}")]
    PlanningFailed(String),

    /// 总结阶段 LLM 调用失败（一次性步骤，不重试，终止 run）
    #[error("Summary failed: {0}")]
    SummaryFailed(String),

    /// 执行器（浏览器）未能完成子任务；由编排循环按 max_retries 重试
    #[error("Actuator failed: {0}")]
    ActuatorFailed(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    /// 协作方输出无法解析；只在 Planner / Verifier 内部使用，
    /// 对外表现为各自的兜底行为（单任务计划 / 放行）
    #[error("JSON parse error: {0}")]
    JsonParseError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    /// 用户在步骤边界取消了 run
    #[error("Cancelled")]
    Cancelled,
}

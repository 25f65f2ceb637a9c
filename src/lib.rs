//! Magpie - Rust 浏览智能体编排器
//!
//! 把一条自然语言意图分解为有序子任务计划，逐个经浏览器执行器执行、
//! LLM 校验，失败的子任务在预算内重试或改写，最后汇总为一段最终答案。
//!
//! 模块划分：
//! - **agent**: 无头运行时（按配置组装组件、跑单条意图）
//! - **actuator**: 执行器抽象与实现（Headless Chrome / Mock）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型与最近状态快照板
//! - **flow**: 编排核心（计划数据模型、过程事件、Plan/Execute/Verify/Summarize 主循环）
//! - **llm**: LLM 客户端抽象与实现（OpenAI 兼容 / Mock）

pub mod actuator;
pub mod agent;
pub mod config;
pub mod core;
pub mod flow;
pub mod llm;

pub use agent::{create_agent_components, run_intent, run_intent_stream, AgentComponents};
pub use crate::core::{AgentError, StatusBoard};
pub use flow::{run_flow, FlowResult, RunEvent, RunSession};

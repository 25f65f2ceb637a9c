//! 执行器（Actuator）抽象：真实世界动作的外部系统
//!
//! 每次 run 执行一条自然语言子任务并返回结构化结果：可选的最终结论
//! （final_result）与各浏览步骤提取的文本（extracts）。如何从二者组装
//! 子任务结果文本由 flow::executor 决定，执行器只负责汇报。
//!
//! 实现为显式传入的所有权句柄，不使用模块级单例；跨 run 的会话串行化
//! 由 flow::executor 的信号量保证。

pub mod mock;

#[cfg(feature = "browser")]
pub mod chrome;

use async_trait::async_trait;

pub use mock::MockActuator;

#[cfg(feature = "browser")]
pub use chrome::ChromeActuator;

/// 一次执行的结构化结果
#[derive(Debug, Clone, Default)]
pub struct ActuatorRun {
    /// 执行器明确给出的最终结论（若有则优先使用）
    pub final_result: Option<String>,
    /// 各子步骤提取到的文本，按发生顺序排列
    pub extracts: Vec<String>,
}

impl ActuatorRun {
    /// 仅有最终结论的结果
    pub fn final_only(text: impl Into<String>) -> Self {
        Self {
            final_result: Some(text.into()),
            extracts: Vec::new(),
        }
    }

    /// 仅有步骤提取文本的结果
    pub fn extracts_only(extracts: Vec<String>) -> Self {
        Self {
            final_result: None,
            extracts,
        }
    }
}

/// 执行器 trait：对一条子任务描述执行一次真实动作
#[async_trait]
pub trait Actuator: Send + Sync {
    /// 执行一条子任务；失败返回故障描述。不做内部重试，
    /// 重试策略全部在编排层。
    async fn run(&self, description: &str) -> Result<ActuatorRun, String>;
}

//! Executor：对单条子任务描述调用一次执行器并组装文本结果
//!
//! 结果组装：优先取执行器的最终结论；否则取最后 N 个步骤提取文本
//! 换行拼接；都没有则返回哨兵字符串。执行器不幂等（可能重复真实世界
//! 副作用），本层绝不内部重试。
//!
//! 执行器（浏览器）可能是多个并发 run 共享的单实例，不支持会话交错，
//! 用单许可 Semaphore 保证任意时刻至多一个执行会话。

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::Semaphore;

use crate::actuator::Actuator;
use crate::core::AgentError;

/// 无任何可提取内容时的哨兵结果
pub const NO_CONTENT_SENTINEL: &str = "[no content extracted]";

/// 默认取最后几个步骤的提取文本
pub const DEFAULT_STEP_EXTRACT_LIMIT: usize = 3;

/// Executor：持有执行器句柄与会话门闩
pub struct Executor {
    actuator: Arc<dyn Actuator>,
    session_gate: Arc<Semaphore>,
    step_extract_limit: usize,
}

impl Executor {
    pub fn new(actuator: Arc<dyn Actuator>) -> Self {
        Self {
            actuator,
            session_gate: Arc::new(Semaphore::new(1)),
            step_extract_limit: DEFAULT_STEP_EXTRACT_LIMIT,
        }
    }

    /// 覆盖「最后 N 步」拼接上限
    pub fn with_step_extract_limit(mut self, limit: usize) -> Self {
        self.step_extract_limit = limit.max(1);
        self
    }

    /// 多个 Executor 共享同一个执行器实例时，传入同一个门闩
    pub fn with_session_gate(mut self, gate: Arc<Semaphore>) -> Self {
        self.session_gate = gate;
        self
    }

    /// 执行一条子任务描述，返回组装好的文本结果；故障 → ActuatorFailed
    pub async fn execute(&self, description: &str) -> Result<String, AgentError> {
        let _permit = self
            .session_gate
            .acquire()
            .await
            .expect("session gate closed");

        let start = Instant::now();
        let result = self.actuator.run(description).await;
        let duration_ms = start.elapsed().as_millis() as u64;
        tracing::info!(
            ok = result.is_ok(),
            duration_ms,
            description = %description,
            "actuator run"
        );

        let run = result.map_err(AgentError::ActuatorFailed)?;

        if let Some(final_result) = run.final_result {
            return Ok(final_result);
        }

        let extracts: Vec<&str> = run
            .extracts
            .iter()
            .map(|s| s.as_str())
            .filter(|s| !s.trim().is_empty())
            .collect();
        if extracts.is_empty() {
            return Ok(NO_CONTENT_SENTINEL.to_string());
        }

        let tail_start = extracts.len().saturating_sub(self.step_extract_limit);
        Ok(extracts[tail_start..].join("\n"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actuator::MockActuator;

    fn executor_with(actuator: MockActuator) -> Executor {
        Executor::new(Arc::new(actuator))
    }

    #[tokio::test]
    async fn test_prefers_final_result() {
        let actuator = MockActuator::new();
        actuator.push_final("the answer");
        let executor = executor_with(actuator);

        let result = executor.execute("task").await.unwrap();
        assert_eq!(result, "the answer");
    }

    #[tokio::test]
    async fn test_joins_last_three_extracts() {
        let actuator = MockActuator::new();
        actuator.push_extracts(vec![
            "one".into(),
            "two".into(),
            "three".into(),
            "four".into(),
        ]);
        let executor = executor_with(actuator);

        let result = executor.execute("task").await.unwrap();
        assert_eq!(result, "two\nthree\nfour");
    }

    #[tokio::test]
    async fn test_sentinel_when_nothing_extracted() {
        let actuator = MockActuator::new();
        actuator.push_empty();
        let executor = executor_with(actuator);

        let result = executor.execute("task").await.unwrap();
        assert_eq!(result, NO_CONTENT_SENTINEL);
    }

    #[tokio::test]
    async fn test_fault_maps_to_actuator_failed() {
        let actuator = MockActuator::new();
        actuator.push_fault("browser crashed");
        let executor = executor_with(actuator);

        let err = executor.execute("task").await.unwrap_err();
        assert!(matches!(err, AgentError::ActuatorFailed(_)));
    }
}

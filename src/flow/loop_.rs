//! 编排主循环
//!
//! Plan -> (Execute -> Verify -> 路由)* -> Summarize。单个 run 严格串行；
//! 子任务故障在循环内按 max_retries 重试并优雅降级为哨兵结果，只有
//! 规划 / 总结故障与取消会终止整个 run。每个状态迁移后向 event_tx 推送
//! 一份快照，并镜像写入 StatusBoard；取消令牌在每个步骤边界检查。

use tokio::sync::mpsc::UnboundedSender;
use tokio_util::sync::CancellationToken;

use crate::core::{AgentError, StatusBoard};
use crate::flow::events::{RunEvent, Step};
use crate::flow::executor::Executor;
use crate::flow::planner::Planner;
use crate::flow::state::{RunState, TaskStatus};
use crate::flow::summarizer::Summarizer;
use crate::flow::verifier::{Verdict, Verifier};

/// 重试耗尽且没有任何结果时写入的哨兵
pub const MAX_RETRIES_SENTINEL: &str = "[no result — max retries exceeded]";

/// 循环执行结果：最终总结与收尾时的完整状态
#[derive(Debug)]
pub struct FlowResult {
    pub summary: String,
    pub state: RunState,
}

/// 单个 run 的会话配置
pub struct RunSession<'a> {
    /// 意图分解（必需）
    pub planner: &'a Planner,
    /// 子任务执行（必需）
    pub executor: &'a Executor,
    /// 结果校验（必需）
    pub verifier: &'a Verifier,
    /// 最终总结（必需）
    pub summarizer: &'a Summarizer,
    /// 取消令牌（必需）
    pub cancel_token: CancellationToken,
    /// 可选：事件推送通道
    pub event_tx: Option<&'a UnboundedSender<RunEvent>>,
    /// 可选：最近事件快照板
    pub status: Option<&'a StatusBoard>,
}

impl<'a> RunSession<'a> {
    /// 创建最小配置的 RunSession
    pub fn new(
        planner: &'a Planner,
        executor: &'a Executor,
        verifier: &'a Verifier,
        summarizer: &'a Summarizer,
        cancel_token: CancellationToken,
    ) -> Self {
        Self {
            planner,
            executor,
            verifier,
            summarizer,
            cancel_token,
            event_tx: None,
            status: None,
        }
    }

    /// 设置事件推送通道
    pub fn with_event_tx(mut self, tx: &'a UnboundedSender<RunEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    /// 设置状态快照板
    pub fn with_status(mut self, status: &'a StatusBoard) -> Self {
        self.status = Some(status);
        self
    }
}

fn emit(session: &RunSession<'_>, event: RunEvent) {
    if let Some(board) = session.status {
        board.record(&event);
    }
    if let Some(tx) = session.event_tx {
        let _ = tx.send(event);
    }
}

fn cancelled(session: &RunSession<'_>) -> bool {
    if session.cancel_token.is_cancelled() {
        emit(session, RunEvent::Cancelled);
        return true;
    }
    false
}

/// 执行完整编排流程
///
/// 意图 -> Planner 建计划 -> 逐个子任务 Execute + Verify（同任务重试 /
/// 改写后重试 / 按下标推进）-> 无 Pending 后 Summarize -> Result 事件。
pub async fn run_flow(
    session: &RunSession<'_>,
    intent: &str,
    max_retries: u32,
) -> Result<FlowResult, AgentError> {
    let mut state = RunState::new(intent, max_retries);

    // Planning：一次性步骤，故障不重试、直接终止
    if cancelled(session) {
        return Err(AgentError::Cancelled);
    }
    let descriptions = match session.planner.plan(intent).await {
        Ok(d) => d,
        Err(e) => {
            emit(session, RunEvent::Error { text: e.to_string() });
            return Err(e);
        }
    };
    state.install_plan(descriptions);
    emit(
        session,
        RunEvent::snapshot(
            Step::ParseIntent,
            format!("Plan ready — {} sub-task(s).", state.sub_tasks.len()),
            &state,
        ),
    );

    // 空计划是合法的退化情形：直接去总结
    while state.current_task().is_some() {
        // Executing
        if cancelled(session) {
            return Err(AgentError::Cancelled);
        }
        execute_current(session, &mut state).await;

        // Verifying
        if cancelled(session) {
            return Err(AgentError::Cancelled);
        }
        verify_current(session, &mut state).await;

        // 路由：当前仍 Pending 则原地重试，否则推进到第一个 Pending，
        // 都没有则离开循环去总结
        match state.current_task().map(|t| t.status) {
            Some(TaskStatus::Pending) => continue,
            _ => match state.first_pending_index() {
                Some(index) => {
                    state.current_task_index = index;
                    emit(
                        session,
                        RunEvent::snapshot(
                            Step::Advance,
                            format!("Advancing to sub-task {}.", index),
                            &state,
                        ),
                    );
                }
                None => break,
            },
        }
    }

    // Summarizing：一次性步骤，故障不重试、直接终止
    if cancelled(session) {
        return Err(AgentError::Cancelled);
    }
    let summary = match session
        .summarizer
        .summarize(&state.intent, &state.findings)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            emit(session, RunEvent::Error { text: e.to_string() });
            return Err(e);
        }
    };
    state.summary = summary.clone();
    emit(session, RunEvent::snapshot(Step::Summarize, "Done.", &state));
    emit(session, RunEvent::Result {
        summary: summary.clone(),
    });

    Ok(FlowResult { summary, state })
}

/// Executing 步骤：标记 Running、调用执行器、落结果或故障，再发快照
async fn execute_current(session: &RunSession<'_>, state: &mut RunState) {
    let (description, id) = {
        let task = match state.current_task_mut() {
            Some(t) => t,
            None => return,
        };
        task.status = TaskStatus::Running;
        (task.description.clone(), task.id)
    };

    let thought = match session.executor.execute(&description).await {
        Ok(result) => {
            let task = state
                .current_task_mut()
                .expect("current task valid across execute");
            task.result = Some(result.clone());
            task.status = TaskStatus::Done;
            state.findings.push(result);
            format!("Sub-task {} completed.", id)
        }
        Err(e) => {
            let task = state
                .current_task_mut()
                .expect("current task valid across execute");
            task.status = TaskStatus::Failed;
            state.last_error = Some(e.to_string());
            tracing::warn!(sub_task = id, error = %e, "sub-task execution failed");
            format!("Sub-task {} failed: {}", id, e)
        }
    };
    emit(session, RunEvent::snapshot(Step::Execute, thought, state));
}

/// Verifying 步骤：取裁决并应用状态迁移，再发快照
///
/// Retry / Adjust 只在 retries < max_retries 时生效；预算耗尽后任何裁决
/// 都折算为放行，故障任务此时被强制完成（无结果则写哨兵），保证终止。
async fn verify_current(session: &RunSession<'_>, state: &mut RunState) {
    let max_retries = state.max_retries;
    let (verdict, id) = {
        let task = match state.current_task() {
            Some(t) => t,
            None => return,
        };
        let verdict = session.verifier.verify(task, max_retries).await;
        (verdict, task.id)
    };

    let thought = {
        let task = state
            .current_task_mut()
            .expect("current task valid across verify");
        let budget_left = task.retries < max_retries;
        match verdict {
            Verdict::Retry if budget_left => {
                task.retries += 1;
                task.status = TaskStatus::Pending;
                format!("Retrying sub-task {} (attempt {})…", id, task.retries)
            }
            Verdict::Adjust(new_description) if budget_left => {
                task.retries += 1;
                task.status = TaskStatus::Pending;
                task.description = new_description;
                format!("Adjusted sub-task {}: {}", id, task.description)
            }
            _ => {
                // Accept，或预算耗尽时折算为放行
                if task.status == TaskStatus::Failed {
                    task.status = TaskStatus::Done;
                    if task.result.is_none() {
                        task.result = Some(MAX_RETRIES_SENTINEL.to_string());
                    }
                    format!("Sub-task {} exhausted retries. Skipping.", id)
                } else {
                    task.status = TaskStatus::Done;
                    format!("Sub-task {} verified.", id)
                }
            }
        }
    };
    emit(session, RunEvent::snapshot(Step::Verify, thought, state));
}

//! Run 过程事件：每个状态迁移后推送一份不可变快照
//!
//! 编排循环是唯一生产者，传输层（WebSocket / SSE 等）只做透传。
//! 快照在该步骤的状态变更全部落定之后采集，保证自洽。
//! 每个 run 恰好以 Result / Error / Cancelled 三者之一收尾。

use serde::Serialize;

use crate::flow::state::{RunState, SubTask, TaskStatus};

/// 产生快照的步骤名
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    ParseIntent,
    Execute,
    Verify,
    Advance,
    Summarize,
}

/// 子任务在事件里的投影
#[derive(Clone, Debug, Serialize)]
pub struct SubTaskView {
    pub id: usize,
    pub description: String,
    pub status: TaskStatus,
}

impl From<&SubTask> for SubTaskView {
    fn from(task: &SubTask) -> Self {
        Self {
            id: task.id,
            description: task.description.clone(),
            status: task.status,
        }
    }
}

/// 单步过程事件（可序列化为 JSON 供前端展示）
#[derive(Clone, Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    /// 一次状态迁移后的完整快照
    StateUpdate {
        node: Step,
        /// 刚发生了什么的一句话描述
        thought: String,
        current_task_index: usize,
        total_tasks: usize,
        sub_tasks: Vec<SubTaskView>,
    },
    /// 终止：run 成功，携带最终总结
    Result { summary: String },
    /// 终止：run 失败（规划 / 总结阶段故障）
    Error { text: String },
    /// 终止：用户取消
    Cancelled,
}

impl RunEvent {
    /// 从当前 RunState 采集一份 StateUpdate 快照
    pub fn snapshot(node: Step, thought: impl Into<String>, state: &RunState) -> Self {
        RunEvent::StateUpdate {
            node,
            thought: thought.into(),
            current_task_index: state.current_task_index,
            total_tasks: state.sub_tasks.len(),
            sub_tasks: state.sub_tasks.iter().map(SubTaskView::from).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_snapshot_reflects_state() {
        let mut state = RunState::new("intent", 3);
        state.install_plan(vec!["a".into(), "b".into()]);
        state.sub_tasks[0].status = TaskStatus::Done;
        state.current_task_index = 1;

        let event = RunEvent::snapshot(Step::Verify, "checked", &state);
        match event {
            RunEvent::StateUpdate {
                node,
                current_task_index,
                total_tasks,
                sub_tasks,
                ..
            } => {
                assert_eq!(node, Step::Verify);
                assert_eq!(current_task_index, 1);
                assert_eq!(total_tasks, 2);
                assert_eq!(sub_tasks[0].status, TaskStatus::Done);
                assert_eq!(sub_tasks[1].status, TaskStatus::Pending);
            }
            other => panic!("Expected StateUpdate, got {:?}", other),
        }
    }

    #[test]
    fn test_event_json_shape() {
        let state = RunState::new("intent", 3);
        let event = RunEvent::snapshot(Step::ParseIntent, "planned", &state);
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["type"], "state_update");
        assert_eq!(json["node"], "parse_intent");
        assert_eq!(json["total_tasks"], 0);
    }
}

//! Run 状态：子任务计划与贯穿全程的可变上下文
//!
//! RunState 是单个 run 独占的强类型结构体，以 &mut 传过每个步骤函数；
//! 计划创建后顺序不变、条目不增不删，只原位修改描述 / 状态 / 结果 / 重试数。

use serde::Serialize;

/// 子任务状态
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// 尚未尝试，或被校验重置等待重试
    Pending,
    /// 正在执行（瞬态，单个步骤内出现）
    Running,
    /// 已完成：执行成功且校验通过，或重试耗尽被强制完成
    Done,
    /// 执行出故障（瞬态，下一个校验步骤会转为 Pending 或强制 Done）
    Failed,
}

/// 单个子任务
#[derive(Clone, Debug, Serialize)]
pub struct SubTask {
    /// 计划内位置，创建后不变
    pub id: usize,
    /// 可被校验的 adjust 裁决重写
    pub description: String,
    pub status: TaskStatus,
    /// 仅执行成功时写入
    pub result: Option<String>,
    /// 校验触发的重试次数，单调不减，上限 max_retries
    pub retries: u32,
}

impl SubTask {
    pub fn new(id: usize, description: impl Into<String>) -> Self {
        Self {
            id,
            description: description.into(),
            status: TaskStatus::Pending,
            result: None,
            retries: 0,
        }
    }
}

/// 单个 run 的完整可变上下文
#[derive(Clone, Debug)]
pub struct RunState {
    /// 原始意图，创建后不变
    pub intent: String,
    pub sub_tasks: Vec<SubTask>,
    /// 当前执行的子任务下标；计划非空时始终有效
    pub current_task_index: usize,
    /// 每个完成的执行各追加一条，只增不删
    pub findings: Vec<String>,
    pub last_error: Option<String>,
    pub max_retries: u32,
    /// 终止步骤前为空串
    pub summary: String,
}

impl RunState {
    pub fn new(intent: impl Into<String>, max_retries: u32) -> Self {
        Self {
            intent: intent.into(),
            sub_tasks: Vec::new(),
            current_task_index: 0,
            findings: Vec::new(),
            last_error: None,
            max_retries,
            summary: String::new(),
        }
    }

    /// 用 Planner 产出的描述填充计划：id = 位置，全部 Pending，下标归零
    pub fn install_plan(&mut self, descriptions: Vec<String>) {
        self.sub_tasks = descriptions
            .into_iter()
            .enumerate()
            .map(|(i, desc)| SubTask::new(i, desc))
            .collect();
        self.current_task_index = 0;
    }

    pub fn current_task(&self) -> Option<&SubTask> {
        self.sub_tasks.get(self.current_task_index)
    }

    pub fn current_task_mut(&mut self) -> Option<&mut SubTask> {
        self.sub_tasks.get_mut(self.current_task_index)
    }

    /// 按下标找第一个 Pending 子任务（稳定的从左到右扫描）
    pub fn first_pending_index(&self) -> Option<usize> {
        self.sub_tasks
            .iter()
            .position(|t| t.status == TaskStatus::Pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_plan_assigns_ids_in_order() {
        let mut state = RunState::new("intent", 3);
        state.install_plan(vec!["a".to_string(), "b".to_string()]);
        assert_eq!(state.sub_tasks.len(), 2);
        assert_eq!(state.sub_tasks[0].id, 0);
        assert_eq!(state.sub_tasks[1].id, 1);
        assert!(state
            .sub_tasks
            .iter()
            .all(|t| t.status == TaskStatus::Pending));
        assert_eq!(state.current_task_index, 0);
    }

    #[test]
    fn test_first_pending_skips_done() {
        let mut state = RunState::new("intent", 3);
        state.install_plan(vec!["a".into(), "b".into(), "c".into()]);
        state.sub_tasks[0].status = TaskStatus::Done;
        assert_eq!(state.first_pending_index(), Some(1));
        state.sub_tasks[1].status = TaskStatus::Done;
        state.sub_tasks[2].status = TaskStatus::Done;
        assert_eq!(state.first_pending_index(), None);
    }
}

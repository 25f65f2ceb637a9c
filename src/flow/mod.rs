//! 编排层：计划数据模型、过程事件、四个步骤组件与主循环

pub mod events;
pub mod executor;
pub mod loop_;
pub mod planner;
pub mod state;
pub mod summarizer;
pub mod verifier;

pub use events::{RunEvent, Step, SubTaskView};
pub use executor::{Executor, NO_CONTENT_SENTINEL};
pub use loop_::{run_flow, FlowResult, RunSession, MAX_RETRIES_SENTINEL};
pub use planner::Planner;
pub use state::{RunState, SubTask, TaskStatus};
pub use summarizer::Summarizer;
pub use verifier::{Verdict, Verifier};

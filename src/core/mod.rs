//! 核心层：错误类型与最近状态快照

pub mod error;
pub mod status;

pub use error::AgentError;
pub use status::StatusBoard;

//! 运行时状态模块
//!
//! 管理应用状态、数据存储和快照持久化

pub mod app_state;
pub mod persistence;
pub mod store;

pub use app_state::AppState;
pub use persistence::SnapshotFile;
pub use store::Database;

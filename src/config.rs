//! エージェントとワークフローの定義モジュール
//!
//! # 責務
//!
//! - エージェント [`Agent`] とエージェントコレクション [`AgentLibrary`] の定義
//! - ワークフロー定義 [`WorkflowDefinition`]（エージェント参照の順序付き列）の定義
//! - TOML 定義ファイルおよび JSON エクスポート形式の読み込みとバリデーション
//!
//! # モジュール構成
//!
//! - [`agent`][]: エージェントのドメインモデルとコレクション
//! - [`workflow`][]: ワークフロー定義のドメインモデル
//! - `dto`: デシリアライズ専用の内部 DTO（外部非公開）
//!
//! # 使用例
//!
//! ```rust,no_run
//! use agentforge_chain::config::agent::AgentLibrary;
//! use agentforge_chain::config::workflow::WorkflowDefinition;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agents = AgentLibrary::from_file("agents/example.toml")?;
//!     let workflow = WorkflowDefinition::from_file("workflows/example.toml")?;
//!
//!     for step in workflow.sorted_steps() {
//!         let agent = agents.get(step.agent_id());
//!         println!("{} -> {:?}", step.agent_id(), agent.map(|a| &a.name));
//!     }
//!
//!     Ok(())
//! }
//! ```

mod dto;

pub mod agent;
pub mod workflow;

// 公開APIの再エクスポート
pub use agent::{Agent, AgentLibrary, CustomParameter, ParameterKind};
pub use workflow::{WorkflowDefinition, WorkflowStepRef};

//! # agentforge-chain
//!
//! エージェントチェーンの逐次実行エンジン。
//!
//! TOML で定義されたワークフロー（エージェント参照の順序付き列）を読み込み、
//! 前ステップの出力を次ステップの入力として受け渡しながら、
//! エージェントを 1 つずつ実行します。
//!
//! ## 実行モデル
//!
//! - ステップは `order` の昇順で逐次実行（並行実行・分岐なし）
//! - 最初の失敗でチェーンは停止し、失敗時点までの部分トレースを保全
//! - 実行試行 1 回につき実行ログを 1 件記録（成功・失敗を問わず）
//!
//! ## モジュール構成
//!
//! - [`config`][] - エージェント・ワークフロー定義の読み込み
//! - [`engine`][] - チェーン実行エンジンと実行コントローラー
//! - [`provider`][] - LLM プロバイダー境界（Gemini クライアント）
//! - [`store`][] - 実行ログの永続化
//! - [`error`][] - エラー型定義
//!
//! ## 使用例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentforge_chain::config::agent::AgentLibrary;
//! use agentforge_chain::config::workflow::WorkflowDefinition;
//! use agentforge_chain::engine::WorkflowRunController;
//! use agentforge_chain::provider::GeminiInvoker;
//! use agentforge_chain::store::JsonlExecutionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agents = AgentLibrary::from_file("agents/example.toml")?;
//!     let workflow = WorkflowDefinition::from_file("workflows/example.toml")?;
//!
//!     let controller = WorkflowRunController::new(
//!         Arc::new(GeminiInvoker::from_env()?),
//!         Arc::new(JsonlExecutionStore::new("executions.jsonl")),
//!     );
//!     controller.start(&workflow, &agents, "実行したい入力テキスト").await?;
//!
//!     if let Some(result) = controller.last_result() {
//!         println!("{}", result.final_output);
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod engine;
pub mod error;
pub mod provider;
pub mod store;

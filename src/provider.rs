//! LLMプロバイダー抽象化レイヤー
//!
//! # 責務
//!
//! - 単一エージェント実行の統一インターフェース [`AgentInvoker`] を提供
//! - Gemini `generateContent` API を呼び出す具象クライアント [`GeminiInvoker`] を提供
//! - モデルカタログとデフォルトモデルへのフォールバック
//!
//! チェーン実行エンジン（[`crate::engine`]）から見ると、このモジュールは
//! 「エージェントと入力を渡すと出力文字列が返る」外部境界です。
//! 認証・プロンプト構築・エラー分類はすべてこの境界の内側で完結し、
//! エンジン側には [`ProviderError`](crate::error::ProviderError) として届きます。
//!
//! # モジュール構成
//!
//! - [`traits`][] - 共通インターフェース（[`AgentInvoker`] トレイト等）
//! - [`gemini`][] - Gemini API クライアント
//! - [`models`][] - モデルカタログとデフォルトモデル
//!
//! # 使用例
//!
//! ```rust,no_run
//! use agentforge_chain::provider::gemini::GeminiInvoker;
//! use agentforge_chain::provider::{AgentInvoker, ParameterOverrides};
//! use agentforge_chain::config::agent::Agent;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // 事前に環境変数 GEMINI_API_KEY の設定が必要
//!     let invoker = GeminiInvoker::from_env()?;
//!
//!     let agent = Agent::new("helper", "Helper")
//!         .with_role("helpful assistant")
//!         .with_goal("Answer questions");
//!
//!     let output = invoker
//!         .invoke(&agent, "Explain Rust ownership in one sentence.", &ParameterOverrides::new())
//!         .await?;
//!     println!("Response: {}", output);
//!     Ok(())
//! }
//! ```

pub mod gemini;
pub mod models;
pub mod traits;

// 公開APIの再エクスポート
pub use gemini::GeminiInvoker;
pub use models::{DEFAULT_MODEL, GEMINI_MODELS, ModelInfo};
pub use traits::{AgentInvoker, ParameterOverrides};

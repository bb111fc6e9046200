//! チェーン実行エンジン
//!
//! # 責務
//!
//! - ワークフロー定義に基づくエージェントチェーンの逐次実行
//! - 前ステップの出力を次ステップの入力として受け渡すパイプライン処理
//! - 最初の失敗での停止と、失敗時点までの部分トレースの保全
//! - 実行進捗の公開と実行ログの記録（コントローラー経由）
//!
//! # モジュール構成
//!
//! - [`executor`][] - チェーン実行の中核ロジック（[`ChainExecutor`]）
//! - [`controller`][] - 進捗公開・ログ記録を担う実行コントローラー
//!   （[`WorkflowRunController`]）
//! - [`result`][] - 実行結果・実行ログ・エラーの型定義
//!
//! # 実行モデル
//!
//! ステップは `order` の昇順で 1 つずつ実行されます。並行実行や分岐はなく、
//! チェーンの形は常に一本の直列パイプラインです。
//!
//! ```text
//! 初期入力 → [ステップ1] → 出力1 → [ステップ2] → 出力2 → ... → 最終出力
//! ```
//!
//! いずれかのステップが失敗するとチェーンはそこで停止し、
//! 後続のステップは実行されません。

pub mod controller;
pub mod executor;
pub mod result;

// 公開APIの再エクスポート
pub use controller::{RunProgress, WorkflowRunController};
pub use executor::{ChainExecutor, StepObserver};
pub use result::{
    ChainError, ChainExecutionResult, ChainFailure, ExecutionLog, RunStatus, StepResult,
    StepStatus,
};

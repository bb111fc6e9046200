//! エージェント実行の共通インターフェース定義
//!
//! # 責務
//!
//! - 単一エージェント実行の共通トレイト [`AgentInvoker`] を定義
//! - チェーンレベルのパラメーター上書き [`ParameterOverrides`] の型を定義
//!
//! [`AgentInvoker`] はチェーン実行エンジンにとっての外部境界です。
//! プロンプト構築や HTTP 通信の詳細は実装側（[`gemini`](super::gemini) 等）が持ち、
//! エンジンは「エージェントと入力を渡すと出力文字列が返る」ことだけを前提とします。

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::config::agent::Agent;
use crate::error::ProviderError;

/// チェーンレベルで渡すパラメーター上書き
///
/// キーはパラメーター名（大文字小文字は実装側で無視）、値は文字列表現です。
/// チェーン実行では常に空のマップが渡され、エージェント自身に設定された
/// `custom_parameters` のみが実装側で適用されます。
pub type ParameterOverrides = BTreeMap<String, String>;

/// 単一エージェント実行の共通インターフェース
///
/// このトレイトを実装することで、任意の LLM プロバイダーを
/// チェーン実行エンジンに接続できます。
///
/// # 実装要件
///
/// - `Send + Sync`: マルチスレッド環境で安全に使用可能
/// - 非同期実行対応（`async_trait` を使用）
///
/// # 例（テスト用のモック実装）
///
/// ```rust
/// use agentforge_chain::provider::{AgentInvoker, ParameterOverrides};
/// use agentforge_chain::config::agent::Agent;
/// use agentforge_chain::error::ProviderError;
/// use async_trait::async_trait;
///
/// struct EchoInvoker;
///
/// #[async_trait]
/// impl AgentInvoker for EchoInvoker {
///     async fn invoke(
///         &self,
///         _agent: &Agent,
///         input: &str,
///         _overrides: &ParameterOverrides,
///     ) -> Result<String, ProviderError> {
///         Ok(input.to_string())
///     }
/// }
/// ```
#[async_trait]
pub trait AgentInvoker: Send + Sync {
    /// エージェントを 1 回実行し、出力テキストを取得する
    ///
    /// # 引数
    ///
    /// - `agent`: 実行するエージェント（役割・目標・モデル等の設定）
    /// - `input`: 入力テキスト（チェーンでは前ステップの出力）
    /// - `overrides`: パラメーター上書き（チェーン実行では常に空）
    ///
    /// # 戻り値
    ///
    /// - `Ok(String)`: 成功時、エージェントの出力テキスト
    /// - `Err(ProviderError)`: 失敗時、エラー詳細
    async fn invoke(
        &self,
        agent: &Agent,
        input: &str,
        overrides: &ParameterOverrides,
    ) -> Result<String, ProviderError>;
}

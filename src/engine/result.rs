//! チェーン実行結果の型定義
//!
//! # 責務
//!
//! - ステップ実行結果 [`StepResult`] の型定義
//! - チェーン全体の実行結果 [`ChainExecutionResult`] の型定義
//! - 実行ログ [`ExecutionLog`] の型定義（永続化対象）
//! - 実行ステータス [`RunStatus`] と [`StepStatus`] の型定義
//! - 実行エラー [`ChainError`] と部分トレース付き失敗 [`ChainFailure`] の型定義
//!
//! # 主要な型
//!
//! - [`ChainExecutionResult`][]: 全ステップ成功時のみ生成される集約結果
//! - [`StepResult`][]: 個別ステップの実行結果（入力、出力、ステータス等）
//! - [`ExecutionLog`][]: 実行 1 回につき 1 件、成功・失敗を問わず記録されるログ
//! - [`ChainFailure`][]: 失敗時のエラーと、失敗時点までの部分トレースの組
//!
//! # 使用例
//!
//! ```rust,no_run
//! use agentforge_chain::engine::result::ChainExecutionResult;
//!
//! fn handle_result(result: ChainExecutionResult) {
//!     println!("ワークフロー: {}", result.workflow_name);
//!     println!("完了ステップ数: {}", result.completed_steps());
//!     println!("最終出力: {}", result.final_output);
//!
//!     // JSON形式で出力
//!     if let Ok(json) = result.to_json() {
//!         println!("JSON: {}", json);
//!     }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime};
use thiserror::Error;

use crate::error::{ProviderError, StoreError};

/// ステップ実行ステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    /// 成功
    Success,
    /// 失敗（このステップでチェーンは停止）
    Error,
}

/// 実行全体のステータス
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// すべてのステップが成功
    Success,
    /// いずれかのステップで失敗
    Error,
}

/// ステップ実行結果
///
/// 実行された各ステップにつき 1 件、実行順に生成されます。
/// 生成後は不変です。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    /// ステップ番号（1始まり、実行順）
    pub step: usize,

    /// 実行したエージェントの ID
    pub agent_id: String,

    /// 実行したエージェントの表示名
    pub agent_name: String,

    /// このステップへの入力（前ステップの出力、先頭は初期入力）
    pub input: String,

    /// エージェントの出力（成功時のみ）
    pub output: Option<String>,

    /// 実行ステータス
    pub status: StepStatus,

    /// エラーメッセージ（失敗時のみ）
    pub error: Option<String>,

    /// 実行時間
    pub duration: Duration,
}

/// チェーン実行結果
///
/// 全ステップが成功した実行に対してのみ生成されます。
/// 失敗した実行は代わりに [`ChainFailure`] として部分トレースを伝搬します。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainExecutionResult {
    /// ワークフロー ID
    pub workflow_id: String,

    /// ワークフロー名
    pub workflow_name: String,

    /// 各ステップの実行結果（実行順）
    pub results: Vec<StepResult>,

    /// 最終出力（最後のステップの出力）
    pub final_output: String,
}

impl ChainExecutionResult {
    /// 結果をJSON形式でシリアライズ
    ///
    /// # 戻り値
    ///
    /// - `Ok(String)`: JSON文字列
    /// - `Err(serde_json::Error)`: シリアライズ失敗
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// 成功したステップ数
    pub fn completed_steps(&self) -> usize {
        self.results
            .iter()
            .filter(|step| matches!(step.status, StepStatus::Success))
            .count()
    }
}

/// 実行ログ（ワークフロー単位）
///
/// 実行試行 1 回につき 1 件、成功・失敗を問わず生成され、
/// [`ExecutionStore`](crate::store::ExecutionStore) に追記されます。
/// 生成後に更新されることはありません。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    /// ワークフロー ID
    pub workflow_id: String,

    /// ワークフロー名
    pub workflow_name: String,

    /// 実行時の初期入力
    pub input: String,

    /// 最終出力（失敗時は None）
    pub output: Option<String>,

    /// 実行ステータス
    pub status: RunStatus,

    /// 失敗時点までを含むステップ実行結果
    pub step_results: Vec<StepResult>,

    /// エラーメッセージ（失敗時のみ）
    pub error: Option<String>,

    /// 実行日時
    pub run_at: SystemTime,
}

impl ExecutionLog {
    /// 成功した実行からログを生成
    pub fn success(result: &ChainExecutionResult, input: impl Into<String>) -> Self {
        Self {
            workflow_id: result.workflow_id.clone(),
            workflow_name: result.workflow_name.clone(),
            input: input.into(),
            output: Some(result.final_output.clone()),
            status: RunStatus::Success,
            step_results: result.results.clone(),
            error: None,
            run_at: SystemTime::now(),
        }
    }

    /// 失敗した実行からログを生成
    ///
    /// 失敗時点までに蓄積された部分トレースをそのまま記録します。
    pub fn failure(
        workflow_id: impl Into<String>,
        workflow_name: impl Into<String>,
        input: impl Into<String>,
        failure: &ChainFailure,
    ) -> Self {
        Self {
            workflow_id: workflow_id.into(),
            workflow_name: workflow_name.into(),
            input: input.into(),
            output: None,
            status: RunStatus::Error,
            step_results: failure.steps.clone(),
            error: Some(failure.error.to_string()),
            run_at: SystemTime::now(),
        }
    }

    /// ログをJSON形式でシリアライズ
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// チェーン実行エラー
///
/// # エラー種別
///
/// - [`ChainError::EmptyInput`] - 初期入力が空（実行前に拒否、ログは書かれない）
/// - [`ChainError::RunInProgress`] - 同一コントローラーで実行中（実行前に拒否）
/// - [`ChainError::MissingAgent`] - ステップが参照するエージェントが存在しない
/// - [`ChainError::Invocation`] - エージェント実行（外部 invoke）の失敗
/// - [`ChainError::Timeout`] - ステップがタイムアウト時間内に完了しなかった
/// - [`ChainError::Store`] - 実行ログの永続化に失敗
#[derive(Debug, Error)]
pub enum ChainError {
    /// 初期入力が空
    #[error("初期入力が空です。入力を指定してから実行してください")]
    EmptyInput,

    /// 同一コントローラーで別の実行が進行中
    #[error("別の実行が進行中です。完了を待ってから再実行してください")]
    RunInProgress,

    /// 参照先エージェントが存在しない
    #[error("エージェントが見つかりません: {agent_id}")]
    MissingAgent {
        /// 解決できなかったエージェント ID
        agent_id: String,
    },

    /// エージェント実行エラー
    #[error("エージェント実行エラー: {0}")]
    Invocation(#[from] ProviderError),

    /// タイムアウト
    #[error("タイムアウト: エージェント '{agent_name}' が {timeout_secs}秒以内に完了しませんでした")]
    Timeout {
        /// タイムアウトしたエージェント名
        agent_name: String,
        /// タイムアウト時間（秒）
        timeout_secs: u64,
    },

    /// 実行ログ永続化エラー
    #[error("実行ログの保存エラー: {0}")]
    Store(#[from] StoreError),
}

/// 部分トレース付きのチェーン実行失敗
///
/// チェーンは最初の失敗で停止しますが、失敗時点までに蓄積された
/// [`StepResult`] の列はログ記録のために呼び出し側へ返されます。
#[derive(Debug, Error)]
#[error("{error}")]
pub struct ChainFailure {
    /// 失敗の原因
    #[source]
    pub error: ChainError,

    /// 失敗時点までの部分トレース
    /// （エージェント解決失敗の場合、失敗ステップ自体のエントリは含まれない）
    pub steps: Vec<StepResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn success_step(step: usize, input: &str, output: &str) -> StepResult {
        StepResult {
            step,
            agent_id: format!("agent{step}"),
            agent_name: format!("Agent {step}"),
            input: input.to_string(),
            output: Some(output.to_string()),
            status: StepStatus::Success,
            error: None,
            duration: Duration::from_millis(10),
        }
    }

    #[test]
    fn test_step_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&StepStatus::Success).unwrap(),
            "\"success\""
        );
        assert_eq!(
            serde_json::to_string(&StepStatus::Error).unwrap(),
            "\"error\""
        );
        assert_eq!(
            serde_json::to_string(&RunStatus::Error).unwrap(),
            "\"error\""
        );
    }

    #[test]
    fn test_completed_steps_count() {
        let result = ChainExecutionResult {
            workflow_id: "wf".to_string(),
            workflow_name: "Test".to_string(),
            results: vec![success_step(1, "a", "Xa"), success_step(2, "Xa", "YXa")],
            final_output: "YXa".to_string(),
        };

        assert_eq!(result.completed_steps(), 2);
    }

    #[test]
    fn test_execution_log_success() {
        let result = ChainExecutionResult {
            workflow_id: "wf".to_string(),
            workflow_name: "Test".to_string(),
            results: vec![success_step(1, "a", "Xa")],
            final_output: "Xa".to_string(),
        };

        let log = ExecutionLog::success(&result, "a");

        assert_eq!(log.workflow_id, "wf");
        assert_eq!(log.status, RunStatus::Success);
        assert_eq!(log.output.as_deref(), Some("Xa"));
        assert_eq!(log.input, "a");
        assert_eq!(log.step_results.len(), 1);
        assert!(log.error.is_none());
    }

    #[test]
    fn test_execution_log_failure_keeps_partial_trace() {
        let failure = ChainFailure {
            error: ChainError::Invocation(ProviderError::Api("quota exceeded".to_string())),
            steps: vec![success_step(1, "a", "Xa")],
        };

        let log = ExecutionLog::failure("wf", "Test", "a", &failure);

        assert_eq!(log.status, RunStatus::Error);
        assert!(log.output.is_none());
        assert_eq!(log.step_results.len(), 1);
        assert!(log.error.as_deref().unwrap().contains("quota exceeded"));
    }

    #[test]
    fn test_execution_log_json_roundtrip() {
        let result = ChainExecutionResult {
            workflow_id: "wf".to_string(),
            workflow_name: "Test".to_string(),
            results: vec![success_step(1, "a", "Xa")],
            final_output: "Xa".to_string(),
        };
        let log = ExecutionLog::success(&result, "a");

        let json = log.to_json().unwrap();
        let restored: ExecutionLog = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.workflow_id, log.workflow_id);
        assert_eq!(restored.status, RunStatus::Success);
        assert_eq!(restored.step_results.len(), 1);
    }

    #[test]
    fn test_chain_error_missing_agent_message() {
        let err = ChainError::MissingAgent {
            agent_id: "ghost".to_string(),
        };
        assert_eq!(err.to_string(), "エージェントが見つかりません: ghost");
    }

    #[test]
    fn test_chain_error_timeout_message() {
        let err = ChainError::Timeout {
            agent_name: "Summarizer".to_string(),
            timeout_secs: 30,
        };
        assert_eq!(
            err.to_string(),
            "タイムアウト: エージェント 'Summarizer' が 30秒以内に完了しませんでした"
        );
    }

    #[test]
    fn test_chain_failure_display_delegates_to_error() {
        let failure = ChainFailure {
            error: ChainError::EmptyInput,
            steps: vec![],
        };
        assert_eq!(
            failure.to_string(),
            "初期入力が空です。入力を指定してから実行してください"
        );
    }
}

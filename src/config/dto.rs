//! デシリアライズ用の DTO (Data Transfer Object)
//!
//! # 責務
//!
//! このモジュールは、TOML ファイルおよび JSON エクスポート形式からの
//! データ読み込み専用の構造体を提供します。
//! DTO はバリデーション前の「生データ」を表現し、ドメインモデルとは分離されています。
//!
//! ## 設計思想
//!
//! - **単一責務**: デシリアライズのみを担当
//! - **ファイル構造への密結合**: TOML / JSON の構造変更に柔軟に対応
//! - **バリデーション前の状態**: 不正なデータも一旦受け入れる
//! - **カプセル化**: config モジュール内部のみで使用（外部非公開）
//!
//! ## 変換フロー
//!
//! ```text
//! TOML / JSON ファイル
//!   ↓ (デシリアライズ)
//! WorkflowDto / AgentsFileDto / AgentExportDto
//!   ↓ (TryFrom でバリデーション)
//! WorkflowDefinition / AgentLibrary (ドメインモデル)
//! ```

use serde::{Deserialize, Serialize};

/// ワークフロー DTO
///
/// TOML の `[workflow]` セクションと `[[steps]]` 配列をデシリアライズ/シリアライズします。
///
/// **注**: この構造体は config モジュール内部の実装詳細です。
/// 外部からは [`WorkflowDefinition`](super::workflow::WorkflowDefinition) を使用してください。
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct WorkflowDto {
    /// ワークフローのメタデータ
    pub(super) workflow: WorkflowMetadataDto,
    /// ステップの配列
    pub(super) steps: Vec<WorkflowStepDto>,
}

/// ワークフローメタデータ DTO
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct WorkflowMetadataDto {
    /// ワークフロー ID（省略時は name をそのまま使用）
    pub(super) id: Option<String>,
    /// ワークフロー名
    pub(super) name: String,
    /// 説明（任意）
    pub(super) description: Option<String>,
}

/// ワークフローステップ DTO
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct WorkflowStepDto {
    /// 参照するエージェントの ID
    pub(super) agent_id: String,
    /// 実行順序（昇順ソートで実行順が決まる）
    pub(super) order: u32,
}

/// エージェント定義ファイル DTO
///
/// TOML の `[[agents]]` 配列をデシリアライズします。
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct AgentsFileDto {
    /// エージェントの配列
    pub(super) agents: Vec<AgentDto>,
}

/// エージェント DTO（TOML 用）
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct AgentDto {
    /// エージェント ID
    pub(super) id: String,
    /// 表示名
    pub(super) name: String,
    /// 役割
    pub(super) role: String,
    /// 目標
    pub(super) goal: String,
    /// 使用するモデル ID（省略時はデフォルトモデル）
    pub(super) model: Option<String>,
    /// タスクの説明
    pub(super) task_description: String,
    /// 期待される出力形式
    pub(super) expected_output: String,
    /// カスタムパラメーター（任意）
    pub(super) custom_parameters: Option<Vec<CustomParameterDto>>,
    /// 組み込みエージェントかどうか
    pub(super) is_default: Option<bool>,
}

/// カスタムパラメーター DTO
#[derive(Debug, Serialize, Deserialize)]
pub(super) struct CustomParameterDto {
    /// パラメーター名
    pub(super) key: String,
    /// パラメーター値
    pub(super) value: String,
    /// 種別（text / number / select）
    #[serde(rename = "type")]
    pub(super) kind: String,
}

/// エージェントエクスポート DTO（JSON 用）
///
/// ビルダー UI のエクスポート機能が出力する JSON 形式を表現します:
///
/// ```json
/// {
///   "version": "1.0",
///   "exportDate": "2025-10-24T09:00:00.000Z",
///   "agentCount": 1,
///   "agents": [ { "name": "...", "role": "...", ... } ]
/// }
/// ```
///
/// エクスポートされたエージェントは `id` と `isDefault` を持たないため、
/// インポート時に ID を採番します。
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct AgentExportDto {
    /// エクスポート形式のバージョン
    #[allow(dead_code)]
    pub(super) version: String,
    /// エクスポート日時（ISO 8601、任意）
    #[allow(dead_code)]
    pub(super) export_date: Option<String>,
    /// エージェント数（任意、検証には使用しない）
    #[allow(dead_code)]
    pub(super) agent_count: Option<u32>,
    /// エージェントの配列
    pub(super) agents: Vec<ExportedAgentDto>,
}

/// エクスポートされたエージェント DTO（JSON 用、camelCase）
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ExportedAgentDto {
    /// 表示名
    pub(super) name: String,
    /// 役割
    pub(super) role: String,
    /// 目標
    pub(super) goal: String,
    /// 使用するモデル ID（省略時はデフォルトモデル）
    pub(super) model: Option<String>,
    /// タスクの説明
    pub(super) task_description: String,
    /// 期待される出力形式
    pub(super) expected_output: String,
    /// カスタムパラメーター（任意）
    pub(super) custom_parameters: Option<Vec<CustomParameterDto>>,
}

//! ワークフロー定義の読み込みと管理を行うモジュール
//!
//! # 責務
//!
//! このモジュールは、エージェントチェーンのワークフローを TOML 形式で定義し、
//! それを Rust の型として扱うための機能を提供します。
//!
//! ## 主な機能
//!
//! - **TOML パース**: ワークフロー定義ファイルを読み込み、
//!   [`WorkflowDefinition`] 構造体にデシリアライズ
//! - **ワークフロー定義**: 要約→翻訳→整形 のような処理の流れを
//!   エージェント参照の順序付き列として表現
//! - **実行順序の正規化**: `order` フィールドの昇順ソート
//!   （同値は定義順を維持）による一意な実行順の提供
//!
//! ## 設計思想
//!
//! - **宣言的定義**: 手続き的なコードではなく、TOML による宣言的な定義で
//!   ワークフローを記述可能にする
//! - **読み取り専用**: 実行エンジンはワークフロー定義を書き換えない
//!
//! ## 使用例
//!
//! ```toml
//! [workflow]
//! id = "summarize-translate"
//! name = "Summarize and Translate"
//! description = "Summarize the input, then translate the summary"
//!
//! [[steps]]
//! agent_id = "summarizer"
//! order = 1
//!
//! [[steps]]
//! agent_id = "translator"
//! order = 2
//! ```
//!
//! ## 関連モジュール
//!
//! - [`crate::config::agent`]: ステップが参照するエージェントの定義
//! - [`crate::engine::executor`]: ワークフローの実行エンジン

use std::path::Path;

use super::dto::{WorkflowDto, WorkflowMetadataDto, WorkflowStepDto};
use crate::error::ConfigError;

/// ワークフロー内の 1 ステップ（エージェント参照）
///
/// `order` の昇順ソートが実行順を定義します。
/// 同じ `order` を持つステップは、定義ファイルでの出現順に実行されます。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowStepRef {
    agent_id: String,
    order: u32,
}

impl WorkflowStepRef {
    /// ステップ参照を生成
    pub fn new(agent_id: impl Into<String>, order: u32) -> Self {
        Self {
            agent_id: agent_id.into(),
            order,
        }
    }

    /// 参照するエージェントの ID
    pub fn agent_id(&self) -> &str {
        &self.agent_id
    }

    /// 実行順序
    pub fn order(&self) -> u32 {
        self.order
    }
}

/// ワークフロー定義（ドメインモデル）
///
/// エージェント参照の順序付き列です。実行エンジンに対して読み取り専用であり、
/// バリデーション済みの状態を保証します。
///
/// ## DTO との違い
///
/// - `WorkflowDto`: TOML デシリアライズ専用、バリデーション前の生データ
/// - [`WorkflowDefinition`]: バリデーション済み、ドメインロジックを持つ
///
/// # 例
///
/// ```rust
/// use agentforge_chain::config::workflow::{WorkflowDefinition, WorkflowStepRef};
///
/// let workflow = WorkflowDefinition::new(
///     "wf-1",
///     "Summarize and Translate",
///     None,
///     vec![
///         WorkflowStepRef::new("translator", 2),
///         WorkflowStepRef::new("summarizer", 1),
///     ],
/// );
///
/// // sorted_steps は order 昇順
/// let sorted = workflow.sorted_steps();
/// assert_eq!(sorted[0].agent_id(), "summarizer");
/// assert_eq!(sorted[1].agent_id(), "translator");
/// ```
#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    id: String,
    name: String,
    description: Option<String>,
    steps: Vec<WorkflowStepRef>,
}

impl WorkflowDefinition {
    /// ワークフロー定義を生成
    ///
    /// プログラムから構築する場合のコンストラクターです。
    /// ファイル読み込み時のバリデーションは行いません。
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        steps: Vec<WorkflowStepRef>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description,
            steps,
        }
    }

    /// TOML ファイルからワークフローを読み込む
    ///
    /// # 処理フロー
    ///
    /// 1. ファイル読み込み
    /// 2. TOML デシリアライズ → `WorkflowDto`
    /// 3. バリデーション & 変換 → [`WorkflowDefinition`]
    ///
    /// # 引数
    ///
    /// * `path` - TOML ファイルのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkflowDefinition)` - 読み込みに成功した場合
    /// * `Err(ConfigError)` - ファイルの読み込みまたはパースに失敗した場合
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// TOML 文字列からワークフローを読み込む
    ///
    /// # 引数
    ///
    /// * `toml_str` - TOML 形式の文字列
    ///
    /// # 戻り値
    ///
    /// * `Ok(WorkflowDefinition)` - パースに成功した場合
    /// * `Err(ConfigError)` - パースまたはバリデーションに失敗した場合
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let dto: WorkflowDto = toml::from_str(toml_str)?;
        Self::try_from(dto)
    }

    /// ワークフローを TOML 文字列に変換
    ///
    /// # 戻り値
    ///
    /// * `Ok(String)` - TOML 文字列
    /// * `Err(ConfigError)` - シリアライズに失敗した場合
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        let dto = WorkflowDto::from(self.clone());
        Ok(toml::to_string(&dto)?)
    }

    /// ワークフローを TOML ファイルに保存
    ///
    /// # 引数
    ///
    /// * `path` - 保存先のファイルパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(())` - 保存に成功した場合
    /// * `Err(ConfigError)` - ファイル書き込みに失敗した場合
    pub fn to_file(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let toml_str = self.to_toml()?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// ワークフロー ID
    pub fn id(&self) -> &str {
        &self.id
    }

    /// ワークフロー名
    pub fn name(&self) -> &str {
        &self.name
    }

    /// 説明
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// ステップの一覧（定義順のまま）
    pub fn steps(&self) -> &[WorkflowStepRef] {
        &self.steps
    }

    /// 実行順に並べたステップの一覧
    ///
    /// `order` の昇順で安定ソートします。同値の `order` は定義順を維持するため、
    /// 実行順は常に決定的です。実行エンジンはこのメソッドの結果のみを使用します。
    pub fn sorted_steps(&self) -> Vec<WorkflowStepRef> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|step| step.order);
        steps
    }
}

/// DTO からドメインモデルへの変換（読み込み方向）
///
/// バリデーションを実施し、不正なデータの場合は [`ConfigError::Validation`] を返します。
///
/// # 検証内容
///
/// 1. ワークフロー名が空でないこと
/// 2. ステップが 1 つ以上あること
/// 3. 各ステップの `agent_id` が空でないこと
impl TryFrom<WorkflowDto> for WorkflowDefinition {
    type Error = ConfigError;

    fn try_from(dto: WorkflowDto) -> Result<Self, Self::Error> {
        if dto.workflow.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "ワークフロー名が空です".to_string(),
            ));
        }
        if dto.steps.is_empty() {
            return Err(ConfigError::Validation(
                "ワークフローにステップがありません".to_string(),
            ));
        }
        for step in &dto.steps {
            if step.agent_id.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "ステップの agent_id が空です".to_string(),
                ));
            }
        }

        // ID 省略時は名前をそのまま使用する
        let id = dto.workflow.id.unwrap_or_else(|| dto.workflow.name.clone());

        Ok(Self {
            id,
            name: dto.workflow.name,
            description: dto.workflow.description,
            steps: dto
                .steps
                .into_iter()
                .map(|s| WorkflowStepRef::new(s.agent_id, s.order))
                .collect(),
        })
    }
}

/// ドメインモデルから DTO への変換（書き込み方向）
///
/// バリデーション済みのドメインモデルから DTO を生成するため、
/// この変換は失敗しません（`From` トレイトを使用）。
impl From<WorkflowDefinition> for WorkflowDto {
    fn from(workflow: WorkflowDefinition) -> Self {
        Self {
            workflow: WorkflowMetadataDto {
                id: Some(workflow.id),
                name: workflow.name,
                description: workflow.description,
            },
            steps: workflow
                .steps
                .into_iter()
                .map(|s| WorkflowStepDto {
                    agent_id: s.agent_id,
                    order: s.order,
                })
                .collect(),
        }
    }
}

//! エージェント定義とエージェントコレクション
//!
//! # 責務
//!
//! - 実行可能な単位であるエージェント [`Agent`] のドメインモデルを提供
//! - チェーン実行時の ID 参照解決を担う [`AgentLibrary`] を提供
//! - TOML 定義ファイルおよびビルダー UI の JSON エクスポート形式の読み込み
//!
//! エージェントはワークフロー実行中は不変のスナップショットとして扱われます。
//! 実行エンジンはここで定義されたコレクションを読み取るだけで、書き換えません。

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::dto::{AgentDto, AgentExportDto, AgentsFileDto, CustomParameterDto, ExportedAgentDto};
use crate::error::ConfigError;

/// カスタムパラメーターの種別
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    /// 自由入力テキスト
    Text,
    /// 数値
    Number,
    /// 選択式
    Select,
}

impl ParameterKind {
    /// 文字列表現から種別を解決
    ///
    /// # 戻り値
    ///
    /// - `Some(ParameterKind)`: `text` / `number` / `select` のいずれか
    /// - `None`: 未知の種別
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            "select" => Some(Self::Select),
            _ => None,
        }
    }
}

/// エージェントに設定されたカスタムパラメーター
///
/// 生成パラメーター（temperature 等）として解釈されるか、
/// システムプロンプトのコンテキストとして埋め込まれます。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomParameter {
    /// パラメーター名
    pub key: String,
    /// パラメーター値
    pub value: String,
    /// 種別
    #[serde(rename = "type")]
    pub kind: ParameterKind,
}

/// エージェント（ドメインモデル）
///
/// 役割・目標・タスク記述・モデル参照を持つ、入力文字列を受け取って
/// 出力文字列を生成できる名前付きの設定単位です。
///
/// # 例
///
/// ```rust
/// use agentforge_chain::config::agent::Agent;
///
/// let agent = Agent::new("summarizer", "Summarizer")
///     .with_role("Technical Writer")
///     .with_goal("Summarize input text")
///     .with_task_description("Summarize the input in three sentences.")
///     .with_expected_output("A three-sentence summary.");
///
/// assert_eq!(agent.id, "summarizer");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    /// エージェント ID（ライブラリ内で一意）
    pub id: String,

    /// 表示名
    pub name: String,

    /// 役割（システムプロンプトの "You are a {role}." に使用）
    pub role: String,

    /// 目標
    pub goal: String,

    /// 使用するモデル ID（空文字列の場合はデフォルトモデルにフォールバック）
    pub model: String,

    /// タスクの説明
    pub task_description: String,

    /// 期待される出力形式
    pub expected_output: String,

    /// カスタムパラメーター
    pub custom_parameters: Vec<CustomParameter>,

    /// 組み込みエージェントかどうか
    pub is_default: bool,
}

impl Agent {
    /// 最小構成のエージェントを生成（ビルダー起点）
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            role: String::new(),
            goal: String::new(),
            model: String::new(),
            task_description: String::new(),
            expected_output: String::new(),
            custom_parameters: Vec::new(),
            is_default: false,
        }
    }

    /// 役割を設定
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    /// 目標を設定
    pub fn with_goal(mut self, goal: impl Into<String>) -> Self {
        self.goal = goal.into();
        self
    }

    /// モデル ID を設定
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// タスクの説明を設定
    pub fn with_task_description(mut self, task_description: impl Into<String>) -> Self {
        self.task_description = task_description.into();
        self
    }

    /// 期待される出力形式を設定
    pub fn with_expected_output(mut self, expected_output: impl Into<String>) -> Self {
        self.expected_output = expected_output.into();
        self
    }

    /// カスタムパラメーターを追加
    pub fn with_parameter(mut self, param: CustomParameter) -> Self {
        self.custom_parameters.push(param);
        self
    }
}

/// エージェントコレクション（ドメインモデル）
///
/// ワークフローのステップが参照する `agent_id` の解決先です。
/// チェーン実行中は不変のスナップショットとして扱われます。
///
/// # 例
///
/// ```rust
/// use agentforge_chain::config::agent::{Agent, AgentLibrary};
///
/// let library = AgentLibrary::new(vec![
///     Agent::new("summarizer", "Summarizer"),
///     Agent::new("translator", "Translator"),
/// ]);
///
/// assert!(library.get("summarizer").is_some());
/// assert!(library.get("ghost").is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct AgentLibrary {
    agents: Vec<Agent>,
}

impl AgentLibrary {
    /// エージェントのリストからライブラリを生成
    ///
    /// プログラムから構築する場合のコンストラクターです。
    /// ファイル読み込み時のバリデーション（ID の重複チェック等）は行いません。
    pub fn new(agents: Vec<Agent>) -> Self {
        Self { agents }
    }

    /// TOML ファイルからエージェントライブラリを読み込む
    ///
    /// # 処理フロー
    ///
    /// 1. ファイル読み込み
    /// 2. TOML デシリアライズ → [`AgentsFileDto`]
    /// 3. バリデーション & 変換 → [`AgentLibrary`]
    ///
    /// # 引数
    ///
    /// * `path` - TOML ファイルのパス
    ///
    /// # 戻り値
    ///
    /// * `Ok(AgentLibrary)` - 読み込みに成功した場合
    /// * `Err(ConfigError)` - ファイルの読み込みまたはパースに失敗した場合
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// TOML 文字列からエージェントライブラリを読み込む
    pub fn from_toml(toml_str: &str) -> Result<Self, ConfigError> {
        let dto: AgentsFileDto = toml::from_str(toml_str)?;
        Self::try_from(dto)
    }

    /// ビルダー UI の JSON エクスポート形式からエージェントライブラリを読み込む
    ///
    /// エクスポートされたエージェントは ID を持たないため、
    /// 表示名のスラッグ（小文字化し空白を `-` に置換）を ID として採番します。
    ///
    /// # 引数
    ///
    /// * `json` - `{ "version": "1.0", "agents": [...] }` 形式の JSON 文字列
    ///
    /// # 戻り値
    ///
    /// * `Ok(AgentLibrary)` - パースに成功した場合
    /// * `Err(ConfigError)` - パース失敗、または採番後の ID が重複した場合
    pub fn from_json_export(json: &str) -> Result<Self, ConfigError> {
        let dto: AgentExportDto = serde_json::from_str(json)?;
        let agents = dto
            .agents
            .into_iter()
            .map(Agent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::validate(agents)
    }

    /// ID からエージェントを検索
    ///
    /// # 戻り値
    ///
    /// - `Some(&Agent)`: 該当するエージェントが存在する場合
    /// - `None`: 存在しない場合
    pub fn get(&self, agent_id: &str) -> Option<&Agent> {
        self.agents.iter().find(|agent| agent.id == agent_id)
    }

    /// 保持しているエージェントの一覧
    pub fn agents(&self) -> &[Agent] {
        &self.agents
    }

    /// エージェント数
    pub fn len(&self) -> usize {
        self.agents.len()
    }

    /// 空かどうか
    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// ID の一意性と必須フィールドを検証してライブラリを構築
    fn validate(agents: Vec<Agent>) -> Result<Self, ConfigError> {
        let mut seen = std::collections::HashSet::new();
        for agent in &agents {
            if agent.id.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "エージェント '{}' の ID が空です",
                    agent.name
                )));
            }
            if agent.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "エージェント '{}' の名前が空です",
                    agent.id
                )));
            }
            if !seen.insert(agent.id.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "エージェント ID が重複しています: {}",
                    agent.id
                )));
            }
        }
        Ok(Self { agents })
    }
}

/// DTO からドメインモデルへの変換（読み込み方向）
///
/// バリデーションを実施し、不正なデータの場合は [`ConfigError::Validation`] を返します。
impl TryFrom<AgentsFileDto> for AgentLibrary {
    type Error = ConfigError;

    fn try_from(dto: AgentsFileDto) -> Result<Self, Self::Error> {
        let agents = dto
            .agents
            .into_iter()
            .map(Agent::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Self::validate(agents)
    }
}

impl TryFrom<AgentDto> for Agent {
    type Error = ConfigError;

    fn try_from(dto: AgentDto) -> Result<Self, Self::Error> {
        Ok(Self {
            id: dto.id,
            name: dto.name,
            role: dto.role,
            goal: dto.goal,
            model: dto.model.unwrap_or_default(),
            task_description: dto.task_description,
            expected_output: dto.expected_output,
            custom_parameters: convert_parameters(dto.custom_parameters)?,
            is_default: dto.is_default.unwrap_or(false),
        })
    }
}

/// エクスポート形式からの変換（ID はスラッグで採番）
impl TryFrom<ExportedAgentDto> for Agent {
    type Error = ConfigError;

    fn try_from(dto: ExportedAgentDto) -> Result<Self, Self::Error> {
        let id = slugify(&dto.name);
        Ok(Self {
            id,
            name: dto.name,
            role: dto.role,
            goal: dto.goal,
            model: dto.model.unwrap_or_default(),
            task_description: dto.task_description,
            expected_output: dto.expected_output,
            custom_parameters: convert_parameters(dto.custom_parameters)?,
            is_default: false,
        })
    }
}

fn convert_parameters(
    params: Option<Vec<CustomParameterDto>>,
) -> Result<Vec<CustomParameter>, ConfigError> {
    params
        .unwrap_or_default()
        .into_iter()
        .map(|p| {
            let kind = ParameterKind::parse(&p.kind).ok_or_else(|| {
                ConfigError::Validation(format!(
                    "パラメーター '{}' の種別が不正です: {}",
                    p.key, p.kind
                ))
            })?;
            Ok(CustomParameter {
                key: p.key,
                value: p.value,
                kind,
            })
        })
        .collect()
}

/// 表示名から ID スラッグを生成（小文字化し、空白の並びを `-` に置換）
fn slugify(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_from_toml() {
        let toml_str = r#"
            [[agents]]
            id = "summarizer"
            name = "Summarizer"
            role = "Technical Writer"
            goal = "Summarize input text"
            model = "gemini-2.5-flash"
            task_description = "Summarize the input in three sentences."
            expected_output = "A three-sentence summary."

            [[agents.custom_parameters]]
            key = "temperature"
            value = "0.2"
            type = "number"

            [[agents]]
            id = "translator"
            name = "Translator"
            role = "Translator"
            goal = "Translate to Japanese"
            task_description = "Translate the input into Japanese."
            expected_output = "Japanese text."
        "#;

        let library = AgentLibrary::from_toml(toml_str).unwrap();
        assert_eq!(library.len(), 2);

        let summarizer = library.get("summarizer").unwrap();
        assert_eq!(summarizer.name, "Summarizer");
        assert_eq!(summarizer.model, "gemini-2.5-flash");
        assert_eq!(summarizer.custom_parameters.len(), 1);
        assert_eq!(summarizer.custom_parameters[0].kind, ParameterKind::Number);
        assert!(!summarizer.is_default);

        // model 省略時は空文字列（実行時にデフォルトモデルへフォールバック）
        let translator = library.get("translator").unwrap();
        assert_eq!(translator.model, "");
    }

    #[test]
    fn test_library_rejects_duplicate_ids() {
        let toml_str = r#"
            [[agents]]
            id = "dup"
            name = "First"
            role = "r"
            goal = "g"
            task_description = "t"
            expected_output = "o"

            [[agents]]
            id = "dup"
            name = "Second"
            role = "r"
            goal = "g"
            task_description = "t"
            expected_output = "o"
        "#;

        let err = AgentLibrary::from_toml(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
        assert_eq!(
            err.to_string(),
            "設定のバリデーションに失敗しました: エージェント ID が重複しています: dup"
        );
    }

    #[test]
    fn test_library_rejects_unknown_parameter_kind() {
        let toml_str = r#"
            [[agents]]
            id = "a"
            name = "A"
            role = "r"
            goal = "g"
            task_description = "t"
            expected_output = "o"

            [[agents.custom_parameters]]
            key = "tone"
            value = "formal"
            type = "slider"
        "#;

        let err = AgentLibrary::from_toml(toml_str).unwrap_err();
        assert!(matches!(err, ConfigError::Validation(_)));
    }

    #[test]
    fn test_library_from_json_export() {
        let json = r#"{
            "version": "1.0",
            "exportDate": "2025-10-24T09:00:00.000Z",
            "agentCount": 1,
            "agents": [
                {
                    "name": "Blog Writer",
                    "role": "Content Writer",
                    "goal": "Write blog posts",
                    "model": "gemini-2.0-flash",
                    "taskDescription": "Write a blog post about the input topic.",
                    "expectedOutput": "A markdown blog post.",
                    "customParameters": [
                        { "key": "tone", "value": "casual", "type": "text" }
                    ]
                }
            ]
        }"#;

        let library = AgentLibrary::from_json_export(json).unwrap();
        assert_eq!(library.len(), 1);

        // ID は表示名のスラッグで採番される
        let agent = library.get("blog-writer").unwrap();
        assert_eq!(agent.name, "Blog Writer");
        assert_eq!(agent.custom_parameters[0].key, "tone");
        assert!(!agent.is_default);
    }

    #[test]
    fn test_json_export_missing_version_is_rejected() {
        let json = r#"{ "agents": [] }"#;
        let err = AgentLibrary::from_json_export(json).unwrap_err();
        assert!(matches!(err, ConfigError::JsonParse(_)));
    }

    #[test]
    fn test_parameter_kind_parse() {
        assert_eq!(ParameterKind::parse("text"), Some(ParameterKind::Text));
        assert_eq!(ParameterKind::parse("number"), Some(ParameterKind::Number));
        assert_eq!(ParameterKind::parse("select"), Some(ParameterKind::Select));
        assert_eq!(ParameterKind::parse("slider"), None);
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Blog Writer"), "blog-writer");
        assert_eq!(slugify("  AgentForge   Assistant "), "agentforge-assistant");
    }
}

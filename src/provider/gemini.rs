//! Gemini API クライアント
//!
//! # 責務
//!
//! - Gemini `generateContent` API との HTTP 通信を担当
//! - [`AgentInvoker`] トレイトを実装し、統一インターフェースを提供
//! - エージェント設定（役割・目標・タスク記述）からのシステムプロンプト構築
//! - カスタムパラメーターから生成設定（temperature 等）への変換
//!
//! # 認証
//!
//! API キーはコンストラクター引数、または環境変数 `GEMINI_API_KEY` から取得します。
//! キーが未設定の場合は [`ProviderError::MissingApiKey`] を返します。
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
//!     let agent = Agent::new("summarizer", "Summarizer")
//!         .with_role("Technical Writer")
//!         .with_goal("Summarize input text")
//!         .with_task_description("Summarize the input in three sentences.")
//!         .with_expected_output("A three-sentence summary.");
//!
//!     let output = invoker
//!         .invoke(&agent, "Rust is a systems programming language...", &ParameterOverrides::new())
//!         .await?;
//!     println!("{}", output);
//!
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

use super::models::resolve_model;
use super::traits::{AgentInvoker, ParameterOverrides};
use crate::config::agent::Agent;
use crate::error::ProviderError;

/// Gemini API のベース URL
const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// API キーを読み取る環境変数名
const API_KEY_ENV: &str = "GEMINI_API_KEY";

/// 生成設定のデフォルト値
const DEFAULT_TEMPERATURE: f64 = 0.7;
const DEFAULT_TOP_K: u32 = 40;
const DEFAULT_TOP_P: f64 = 0.95;
const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 8192;

/// Gemini API クライアント
///
/// Gemini の `generateContent` エンドポイントを呼び出してエージェントを実行します。
pub struct GeminiInvoker {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

impl GeminiInvoker {
    /// API キーを指定してクライアントを生成
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    /// 環境変数 `GEMINI_API_KEY` からクライアントを生成
    ///
    /// # エラー
    ///
    /// - [`ProviderError::MissingApiKey`] - 環境変数が未設定または空
    pub fn from_env() -> Result<Self, ProviderError> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Self::new(key)),
            _ => Err(ProviderError::MissingApiKey(API_KEY_ENV.to_string())),
        }
    }

    /// ベース URL を差し替える（テスト用）
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl AgentInvoker for GeminiInvoker {
    async fn invoke(
        &self,
        agent: &Agent,
        input: &str,
        overrides: &ParameterOverrides,
    ) -> Result<String, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::MissingApiKey(API_KEY_ENV.to_string()));
        }

        // エージェント自身のパラメーターを基底に、チェーンレベルの上書きを重ねる
        let params = effective_parameters(agent, overrides);
        let system_prompt = build_system_prompt(agent, &params);
        let generation_config = extract_generation_config(&params);

        let model = resolve_model(&agent.model);
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, model, self.api_key
        );

        let full_prompt = format!("{}\n\n---\n\nInput:\n{}", system_prompt, input);
        let request = GenerateContentRequest {
            contents: vec![ContentDto {
                parts: vec![PartDto { text: full_prompt }],
            }],
            generation_config,
        };

        debug!(agent = %agent.name, model, "Gemini API を呼び出します");

        let response = self.client.post(&url).json(&request).send().await?;

        // エラーレスポンスは本文のエラーメッセージを抽出
        if !response.status().is_success() {
            let message = response
                .json::<ApiErrorResponse>()
                .await
                .ok()
                .and_then(|body| body.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| "Gemini API request failed".to_string());
            return Err(ProviderError::Api(message));
        }

        let body: GenerateContentResponse = response.json().await?;

        let candidates = body.candidates.unwrap_or_default();
        if candidates.is_empty() {
            // ブロック理由があれば区別して返す
            if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
                return Err(ProviderError::ContentBlocked(reason));
            }
            return Err(ProviderError::EmptyResponse);
        }

        candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|content| content.parts.into_iter().next())
            .map(|part| part.text)
            .ok_or_else(|| {
                ProviderError::InvalidResponse(
                    "候補にコンテンツが含まれていません。セーフティフィルターの可能性があります"
                        .to_string(),
                )
            })
    }
}

/// エージェント自身のパラメーターに上書きを重ねた実効パラメーターを構築
///
/// キーの衝突時は上書き側が優先されます。
fn effective_parameters(agent: &Agent, overrides: &ParameterOverrides) -> ParameterOverrides {
    let mut params: BTreeMap<String, String> = agent
        .custom_parameters
        .iter()
        .map(|p| (p.key.clone(), p.value.clone()))
        .collect();
    for (key, value) in overrides {
        params.insert(key.clone(), value.clone());
    }
    params
}

/// 生成設定として解釈するパラメーターキー（小文字比較）
const GENERATION_KEYS: &[&str] = &["temperature", "maxtokens", "topp", "topk"];

/// システムプロンプトを構築
///
/// 役割・目標・タスク記述・期待出力に加えて、生成設定以外の
/// パラメーターをコンテキストとして埋め込みます。
fn build_system_prompt(agent: &Agent, params: &ParameterOverrides) -> String {
    let mut prompt = format!(
        "You are a {}.\n\nYour goal is: {}\n\nTask Description:\n{}\n\nExpected Output Format:\n{}",
        agent.role, agent.goal, agent.task_description, agent.expected_output
    );

    let context_params: Vec<_> = params
        .iter()
        .filter(|(key, _)| !GENERATION_KEYS.contains(&key.to_lowercase().as_str()))
        .collect();

    if !context_params.is_empty() {
        prompt.push_str("\n\nContext:");
        for (key, value) in context_params {
            prompt.push_str(&format!("\n- {}: {}", key, value));
        }
    }

    prompt
}

/// パラメーターから生成設定を抽出
///
/// `temperature` / `maxtokens` / `topp` / `topk`（大文字小文字を区別しない）を
/// 数値として解釈し、解釈できない値や未指定の項目はデフォルト値を使用します。
fn extract_generation_config(params: &ParameterOverrides) -> GenerationConfigDto {
    let mut config = GenerationConfigDto {
        temperature: DEFAULT_TEMPERATURE,
        top_k: DEFAULT_TOP_K,
        top_p: DEFAULT_TOP_P,
        max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
    };

    for (key, value) in params {
        match key.to_lowercase().as_str() {
            "temperature" => {
                if let Ok(v) = value.parse::<f64>() {
                    config.temperature = v;
                }
            }
            "maxtokens" => {
                if let Ok(v) = value.parse::<u32>() {
                    config.max_output_tokens = v;
                }
            }
            "topp" => {
                if let Ok(v) = value.parse::<f64>() {
                    config.top_p = v;
                }
            }
            "topk" => {
                if let Ok(v) = value.parse::<u32>() {
                    config.top_k = v;
                }
            }
            _ => {}
        }
    }

    config
}

/// `generateContent` リクエストボディ
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<ContentDto>,
    generation_config: GenerationConfigDto,
}

#[derive(Debug, Serialize, Deserialize)]
struct ContentDto {
    parts: Vec<PartDto>,
}

#[derive(Debug, Serialize, Deserialize)]
struct PartDto {
    text: String,
}

/// 生成設定
#[derive(Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigDto {
    temperature: f64,
    top_k: u32,
    top_p: f64,
    max_output_tokens: u32,
}

/// `generateContent` レスポンスボディ
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<CandidateDto>>,
    prompt_feedback: Option<PromptFeedbackDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateDto {
    content: Option<CandidateContentDto>,
}

#[derive(Debug, Deserialize)]
struct CandidateContentDto {
    #[serde(default)]
    parts: Vec<PartDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedbackDto {
    block_reason: Option<String>,
}

/// API エラーレスポンス（`{"error": {"message": "..."}}`）
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: Option<ApiErrorDto>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDto {
    message: Option<String>,
}

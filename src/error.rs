//! エラー型の定義
//!
//! このモジュールは、AgentForge Chain 全体で使用される境界ごとのエラー型を定義します。
//!
//! - [`ConfigError`]: エージェント/ワークフロー定義の読み込み・バリデーションエラー
//! - [`ProviderError`]: LLM プロバイダー呼び出し（単一エージェント実行）のエラー
//! - [`StoreError`]: 実行ログ永続化のエラー
//!
//! チェーン実行そのもののエラーは [`ChainError`](crate::engine::result::ChainError) を参照。

use thiserror::Error;

/// 設定関連のエラー
#[derive(Debug, Error)]
pub enum ConfigError {
    /// ファイルの読み込みに失敗
    #[error("設定ファイルの読み込みに失敗しました: {0}")]
    FileRead(#[from] std::io::Error),

    /// TOML のデシリアライズに失敗
    #[error("TOML のデシリアライズに失敗しました: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    /// TOML のシリアライズに失敗
    #[error("TOML のシリアライズに失敗しました: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// JSON（エクスポート形式）のパースに失敗
    #[error("JSON のパースに失敗しました: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// バリデーションエラー
    #[error("設定のバリデーションに失敗しました: {0}")]
    Validation(String),
}

/// プロバイダー関連のエラー
///
/// 単一エージェント実行（`invoke`）の失敗はすべてこの型に分類されます。
/// 認証・レート制限・ネットワーク・不正モデル等は個別に区別せず、
/// 人間が読めるメッセージとして保持します。
#[derive(Debug, Error)]
pub enum ProviderError {
    /// API キーが未設定
    #[error("API キーが設定されていません。環境変数 {0} を設定してください")]
    MissingApiKey(String),

    /// HTTP リクエストの送信に失敗（ネットワークエラー等）
    #[error("API リクエストの送信に失敗しました: {0}")]
    Request(#[from] reqwest::Error),

    /// API がエラーレスポンスを返した
    #[error("API がエラーを返しました: {0}")]
    Api(String),

    /// コンテンツがセーフティフィルターでブロックされた
    #[error("コンテンツがブロックされました: {0}")]
    ContentBlocked(String),

    /// API レスポンスに候補が含まれていない
    #[error("API レスポンスに候補が含まれていません。コンテンツがブロックされたか、応答が空でした")]
    EmptyResponse,

    /// 不正なレスポンス形式
    #[error("不正なレスポンス形式です: {0}")]
    InvalidResponse(String),
}

/// 実行ログ永続化のエラー
#[derive(Debug, Error)]
pub enum StoreError {
    /// ログの書き込みに失敗
    #[error("実行ログの書き込みに失敗しました: {0}")]
    Write(#[source] std::io::Error),

    /// ログの読み込みに失敗
    #[error("実行ログの読み込みに失敗しました: {0}")]
    Read(#[source] std::io::Error),

    /// ログのシリアライズ/デシリアライズに失敗
    #[error("実行ログのシリアライズに失敗しました: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_validation_message() {
        let err = ConfigError::Validation("ワークフロー名が空です".to_string());
        assert_eq!(
            err.to_string(),
            "設定のバリデーションに失敗しました: ワークフロー名が空です"
        );
    }

    #[test]
    fn test_provider_error_missing_api_key_message() {
        let err = ProviderError::MissingApiKey("GEMINI_API_KEY".to_string());
        assert_eq!(
            err.to_string(),
            "API キーが設定されていません。環境変数 GEMINI_API_KEY を設定してください"
        );
    }

    #[test]
    fn test_provider_error_api_message() {
        let err = ProviderError::Api("quota exceeded".to_string());
        assert_eq!(err.to_string(), "API がエラーを返しました: quota exceeded");
    }

    #[test]
    fn test_store_error_write_message() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::Write(io);
        assert!(err.to_string().starts_with("実行ログの書き込みに失敗しました"));
    }
}

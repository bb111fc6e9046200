//! モデルカタログ
//!
//! # 責務
//!
//! - 利用可能な Gemini モデルの一覧と表示用メタデータを提供
//! - エージェントのモデル指定が空の場合のデフォルトモデルを定義

/// モデルのメタデータ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelInfo {
    /// モデル ID（API に渡す識別子）
    pub id: &'static str,
    /// 表示名
    pub name: &'static str,
    /// 説明
    pub description: &'static str,
    /// バッジ表示用のカテゴリー
    pub category: &'static str,
}

/// 利用可能なモデルの一覧
pub const GEMINI_MODELS: &[ModelInfo] = &[
    ModelInfo {
        id: "gemini-2.0-flash-live",
        name: "Gemini 2.0 Flash Live",
        description: "Free",
        category: "live",
    },
    ModelInfo {
        id: "gemini-2.5-flash-live",
        name: "Gemini 2.5 Flash Live",
        description: "Free",
        category: "live",
    },
    ModelInfo {
        id: "gemini-2.5-flash",
        name: "Gemini 2.5 Flash",
        description: "Fast and efficient",
        category: "flash",
    },
    ModelInfo {
        id: "gemini-2.5-flash-lite",
        name: "Gemini 2.5 Flash Lite",
        description: "Ultra lightweight and fast",
        category: "lite",
    },
    ModelInfo {
        id: "gemini-2.5-pro",
        name: "Gemini 2.5 Pro",
        description: "Most capable model",
        category: "pro",
    },
    ModelInfo {
        id: "gemini-2.0-flash",
        name: "Gemini 2.0 Flash",
        description: "High throughput",
        category: "flash",
    },
    ModelInfo {
        id: "gemini-2.0-flash-exp",
        name: "Gemini 2.0 Flash Experimental",
        description: "Experimental features and testing",
        category: "exp",
    },
    ModelInfo {
        id: "gemini-2.0-flash-lite",
        name: "Gemini 2.0 Flash Lite",
        description: "Cost-efficient and fast",
        category: "lite",
    },
];

/// デフォルトモデル
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-live";

/// エージェントのモデル指定を解決
///
/// 指定が空文字列または空白のみの場合は [`DEFAULT_MODEL`] にフォールバックします。
/// カタログにないモデル ID もそのまま通します（API 側でエラーになります）。
pub fn resolve_model(model: &str) -> &str {
    if model.trim().is_empty() {
        DEFAULT_MODEL
    } else {
        model
    }
}

/// モデル ID から表示名を取得
///
/// カタログにない ID はそのまま返します。
pub fn model_name(model_id: &str) -> &str {
    GEMINI_MODELS
        .iter()
        .find(|m| m.id == model_id)
        .map(|m| m.name)
        .unwrap_or(model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_model_falls_back_to_default() {
        assert_eq!(resolve_model(""), DEFAULT_MODEL);
        assert_eq!(resolve_model("   "), DEFAULT_MODEL);
        assert_eq!(resolve_model("gemini-2.5-pro"), "gemini-2.5-pro");
    }

    #[test]
    fn test_model_name_lookup() {
        assert_eq!(model_name("gemini-2.5-flash"), "Gemini 2.5 Flash");
        assert_eq!(model_name("unknown-model"), "unknown-model");
    }

    #[test]
    fn test_default_model_is_in_catalog() {
        assert!(GEMINI_MODELS.iter().any(|m| m.id == DEFAULT_MODEL));
    }
}

//! 実行ログの永続化レイヤー
//!
//! # 責務
//!
//! - 実行ログの永続化インターフェース [`ExecutionStore`] を提供
//! - JSON Lines ファイルへ追記する [`JsonlExecutionStore`] を提供
//! - テストおよび組み込み利用向けのインメモリ実装 [`MemoryExecutionStore`] を提供
//!
//! 実行ログは追記専用です。一度記録したログを更新・削除する操作はありません。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use agentforge_chain::store::{ExecutionStore, JsonlExecutionStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = JsonlExecutionStore::new("executions.jsonl");
//!     for log in store.load_all().await? {
//!         println!("{}: {:?}", log.workflow_name, log.status);
//!     }
//!     Ok(())
//! }
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::engine::result::ExecutionLog;
use crate::error::StoreError;

/// 実行ログの永続化インターフェース
///
/// 実行 1 回につき [`record_execution`](Self::record_execution) が
/// ちょうど 1 回呼ばれます。実装は追記のみを想定すればよく、
/// 既存ログの書き換えを考慮する必要はありません。
#[async_trait]
pub trait ExecutionStore: Send + Sync {
    /// 実行ログを 1 件追記
    async fn record_execution(&self, log: &ExecutionLog) -> Result<(), StoreError>;

    /// 記録済みの実行ログをすべて読み込む（記録順）
    async fn load_all(&self) -> Result<Vec<ExecutionLog>, StoreError>;
}

/// JSON Lines ファイルに追記する実行ログストア
///
/// 1 行につき 1 件のログを JSON で追記します。ファイルが存在しない場合は
/// 初回の記録時に作成され、読み込み時は空のリストとして扱われます。
pub struct JsonlExecutionStore {
    path: PathBuf,
}

impl JsonlExecutionStore {
    /// 指定したパスに追記するストアを生成
    ///
    /// この時点ではファイルを開きません。
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// ログファイルのパス
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl ExecutionStore for JsonlExecutionStore {
    async fn record_execution(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        // 1 行 1 レコードで追記する（pretty 出力は改行を含むため使わない）
        let mut line = serde_json::to_string(log)?;
        line.push('\n');

        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .map_err(StoreError::Write)?;
        file.write_all(line.as_bytes())
            .await
            .map_err(StoreError::Write)?;
        file.flush().await.map_err(StoreError::Write)?;

        debug!(path = %self.path.display(), workflow = %log.workflow_name, "実行ログを追記しました");
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ExecutionLog>, StoreError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            // 未作成のログファイルは「記録なし」として扱う
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(StoreError::Read(err)),
        };

        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(StoreError::from))
            .collect()
    }
}

/// インメモリの実行ログストア
///
/// テストおよびログを残す必要のない組み込み利用向けです。
#[derive(Default)]
pub struct MemoryExecutionStore {
    logs: Mutex<Vec<ExecutionLog>>,
}

impl MemoryExecutionStore {
    /// 空のストアを生成
    pub fn new() -> Self {
        Self::default()
    }

    /// 記録済みログのスナップショットを取得
    pub fn logs(&self) -> Vec<ExecutionLog> {
        self.lock().clone()
    }

    /// 記録済みログの件数
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// ログが 1 件もないかどうか
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<ExecutionLog>> {
        self.logs.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ExecutionStore for MemoryExecutionStore {
    async fn record_execution(&self, log: &ExecutionLog) -> Result<(), StoreError> {
        self.lock().push(log.clone());
        Ok(())
    }

    async fn load_all(&self) -> Result<Vec<ExecutionLog>, StoreError> {
        Ok(self.logs())
    }
}

//! ワークフロー実行のオーケストレーション
//!
//! # 責務
//!
//! このモジュールは、[`ChainExecutor`] を対話的な利用のためにラップする
//! [`WorkflowRunController`] を提供します。
//!
//! - 実行中の進捗（現在のステップ、完了済みステップ）を watch チャンネルで公開
//! - 成功・失敗を問わず、実行試行 1 回につき必ず 1 件の実行ログを
//!   [`ExecutionStore`] に記録
//! - 実行開始時の状態リセットと、多重実行の拒否（reject-if-busy）
//!
//! 元の UI ではこれらの状態はコンポーネントローカルな state として持たれて
//! いましたが、ここでは実行セッションごとに生成されるコントローラーオブジェクト
//! が明示的に所有します。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use agentforge_chain::config::agent::AgentLibrary;
//! use agentforge_chain::config::workflow::WorkflowDefinition;
//! use agentforge_chain::engine::controller::WorkflowRunController;
//! use agentforge_chain::provider::gemini::GeminiInvoker;
//! use agentforge_chain::store::JsonlExecutionStore;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agents = AgentLibrary::from_file("agents/example.toml")?;
//!     let workflow = WorkflowDefinition::from_file("workflows/example.toml")?;
//!
//!     let controller = WorkflowRunController::new(
//!         Arc::new(GeminiInvoker::from_env()?),
//!         Arc::new(JsonlExecutionStore::new("executions.jsonl")),
//!     );
//!
//!     // 進捗の購読（UI 表示用）
//!     let mut progress = controller.subscribe();
//!     tokio::spawn(async move {
//!         while progress.changed().await.is_ok() {
//!             let p = progress.borrow().clone();
//!             println!("current = {:?}, completed = {:?}", p.current_step, p.completed_steps);
//!         }
//!     });
//!
//!     controller.start(&workflow, &agents, "入力テキスト").await?;
//!
//!     if let Some(result) = controller.last_result() {
//!         println!("最終出力: {}", result.final_output);
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # 既知の制限
//!
//! 実行中のチェーンを中断するキャンセル機構はありません。
//! 実行はすべてのステップが完了するか、いずれかのステップで失敗するまで続きます。

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info};

use crate::config::agent::AgentLibrary;
use crate::config::workflow::WorkflowDefinition;
use crate::engine::executor::{ChainExecutor, StepObserver};
use crate::engine::result::{ChainError, ChainExecutionResult, ExecutionLog};
use crate::provider::AgentInvoker;
use crate::store::ExecutionStore;

/// 実行中の進捗状態（UI 表示用、非永続）
///
/// 実行開始のたびにリセットされ、ステップ境界ごとに更新されます。
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RunProgress {
    /// 実行中かどうか
    pub running: bool,

    /// 現在実行中のステップ（0 始まり、アイドル時は `None`）
    pub current_step: Option<usize>,

    /// 完了済みステップの集合（0 始まり）
    pub completed_steps: BTreeSet<usize>,
}

impl RunProgress {
    /// アイドル状態の進捗を生成
    pub fn idle() -> Self {
        Self::default()
    }
}

/// ステップ境界の通知を watch チャンネルへ流すオブザーバー
struct WatchObserver<'a> {
    tx: &'a watch::Sender<RunProgress>,
    progress: RunProgress,
}

impl StepObserver for WatchObserver<'_> {
    fn on_step_started(&mut self, index: usize) {
        self.progress.current_step = Some(index);
        self.tx.send_replace(self.progress.clone());
    }

    fn on_step_completed(&mut self, index: usize) {
        self.progress.completed_steps.insert(index);
        self.tx.send_replace(self.progress.clone());
    }
}

/// ワークフロー実行コントローラー
///
/// 1 つの実行セッションの可変状態（実行中フラグ、進捗、直近の結果/エラー）を
/// 排他的に所有します。状態は進行中の実行のみが書き換え、同一インスタンスへの
/// 並行した `start` 呼び出しは [`ChainError::RunInProgress`] で拒否されます。
///
/// エージェントコレクションとワークフロー定義は 1 回の実行の間、
/// 不変のスナップショットとして扱われます。
pub struct WorkflowRunController {
    invoker: Arc<dyn AgentInvoker>,
    store: Arc<dyn ExecutionStore>,
    step_timeout: Option<Duration>,
    running: AtomicBool,
    progress_tx: watch::Sender<RunProgress>,
    last_result: Mutex<Option<ChainExecutionResult>>,
    last_error: Mutex<Option<String>>,
}

impl WorkflowRunController {
    /// 新しいコントローラーを生成
    ///
    /// # 引数
    ///
    /// - `invoker`: 単一エージェント実行の外部境界
    /// - `store`: 実行ログの永続化先
    pub fn new(invoker: Arc<dyn AgentInvoker>, store: Arc<dyn ExecutionStore>) -> Self {
        let (progress_tx, _) = watch::channel(RunProgress::idle());
        Self {
            invoker,
            store,
            step_timeout: None,
            running: AtomicBool::new(false),
            progress_tx,
            last_result: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    /// ステップごとのタイムアウトを設定
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// ワークフローを実行
    ///
    /// # 事前条件
    ///
    /// - `initial_input` はトリム後に空でないこと（[`ChainError::EmptyInput`]）
    /// - 同一インスタンスで別の実行が進行中でないこと（[`ChainError::RunInProgress`]）
    ///
    /// 事前条件違反で拒否された場合、invoke は一度も呼ばれず、実行ログも書かれません。
    ///
    /// # 観測可能な状態遷移
    ///
    /// 1. 進捗・直近の結果/エラーをリセットし、`running = true` を公開
    /// 2. ステップごとに `current_step` を実行前に更新、成功後に完了集合へ追加
    /// 3. 実行終了時にアイドル状態（`current_step = None`）へ戻す
    /// 4. 成功・失敗を問わず、実行ログを **ちょうど 1 回** 記録
    ///
    /// # 戻り値
    ///
    /// - `Ok(())`: 全ステップ成功（結果は [`last_result`](Self::last_result) から取得）
    /// - `Err(ChainError)`: 拒否または実行失敗（部分トレースはログに記録済み）
    pub async fn start(
        &self,
        workflow: &WorkflowDefinition,
        agents: &AgentLibrary,
        initial_input: &str,
    ) -> Result<(), ChainError> {
        if initial_input.trim().is_empty() {
            return Err(ChainError::EmptyInput);
        }
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(ChainError::RunInProgress);
        }

        let outcome = self.run(workflow, agents, initial_input).await;
        self.running.store(false, Ordering::SeqCst);
        outcome
    }

    /// 実行中かどうか
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 進捗の購読用レシーバーを取得
    pub fn subscribe(&self) -> watch::Receiver<RunProgress> {
        self.progress_tx.subscribe()
    }

    /// 現在の進捗のスナップショット
    pub fn progress(&self) -> RunProgress {
        self.progress_tx.borrow().clone()
    }

    /// 直近の成功した実行の結果
    pub fn last_result(&self) -> Option<ChainExecutionResult> {
        lock_state(&self.last_result).clone()
    }

    /// 直近の失敗した実行のエラーメッセージ
    pub fn last_error(&self) -> Option<String> {
        lock_state(&self.last_error).clone()
    }

    /// 実行本体（running フラグの管理は `start` 側で行う）
    async fn run(
        &self,
        workflow: &WorkflowDefinition,
        agents: &AgentLibrary,
        initial_input: &str,
    ) -> Result<(), ChainError> {
        // 前回の実行状態をクリア
        *lock_state(&self.last_result) = None;
        *lock_state(&self.last_error) = None;

        let mut observer = WatchObserver {
            tx: &self.progress_tx,
            progress: RunProgress {
                running: true,
                current_step: None,
                completed_steps: BTreeSet::new(),
            },
        };
        self.progress_tx.send_replace(observer.progress.clone());

        let mut executor = ChainExecutor::new(workflow, agents, self.invoker.as_ref());
        if let Some(timeout) = self.step_timeout {
            executor = executor.with_step_timeout(timeout);
        }

        let outcome = executor
            .execute_with_observer(initial_input, &mut observer)
            .await;

        // アイドル状態へ戻す（完了ステップ集合は表示用に残す）
        let mut final_progress = observer.progress.clone();
        final_progress.running = false;
        final_progress.current_step = None;
        self.progress_tx.send_replace(final_progress);

        match outcome {
            Ok(result) => {
                info!(
                    workflow = workflow.name(),
                    steps = result.results.len(),
                    "ワークフローが完了しました"
                );
                let log = ExecutionLog::success(&result, initial_input);
                *lock_state(&self.last_result) = Some(result);

                self.store
                    .record_execution(&log)
                    .await
                    .map_err(ChainError::Store)
            }
            Err(failure) => {
                let message = failure.error.to_string();
                error!(workflow = workflow.name(), %message, "ワークフローが失敗しました");
                *lock_state(&self.last_error) = Some(message);

                // 失敗時もログは必ず記録する（部分トレース付き）
                let log =
                    ExecutionLog::failure(workflow.id(), workflow.name(), initial_input, &failure);
                if let Err(store_err) = self.store.record_execution(&log).await {
                    error!(%store_err, "実行ログの保存に失敗しました");
                }

                Err(failure.error)
            }
        }
    }
}

/// 状態用 Mutex のロック（ポイズニングは無視して継続する）
fn lock_state<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::agent::Agent;
    use crate::config::workflow::WorkflowStepRef;
    use crate::engine::result::RunStatus;
    use crate::error::ProviderError;
    use crate::provider::ParameterOverrides;
    use crate::store::MemoryExecutionStore;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use tokio::sync::Notify;

    /// エージェント ID ごとに決めた接頭辞を返すモック invoke 実装
    struct MockInvoker {
        prefixes: HashMap<String, String>,
        failures: HashMap<String, String>,
    }

    impl MockInvoker {
        fn new() -> Self {
            Self {
                prefixes: HashMap::new(),
                failures: HashMap::new(),
            }
        }

        fn with_prefix(mut self, agent_id: &str, prefix: &str) -> Self {
            self.prefixes.insert(agent_id.to_string(), prefix.to_string());
            self
        }

        fn with_failure(mut self, agent_id: &str, message: &str) -> Self {
            self.failures.insert(agent_id.to_string(), message.to_string());
            self
        }
    }

    #[async_trait]
    impl AgentInvoker for MockInvoker {
        async fn invoke(
            &self,
            agent: &Agent,
            input: &str,
            _overrides: &ParameterOverrides,
        ) -> Result<String, ProviderError> {
            if let Some(message) = self.failures.get(&agent.id) {
                return Err(ProviderError::Api(message.clone()));
            }
            let prefix = self.prefixes.get(&agent.id).cloned().unwrap_or_default();
            Ok(format!("{}{}", prefix, input))
        }
    }

    /// 通知があるまで応答を保留するモック（多重実行拒否のテスト用）
    struct BlockingInvoker {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl AgentInvoker for BlockingInvoker {
        async fn invoke(
            &self,
            _agent: &Agent,
            input: &str,
            _overrides: &ParameterOverrides,
        ) -> Result<String, ProviderError> {
            self.release.notified().await;
            Ok(input.to_string())
        }
    }

    fn library() -> AgentLibrary {
        AgentLibrary::new(vec![
            Agent::new("agent1", "Agent One"),
            Agent::new("agent2", "Agent Two"),
        ])
    }

    fn two_step_workflow() -> WorkflowDefinition {
        WorkflowDefinition::new(
            "wf-1",
            "Two Steps",
            None,
            vec![
                WorkflowStepRef::new("agent1", 0),
                WorkflowStepRef::new("agent2", 1),
            ],
        )
    }

    fn controller_with(
        invoker: impl AgentInvoker + 'static,
    ) -> (WorkflowRunController, Arc<MemoryExecutionStore>) {
        let store = Arc::new(MemoryExecutionStore::new());
        let controller = WorkflowRunController::new(Arc::new(invoker), store.clone());
        (controller, store)
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected_without_logging() {
        let invoker = MockInvoker::new();
        let (controller, store) = controller_with(invoker);

        let err = controller
            .start(&two_step_workflow(), &library(), "   ")
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::EmptyInput));
        // 実行は試行されていないのでログは書かれない
        assert_eq!(store.len(), 0);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_successful_run_records_exactly_one_log() {
        let invoker = MockInvoker::new()
            .with_prefix("agent1", "X")
            .with_prefix("agent2", "Y");
        let (controller, store) = controller_with(invoker);

        controller
            .start(&two_step_workflow(), &library(), "a")
            .await
            .unwrap();

        let result = controller.last_result().unwrap();
        assert_eq!(result.final_output, "YXa");
        assert!(controller.last_error().is_none());

        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, RunStatus::Success);
        assert_eq!(logs[0].input, "a");
        assert_eq!(logs[0].output.as_deref(), Some("YXa"));
        assert_eq!(logs[0].step_results.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_run_still_records_exactly_one_log() {
        let invoker = MockInvoker::new()
            .with_prefix("agent1", "X")
            .with_failure("agent2", "quota exceeded");
        let (controller, store) = controller_with(invoker);

        let err = controller
            .start(&two_step_workflow(), &library(), "a")
            .await
            .unwrap_err();

        assert!(matches!(err, ChainError::Invocation(_)));
        assert!(controller.last_result().is_none());
        assert!(
            controller
                .last_error()
                .as_deref()
                .unwrap()
                .contains("quota exceeded")
        );

        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, RunStatus::Error);
        assert!(logs[0].output.is_none());
        // 部分トレース（成功 1 件 + 失敗 1 件）が記録される
        assert_eq!(logs[0].step_results.len(), 2);
        assert!(logs[0].error.as_deref().unwrap().contains("quota exceeded"));
    }

    #[tokio::test]
    async fn test_missing_agent_logs_error_with_empty_trace() {
        let invoker = MockInvoker::new();
        let (controller, store) = controller_with(invoker);
        let workflow = WorkflowDefinition::new(
            "wf-ghost",
            "Ghost",
            None,
            vec![WorkflowStepRef::new("ghost", 0)],
        );

        let err = controller.start(&workflow, &library(), "a").await.unwrap_err();

        assert!(matches!(err, ChainError::MissingAgent { .. }));
        let logs = store.logs();
        assert_eq!(logs.len(), 1);
        assert_eq!(logs[0].status, RunStatus::Error);
        assert!(logs[0].step_results.is_empty());
    }

    #[tokio::test]
    async fn test_progress_reaches_idle_with_completed_steps() {
        let invoker = MockInvoker::new()
            .with_prefix("agent1", "X")
            .with_prefix("agent2", "Y");
        let (controller, _store) = controller_with(invoker);

        controller
            .start(&two_step_workflow(), &library(), "a")
            .await
            .unwrap();

        let progress = controller.progress();
        assert!(!progress.running);
        assert_eq!(progress.current_step, None);
        assert_eq!(
            progress.completed_steps,
            BTreeSet::from([0usize, 1usize])
        );
    }

    #[tokio::test]
    async fn test_concurrent_start_is_rejected() {
        let release = Arc::new(Notify::new());
        let invoker = BlockingInvoker {
            release: release.clone(),
        };
        let store = Arc::new(MemoryExecutionStore::new());
        let controller = Arc::new(WorkflowRunController::new(Arc::new(invoker), store.clone()));

        let workflow = WorkflowDefinition::new(
            "wf-slow",
            "Slow",
            None,
            vec![WorkflowStepRef::new("agent1", 0)],
        );
        let agents = library();

        let first = {
            let controller = controller.clone();
            let workflow = workflow.clone();
            let agents = agents.clone();
            tokio::spawn(async move { controller.start(&workflow, &agents, "a").await })
        };

        // 最初の実行が走り出すまで待つ
        while !controller.is_running() {
            tokio::task::yield_now().await;
        }

        // 進行中は current_step が失敗も完了もしていない先頭ステップを指す
        let progress = controller.progress();
        assert!(progress.running);
        assert_eq!(progress.current_step, Some(0));

        let err = controller.start(&workflow, &agents, "b").await.unwrap_err();
        assert!(matches!(err, ChainError::RunInProgress));

        release.notify_one();
        first.await.unwrap().unwrap();

        // 拒否された呼び出しはログを書かない
        assert_eq!(store.len(), 1);
        assert!(!controller.is_running());
    }

    #[tokio::test]
    async fn test_new_run_clears_previous_error() {
        let invoker = MockInvoker::new().with_prefix("agent1", "X");
        let (controller, store) = controller_with(invoker);
        let agents = library();

        let ghost_workflow = WorkflowDefinition::new(
            "wf-ghost",
            "Ghost",
            None,
            vec![WorkflowStepRef::new("ghost", 0)],
        );
        let ok_workflow = WorkflowDefinition::new(
            "wf-ok",
            "Ok",
            None,
            vec![WorkflowStepRef::new("agent1", 0)],
        );

        let _ = controller.start(&ghost_workflow, &agents, "a").await;
        assert!(controller.last_error().is_some());

        controller.start(&ok_workflow, &agents, "a").await.unwrap();
        assert!(controller.last_error().is_none());
        assert_eq!(controller.last_result().unwrap().final_output, "Xa");

        // 実行試行 2 回でログも 2 件
        assert_eq!(store.len(), 2);
    }
}

//! チェーン実行エンジン
//!
//! # 責務
//!
//! このモジュールは、チェーン実行の中核となる `ChainExecutor` を提供します。
//! ワークフロー定義を受け取り、各ステップを `order` の昇順で 1 つずつ実行し、
//! 各エージェントの出力を次のエージェントの入力として受け渡します。
//!
//! # 実行フロー
//!
//! 1. ステップを `order` の昇順で安定ソート
//! 2. 各ステップについて順次:
//!    - エージェント参照を解決（失敗したら即時中断）
//!    - エージェントを実行（invoke が解決するまで次のステップは開始しない）
//!    - 結果をトレースに記録
//!    - 出力を次のステップの入力へ引き継ぐ
//! 3. 全ステップ成功なら最終出力を含む集約結果を返す
//!
//! 最初の失敗でチェーンは停止し、それ以降のステップは実行されません。
//! 失敗時点までの部分トレースは [`ChainFailure`] として呼び出し側に返され、
//! ログ記録（[`WorkflowRunController`](crate::engine::controller::WorkflowRunController)）
//! に使用されます。
//!
//! # 使用例
//!
//! ```rust,no_run
//! use agentforge_chain::config::agent::AgentLibrary;
//! use agentforge_chain::config::workflow::WorkflowDefinition;
//! use agentforge_chain::engine::executor::ChainExecutor;
//! use agentforge_chain::provider::gemini::GeminiInvoker;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let agents = AgentLibrary::from_file("agents/example.toml")?;
//!     let workflow = WorkflowDefinition::from_file("workflows/example.toml")?;
//!     let invoker = GeminiInvoker::from_env()?;
//!
//!     let executor = ChainExecutor::new(&workflow, &agents, &invoker);
//!     let result = executor.execute("Rust の所有権について説明してください").await?;
//!
//!     println!("最終出力: {}", result.final_output);
//!     Ok(())
//! }
//! ```

use std::time::{Duration, SystemTime};
use tracing::{error, info};

use crate::config::agent::{Agent, AgentLibrary};
use crate::config::workflow::WorkflowDefinition;
use crate::engine::result::{
    ChainError, ChainExecutionResult, ChainFailure, StepResult, StepStatus,
};
use crate::provider::{AgentInvoker, ParameterOverrides};

/// ステップ進捗の通知先
///
/// チェーン実行中のステップ境界で呼び出されます。
/// UI 向けの進捗表示（現在のステップ、完了済みステップ）に使用します。
///
/// 失敗したステップは `on_step_started` のみが呼ばれ、
/// `on_step_completed` は呼ばれません。
pub trait StepObserver: Send {
    /// ステップの実行直前に呼ばれる（`index` は 0 始まり、実行順）
    fn on_step_started(&mut self, _index: usize) {}

    /// ステップの成功直後に呼ばれる
    fn on_step_completed(&mut self, _index: usize) {}
}

/// 何も通知しないオブザーバー
pub struct NoopObserver;

impl StepObserver for NoopObserver {}

/// チェーン実行エンジン
///
/// ワークフロー定義・エージェントコレクション・invoke 実装への参照を受け取り、
/// 1 回の実行を完了または最初の失敗まで進めます。
/// 並行実行は行いません。ステップ *N* は必ずステップ *N-1* の解決済み出力を
/// 入力として観測します。
///
/// # フィールド
///
/// - `workflow`: 実行するワークフロー定義（読み取り専用）
/// - `agents`: ステップ参照の解決先（読み取り専用スナップショット）
/// - `invoker`: 単一エージェント実行の外部境界
/// - `step_timeout`: ステップごとのタイムアウト（デフォルトは無制限）
pub struct ChainExecutor<'a> {
    workflow: &'a WorkflowDefinition,
    agents: &'a AgentLibrary,
    invoker: &'a dyn AgentInvoker,
    step_timeout: Option<Duration>,
}

impl<'a> ChainExecutor<'a> {
    /// 新しいエグゼキューターを生成
    pub fn new(
        workflow: &'a WorkflowDefinition,
        agents: &'a AgentLibrary,
        invoker: &'a dyn AgentInvoker,
    ) -> Self {
        Self {
            workflow,
            agents,
            invoker,
            step_timeout: None,
        }
    }

    /// ステップごとのタイムアウトを設定
    ///
    /// 指定時間内に invoke が解決しない場合、そのステップは
    /// [`ChainError::Timeout`] として失敗します。未設定の場合は無制限に待ちます。
    pub fn with_step_timeout(mut self, timeout: Duration) -> Self {
        self.step_timeout = Some(timeout);
        self
    }

    /// チェーンを実行
    ///
    /// 進捗通知が不要な場合のエントリーポイントです。
    ///
    /// # 戻り値
    ///
    /// - `Ok(ChainExecutionResult)`: 全ステップ成功
    /// - `Err(ChainFailure)`: 最初の失敗と、失敗時点までの部分トレース
    pub async fn execute(
        &self,
        initial_input: &str,
    ) -> Result<ChainExecutionResult, ChainFailure> {
        self.execute_with_observer(initial_input, &mut NoopObserver)
            .await
    }

    /// 進捗通知付きでチェーンを実行
    ///
    /// 各ステップの開始・完了を `observer` に通知します。
    ///
    /// # 引数
    ///
    /// - `initial_input`: 最初のステップへの入力
    /// - `observer`: ステップ境界の通知先
    pub async fn execute_with_observer(
        &self,
        initial_input: &str,
        observer: &mut dyn StepObserver,
    ) -> Result<ChainExecutionResult, ChainFailure> {
        let steps = self.workflow.sorted_steps();
        let total = steps.len();
        let mut results: Vec<StepResult> = Vec::with_capacity(total);
        let mut current_input = initial_input.to_string();

        // チェーンレベルでは常に空の上書きを渡す
        // （エージェント自身の設定のみが invoke 内部で適用される）
        let overrides = ParameterOverrides::new();

        for (index, step) in steps.iter().enumerate() {
            let Some(agent) = self.agents.get(step.agent_id()) else {
                // 参照解決の失敗は致命的。失敗ステップのエントリは追加しない
                error!(agent_id = step.agent_id(), "エージェントが見つかりません");
                return Err(ChainFailure {
                    error: ChainError::MissingAgent {
                        agent_id: step.agent_id().to_string(),
                    },
                    steps: results,
                });
            };

            info!(step = index + 1, total, agent = %agent.name, "ステップを実行します");
            observer.on_step_started(index);

            let step_start = SystemTime::now();
            let outcome = self.invoke_step(agent, &current_input, &overrides).await;
            let duration = SystemTime::now()
                .duration_since(step_start)
                .unwrap_or(Duration::from_secs(0));

            match outcome {
                Ok(output) => {
                    results.push(StepResult {
                        step: index + 1,
                        agent_id: agent.id.clone(),
                        agent_name: agent.name.clone(),
                        input: current_input.clone(),
                        output: Some(output.clone()),
                        status: StepStatus::Success,
                        error: None,
                        duration,
                    });
                    observer.on_step_completed(index);

                    // 出力を次のステップへ引き継ぐ
                    current_input = output;
                }
                Err(err) => {
                    error!(step = index + 1, agent = %agent.name, %err, "ステップが失敗しました");
                    results.push(StepResult {
                        step: index + 1,
                        agent_id: agent.id.clone(),
                        agent_name: agent.name.clone(),
                        input: current_input.clone(),
                        output: None,
                        status: StepStatus::Error,
                        error: Some(err.to_string()),
                        duration,
                    });
                    // 最初の失敗でチェーンを停止
                    return Err(ChainFailure {
                        error: err,
                        steps: results,
                    });
                }
            }
        }

        Ok(ChainExecutionResult {
            workflow_id: self.workflow.id().to_string(),
            workflow_name: self.workflow.name().to_string(),
            results,
            final_output: current_input,
        })
    }

    /// タイムアウト設定を考慮して invoke を 1 回実行
    async fn invoke_step(
        &self,
        agent: &Agent,
        input: &str,
        overrides: &ParameterOverrides,
    ) -> Result<String, ChainError> {
        match self.step_timeout {
            Some(timeout) => {
                match tokio::time::timeout(timeout, self.invoker.invoke(agent, input, overrides))
                    .await
                {
                    Ok(Ok(output)) => Ok(output),
                    Ok(Err(e)) => Err(ChainError::Invocation(e)),
                    Err(_) => Err(ChainError::Timeout {
                        agent_name: agent.name.clone(),
                        timeout_secs: timeout.as_secs(),
                    }),
                }
            }
            None => self
                .invoker
                .invoke(agent, input, overrides)
                .await
                .map_err(ChainError::Invocation),
        }
    }
}

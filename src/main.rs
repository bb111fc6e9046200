//! agentforge-chain CLI
//!
//! TOML で定義したワークフローをコマンドラインから実行し、
//! 実行ログを JSON Lines ファイルに記録します。
//!
//! ```text
//! agentforge-chain run "入力テキスト" --workflow workflows/example.toml
//! agentforge-chain history --log-file executions.jsonl
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_appender::non_blocking::WorkerGuard;

use agentforge_chain::config::agent::AgentLibrary;
use agentforge_chain::config::workflow::WorkflowDefinition;
use agentforge_chain::engine::WorkflowRunController;
use agentforge_chain::provider::GeminiInvoker;
use agentforge_chain::store::{ExecutionStore, JsonlExecutionStore};

#[derive(Parser)]
#[command(name = "agentforge-chain", version, about = "エージェントチェーンの逐次実行エンジン")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// トレースログの出力先ディレクトリ（省略時は標準エラー出力）
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// トレースログを JSON 形式で出力
    #[arg(long, global = true)]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Command {
    /// ワークフローを実行
    Run(RunArgs),
    /// 記録済みの実行ログを表示
    History(HistoryArgs),
}

#[derive(Args)]
struct RunArgs {
    /// チェーンへの初期入力テキスト
    input: String,

    /// ワークフロー定義（TOML）
    #[arg(long, default_value = "workflows/example.toml")]
    workflow: PathBuf,

    /// エージェント定義（TOML、または拡張子 .json のビルダーエクスポート）
    #[arg(long, default_value = "agents/example.toml")]
    agents: PathBuf,

    /// 実行ログの保存先（JSON Lines）
    #[arg(long, default_value = "executions.jsonl")]
    log_file: PathBuf,

    /// ステップごとのタイムアウト（秒）
    #[arg(long)]
    step_timeout: Option<u64>,

    /// 実行結果全体を JSON で出力（省略時は最終出力のみ）
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct HistoryArgs {
    /// 実行ログの保存先（JSON Lines）
    #[arg(long, default_value = "executions.jsonl")]
    log_file: PathBuf,

    /// ログ全体を JSON で出力（省略時は 1 行サマリー）
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let _guard = init_tracing(cli.log_dir.as_deref(), cli.json_logs);

    let outcome = match cli.command {
        Command::Run(args) => run(args).await,
        Command::History(args) => history(args).await,
    };

    if let Err(err) = outcome {
        eprintln!("エラー: {err}");
        std::process::exit(1);
    }
}

/// トレーシングの初期化
///
/// ファイル出力時は flush 完了を保証するため、返されたガードを
/// プロセス終了まで保持する必要があります。
fn init_tracing(log_dir: Option<&Path>, json_logs: bool) -> Option<WorkerGuard> {
    match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "agentforge-chain.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            if json_logs {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false)
                    .init();
            } else {
                tracing_subscriber::fmt()
                    .with_writer(writer)
                    .with_ansi(false)
                    .init();
            }
            Some(guard)
        }
        None => {
            if json_logs {
                tracing_subscriber::fmt()
                    .json()
                    .with_writer(std::io::stderr)
                    .init();
            } else {
                tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            }
            None
        }
    }
}

async fn run(args: RunArgs) -> Result<(), Box<dyn std::error::Error>> {
    let agents = load_agents(&args.agents)?;
    let workflow = WorkflowDefinition::from_file(&args.workflow)?;
    let total_steps = workflow.steps().len();

    let mut controller = WorkflowRunController::new(
        Arc::new(GeminiInvoker::from_env()?),
        Arc::new(JsonlExecutionStore::new(&args.log_file)),
    );
    if let Some(secs) = args.step_timeout {
        controller = controller.with_step_timeout(Duration::from_secs(secs));
    }

    // ステップ境界ごとに進捗を標準エラー出力へ表示する
    let mut progress_rx = controller.subscribe();
    let progress_task = tokio::spawn(async move {
        while progress_rx.changed().await.is_ok() {
            let progress = progress_rx.borrow_and_update().clone();
            if let Some(step) = progress.current_step {
                eprintln!(
                    "[{}/{}] ステップ {} を実行中...",
                    progress.completed_steps.len(),
                    total_steps,
                    step + 1
                );
            }
        }
    });

    let outcome = controller.start(&workflow, &agents, &args.input).await;
    let result = controller.last_result();

    // watch の送信側を閉じて進捗表示タスクを終了させる
    drop(controller);
    let _ = progress_task.await;

    outcome?;

    if let Some(result) = result {
        if args.json {
            println!("{}", result.to_json()?);
        } else {
            println!("{}", result.final_output);
        }
    }
    Ok(())
}

async fn history(args: HistoryArgs) -> Result<(), Box<dyn std::error::Error>> {
    let store = JsonlExecutionStore::new(&args.log_file);
    let logs = store.load_all().await?;

    if logs.is_empty() {
        eprintln!("実行ログはまだありません: {}", args.log_file.display());
        return Ok(());
    }

    for log in logs {
        if args.json {
            println!("{}", log.to_json()?);
        } else {
            let status = match log.status {
                agentforge_chain::engine::RunStatus::Success => "success",
                agentforge_chain::engine::RunStatus::Error => "error",
            };
            println!(
                "{} [{}] steps={} input={:?}",
                log.workflow_name,
                status,
                log.step_results.len(),
                log.input
            );
        }
    }
    Ok(())
}

/// エージェント定義の読み込み
///
/// 拡張子が `.json` の場合はビルダー UI のエクスポート形式、
/// それ以外は TOML 定義ファイルとして解釈します。
fn load_agents(path: &Path) -> Result<AgentLibrary, Box<dyn std::error::Error>> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let library = if is_json {
        let content = std::fs::read_to_string(path)?;
        AgentLibrary::from_json_export(&content)?
    } else {
        AgentLibrary::from_file(path)?
    };
    Ok(library)
}

//! Voice-commanded robot arm: interpret, confirm, execute
//!
//! Interactive sessions read operator commands line by line, read the
//! interpreted motion back and only move after a yes. Batch commands run whole
//! prompt tables through the interpreter or the composer for evaluation.

mod config;

use anyhow::{Context, Result};
use batch_eval::{
    completion_path, confirm_table, interpret_table, BatchOptions, BatchReport, Table,
    UsageMetrics,
};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use confirm_composer::{Composer, LlmComposer, TemplateComposer};
use confirmation_gate::{
    ConfirmationGate, ConsoleChannel, GateError, GatePolicy, LoggingActuator, SessionOutcome,
};
use intent_parser::{
    Displacement, Interpreter, Lexicon, LlmInterpreter, RuleInterpreter, Utterance,
};
use llm_backend::{create_backend, CompletionBackend};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

use config::HriConfig;

#[derive(Parser, Debug)]
#[command(
    name = "hri",
    version,
    about = "Natural-language robot arm control with spoken confirmation",
    disable_help_subcommand = true
)]
struct Cli {
    /// Config file; sessions and batch runs create it with defaults if missing
    #[arg(long, global = true, default_value = "hri.json")]
    config: String,

    /// Where interpretation and confirmation wording come from
    #[arg(long, value_enum, global = true, default_value_t = BackendKind::Rules)]
    backend: BackendKind,

    /// YAML lexicon extension (overrides the config file)
    #[arg(long, global = true)]
    lexicon: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum BackendKind {
    /// Offline: rule interpreter and template composer
    Rules,
    /// Language model over an OpenAI-compatible HTTP API
    Http,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Interpret one command and print the displacement
    Interpret {
        #[arg(long)]
        text: String,
    },
    /// Print the confirmation for one command
    Confirm {
        #[arg(long)]
        text: String,
        /// Displacement in the reply grammar; interpreted from the text if omitted
        #[arg(long)]
        displacement: Option<String>,
    },
    /// Interactive interpret-confirm-execute loop on the console
    Session {
        /// Utterances per interaction before giving up
        #[arg(long)]
        max_attempts: Option<u32>,
        /// Stop after one interaction
        #[arg(long, action = ArgAction::SetTrue)]
        once: bool,
        /// Print each session report as JSON
        #[arg(long, action = ArgAction::SetTrue)]
        json: bool,
    },
    /// Interpret a column of prompts from a JSON table
    BatchInterpret {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "Prompt Contents")]
        column: String,
        /// Column with expected replies, for accuracy scoring
        #[arg(long)]
        expected_column: Option<String>,
        #[arg(long)]
        concurrency: Option<usize>,
        /// Print Prometheus counters after the run
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Compose confirmations for prompts and their displacements
    BatchConfirm {
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "Prompt Contents")]
        column: String,
        #[arg(long, default_value = "Prompt Execution")]
        exe_column: String,
        #[arg(long)]
        concurrency: Option<usize>,
        #[arg(long, action = ArgAction::SetTrue)]
        metrics: bool,
    },
    /// Print the effective lexicon as YAML
    Lexicon,
}

impl Commands {
    /// One-shot lookups that should leave the working directory alone
    fn is_read_only(&self) -> bool {
        matches!(
            self,
            Commands::Interpret { .. } | Commands::Confirm { .. } | Commands::Lexicon
        )
    }
}

/// Interpreter and composer chosen for this run
struct Pipeline {
    interpreter: Arc<dyn Interpreter>,
    composer: Arc<dyn Composer>,
}

impl Pipeline {
    fn build(kind: BackendKind, config: &HriConfig, lexicon: &Lexicon) -> Result<Self> {
        match kind {
            BackendKind::Rules => Ok(Self {
                interpreter: Arc::new(
                    RuleInterpreter::new(lexicon).context("compiling lexicon")?,
                ),
                composer: Arc::new(TemplateComposer::new()),
            }),
            BackendKind::Http => {
                let backend: Arc<dyn CompletionBackend> =
                    create_backend(config.backend_config()?).context("creating backend")?;
                Ok(Self {
                    interpreter: Arc::new(LlmInterpreter::new(
                        backend.clone(),
                        config.interpreter.clone(),
                        lexicon,
                    )),
                    composer: Arc::new(LlmComposer::new(backend, config.composer.clone())),
                })
            }
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    setup_tracing();
    let cli = Cli::parse();

    intent_parser::init()?;
    confirm_composer::init()?;
    confirmation_gate::init()?;
    batch_eval::init()?;

    let config = if cli.command.is_read_only() {
        HriConfig::read(&cli.config)?
    } else {
        HriConfig::load(&cli.config)?
    };
    let lexicon = load_lexicon(&cli, &config)?;

    if let Commands::Lexicon = cli.command {
        print!("{}", lexicon.to_yaml()?);
        return Ok(());
    }

    let pipeline = Pipeline::build(cli.backend, &config, &lexicon)?;
    info!(
        "Using {} interpreter and {} composer",
        pipeline.interpreter.name(),
        pipeline.composer.name()
    );

    match cli.command {
        Commands::Interpret { text } => {
            let out = pipeline.interpreter.interpret(&Utterance::new(text)).await?;
            println!("{}", out.displacement);
        }
        Commands::Confirm { text, displacement } => {
            let utterance = Utterance::new(text);
            let displacement = match displacement {
                Some(grammar) => Displacement::parse_reply(&grammar)
                    .context("--displacement is not in the reply grammar")?,
                None => pipeline.interpreter.interpret(&utterance).await?.displacement,
            };
            let confirmation = pipeline.composer.compose(&utterance, &displacement).await?;
            if confirmation.fell_back {
                warn!("Backend wording was unusable; printed the template instead");
            }
            println!("{}", confirmation.text);
        }
        Commands::Session {
            max_attempts,
            once,
            json,
        } => {
            let policy = GatePolicy {
                max_attempts: max_attempts.unwrap_or(config.gate.max_attempts),
            };
            run_sessions(pipeline, policy, once, json).await?;
        }
        Commands::BatchInterpret {
            input,
            column,
            expected_column,
            concurrency,
            metrics,
        } => {
            let mut table = Table::load(&input)?;
            let usage = UsageMetrics::new()?;
            let options = batch_options(&config, concurrency);
            let report = interpret_table(
                pipeline.interpreter,
                &mut table,
                &column,
                expected_column.as_deref(),
                &options,
                &usage,
            )
            .await?;
            finish_batch(&input, &table, &report, metrics.then_some(&usage))?;
        }
        Commands::BatchConfirm {
            input,
            column,
            exe_column,
            concurrency,
            metrics,
        } => {
            let mut table = Table::load(&input)?;
            let usage = UsageMetrics::new()?;
            let options = batch_options(&config, concurrency);
            let report = confirm_table(
                pipeline.composer,
                &mut table,
                &column,
                &exe_column,
                &options,
                &usage,
            )
            .await?;
            finish_batch(&input, &table, &report, metrics.then_some(&usage))?;
        }
        Commands::Lexicon => {}
    }

    Ok(())
}

fn load_lexicon(cli: &Cli, config: &HriConfig) -> Result<Lexicon> {
    let path = cli
        .lexicon
        .clone()
        .or_else(|| config.lexicon.as_ref().map(PathBuf::from));
    match path {
        Some(path) => Lexicon::with_extension_file(&path)
            .with_context(|| format!("loading lexicon extension {}", path.display())),
        None => Ok(Lexicon::default()),
    }
}

fn batch_options(config: &HriConfig, concurrency: Option<usize>) -> BatchOptions {
    BatchOptions {
        concurrency: concurrency.unwrap_or(config.batch.concurrency),
    }
}

async fn run_sessions(
    pipeline: Pipeline,
    policy: GatePolicy,
    once: bool,
    json: bool,
) -> Result<()> {
    let gate = ConfirmationGate::new(
        pipeline.interpreter,
        pipeline.composer,
        LoggingActuator::new(),
        policy,
    )?;
    let mut channel = ConsoleChannel::stdio();

    println!("Say a movement command, e.g. 'move up 5 cm' (Ctrl-D to quit).");
    loop {
        let report = match gate.run(&mut channel).await {
            Ok(report) => report,
            Err(GateError::ChannelClosed) => {
                info!("Input closed, ending session");
                break;
            }
            Err(e) => return Err(e).context("interaction failed"),
        };

        match report.outcome {
            SessionOutcome::Executed(d) => info!(
                "Interaction {} executed {} after {} attempt(s)",
                report.interaction_id, d, report.attempts
            ),
            SessionOutcome::Aborted => warn!(
                "Interaction {} aborted after {} attempt(s)",
                report.interaction_id, report.attempts
            ),
        }
        if json {
            println!("{}", serde_json::to_string(&report)?);
        }
        if once {
            break;
        }
    }
    Ok(())
}

fn finish_batch(
    input: &std::path::Path,
    table: &Table,
    report: &BatchReport,
    metrics: Option<&UsageMetrics>,
) -> Result<()> {
    let out = completion_path(input);
    table.save(&out)?;
    println!("Completion saved to: {}", out.display());
    println!("{}", report.summary());
    if let Some(metrics) = metrics {
        print!("{}", metrics.encode_text());
    }
    Ok(())
}

fn setup_tracing() {
    // Best-effort; avoid panics if already set
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_parses_batch_defaults() {
        let cli = Cli::try_parse_from(["hri", "batch-confirm", "--input", "t.json"]).unwrap();
        assert_eq!(cli.backend, BackendKind::Rules);
        assert_eq!(cli.config, "hri.json");
        match cli.command {
            Commands::BatchConfirm {
                column, exe_column, ..
            } => {
                assert_eq!(column, "Prompt Contents");
                assert_eq!(exe_column, "Prompt Execution");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn global_flags_follow_the_subcommand() {
        let cli = Cli::try_parse_from([
            "hri",
            "interpret",
            "--text",
            "move up 5 cm",
            "--backend",
            "http",
        ])
        .unwrap();
        assert_eq!(cli.backend, BackendKind::Http);
    }

    #[test]
    fn only_long_running_commands_create_the_config() {
        let parse = |args: &[&str]| Cli::try_parse_from(args).unwrap().command;
        assert!(parse(&["hri", "lexicon"]).is_read_only());
        assert!(parse(&["hri", "interpret", "--text", "up 1 mm"]).is_read_only());
        assert!(!parse(&["hri", "session", "--once"]).is_read_only());
        assert!(!parse(&["hri", "batch-interpret", "--input", "t.json"]).is_read_only());
    }

    #[tokio::test]
    async fn rules_pipeline_runs_offline() {
        let pipeline =
            Pipeline::build(BackendKind::Rules, &HriConfig::default(), &Lexicon::default())
                .unwrap();
        let out = pipeline
            .interpreter
            .interpret(&Utterance::new("Shift left for 54cm"))
            .await
            .unwrap();
        assert_eq!(out.displacement, Displacement::new(-540.0, 0.0, 0.0));
    }
}

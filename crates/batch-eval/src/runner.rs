//! Fan-out of many utterances through an interpreter or composer

use crate::{BatchError, Result, Table, UsageMetrics};
use confirm_composer::Composer;
use intent_parser::{Displacement, Interpreter, Utterance};
use llm_backend::TokenUsage;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

/// Column the results are written to
pub const COMPLETION_COLUMN: &str = "Completion";
/// Per-axis tolerance when scoring against expected answers, in millimeters
pub const ACCURACY_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct BatchOptions {
    /// Items in flight at once
    pub concurrency: usize,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

/// Outcome of one row
#[derive(Debug, Clone, PartialEq)]
pub struct ItemResult {
    pub completion: String,
    pub displacement: Option<Displacement>,
    pub usage: TokenUsage,
    pub ok: bool,
}

impl ItemResult {
    fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            completion: format!("ERROR: {}", reason),
            displacement: None,
            usage: TokenUsage::default(),
            ok: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct AverageUsage {
    pub prompt_tokens: f64,
    pub completion_tokens: f64,
    pub total_tokens: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Accuracy {
    pub matched: usize,
    pub scored: usize,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub items: usize,
    pub failures: usize,
    pub usage: TokenUsage,
    pub average_usage: AverageUsage,
    pub elapsed_secs: f64,
    pub secs_per_item: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<Accuracy>,
}

impl BatchReport {
    pub fn from_items(items: &[ItemResult], elapsed: Duration) -> Self {
        let usage: TokenUsage = items.iter().map(|i| i.usage).sum();
        let n = items.len();
        let per = |v: u64| if n == 0 { 0.0 } else { v as f64 / n as f64 };
        let elapsed_secs = elapsed.as_secs_f64();
        Self {
            items: n,
            failures: items.iter().filter(|i| !i.ok).count(),
            usage,
            average_usage: AverageUsage {
                prompt_tokens: per(usage.prompt_tokens),
                completion_tokens: per(usage.completion_tokens),
                total_tokens: per(usage.total_tokens),
            },
            elapsed_secs,
            secs_per_item: if n == 0 { 0.0 } else { elapsed_secs / n as f64 },
            accuracy: None,
        }
    }

    /// One-line human summary
    pub fn summary(&self) -> String {
        let mut line = format!(
            "{} items ({} failed) in {:.2}s, {:.2}s per item; average tokens per item: prompt {:.1}, completion {:.1}, total {:.1}",
            self.items,
            self.failures,
            self.elapsed_secs,
            self.secs_per_item,
            self.average_usage.prompt_tokens,
            self.average_usage.completion_tokens,
            self.average_usage.total_tokens
        );
        if let Some(acc) = &self.accuracy {
            line.push_str(&format!(
                "; accuracy {}/{} ({:.1}%)",
                acc.matched,
                acc.scored,
                acc.fraction * 100.0
            ));
        }
        line
    }
}

/// Score interpreted displacements against expected replies in the grammar
///
/// Rows whose expected cell is not in the grammar are not scored; rows that
/// failed to interpret count as misses.
pub fn accuracy(items: &[ItemResult], expected: &[String]) -> Accuracy {
    let mut matched = 0;
    let mut scored = 0;
    for (item, cell) in items.iter().zip(expected) {
        let Ok(want) = Displacement::parse_reply(cell) else {
            continue;
        };
        scored += 1;
        if item
            .displacement
            .is_some_and(|got| got.approx_eq(&want, ACCURACY_TOLERANCE))
        {
            matched += 1;
        }
    }
    Accuracy {
        matched,
        scored,
        fraction: if scored == 0 {
            0.0
        } else {
            matched as f64 / scored as f64
        },
    }
}

/// Run `work` over `inputs` with at most `concurrency` in flight; results
/// come back in input order
async fn fan_out<T, F, Fut>(
    inputs: Vec<T>,
    options: &BatchOptions,
    metrics: &UsageMetrics,
    work: F,
) -> Result<Vec<ItemResult>>
where
    T: Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = ItemResult> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut tasks = JoinSet::new();
    let total = inputs.len();

    for (index, input) in inputs.into_iter().enumerate() {
        let permit = semaphore
            .clone()
            .acquire_owned()
            .await
            .map_err(|e| BatchError::Task(e.to_string()))?;
        let job = work(input);
        tasks.spawn(async move {
            let result = job.await;
            drop(permit);
            (index, result)
        });
    }

    let mut slots: Vec<Option<ItemResult>> = vec![None; total];
    while let Some(joined) = tasks.join_next().await {
        let (index, result) = joined.map_err(|e| BatchError::Task(e.to_string()))?;
        metrics.record_usage(&result.usage);
        metrics.record_item(result.ok);
        tracing::debug!("item {}/{} done (ok: {})", index + 1, total, result.ok);
        slots[index] = Some(result);
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(i, slot)| slot.ok_or_else(|| BatchError::Task(format!("item {} never finished", i))))
        .collect()
}

/// Interpret every prompt
pub async fn run_interpretations<I>(
    interpreter: Arc<I>,
    prompts: Vec<String>,
    options: &BatchOptions,
    metrics: &UsageMetrics,
) -> Result<Vec<ItemResult>>
where
    I: Interpreter + ?Sized + 'static,
{
    fan_out(prompts, options, metrics, |prompt| {
        let interpreter = interpreter.clone();
        async move {
            match interpreter.interpret(&Utterance::new(prompt.as_str())).await {
                Ok(out) => ItemResult {
                    completion: out
                        .reply
                        .map(|r| r.trim().to_string())
                        .unwrap_or_else(|| out.displacement.to_string()),
                    displacement: Some(out.displacement),
                    usage: out.usage,
                    ok: true,
                },
                Err(e) => {
                    tracing::warn!("Could not interpret {:?}: {}", prompt, e);
                    ItemResult::failed(e)
                }
            }
        }
    })
    .await
}

/// Compose a confirmation for every prompt and its displacement
///
/// `executions` holds displacements in the reply grammar, one per prompt.
pub async fn run_confirmations<C>(
    composer: Arc<C>,
    prompts: Vec<String>,
    executions: Vec<String>,
    options: &BatchOptions,
    metrics: &UsageMetrics,
) -> Result<Vec<ItemResult>>
where
    C: Composer + ?Sized + 'static,
{
    if prompts.len() != executions.len() {
        return Err(BatchError::ShapeMismatch {
            left: prompts.len(),
            right: executions.len(),
        });
    }

    let pairs: Vec<(String, String)> = prompts.into_iter().zip(executions).collect();
    fan_out(pairs, options, metrics, |(prompt, exe)| {
        let composer = composer.clone();
        async move {
            let displacement = match Displacement::parse_reply(&exe) {
                Ok(d) => d,
                Err(e) => {
                    tracing::warn!("Row for {:?} has no usable execution: {}", prompt, e);
                    return ItemResult::failed(e);
                }
            };
            match composer
                .compose(&Utterance::new(prompt.as_str()), &displacement)
                .await
            {
                Ok(confirmation) => ItemResult {
                    completion: confirmation.text.into_string(),
                    displacement: Some(displacement),
                    usage: confirmation.usage,
                    ok: true,
                },
                Err(e) => {
                    tracing::warn!("Could not compose for {:?}: {}", prompt, e);
                    ItemResult::failed(e)
                }
            }
        }
    })
    .await
}

/// Interpret the prompt column of a table and append the results
pub async fn interpret_table<I>(
    interpreter: Arc<I>,
    table: &mut Table,
    prompt_column: &str,
    expected_column: Option<&str>,
    options: &BatchOptions,
    metrics: &UsageMetrics,
) -> Result<BatchReport>
where
    I: Interpreter + ?Sized + 'static,
{
    let prompts = table.column(prompt_column)?;
    let expected = expected_column.map(|c| table.column(c)).transpose()?;

    let started = Instant::now();
    let items = run_interpretations(interpreter, prompts, options, metrics).await?;
    let mut report = BatchReport::from_items(&items, started.elapsed());
    report.accuracy = expected.map(|cells| accuracy(&items, &cells));

    table.set_column(
        COMPLETION_COLUMN,
        items.into_iter().map(|i| i.completion).collect(),
    )?;
    Ok(report)
}

/// Compose confirmations for a table's prompt and execution columns and
/// append the results
pub async fn confirm_table<C>(
    composer: Arc<C>,
    table: &mut Table,
    prompt_column: &str,
    exe_column: &str,
    options: &BatchOptions,
    metrics: &UsageMetrics,
) -> Result<BatchReport>
where
    C: Composer + ?Sized + 'static,
{
    let prompts = table.column(prompt_column)?;
    let executions = table.column(exe_column)?;

    let started = Instant::now();
    let items = run_confirmations(composer, prompts, executions, options, metrics).await?;
    let report = BatchReport::from_items(&items, started.elapsed());

    table.set_column(
        COMPLETION_COLUMN,
        items.into_iter().map(|i| i.completion).collect(),
    )?;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use confirm_composer::TemplateComposer;
    use intent_parser::{InterpreterConfig, Lexicon, LlmInterpreter, RuleInterpreter};
    use llm_backend::{ScriptedBackend, TokenUsage};

    fn prompts_table() -> Table {
        Table::new(
            vec![
                "Prompt Contents".to_string(),
                "Expected".to_string(),
                "Prompt Execution".to_string(),
            ],
            vec![
                vec![
                    "Move up 36mm".to_string(),
                    "delta_x, delta_y, delta_z = 0.0, 0.0, 36.0".to_string(),
                    "delta_x, delta_y, delta_z = 0.0, 0.0, 36.0".to_string(),
                ],
                vec![
                    "Shift left for 54cm".to_string(),
                    "delta_x, delta_y, delta_z = -540.0, 0.0, 0.0".to_string(),
                    "delta_x, delta_y, delta_z = -540.0, 0.0, 0.0".to_string(),
                ],
                vec![
                    "move closer for 1 ft".to_string(),
                    "delta_x, delta_y, delta_z = 0.0, 304.8, 0.0".to_string(),
                    "garbage".to_string(),
                ],
            ],
        )
        .unwrap()
    }

    fn rules() -> Arc<RuleInterpreter> {
        Arc::new(RuleInterpreter::new(&Lexicon::default()).unwrap())
    }

    #[tokio::test]
    async fn interpret_table_appends_one_column_in_row_order() {
        let mut table = prompts_table();
        let before = table.clone();
        let metrics = UsageMetrics::new().unwrap();

        let report = interpret_table(
            rules(),
            &mut table,
            "Prompt Contents",
            Some("Expected"),
            &BatchOptions { concurrency: 2 },
            &metrics,
        )
        .await
        .unwrap();

        assert_eq!(table.len(), 3);
        assert_eq!(table.columns.len(), before.columns.len() + 1);
        for (row, old) in table.rows.iter().zip(&before.rows) {
            assert_eq!(&row[..3], &old[..]);
        }
        assert_eq!(
            table.column(COMPLETION_COLUMN).unwrap()[1],
            "delta_x, delta_y, delta_z = -540.0, 0.0, 0.0"
        );

        // The third expected answer has the wrong sign on purpose
        let acc = report.accuracy.unwrap();
        assert_eq!((acc.matched, acc.scored), (2, 3));
        assert_eq!(report.failures, 0);
        assert!(report.usage.is_empty());
    }

    #[tokio::test]
    async fn usage_totals_and_averages() {
        let backend = ScriptedBackend::with_responder(|req| {
            Ok(match req.last_user_message() {
                Some("Move up 36mm") => "delta_x, delta_y, delta_z = 0.0, 0.0, 36.0".to_string(),
                _ => "no idea".to_string(),
            })
        })
        .with_usage(TokenUsage::new(600, 20));
        let interpreter = Arc::new(LlmInterpreter::new(
            backend,
            InterpreterConfig::default(),
            &Lexicon::default(),
        ));
        let metrics = UsageMetrics::new().unwrap();

        let items = run_interpretations(
            interpreter,
            vec!["Move up 36mm".to_string(), "dance".to_string()],
            &BatchOptions::default(),
            &metrics,
        )
        .await
        .unwrap();

        assert!(items[0].ok);
        assert!(!items[1].ok);
        assert!(items[1].completion.starts_with("ERROR: "));

        let report = BatchReport::from_items(&items, Duration::from_secs(4));
        assert_eq!(report.usage.total_tokens, 620);
        assert_eq!(report.average_usage.total_tokens, 310.0);
        assert_eq!(report.secs_per_item, 2.0);
        assert_eq!(metrics.usage.item_failures.get(), 1);
        assert_eq!(metrics.usage.items_processed.get(), 2);
    }

    #[tokio::test]
    async fn confirm_table_marks_unusable_rows() {
        let mut table = prompts_table();
        let metrics = UsageMetrics::new().unwrap();

        let report = confirm_table(
            Arc::new(TemplateComposer::new()),
            &mut table,
            "Prompt Contents",
            "Prompt Execution",
            &BatchOptions { concurrency: 1 },
            &metrics,
        )
        .await
        .unwrap();

        let out = table.column(COMPLETION_COLUMN).unwrap();
        assert!(out[0].starts_with("I heard you said move up 36mm."));
        assert!(out[1].contains("negative x-axis for 540 mm"));
        assert!(out[2].starts_with("ERROR: "));
        assert_eq!(report.failures, 1);
    }

    #[tokio::test]
    async fn unequal_columns_fail_before_any_call() {
        let composer = Arc::new(confirm_composer::LlmComposer::new(
            ScriptedBackend::with_replies(Vec::<String>::new()),
            Default::default(),
        ));
        let metrics = UsageMetrics::new().unwrap();

        let err = run_confirmations(
            composer.clone(),
            vec!["a".to_string(), "b".to_string()],
            vec!["delta_x, delta_y, delta_z = 0, 0, 0".to_string()],
            &BatchOptions::default(),
            &metrics,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, BatchError::ShapeMismatch { left: 2, right: 1 }));
        assert_eq!(composer.backend().call_count(), 0);
    }

    #[test]
    fn empty_batch_reports_zeroes() {
        let report = BatchReport::from_items(&[], Duration::from_secs(1));
        assert_eq!(report.items, 0);
        assert_eq!(report.secs_per_item, 0.0);
        assert_eq!(accuracy(&[], &[]).fraction, 0.0);
    }
}

//! Benchmark CLI for comparing LLM configurations on QA datasets.
//!
//! Runs registered tasks (or ad-hoc JSONL files) against the configured
//! model set, saves JSONL artifacts, and renders console/markdown reports.

use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use qabench_core::{
    BenchmarkConfig, ChatClient, ClientConfig, ModelSpec, RecursiveClientFactory,
};
use qabench_runner::{artifact, render, BenchmarkRunner, JsonlDataset, RunProgress, RunSummary};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Benchmark CLI for comparing LLM configurations on QA datasets.
#[derive(Parser, Debug)]
#[command(name = "qabench")]
#[command(about = "Run multi-model QA benchmarks and generate comparison reports")]
#[command(version)]
struct Args {
    /// Comma-separated tasks: registered names (e.g. "hotpotqa") or paths
    /// to JSONL dataset files
    #[arg(long, short = 't', default_value = "hotpotqa")]
    task: String,

    /// Number of examples per task (overrides the config file)
    #[arg(long, short = 's')]
    sample: Option<usize>,

    /// Shuffle examples deterministically before sampling
    #[arg(long)]
    shuffle: bool,

    /// Path to a JSON benchmark configuration (models, output dir)
    #[arg(long, short = 'c')]
    config: Option<PathBuf>,

    /// Output directory for result artifacts (overrides the config file)
    #[arg(long)]
    output_dir: Option<PathBuf>,

    /// Also write a markdown report next to the results
    #[arg(long)]
    report: bool,

    /// Regenerate the report from an existing results file and exit
    #[arg(long)]
    view: Option<PathBuf>,

    /// API request timeout in seconds
    #[arg(long, default_value = "120")]
    timeout: u64,

    /// Maximum tokens per completion
    #[arg(long, default_value = "1024")]
    max_tokens: u32,

    /// Context chunk size (characters) for recursive models
    #[arg(long, default_value = "6000")]
    chunk_chars: usize,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn validate(&self) -> Result<(), String> {
        if self.task.split(',').all(|t| t.trim().is_empty()) {
            return Err("no tasks specified".to_string());
        }
        if self.chunk_chars == 0 {
            return Err("chunk-chars must be greater than 0".to_string());
        }
        Ok(())
    }

    fn tasks(&self) -> Vec<String> {
        self.task
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect()
    }

    fn client_config(&self) -> ClientConfig {
        ClientConfig::new()
            .with_timeout(Duration::from_secs(self.timeout))
            .with_max_tokens(self.max_tokens)
            .with_chunk_chars(self.chunk_chars)
    }

    /// Build the benchmark config from file/defaults plus CLI overrides.
    fn benchmark_config(&self) -> Result<BenchmarkConfig, String> {
        let mut config = match &self.config {
            Some(path) => BenchmarkConfig::from_file(path)
                .map_err(|e| format!("failed to load config {}: {}", path.display(), e))?,
            None => BenchmarkConfig::default(),
        };
        if let Some(sample) = self.sample {
            config.max_samples = if sample == 0 { None } else { Some(sample) };
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if self.shuffle {
            config.shuffle = true;
        }
        config.validate().map_err(|e| e.to_string())?;
        Ok(config)
    }
}

/// Print which models run through which pool.
fn print_banner(config: &BenchmarkConfig) {
    let shared: Vec<_> = config.models.iter().filter(|m| !m.isolated).collect();
    let isolated: Vec<_> = config.models.iter().filter(|m| m.isolated).collect();

    eprintln!("{}", "=".repeat(70));
    eprintln!("BENCHMARK CONFIGURATION");
    eprintln!("{}", "=".repeat(70));
    eprintln!("Shared models (worker pool):        {}", shared.len());
    for model in &shared {
        eprintln!("  - {}", model.name);
    }
    eprintln!("Isolated models (dedicated workers): {}", isolated.len());
    for model in &isolated {
        eprintln!("  - {}", model.name);
    }
    eprintln!("{}", "=".repeat(70));
}

fn progress_bar() -> ProgressBar {
    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Regenerate the console summary and markdown report from a saved
/// results file.
fn view_results(path: &PathBuf, config: &BenchmarkConfig) -> Result<(), String> {
    let reports = artifact::read_results(path).map_err(|e| e.to_string())?;
    if reports.is_empty() {
        return Err(format!("no results found in {}", path.display()));
    }

    // Use configured model order so the baseline stays positional; fall
    // back to the report's own (alphabetical) keys for unknown sets.
    let mut models: Vec<ModelSpec> = config
        .models
        .iter()
        .filter(|m| reports[0].models.contains_key(&m.name))
        .cloned()
        .collect();
    if models.is_empty() {
        log::warn!("no configured model matches this file; using alphabetical order");
        models = reports[0]
            .models
            .keys()
            .map(|name| {
                ModelSpec::new(name, name, qabench_core::BackendKind::OpenRouter, false)
            })
            .collect();
    }

    let summary = RunSummary::from_reports(&reports, &models);
    render::print_console_summary(&summary);

    let run_id = artifact::extract_run_id(path)
        .unwrap_or_else(|| artifact::run_id(chrono::Local::now()));
    let dir = path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let report_path = render::write_markdown_report(&dir, &reports, &summary, &run_id)
        .map_err(|e| e.to_string())?;
    println!("\nMarkdown report generated: {}", report_path.display());
    Ok(())
}

async fn run_benchmark(args: &Args, config: BenchmarkConfig) -> Result<(), String> {
    let client_config = args.client_config();
    let shared_client = ChatClient::from_env(client_config.clone())
        .map_err(|e| format!("failed to create shared client: {}", e))?;
    let isolated_factory = RecursiveClientFactory::from_env(client_config)
        .map_err(|e| format!("failed to create isolated client factory: {}", e))?;

    let cancel = CancellationToken::new();
    {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                eprintln!("\nCancelling run; unfinished tasks will be marked as errors...");
                cancel.cancel();
            }
        });
    }

    let mut runner = BenchmarkRunner::new(
        config.clone(),
        Arc::new(shared_client),
        Arc::new(isolated_factory),
    )
    .with_cancellation(cancel);

    // Paths become ad-hoc JSONL tasks registered under their file stem
    let mut task_names = Vec::new();
    for task in args.tasks() {
        let path = PathBuf::from(&task);
        if path.is_file() {
            let name = JsonlDataset::new(path.clone()).name().to_string();
            runner.registry_mut().register(name.clone(), move || {
                Ok(Box::new(JsonlDataset::new(path.clone())))
            });
            task_names.push(name);
        } else {
            task_names.push(task);
        }
    }

    print_banner(&config);

    for task_name in &task_names {
        eprintln!("\nTask: {}", task_name);
        let bar = progress_bar();
        let bar_handle = bar.clone();

        let run = runner
            .run_task_with_progress(task_name, move |progress| match progress {
                RunProgress::Started { total, .. } => {
                    bar_handle.set_length(total as u64);
                    bar_handle.set_message("evaluating...");
                }
                RunProgress::TaskCompleted {
                    completed, errored, ..
                } => {
                    bar_handle.set_position(completed as u64);
                    if errored {
                        bar_handle.set_message("(some failures)");
                    }
                }
                _ => {}
            })
            .await
            .map_err(|e| e.to_string())?;
        bar.finish_with_message("done");

        render::print_console_summary(&run.summary);
        println!("Details: {}", run.output_file.display());

        if args.report {
            let report_path = render::write_markdown_report(
                &config.output_dir,
                &run.reports,
                &run.summary,
                runner.run_id(),
            )
            .map_err(|e| e.to_string())?;
            println!("Report:  {}", report_path.display());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let default_level = if args.verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        return ExitCode::FAILURE;
    }

    let config = match args.benchmark_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match &args.view {
        Some(path) => view_results(path, &config),
        None => run_benchmark(&args, config).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_args() -> Args {
        Args {
            task: "hotpotqa".to_string(),
            sample: Some(5),
            shuffle: false,
            config: None,
            output_dir: None,
            report: false,
            view: None,
            timeout: 120,
            max_tokens: 1024,
            chunk_chars: 6000,
            verbose: false,
        }
    }

    #[test]
    fn test_validate_valid_args() {
        assert!(test_args().validate().is_ok());
    }

    #[test]
    fn test_validate_empty_tasks() {
        let mut args = test_args();
        args.task = " , ".to_string();
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_validate_zero_chunk_chars() {
        let mut args = test_args();
        args.chunk_chars = 0;
        assert!(args.validate().is_err());
    }

    #[test]
    fn test_tasks_parsing() {
        let mut args = test_args();
        args.task = "hotpotqa, custom.jsonl".to_string();
        assert_eq!(args.tasks(), vec!["hotpotqa", "custom.jsonl"]);
    }

    #[test]
    fn test_sample_override() {
        let mut args = test_args();
        args.sample = Some(25);
        let config = args.benchmark_config().unwrap();
        assert_eq!(config.max_samples, Some(25));

        // Zero means the whole dataset
        args.sample = Some(0);
        let config = args.benchmark_config().unwrap();
        assert_eq!(config.max_samples, None);
    }

    #[test]
    fn test_client_config_from_args() {
        let config = test_args().client_config();
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_tokens, 1024);
        assert_eq!(config.chunk_chars, 6000);
    }
}

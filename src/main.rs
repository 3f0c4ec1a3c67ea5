//! HashCalc CLI - concurrent, cache-aware file digests

use hashcalc::config::{
    build_tasks, parse_groups, parse_size, CalculatorConfig, CliArgs, Commands, HashAlgorithm,
    HashTask, OutputFormat,
};
use hashcalc::core::ThreadedCalculator;
use hashcalc::error::{HashCalcError, Result};
use hashcalc::fs::{short_display_names, LocalFile};
use hashcalc::hash::{benchmark_algorithms, MultipleHashResult};
use hashcalc::progress::{
    format_size, FutureWithProgress, ProgressReporter, RunSummary, TaskStatus,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;

/// Interval between progress redraws
const REFRESH_INTERVAL: Duration = Duration::from_millis(100);

fn main() {
    let args = CliArgs::parse_grouped();

    // Initialize logging
    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(args) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Returns whether every task succeeded
fn run(args: CliArgs) -> Result<bool> {
    if let Some(command) = &args.command {
        handle_command(command)?;
        return Ok(true);
    }

    let groups = parse_groups(&args)?;
    let config = CalculatorConfig::from_cli(&args)?;
    let tasks = build_tasks(&args, groups)?;
    if tasks.is_empty() {
        return Err(HashCalcError::config(
            "no input files (see hashcalc --help)",
        ));
    }

    if args.verbose > 0 {
        print_config(&config, tasks.len());
    }

    hash_files(&args, config, tasks)
}

fn handle_command(command: &Commands) -> Result<()> {
    match command {
        Commands::Algorithms => {
            cmd_algorithms();
            Ok(())
        }
        Commands::Benchmark { size } => cmd_benchmark(size),
    }
}

#[derive(Serialize)]
struct FileReport {
    path: PathBuf,
    status: String,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    digests: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

fn hash_files(
    args: &CliArgs,
    config: CalculatorConfig,
    tasks: Vec<HashTask>,
) -> Result<bool> {
    let calculator = ThreadedCalculator::new(config)?;
    let paths: Vec<PathBuf> = tasks.iter().map(|task| task.path.clone()).collect();
    let names = short_display_names(&paths);
    let display = |path: &PathBuf| -> String {
        if args.full_path {
            path.display().to_string()
        } else {
            names
                .get(path)
                .cloned()
                .unwrap_or_else(|| path.display().to_string())
        }
    };

    let start = Instant::now();
    let mut futures: Vec<FutureWithProgress<MultipleHashResult>> = Vec::with_capacity(tasks.len());
    for task in &tasks {
        let future = calculator
            .threaded_multiple_get(LocalFile::new(&task.path), &task.algorithms)
            .unwrap_or_else(FutureWithProgress::failed);
        futures.push(future);
    }

    let show_progress = !args.no_progress && std::io::stderr().is_terminal();
    if show_progress {
        let mut reporter = ProgressReporter::new(args.show_all);
        for path in &paths {
            reporter.add_task(display(path));
        }
        loop {
            for (index, future) in futures.iter().enumerate() {
                reporter.refresh(index, future);
            }
            if reporter.all_finished() {
                break;
            }
            std::thread::sleep(REFRESH_INTERVAL);
        }
        reporter.finish();
    }

    let mut summary = RunSummary::default();
    let mut reports = Vec::with_capacity(futures.len());
    for (path, future) in paths.iter().zip(futures) {
        let bytes = future.progress().total();
        let outcome = future.wait();
        let status = match &outcome {
            Ok(_) => TaskStatus::Completed,
            Err(e) if e.is_cancelled() => TaskStatus::Canceled,
            Err(_) => TaskStatus::Failed,
        };
        summary.record(status, bytes);

        let mut report = FileReport {
            path: path.clone(),
            status: status.to_string(),
            digests: BTreeMap::new(),
            error: None,
        };
        match outcome {
            Ok(results) => {
                for (algorithm, result) in results {
                    report.digests.insert(algorithm.to_string(), result.hash);
                }
            }
            Err(e) => report.error = Some(e.to_string()),
        }
        reports.push(report);
    }
    summary.elapsed = start.elapsed();
    calculator.shutdown(true);

    match args.output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&reports)?);
        }
        OutputFormat::Text => {
            for report in &reports {
                let name = display(&report.path);
                match &report.error {
                    Some(error) => eprintln!("{}: {}", name, error),
                    None => {
                        for (algorithm, hash) in &report.digests {
                            println!("{:<9} {}  {}", algorithm, hash, name);
                        }
                    }
                }
            }
        }
    }

    if show_progress || args.verbose > 0 {
        summary.print();
    }

    Ok(!summary.has_failures())
}

fn cmd_algorithms() {
    println!("{:<10} {:<10} {:>5}  {}", "NAME", "DISPLAY", "BITS", "KIND");
    for algorithm in HashAlgorithm::ALL {
        println!(
            "{:<10} {:<10} {:>5}  {}",
            algorithm.as_str(),
            algorithm.name(),
            algorithm.output_size() * 8,
            if algorithm.is_cryptographic() {
                "cryptographic"
            } else {
                "non-cryptographic"
            }
        );
    }
}

fn cmd_benchmark(size: &str) -> Result<()> {
    let size_bytes = parse_size(size)
        .map_err(|e| HashCalcError::config(format!("Invalid benchmark size: {}", e)))?;

    println!("=== HashCalc Benchmark ===");
    println!("Test data size: {}\n", format_size(size_bytes));

    let results = benchmark_algorithms(&HashAlgorithm::ALL, size_bytes as usize);
    println!("{:<10} {:>12} {:>14}", "ALGORITHM", "TIME", "THROUGHPUT");
    for (algorithm, duration, throughput) in results {
        println!(
            "{:<10} {:>12.2?} {:>10.1} MiB/s",
            algorithm.as_str(),
            duration,
            throughput
        );
    }
    Ok(())
}

fn print_config(config: &CalculatorConfig, task_count: usize) {
    eprintln!("=== Configuration ===");
    eprintln!("Files:          {}", task_count);
    eprintln!("Threads:        {}", config.effective_threads());
    eprintln!("Recalc mode:    {:?}", config.recalc_mode);
    eprintln!("Chunk size:     {}", format_size(config.chunk_size as u64));
    eprintln!("I/O threshold:  {}", format_size(config.io_threshold));
    eprintln!(
        "Cache:          {}",
        match (config.cache_enabled, config.cache_size) {
            (false, _) => "disabled".to_string(),
            (true, Some(n)) => format!("LRU ({} entries)", n),
            (true, None) => "memory".to_string(),
        }
    );
    eprintln!();
}

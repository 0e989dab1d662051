//! pima-explorer CLI Module
//!
//! Command-line interface for normalizing the raw files, inspecting the
//! CSV files and running the clustering analysis.

use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::clustering::{Algorithm, FitQuality};
use crate::data::FileInfo;
use crate::pipeline::{Pipeline, PipelineConfig, Report, RunRecord};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "pima")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Crisp and fuzzy clustering of the Pima Indians Diabetes dataset")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Options shared by every command that reads the dataset
#[derive(Args, Debug, Clone, Default)]
pub struct DataArgs {
    /// JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Directory holding pima.tr / pima.te and the generated CSV files
    #[arg(short, long)]
    pub data_dir: Option<PathBuf>,

    /// Random seed for clustering and PCA
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the full analysis
    Run {
        #[command(flatten)]
        data: DataArgs,

        /// Smallest cluster count
        #[arg(long)]
        min_clusters: Option<usize>,

        /// Largest cluster count
        #[arg(long)]
        max_clusters: Option<usize>,

        /// Smallest fuzziness exponent
        #[arg(long)]
        min_m: Option<usize>,

        /// Largest fuzziness exponent
        #[arg(long)]
        max_m: Option<usize>,

        /// Directory for SVG charts
        #[arg(short, long)]
        plot_dir: Option<PathBuf>,

        /// Do not write charts
        #[arg(long)]
        no_plot: bool,

        /// Read existing CSV files instead of normalizing the raw ones
        #[arg(long)]
        skip_preprocess: bool,

        /// Write a JSON report
        #[arg(short, long)]
        report: Option<PathBuf>,
    },

    /// Normalize the raw whitespace-delimited files to CSV
    Preprocess {
        #[command(flatten)]
        data: DataArgs,
    },

    /// Run a single clustering algorithm on the CSV files
    Cluster {
        #[command(flatten)]
        data: DataArgs,

        /// Algorithm
        #[arg(short, long, value_enum, default_value = "fuzzy")]
        algorithm: AlgorithmArg,

        /// Number of clusters
        #[arg(short = 'k', long, default_value = "2")]
        clusters: usize,

        /// Fuzziness exponent (fuzzy only)
        #[arg(short, long, default_value = "2.0")]
        m: f64,
    },

    /// Show information about a CSV file
    Info {
        /// Input data file
        #[arg(short, long)]
        data: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum AlgorithmArg {
    Fuzzy,
    Crisp,
}

// ─── Configuration ─────────────────────────────────────────────────────────────

/// Build the pipeline configuration: file, then flags.
pub fn load_config(args: &DataArgs) -> anyhow::Result<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::from_json_file(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(dir) = &args.data_dir {
        config = config.with_data_dir(dir);
    }
    if let Some(seed) = args.seed {
        config = config.with_random_state(seed);
    }
    Ok(config)
}

// ─── Output ────────────────────────────────────────────────────────────────────

fn quality_text(quality: &FitQuality) -> String {
    match quality {
        FitQuality::Inertia { value, n_iter } => format!("inertia {:.1} · {} iter", value, n_iter),
        FitQuality::PartitionCoefficient { training, test, n_iter } => {
            format!("fpc {:.3}/{:.3} · {} iter", training, test, n_iter)
        }
    }
}

fn print_run(record: &RunRecord) {
    let (train_acc, test_acc) = record.evaluation.aligned_accuracy();
    println!(
        "  {:>2}  {:<26} {:>12} {:>8.1}% {:>8.1}%  {}",
        record.clusters,
        record.algorithm.to_string(),
        record.evaluation.agreement.to_string(),
        train_acc * 100.0,
        test_acc * 100.0,
        dim(&quality_text(&record.quality)),
    );
}

fn print_run_header() {
    println!(
        "  {:>2}  {:<26} {:>12} {:>9} {:>9}",
        muted("k"),
        muted("Algorithm"),
        muted("Agreement"),
        muted("Train"),
        muted("Test"),
    );
    println!("  {}", dim(&"─".repeat(72)));
}

fn print_summary(report: &Report) {
    println!("  {}", dim(&"─".repeat(72)));
    if let Some(best) = report.best_run() {
        let (train_acc, test_acc) = best.evaluation.aligned_accuracy();
        println!();
        println!(
            "  {} {} {} {:.1}% / {:.1}%",
            ok("best"),
            best.title.white().bold(),
            muted("aligned:"),
            train_acc * 100.0,
            test_acc * 100.0,
        );
    }
    let charts = report.ground_truth_plots.len()
        + report.runs.iter().map(|r| r.plots.len()).sum::<usize>();
    if charts > 0 {
        println!("  {:<8} {}", muted("charts"), charts);
    }
    println!();
}

// ─── Commands ──────────────────────────────────────────────────────────────────

#[allow(clippy::too_many_arguments)]
pub fn cmd_run(
    data: &DataArgs,
    min_clusters: Option<usize>,
    max_clusters: Option<usize>,
    min_m: Option<usize>,
    max_m: Option<usize>,
    plot_dir: Option<&Path>,
    no_plot: bool,
    skip_preprocess: bool,
    report: Option<&Path>,
) -> anyhow::Result<()> {
    let mut config = load_config(data)?;
    let (k_lo, k_hi) = (
        min_clusters.unwrap_or(config.clusters.start),
        max_clusters.unwrap_or(config.clusters.end),
    );
    let (m_lo, m_hi) = (
        min_m.unwrap_or(config.fuzziness.start),
        max_m.unwrap_or(config.fuzziness.end),
    );
    config = config.with_clusters(k_lo, k_hi).with_fuzziness(m_lo, m_hi);
    if let Some(dir) = plot_dir {
        config = config.with_plot_dir(dir);
    }
    if no_plot {
        config = config.with_plot(false);
    }
    if skip_preprocess {
        config = config.with_skip_preprocess(true);
    }
    if let Some(path) = report {
        config = config.with_report_path(path);
    }

    println!();
    line_box_top();
    line_box(&format!("{}", "Pima clustering".white().bold()));
    line_box(&kv("data   ", &config.data_dir.display().to_string()));
    line_box(&kv("k      ", &format!("{}..={}", config.clusters.start, config.clusters.end)));
    line_box(&kv("m      ", &format!("{}..={}", config.fuzziness.start, config.fuzziness.end)));
    line_box(&kv(
        "charts ",
        &if config.plot { config.plot_dir.display().to_string() } else { "off".to_string() },
    ));
    line_box_bottom();

    let pipeline = Pipeline::new(config)?;
    section("Runs");
    print_run_header();

    let start = Instant::now();
    let report = pipeline.run_with(print_run)?;
    print_summary(&report);
    println!("  {:<8} {:.2?}", muted("time"), start.elapsed());
    if let Some(path) = &pipeline.config().report_path {
        println!("  {:<8} {}", muted("report"), path.display());
    }
    println!();
    Ok(())
}

pub fn cmd_preprocess(data: &DataArgs) -> anyhow::Result<()> {
    section("Preprocess");
    let config = load_config(data)?;
    let pipeline = Pipeline::new(config)?;

    step_run("Normalizing raw files");
    let start = Instant::now();
    let counts = pipeline.preprocess()?;
    step_done(&format!("{:?}", start.elapsed()));

    for (pair, lines) in pipeline.config().file_pairs().iter().zip(counts) {
        println!(
            "  {} → {} {}",
            pair.raw.display(),
            pair.csv.display().to_string().white(),
            dim(&format!("({} lines)", lines)),
        );
    }
    println!();
    Ok(())
}

pub fn cmd_cluster(
    data: &DataArgs,
    algorithm: AlgorithmArg,
    clusters: usize,
    m: f64,
) -> anyhow::Result<()> {
    section("Cluster");
    let config = load_config(data)?.with_plot(false);
    let pipeline = Pipeline::new(config)?;

    let algorithm = match algorithm {
        AlgorithmArg::Fuzzy => {
            if m <= 1.0 {
                anyhow::bail!("Fuzziness must be greater than 1, got {}", m);
            }
            Algorithm::Fuzzy { m }
        }
        AlgorithmArg::Crisp => Algorithm::Crisp,
    };

    step_run("Loading data");
    let dataset = pipeline.load()?;
    step_done(&format!(
        "{} + {} rows × {} features",
        dataset.training.n_samples(),
        dataset.test.n_samples(),
        dataset.n_features()
    ));

    step_run("Projecting");
    let projection = pipeline.project(&dataset)?;
    step_done("");

    step_run(&format!("Running {}", algorithm.to_string().cyan()));
    let record = pipeline.run_algorithm(&dataset, &projection, clusters, algorithm)?;
    step_done(&format!("{:.1} ms", record.elapsed_ms));

    println!();
    print_run_header();
    print_run(&record);
    println!();
    Ok(())
}

pub fn cmd_info(data_path: &Path) -> anyhow::Result<()> {
    section("Data Info");

    let info = FileInfo::read(data_path)?;

    println!("  {:<12} {}", muted("File"), info.path.display());
    println!("  {:<12} {:.1} KB", muted("Size"), info.file_size as f64 / 1024.0);
    println!("  {:<12} {}", muted("Rows"), info.n_rows);
    println!("  {:<12} {}", muted("Columns"), info.columns.len());
    println!();

    for (i, col) in info.columns.iter().enumerate() {
        let role = if i + 1 == info.columns.len() { "diagnosis" } else { "feature" };
        println!("  {:<20} {}", col, muted(role));
    }

    println!();
    Ok(())
}

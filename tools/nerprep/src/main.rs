//! nerprep
//!
//! Turns WebAnno CoNLL exports into training files for OpenNLP and Stanford
//! NER, trims annual reports to their business section, and lays annotated
//! files out into domain-stratified cross-validation folds.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use nerprep_core::{
    BatchReport, CorpusOptions, CorpusTranscoder, OutputFormat, SectionTrimmer, TabularMode,
    TranscodeOptions, TrimConfig, TrimReport,
};
use nerprep_folds::{CrossValidation, FoldConfig, FoldLayout, FoldRunReport, scan_domains};
use serde::Serialize;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "nerprep")]
#[command(about = "Prepare WebAnno CoNLL exports for NER training")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Log level used when RUST_LOG is unset
    #[arg(long, global = true, env = "NERPREP_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Print the run report as JSON on stdout
    #[arg(long, global = true, env = "NERPREP_JSON")]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Transcode exports into a training format
    Transcode {
        /// Export file or directory of exports
        #[arg(short, long, env = "NERPREP_INPUT")]
        input: PathBuf,

        /// Directory receiving the training files
        #[arg(short, long, env = "NERPREP_OUTPUT")]
        output: PathBuf,

        /// Target format
        #[arg(
            short,
            long,
            value_enum,
            env = "NERPREP_FORMAT",
            default_value_t = FormatArg::Bracketed
        )]
        format: FormatArg,

        /// Keep only sentences containing an entity (tsv only)
        #[arg(long)]
        entities_only: bool,

        /// Trim each output to its business section
        #[arg(long)]
        trim: bool,

        /// Emit nothing for documents without a B-START
        #[arg(long)]
        require_window: bool,

        /// Descend into per-domain subdirectories
        #[arg(short, long)]
        recursive: bool,

        #[command(flatten)]
        markers: MarkerArgs,
    },
    /// Trim a document to the section between two markers
    Trim {
        /// File to trim
        input: PathBuf,

        /// Trimmed file (defaults to the input name with a -p1 suffix)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Do not delete the input after trimming
        #[arg(long)]
        keep_intermediate: bool,

        #[command(flatten)]
        markers: MarkerArgs,
    },
    /// Distribute annotated files into cross-validation folds
    Folds {
        /// Directory holding one subdirectory per domain
        #[arg(short, long, env = "NERPREP_ANNOTATED")]
        annotated: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },
    /// Assemble the training inputs for one held-out fold
    Plan {
        #[command(flatten)]
        layout: LayoutArgs,

        /// Fold held out for evaluation
        #[arg(short, long)]
        eval_fold: usize,

        /// Write all training files concatenated into this file
        #[arg(long)]
        concat: Option<PathBuf>,

        /// Print the comma-separated training file list
        #[arg(long)]
        list: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FormatArg {
    /// OpenNLP inline spans
    Bracketed,
    /// Stanford token/label columns
    Tsv,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Bracketed => OutputFormat::Bracketed,
            FormatArg::Tsv => OutputFormat::Tabular,
        }
    }
}

/// Section marker options
#[derive(Args, Debug, Clone)]
struct MarkerArgs {
    /// Text opening the retained section
    #[arg(long, env = "NERPREP_START_MARKER", default_value = "item 1")]
    start_marker: String,

    /// Text closing the retained section
    #[arg(long, env = "NERPREP_END_MARKER", default_value = "mine safety disclosures")]
    end_marker: String,

    /// End marker is ignored up to this line
    #[arg(long, env = "NERPREP_MIN_END_LINE", default_value_t = 150)]
    min_end_line: usize,

    /// Keep lines holding a lone period
    #[arg(long)]
    keep_periods: bool,
}

impl MarkerArgs {
    fn to_config(&self) -> TrimConfig {
        TrimConfig::new()
            .with_markers(&self.start_marker, &self.end_marker)
            .with_min_end_line(self.min_end_line)
            .with_drop_lone_periods(!self.keep_periods)
    }
}

/// Fold directory options
#[derive(Args, Debug, Clone)]
struct LayoutArgs {
    /// Root of the fold directories
    #[arg(long, env = "NERPREP_FOLDS_ROOT")]
    folds_root: PathBuf,

    /// Number of folds
    #[arg(long, env = "NERPREP_FOLDS", default_value_t = 10)]
    folds: usize,

    /// Maximum files per fold
    #[arg(long, env = "NERPREP_CAPACITY", default_value_t = 10)]
    capacity: usize,

    /// Name of the first fold directory
    #[arg(long, env = "NERPREP_FIRST_INDEX", default_value_t = 0)]
    first_index: usize,
}

impl LayoutArgs {
    fn to_layout(&self) -> FoldLayout {
        let config = FoldConfig::new()
            .with_folds(self.folds)
            .with_capacity(self.capacity)
            .with_first_index(self.first_index);
        FoldLayout::new(&self.folds_root, config)
    }
}

#[derive(Debug, Serialize)]
struct TrimOutcome {
    input: PathBuf,
    output: PathBuf,
    #[serde(flatten)]
    report: TrimReport,
}

#[derive(Debug, Serialize)]
struct PlanReport {
    eval_fold: usize,
    train_files: usize,
    test_files: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    concat: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    lines_written: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    train_file_list: Option<String>,
}

fn init_logging(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).context("failed to serialize report")?;
    println!("{json}");
    Ok(())
}

fn transcode(input: &Path, output: &Path, options: CorpusOptions) -> Result<BatchReport> {
    let corpus = CorpusTranscoder::new(options).context("invalid section markers")?;
    if input.is_file() {
        let outcome = corpus
            .transcode_file(input, output)
            .with_context(|| format!("failed to transcode {}", input.display()))?;
        return Ok(BatchReport {
            processed: vec![outcome],
            failed: Vec::new(),
        });
    }
    corpus
        .transcode_dir(input, output)
        .with_context(|| format!("failed to read {}", input.display()))
}

fn trim(
    input: &Path,
    output: Option<PathBuf>,
    keep: bool,
    config: TrimConfig,
) -> Result<TrimOutcome> {
    let trimmer = SectionTrimmer::new(config).context("invalid section markers")?;
    let output = match output {
        Some(path) => path,
        None => trimmer.trimmed_path(input)?,
    };
    let report = if keep {
        trimmer.trim_copy(input, &output)
    } else {
        trimmer.trim_file(input.to_path_buf(), &output)
    }
    .with_context(|| format!("failed to trim {}", input.display()))?;

    Ok(TrimOutcome {
        input: input.to_path_buf(),
        output,
        report,
    })
}

fn folds(annotated: &Path, layout: &FoldLayout) -> Result<FoldRunReport> {
    let groups = scan_domains(annotated)
        .with_context(|| format!("failed to scan {}", annotated.display()))?;
    if groups.is_empty() {
        bail!("no domain directories with files under {}", annotated.display());
    }
    info!(domains = groups.len(), "distributing into folds");
    layout
        .distribute(&groups)
        .with_context(|| format!("failed to distribute into {}", layout.root().display()))
}

fn plan(
    layout: &FoldLayout,
    eval_fold: usize,
    concat: Option<PathBuf>,
    list: bool,
) -> Result<PlanReport> {
    let cv = CrossValidation::from_layout(layout)
        .with_context(|| format!("failed to read folds from {}", layout.root().display()))?;
    let split = cv.split(eval_fold)?;

    let lines_written = match &concat {
        Some(path) => Some(
            split
                .write_training_file(path)
                .with_context(|| format!("failed to write {}", path.display()))?,
        ),
        None => None,
    };

    Ok(PlanReport {
        eval_fold,
        train_files: split.train.len(),
        train_file_list: list.then(|| split.train_file_list()),
        test_files: split.test,
        concat,
        lines_written,
    })
}

fn run(cli: Cli) -> Result<ExitCode> {
    let json = cli.json;
    match cli.command {
        Commands::Transcode {
            input,
            output,
            format,
            entities_only,
            trim,
            require_window,
            recursive,
            markers,
        } => {
            let mode = if entities_only {
                TabularMode::EntitiesOnly
            } else {
                TabularMode::All
            };
            let options = CorpusOptions {
                transcode: TranscodeOptions::new()
                    .with_format(format.into())
                    .with_tabular_mode(mode)
                    .with_require_window(require_window),
                trim: trim.then(|| markers.to_config()),
                recursive,
            };
            let report = transcode(&input, &output, options)?;
            if json {
                print_json(&report)?;
            } else {
                for outcome in &report.processed {
                    println!("{} -> {}", outcome.input.display(), outcome.output.display());
                }
                for failure in &report.failed {
                    println!("FAILED {}: {}", failure.input.display(), failure.error);
                }
            }
            Ok(exit_code(report.has_failures()))
        }
        Commands::Trim {
            input,
            output,
            keep_intermediate,
            markers,
        } => {
            let outcome = trim(&input, output, keep_intermediate, markers.to_config())?;
            if json {
                print_json(&outcome)?;
            } else {
                println!(
                    "{} -> {} ({} lines retained)",
                    outcome.input.display(),
                    outcome.output.display(),
                    outcome.report.lines_retained
                );
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Folds { annotated, layout } => {
            let report = folds(&annotated, &layout.to_layout())?;
            if json {
                print_json(&report)?;
            } else {
                for (position, size) in report.fold_sizes.iter().enumerate() {
                    println!("fold {}: {size} files", layout.first_index + position);
                }
                for failure in &report.failed {
                    println!("FAILED {}: {}", failure.source.display(), failure.error);
                }
            }
            Ok(exit_code(report.has_failures()))
        }
        Commands::Plan {
            layout,
            eval_fold,
            concat,
            list,
        } => {
            let report = plan(&layout.to_layout(), eval_fold, concat, list)?;
            if json {
                print_json(&report)?;
            } else {
                println!(
                    "eval fold {}: {} training files, {} test files",
                    report.eval_fold,
                    report.train_files,
                    report.test_files.len()
                );
                if let Some(list) = &report.train_file_list {
                    println!("trainFileList={list}");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn exit_code(has_failures: bool) -> ExitCode {
    if has_failures {
        ExitCode::from(2)
    } else {
        ExitCode::SUCCESS
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transcode_flags() {
        let cli = Cli::try_parse_from([
            "nerprep", "transcode", "-i", "in", "-o", "out", "--format", "tsv", "--entities-only",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Transcode {
                format,
                entities_only,
                markers,
                ..
            } => {
                assert_eq!(OutputFormat::from(format), OutputFormat::Tabular);
                assert!(entities_only);
                assert_eq!(markers.min_end_line, 150);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_transcode_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("Acme%2520Corp.conll");
        fs::write(&input, "We O\nsell O\ncoal B-GOODS\n").unwrap();
        let out = dir.path().join("out");

        let report = transcode(&input, &out, CorpusOptions::default()).unwrap();
        assert!(!report.has_failures());
        assert_eq!(
            fs::read_to_string(out.join("Acme Corp.train")).unwrap(),
            "We sell <START:GOODS> coal <END>\n"
        );
    }

    #[test]
    fn test_folds_then_plan() {
        let dir = tempfile::tempdir().unwrap();
        let annotated = dir.path().join("annotated");
        for domain in ["energy", "retail"] {
            fs::create_dir_all(annotated.join(domain)).unwrap();
            for i in 0..2 {
                let file = annotated.join(domain).join(format!("{domain}{i}.train"));
                fs::write(file, "x\n").unwrap();
            }
        }
        let args = LayoutArgs {
            folds_root: dir.path().join("folds"),
            folds: 2,
            capacity: 10,
            first_index: 0,
        };
        let layout = args.to_layout();

        let report = folds(&annotated, &layout).unwrap();
        assert_eq!(report.fold_sizes, vec![2, 2]);

        let concat = dir.path().join("train.txt");
        let plan = plan(&layout, 0, Some(concat.clone()), true).unwrap();
        assert_eq!(plan.train_files, 2);
        assert_eq!(plan.lines_written, Some(4));
        assert!(plan.train_file_list.unwrap().contains(','));
        assert_eq!(fs::read_to_string(concat).unwrap(), "x\n\nx\n\n");
    }

    #[test]
    fn test_folds_rejects_empty_corpus() {
        let dir = tempfile::tempdir().unwrap();
        let layout = FoldLayout::new(dir.path().join("folds"), FoldConfig::new());
        assert!(folds(dir.path(), &layout).is_err());
    }
}

use std::io::IsTerminal;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use miette::{IntoDiagnostic, Result, WrapErr};

use evolens_core::{CommitRecord, EvolensConfig, OutputFormat};
use evolens_history::content::{BranchTip, WorkingCopy};
use evolens_history::mining::{mine_history, MiningOptions};
use evolens_metrics::pipeline::{analyze, AnalysisSettings};
use evolens_metrics::report::{format_report, ReportOptions};
use evolens_metrics::sloc::{SlocOutcome, SourceLineCounter};

#[derive(Parser)]
#[command(
    name = "evolens",
    version,
    about = "Software-evolution metrics from git history",
    long_about = "evolens measures how a codebase evolves: code churn, refactoring ratio,\n\
                   commit classification, and change-set size.\n\n\
                   Examples:\n  \
                     evolens analyze --path .                 Full report for the current repo\n  \
                     evolens analyze --branch master --ext .c --ext .h\n  \
                     evolens analyze --records history.json   Analyze externally mined records\n  \
                     evolens commits --limit 20               Per-commit line counts\n  \
                     evolens sloc src/main.c                  Count source lines"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// Path to configuration file (default: .evolens.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "text",
        long_help = "Output format for command results.\n\n\
                       Formats:\n  \
                         text      Human-readable tables and summaries (default)\n  \
                         json      Machine-readable JSON with camelCase keys\n  \
                         markdown  GitHub-flavored Markdown"
    )]
    format: OutputFormat,

    /// Enable verbose output
    #[arg(long, short, global = true)]
    verbose: bool,

    /// When to use colors
    #[arg(long, global = true, default_value = "auto")]
    color: ColorChoice,
}

#[derive(Subcommand)]
enum Command {
    /// Compute churn, refactoring ratio, and commit classification
    #[command(long_about = "Compute churn, refactoring ratio, and commit classification.\n\n\
        Walks the branch history oldest-first, splits each tracked file's churn into\n\
        creation churn and refactoring churn, counts current SLoC, and reports\n\
        per-file and overall refactoring ratios.\n\n\
        Examples:\n  evolens analyze --path .\n  evolens analyze --ext .c --ext .h --include 'src/**'\n  evolens analyze --records history.json --format json")]
    Analyze {
        /// Repository path (default: [history] repo_path, or current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Branch to analyze (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Tracked file suffix, repeatable (replaces configured extensions)
        #[arg(long = "ext")]
        extensions: Vec<String>,

        /// Glob a tracked path must match, repeatable
        #[arg(long)]
        include: Vec<String>,

        /// Only include commits from the last N days
        #[arg(long)]
        since: Option<u64>,

        /// Read commit records from a JSON file instead of mining git
        #[arg(long)]
        records: Option<PathBuf>,

        /// Where current file content is read from
        #[arg(long, default_value = "working-copy")]
        source: ContentMode,

        /// Files listed by refactoring ratio
        #[arg(long)]
        top_ratio: Option<usize>,

        /// Files listed by total churn
        #[arg(long)]
        top_churn: Option<usize>,
    },
    /// List commits with per-file line counts
    #[command(long_about = "List commits with per-file line counts.\n\n\
        Prints each commit's hash, author, insertions, and deletions, followed by\n\
        the files it touched.\n\n\
        Examples:\n  evolens commits\n  evolens commits --limit 10 --format json")]
    Commits {
        /// Repository path (default: [history] repo_path, or current directory)
        #[arg(long)]
        path: Option<PathBuf>,

        /// Branch to walk (default: HEAD)
        #[arg(long)]
        branch: Option<String>,

        /// Only include commits from the last N days
        #[arg(long)]
        since: Option<u64>,

        /// Show only the N most recent commits
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Count source lines of code in files
    #[command(long_about = "Count source lines of code in files.\n\n\
        Skips blank lines and comments using the [sloc] syntax from .evolens.toml.\n\n\
        Example:\n  evolens sloc src/main.c include/api.h")]
    Sloc {
        /// Files to count
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Create a default .evolens.toml configuration file
    #[command(long_about = "Create a default .evolens.toml configuration file.\n\n\
        Generates a template with the default taxonomy and commented-out options.\n\
        Fails if .evolens.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ContentMode {
    /// Read files from the checked-out working copy
    WorkingCopy,
    /// Read files from the tip of the analyzed branch
    BranchTip,
}

#[derive(Clone, PartialEq, Eq, ValueEnum)]
enum ColorChoice {
    /// Auto-detect based on terminal
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

fn print_welcome(use_color: bool) {
    let version = env!("CARGO_PKG_VERSION");

    if use_color {
        println!("\x1b[1mevolens\x1b[0m v{version}: software-evolution metrics from git history\n");

        println!("Quick start:");
        println!("  \x1b[36mevolens init\x1b[0m               Create a .evolens.toml config file");
        println!("  \x1b[36mevolens analyze --path .\x1b[0m   Churn and refactoring report\n");

        println!("All commands:");
        println!("  \x1b[32manalyze\x1b[0m   Churn, refactoring ratio, commit classification");
        println!("  \x1b[32mcommits\x1b[0m   Per-commit insertions and deletions");
        println!("  \x1b[32msloc\x1b[0m      Count source lines of code");
        println!("  \x1b[32minit\x1b[0m      Create default configuration\n");
    } else {
        println!("evolens v{version}: software-evolution metrics from git history\n");

        println!("Quick start:");
        println!("  evolens init               Create a .evolens.toml config file");
        println!("  evolens analyze --path .   Churn and refactoring report\n");

        println!("All commands:");
        println!("  analyze   Churn, refactoring ratio, commit classification");
        println!("  commits   Per-commit insertions and deletions");
        println!("  sloc      Count source lines of code");
        println!("  init      Create default configuration\n");
    }

    println!("Run 'evolens <command> --help' for details.");
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = tracing_subscriber::EnvFilter::try_from_env("EVOLENS_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn ensure_git_repo(path: &Path) -> Result<()> {
    if git2::Repository::open(path).is_err() {
        miette::bail!(miette::miette!(
            help = "Run evolens from the root of a git repository, or specify --path to one",
            "Not a git repository: {}",
            path.display()
        ));
    }
    Ok(())
}

fn mine_with_spinner(path: &Path, options: &MiningOptions) -> Result<Vec<CommitRecord>> {
    let spinner = if std::io::stderr().is_terminal() {
        let pb = indicatif::ProgressBar::new_spinner();
        pb.set_style(
            indicatif::ProgressStyle::with_template("{spinner:.cyan} {msg} ({elapsed})")
                .into_diagnostic()?,
        );
        pb.set_message(format!("Mining git history at {}...", path.display()));
        pb.enable_steady_tick(std::time::Duration::from_millis(120));
        Some(pb)
    } else {
        eprintln!("Mining git history at {}...", path.display());
        None
    };

    let commits = mine_history(path, options).inspect_err(|_e| {
        if let Some(pb) = &spinner {
            pb.finish_with_message("Failed");
        }
    })?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    Ok(commits)
}

fn format_timestamp(timestamp: i64) -> String {
    chrono::DateTime::from_timestamp(timestamp, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| timestamp.to_string())
}

fn short_hash(hash: &str) -> &str {
    &hash[..hash.len().min(8)]
}

fn print_commits(commits: &[CommitRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(commits).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("# Commits\n");
            println!("| Commit | Date | Author | Insertions | Deletions | Files |");
            println!("|--------|------|--------|------------|-----------|-------|");
            for c in commits {
                println!(
                    "| `{}` | {} | {} | {} | {} | {} |",
                    short_hash(&c.hash),
                    format_timestamp(c.timestamp),
                    c.author,
                    c.insertions(),
                    c.deletions(),
                    c.modifications.len(),
                );
            }
        }
        OutputFormat::Text => {
            for c in commits {
                println!(
                    "{} {} {} +{} -{}",
                    short_hash(&c.hash),
                    format_timestamp(c.timestamp),
                    c.author,
                    c.insertions(),
                    c.deletions(),
                );
                for m in &c.modifications {
                    println!(
                        "  {}: +{} -{}",
                        m.path().unwrap_or("?"),
                        m.added_lines,
                        m.deleted_lines
                    );
                }
            }
        }
    }
    Ok(())
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct SlocEntry {
    path: String,
    status: &'static str,
    sloc: u64,
}

fn count_files(files: &[PathBuf], counter: &SourceLineCounter, format: OutputFormat) -> Result<()> {
    let entries: Vec<SlocEntry> = files
        .iter()
        .map(|path| {
            let outcome = match std::fs::read(path) {
                Ok(bytes) => counter.count_bytes(&bytes),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => SlocOutcome::Absent,
                Err(_) => SlocOutcome::Unreadable,
            };
            let status = match outcome {
                SlocOutcome::Counted(_) => "counted",
                SlocOutcome::Absent => "absent",
                SlocOutcome::Unreadable => "unreadable",
            };
            SlocEntry {
                path: path.display().to_string(),
                status,
                sloc: outcome.lines(),
            }
        })
        .collect();

    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&entries).into_diagnostic()?
            );
        }
        OutputFormat::Markdown => {
            println!("| File | SLoC | Status |");
            println!("|------|------|--------|");
            for e in &entries {
                println!("| `{}` | {} | {} |", e.path, e.sloc, e.status);
            }
        }
        OutputFormat::Text => {
            for e in &entries {
                if e.status == "counted" {
                    println!("{}: {}", e.path, e.sloc);
                } else {
                    println!("{}: {} ({})", e.path, e.sloc, e.status);
                }
            }
            if entries.len() > 1 {
                let total: u64 = entries.iter().map(|e| e.sloc).sum();
                println!("total: {total}");
            }
        }
    }
    Ok(())
}

const DEFAULT_CONFIG: &str = r##"# evolens configuration

[history]
# repo_path = "."
# branch = "master"
# since_days = 365
extensions = [".c", ".h", ".java", ".hpp", ".di", ".uml", ".notation", ".genmodel"]
# include_paths = ["src/generated/**"]

[sloc]
# line_comments = ["//", "#"]
# block_open = "/*"
# block_close = "*/"

[report]
# top_ratio = 5
# top_churn = 10

# Commit categories, matched in order; the first category with a keyword
# in the (lower-cased) message wins. Unmatched commits count as "other".
[[taxonomy]]
name = "feat"
keywords = ["feat", "feature"]

[[taxonomy]]
name = "fix"
keywords = ["fix", "bug", "hotfix", "repair"]

[[taxonomy]]
name = "refactor"
keywords = ["refactor", "restructure", "rework"]

[[taxonomy]]
name = "chore"
keywords = ["chore", "build", "ci"]

[[taxonomy]]
name = "docs"
keywords = ["docs", "documentation"]
"##;

fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => EvolensConfig::from_file(path)
            .wrap_err(format!("loading {}", path.display()))?,
        None => {
            let default_path = Path::new(".evolens.toml");
            if default_path.exists() {
                EvolensConfig::from_file(default_path)?
            } else {
                EvolensConfig::default()
            }
        }
    };

    let use_color = match cli.color {
        ColorChoice::Always => true,
        ColorChoice::Never => false,
        ColorChoice::Auto => std::io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    };

    if cli.verbose {
        eprintln!("format: {}", cli.format);
        let names: Vec<&str> = config.taxonomy.iter().map(|c| c.name.as_str()).collect();
        eprintln!("Taxonomy: {} (+ other)", names.join(", "));
    }

    match cli.command {
        None => {
            print_welcome(use_color);
            return Ok(());
        }
        Some(Command::Analyze {
            path,
            branch,
            extensions,
            include,
            since,
            records,
            source,
            top_ratio,
            top_churn,
        }) => {
            if let Some(path) = path {
                config.history.repo_path = path;
            }
            if branch.is_some() {
                config.history.branch = branch;
            }
            if !extensions.is_empty() {
                config.history.extensions = extensions;
            }
            if !include.is_empty() {
                config.history.include_paths = include;
            }
            if since.is_some() {
                config.history.since_days = since;
            }
            if let Some(n) = top_ratio {
                config.report.top_ratio = n;
            }
            if let Some(n) = top_churn {
                config.report.top_churn = n;
            }

            let settings = AnalysisSettings::from_config(&config)?;
            let repo_path = config.history.repo_path.clone();

            let commits = match &records {
                Some(file) => {
                    eprintln!("Loading commit records from {}...", file.display());
                    evolens_history::records::load_records(file)?
                }
                None => {
                    ensure_git_repo(&repo_path)?;
                    let options = MiningOptions {
                        branch: config.history.branch.clone(),
                        since_days: config.history.since_days,
                    };
                    mine_with_spinner(&repo_path, &options)?
                }
            };
            tracing::debug!(commits = commits.len(), source = ?source, "commit stream ready");
            eprintln!("Analyzed {} commits.", commits.len());

            let report = match source {
                ContentMode::WorkingCopy => {
                    analyze(&commits, settings, &WorkingCopy::new(&repo_path))
                }
                ContentMode::BranchTip => {
                    let tip = BranchTip::open(&repo_path, config.history.branch.as_deref())?;
                    analyze(&commits, settings, &tip)
                }
            };

            let options = ReportOptions::from_config(&config.report);
            print!("{}", format_report(&report, cli.format, &options)?);
            if cli.format == OutputFormat::Json {
                println!();
            }
        }
        Some(Command::Commits {
            path,
            branch,
            since,
            limit,
        }) => {
            let repo_path = path.unwrap_or_else(|| config.history.repo_path.clone());
            ensure_git_repo(&repo_path)?;

            let options = MiningOptions {
                branch: branch.or(config.history.branch.clone()),
                since_days: since.or(config.history.since_days),
            };
            let mut commits = mine_with_spinner(&repo_path, &options)?;
            if let Some(limit) = limit {
                let skip = commits.len().saturating_sub(limit);
                commits.drain(..skip);
            }
            print_commits(&commits, cli.format)?;
        }
        Some(Command::Sloc { ref files }) => {
            let counter = SourceLineCounter::from_config(&config.sloc);
            count_files(files, &counter, cli.format)?;
        }
        Some(Command::Init) => {
            let path = Path::new(".evolens.toml");
            if path.exists() {
                miette::bail!(".evolens.toml already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created .evolens.toml with default configuration");
        }
        Some(Command::Completions { shell }) => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "evolens", &mut std::io::stdout());
        }
    }

    Ok(())
}

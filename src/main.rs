//! Enervi: seven-stage cycle scoring CLI

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use enervi::aggregator::{InputPolicy, ScoreAggregator};
use enervi::config::{load_config, Config, CONFIG_FILENAME};
use enervi::presets::{all_presets, find_preset};
use enervi::reporter::{ConsoleReporter, JsonReporter};
use enervi::session::{find_session_root, load_session, save_session, Session};
use enervi::watcher::AnswersWatcher;
use enervi::{AggregationConfig, RawAnswers, ScoreRequest, ScoreResult, CYCLE_LEN};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Enervi: score seven stages and their transitions
#[derive(Parser, Debug)]
#[command(name = "enervi")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Answers files: JSON objects with Q1..Q7, T1..T7 and optional "penalty"
    inputs: Vec<PathBuf>,

    /// Seven comma-separated stage scores Q1..Q7 (0-10)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "Q1,..,Q7")]
    q: Option<Vec<f64>>,

    /// Seven comma-separated transition scores T1..T7 (0-10)
    #[arg(long, value_delimiter = ',', allow_hyphen_values = true, value_name = "T1,..,T7")]
    t: Option<Vec<f64>>,

    /// Start from a named preset (see `enervi presets`)
    #[arg(long)]
    preset: Option<String>,

    /// Penalize stages next to blocked transitions
    #[arg(long)]
    penalty: bool,

    /// Threshold below which a transition is blocked (default 4.0)
    #[arg(long)]
    tau: Option<f64>,

    /// Penalty per blocked neighbour, 0-10 scale (default 0.3)
    #[arg(long)]
    delta: Option<f64>,

    /// Out-of-range inputs: passthrough, clamp or reject
    #[arg(long, value_name = "POLICY")]
    policy: Option<String>,

    /// Output format as JSON
    #[arg(long, short)]
    json: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,

    /// Quiet mode (one line per result)
    #[arg(long)]
    quiet: bool,

    /// Verbose output
    #[arg(long, short)]
    verbose: bool,

    /// Path to config file (default: search .enervirc.json in current dir and parents)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Watch the answers file and re-score on change
    #[arg(long)]
    watch: bool,

    /// Start from the answers of the previous run
    #[arg(long)]
    resume: bool,

    /// Neither read nor write the session file
    #[arg(long)]
    no_session: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run MCP server for tool-calling clients (stdio JSON-RPC)
    Mcp {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// List built-in and configured presets
    Presets {
        /// Path to config file
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Create .enervirc.json with sensible defaults
    Init {
        /// Enable the blocked-transition penalty
        #[arg(long)]
        penalty: bool,

        /// Out-of-range inputs: passthrough, clamp or reject
        #[arg(long)]
        policy: Option<String>,

        /// Directory in which to create config (default: current)
        #[arg(long)]
        dir: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", "Error".red().bold(), e);
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .try_init();
}

fn parse_policy(value: Option<&str>) -> Result<Option<InputPolicy>> {
    match value {
        None => Ok(None),
        Some(s) => InputPolicy::parse(s)
            .map(Some)
            .ok_or_else(|| anyhow::anyhow!("Unknown input policy '{}' (use passthrough, clamp or reject)", s)),
    }
}

fn current_dir() -> Result<PathBuf> {
    std::env::current_dir().context("Failed to get current directory")
}

fn run() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    if let Some(cmd) = args.command {
        return match cmd {
            Commands::Mcp { config } => {
                let config = load_config(&current_dir()?, config.as_deref())?;
                let aggregator = aggregator_for(&config);
                enervi::mcp::run_mcp_server(&aggregator, &config.presets)?;
                Ok(ExitCode::SUCCESS)
            }
            Commands::Presets { config } => {
                let config = load_config(&current_dir()?, config.as_deref())?;
                run_presets(&config)
            }
            Commands::Init { penalty, policy, dir } => {
                let policy = parse_policy(policy.as_deref())?.unwrap_or_default();
                run_init(penalty, policy, dir.as_deref())
            }
        };
    }

    let cwd = current_dir()?;
    // Resolve work directory for config and session search
    let work_dir = match args.inputs.first() {
        Some(path) if args.inputs.len() == 1 => path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
            .unwrap_or_else(|| cwd.clone()),
        _ => cwd.clone(),
    };

    // Load config (CLI flags override config file)
    let config = load_config(&work_dir, args.config.as_deref())?.merge_with_cli(
        args.penalty.then_some(true),
        args.tau,
        args.delta,
        parse_policy(args.policy.as_deref())?,
    );
    config.validate()?;
    let aggregator = aggregator_for(&config);

    let session_root = if args.no_session {
        None
    } else {
        Some(find_session_root(&work_dir).unwrap_or_else(|| work_dir.clone()))
    };

    if args.watch {
        return run_watch(&args, &config, &aggregator);
    }

    if args.inputs.len() > 1 {
        return run_many(&args, &config, &aggregator);
    }

    let mut session = session_root
        .as_deref()
        .map(load_session)
        .unwrap_or_default();

    let (title, request) = match args.inputs.first() {
        Some(path) => (path.display().to_string(), read_request(path)?),
        None => (
            "command line".to_string(),
            ScoreRequest::from_answers(answers_from_flags(&args, &config, &session)?),
        ),
    };

    let result = aggregator.score_request(&request)?;
    let effective = request.resolve_config(aggregator.config());

    print_result(&args, &config, &title, &result, &effective, session.previous_result());

    if let Some(root) = session_root {
        session.record(request.answers, effective.penalty_enabled, result);
        if let Err(e) = save_session(&root, &session) {
            if !args.quiet {
                eprintln!("{}: Failed to save session: {}", "Warning".yellow(), e);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn aggregator_for(config: &Config) -> ScoreAggregator {
    ScoreAggregator::new()
        .with_config(config.aggregation_config())
        .with_policy(config.input_policy())
}

/// Answers from --preset / --resume, overlaid with --q and --t
fn answers_from_flags(args: &Args, config: &Config, session: &Session) -> Result<RawAnswers> {
    let mut answers = if let Some(ref name) = args.preset {
        find_preset(name, &config.presets)?.answers
    } else if args.resume {
        match session.last_answers {
            Some(answers) => answers,
            None => {
                if !args.quiet {
                    eprintln!("{}: No previous answers to resume", "Info".blue());
                }
                RawAnswers::default()
            }
        }
    } else {
        RawAnswers::default()
    };

    if let Some(ref q) = args.q {
        answers.stages = seven_values("--q", q)?;
    }
    if let Some(ref t) = args.t {
        answers.transitions = seven_values("--t", t)?;
    }
    Ok(answers)
}

fn seven_values(flag: &str, values: &[f64]) -> Result<[f64; CYCLE_LEN]> {
    values.try_into().map_err(|_| {
        anyhow::anyhow!(
            "{} expects {} comma-separated values, got {}",
            flag,
            CYCLE_LEN,
            values.len()
        )
    })
}

fn read_request(path: &Path) -> Result<ScoreRequest> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read answers file: {}", path.display()))?;
    ScoreRequest::from_json(&content)
        .with_context(|| format!("Invalid answers file: {}", path.display()))
}

/// Score an answers file, returning the config it was scored with
fn score_file(path: &Path, aggregator: &ScoreAggregator) -> Result<(AggregationConfig, ScoreResult)> {
    let request = read_request(path)?;
    let result = aggregator
        .score_request(&request)
        .with_context(|| format!("Rejected answers in {}", path.display()))?;
    Ok((request.resolve_config(aggregator.config()), result))
}

fn print_result(
    args: &Args,
    config: &Config,
    title: &str,
    result: &ScoreResult,
    effective: &AggregationConfig,
    previous: Option<&ScoreResult>,
) {
    if args.json {
        let reporter = if args.pretty {
            JsonReporter::new().pretty()
        } else {
            JsonReporter::new()
        };
        println!("{}", reporter.report(result));
        return;
    }

    let reporter = console_reporter(args, config);
    if args.quiet {
        reporter.report_quiet(title, result);
    } else {
        reporter.report(title, result, effective, previous);
    }
}

fn console_reporter(args: &Args, config: &Config) -> ConsoleReporter {
    let reporter = ConsoleReporter::new().with_labels(config.stage_labels());
    if args.verbose {
        reporter.verbose()
    } else {
        reporter
    }
}

/// Score several answers files in parallel
fn run_many(args: &Args, config: &Config, aggregator: &ScoreAggregator) -> Result<ExitCode> {
    use rayon::prelude::*;

    let outcomes: Vec<(String, Result<(AggregationConfig, ScoreResult)>)> = args
        .inputs
        .par_iter()
        .map(|path| (path.display().to_string(), score_file(path, aggregator)))
        .collect();

    let mut results = Vec::with_capacity(outcomes.len());
    let mut effective_configs = Vec::with_capacity(outcomes.len());
    let mut had_errors = false;
    for (file, outcome) in outcomes {
        match outcome {
            Ok((effective, result)) => {
                results.push((file, result));
                effective_configs.push(effective);
            }
            Err(e) => {
                had_errors = true;
                eprintln!("{}: {:#}", "Error".red(), e);
            }
        }
    }

    if args.json {
        let reporter = if args.pretty {
            JsonReporter::new().pretty()
        } else {
            JsonReporter::new()
        };
        println!("{}", reporter.report_many(&results));
    } else {
        let reporter = console_reporter(args, config);
        for ((file, result), effective) in results.iter().zip(&effective_configs) {
            if args.quiet {
                reporter.report_quiet(file, result);
            } else {
                reporter.report(file, result, effective, None);
            }
        }
    }

    if had_errors {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::SUCCESS)
    }
}

fn run_watch(args: &Args, config: &Config, aggregator: &ScoreAggregator) -> Result<ExitCode> {
    let [path] = args.inputs.as_slice() else {
        anyhow::bail!("--watch needs exactly one answers file");
    };

    let watcher = AnswersWatcher::watch(path).context("Failed to create file watcher")?;
    eprintln!("{}: Watching {} (Ctrl+C to stop)", "Info".blue(), path.display());

    let title = path.display().to_string();
    let mut previous: Option<ScoreResult> = None;
    loop {
        match score_file(path, aggregator) {
            Ok((effective, result)) => {
                print_result(args, config, &title, &result, &effective, previous.as_ref());
                previous = Some(result);
            }
            Err(e) => eprintln!("{}: {:#}", "Error".red(), e),
        }

        if !watcher.wait_for_change() {
            return Ok(ExitCode::SUCCESS);
        }
    }
}

fn run_presets(config: &Config) -> Result<ExitCode> {
    for preset in all_presets(&config.presets) {
        let stages: Vec<String> = preset.answers.stages.iter().map(|v| v.to_string()).collect();
        let transitions: Vec<String> = preset
            .answers
            .transitions
            .iter()
            .map(|v| v.to_string())
            .collect();
        println!(
            "{:<12} Q: {}  T: {}",
            preset.name.bold(),
            stages.join(","),
            transitions.join(",")
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn run_init(penalty: bool, policy: InputPolicy, dir: Option<&Path>) -> Result<ExitCode> {
    let cwd = current_dir()?;
    let dir = dir.unwrap_or(&cwd);
    let config_path = dir.join(CONFIG_FILENAME);

    if config_path.exists() {
        eprintln!(
            "{}: {} already exists; use --dir to write elsewhere or remove it first",
            "Warning".yellow(),
            config_path.display()
        );
        return Ok(ExitCode::SUCCESS);
    }

    let json = format!(
        r#"{{
  "penalty": {},
  "tau": 4.0,
  "delta": 0.3,
  "inputPolicy": "{}",
  "stageLabels": ["Root", "Sacral", "Solar", "Heart", "Throat", "Third Eye", "Crown"],
  "presets": {{}}
}}
"#,
        penalty, policy
    );

    std::fs::write(&config_path, json)
        .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

    println!(
        "{}: Created {} with penalty={}, inputPolicy={}",
        "Done".green().bold(),
        config_path.display(),
        penalty,
        policy
    );
    Ok(ExitCode::SUCCESS)
}

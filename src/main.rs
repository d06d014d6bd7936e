use clap::{Parser, ValueEnum};
use game_runner::runner::{Outcome, RunArgs, RunOutcome, run_games};
use game_runner::{
    DEFAULT_COMMAND, DEFAULT_CONCURRENCY, DEFAULT_GAME_COUNT, DEFAULT_INPUT_PATH, MAX_ATTEMPTS,
};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Clone)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Parameter file: a count followed by whitespace separated numbers
    #[arg(short, long, default_value = DEFAULT_INPUT_PATH)]
    input: PathBuf,

    /// Executable run once per game attempt
    #[arg(short, long, default_value = DEFAULT_COMMAND)]
    command: PathBuf,

    /// Extra argument passed to the executable (repeatable)
    #[arg(long = "arg", value_name = "ARG", allow_hyphen_values = true)]
    command_args: Vec<String>,

    /// Number of games to run
    #[arg(short, long, default_value_t = DEFAULT_GAME_COUNT)]
    games: usize,

    /// Number of games run in parallel
    #[arg(short, long, default_value_t = DEFAULT_CONCURRENCY)]
    workers: usize,

    /// Per-attempt timeout (e.g., 500ms, 30s, 2m)
    #[arg(short, long, default_value = "120s", value_parser = humantime::parse_duration)]
    timeout: Duration,

    /// Attempts per game before it is reported as failed
    #[arg(long, default_value_t = MAX_ATTEMPTS)]
    max_attempts: u32,

    /// Pause between attempts of the same game
    #[arg(long, default_value = "1s", value_parser = humantime::parse_duration)]
    retry_delay: Duration,

    /// Result line format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Plain)]
    output: OutputFormat,

    /// Quiet mode - no progress bars, only warnings in the log
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// Token list per game, `FAILED` for games that exhausted their attempts
    Plain,
    /// One JSON object per game
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Logs go to stderr so stdout carries nothing but results
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let default_filter = if args.quiet {
        "game_runner=warn"
    } else {
        "game_runner=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);

    let run_args = RunArgs {
        input_path: args.input,
        command: args.command,
        command_args: args.command_args,
        game_count: args.games,
        worker_count: args.workers,
        timeout: args.timeout,
        max_attempts: args.max_attempts,
        retry_delay: args.retry_delay,
        quiet: args.quiet,
    };

    let result = run_games(run_args).await?;

    for outcome in &result.outcomes {
        println!("{}", format_outcome(outcome, args.output)?);
    }

    Ok(())
}

fn format_outcome(outcome: &RunOutcome, format: OutputFormat) -> anyhow::Result<String> {
    Ok(match format {
        OutputFormat::Plain => match &outcome.outcome {
            Outcome::Completed { tokens } => format!("{:?}", tokens),
            Outcome::Failed { .. } => "FAILED".to_string(),
        },
        OutputFormat::Json => serde_json::to_string(outcome)?,
    })
}

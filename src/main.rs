use clap::Parser;
use std::future::Future;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio::sync::oneshot;
use tracing::{debug, error, info, Level};
use tracing_subscriber::{self, EnvFilter};

use followbot::config::Config;
use followbot::error::{ErrorRecovery, FollowBotError};
use followbot::follower::{CancelHandle, Cancellation};
use followbot::github::GitHubClient;
use followbot::prompt::Prompter;
use followbot::report::{banner, ConsoleReporter};
use followbot::session::{RunRequest, Session, SessionOutcome};
use followbot::throttle::FixedThrottle;

#[derive(Parser)]
#[command(name = "followbot")]
#[command(about = "Follows every follower of a target GitHub account")]
#[command(version)]
struct Cli {
    /// Path to configuration file (can also be set via FOLLOWBOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<String>,

    /// Enable verbose logging (equivalent to --log-level debug)
    #[arg(short, long)]
    verbose: bool,

    /// Account whose followers should be followed; prompted for when omitted
    #[arg(short, long, value_name = "USER")]
    target: Option<String>,

    /// Skip the confirmation prompt
    #[arg(short, long)]
    yes: bool,
}

impl Cli {
    /// Get config path from CLI arg or FOLLOWBOT_CONFIG environment variable
    fn config_path(&self) -> Option<PathBuf> {
        self.config
            .clone()
            .or_else(|| std::env::var("FOLLOWBOT_CONFIG").ok().map(PathBuf::from))
    }
}

fn init_logging(config: &Config, cli: &Cli) -> Result<(), FollowBotError> {
    let configured = config.logging().level;
    let log_level = if cli.verbose {
        "debug"
    } else if let Some(ref level) = cli.log_level {
        level.as_str()
    } else {
        configured.as_deref().unwrap_or("warn")
    };

    let _level = match log_level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => {
            return Err(FollowBotError::InvalidData(format!(
                "Invalid log level: {log_level}. Valid levels are: error, warn, info, debug, trace"
            )));
        }
    };

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(log_level))
        .map_err(|e| FollowBotError::InvalidData(format!("Failed to create log filter: {e}")))?;

    // Logs go to stderr so they never interleave with the status lines on stdout
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .init();

    debug!("Logging initialized with level: {}", log_level);
    Ok(())
}

/// Print an error with its remediation hints
fn print_error(error: &FollowBotError) {
    error!("{}", error);
    println!("\n❌ ERROR: {error}");

    let hints = ErrorRecovery::remediation(error);
    if !hints.is_empty() {
        println!("\n📝 SOLUTION:");
        for hint in hints {
            println!("   {hint}");
        }
    }
    println!();
}

fn report_error(error: &FollowBotError) -> ExitCode {
    print_error(error);
    ExitCode::FAILURE
}

/// Cancel the run on SIGINT or SIGTERM
async fn watch_shutdown_signal(handle: CancelHandle) {
    use tokio::signal;

    #[cfg(unix)]
    {
        let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(sigterm) => sigterm,
            Err(e) => {
                error!("Failed to register SIGTERM handler: {}", e);
                return;
            }
        };

        tokio::select! {
            _ = sigterm.recv() => {
                info!("Received SIGTERM, stopping");
            }
            result = signal::ctrl_c() => {
                if let Err(e) = result {
                    error!("Failed to listen for Ctrl+C: {}", e);
                    return;
                }
                info!("Received SIGINT (Ctrl+C), stopping");
            }
        }
    }

    #[cfg(not(unix))]
    {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, stopping");
    }

    handle.cancel();
}

/// Exit status once listing and following are over.
///
/// A failed listing ends the bot the same way as an empty one.
fn exit_status(result: &Result<SessionOutcome, FollowBotError>) -> u8 {
    match result {
        Ok(_) | Err(FollowBotError::GitHub(_)) => 0,
        Err(_) => 1,
    }
}

/// Print the closing lines of a run and pick the exit code
fn finish(result: Result<SessionOutcome, FollowBotError>) -> ExitCode {
    match &result {
        Ok(SessionOutcome::Declined) => println!("\n✋ Operation cancelled. Goodbye!\n"),
        Ok(SessionOutcome::NoFollowers) => {
            println!("⚠️  No followers found or an error occurred. Exiting.")
        }
        Ok(SessionOutcome::Cancelled) => println!("\n\n✋ Bot stopped. Goodbye!\n"),
        Ok(SessionOutcome::Finished(run)) => {
            info!(
                "Run {}: {:?}",
                if run.is_interrupted() {
                    "interrupted"
                } else {
                    "completed"
                },
                run.stats()
            );
        }
        Err(e @ FollowBotError::GitHub(_)) => {
            print_error(e);
            println!("⚠️  No followers found or an error occurred. Exiting.");
        }
        Err(e) => print_error(e),
    }
    ExitCode::from(exit_status(&result))
}

/// Run `task` unless the bot is stopped first
async fn unless_cancelled<F: Future>(
    cancellation: &mut Cancellation,
    task: F,
) -> Option<F::Output> {
    tokio::select! {
        biased;
        _ = cancellation.cancelled() => None,
        output = task => Some(output),
    }
}

/// Run blocking console input on its own thread so a pending read never holds up shutdown
async fn on_prompt_thread<T, F>(read: F) -> Result<T, FollowBotError>
where
    T: Send + 'static,
    F: FnOnce() -> io::Result<T> + Send + 'static,
{
    let (tx, rx) = oneshot::channel();
    std::thread::spawn(move || {
        let _ = tx.send(read());
    });
    let answer = rx
        .await
        .map_err(|_| FollowBotError::InvalidData("Prompt thread exited early".to_string()))?;
    Ok(answer?)
}

async fn ask<T, F>(prompt: F) -> Result<T, FollowBotError>
where
    T: Send + 'static,
    F: FnOnce(&mut Prompter<io::StdinLock<'static>, io::Stdout>) -> io::Result<T> + Send + 'static,
{
    on_prompt_thread(move || prompt(&mut Prompter::stdio())).await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match Config::load(cli.config_path()) {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            return report_error(&FollowBotError::Config(e));
        }
    };

    if let Err(e) = init_logging(&config, &cli) {
        eprintln!("Failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    info!("Starting followbot v{}", env!("CARGO_PKG_VERSION"));
    debug!("GitHub API: {}", config.github.api_url);

    let (handle, mut cancellation) = Cancellation::new();
    let signal_task = tokio::spawn(watch_shutdown_signal(handle));

    let code = match run_application(&config, &cli, &mut cancellation).await {
        Ok(code) => code,
        Err(e) => report_error(&e),
    };

    signal_task.abort();
    code
}

type ConsoleSession = Session<GitHubClient, FixedThrottle, ConsoleReporter>;

async fn run_application(
    config: &Config,
    cli: &Cli,
    cancellation: &mut Cancellation,
) -> Result<ExitCode, FollowBotError> {
    println!("\n{}", banner("🤖 GitHub Follower Bot"));

    let Some(prepared) = unless_cancelled(cancellation, prepare(config, cli)).await else {
        println!("\n\n✋ Bot stopped. Goodbye!\n");
        return Ok(ExitCode::SUCCESS);
    };
    let (session, request) = prepared?;

    if !request.confirmed {
        return Ok(finish(Ok(SessionOutcome::Declined)));
    }

    println!("\n{}\n", banner("🤖 Starting GitHub Follower Bot"));
    let result = session.execute(&request, cancellation).await;
    Ok(finish(result))
}

/// Read and verify the token, then read the target and the confirmation
async fn prepare(
    config: &Config,
    cli: &Cli,
) -> Result<(ConsoleSession, RunRequest), FollowBotError> {
    let token = if config.github.token.trim().is_empty() {
        ask(|prompter| prompter.read_token()).await?
    } else {
        debug!("Using token from configuration");
        config.github.token.trim().to_string()
    };
    if token.is_empty() {
        return Err(FollowBotError::MissingInput("Token"));
    }

    let session = Session::from_config(config, &token, ConsoleReporter::new())?;

    println!("\n🔍 Testing your token...");
    let account = session.authenticate().await?;
    println!("✅ Token valid! Logged in as: {}\n", account.login);

    let target = match &cli.target {
        Some(target) => target.trim().to_string(),
        None => ask(|prompter| prompter.read_target()).await?,
    };
    if target.is_empty() {
        return Err(FollowBotError::MissingInput("Username"));
    }

    let confirmed = if cli.yes {
        true
    } else {
        let shown = target.clone();
        ask(move |prompter| prompter.confirm(&shown)).await?
    };

    Ok((session, RunRequest::new(token, target, confirmed)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use followbot::error::GitHubError;
    use followbot::follower::{FollowStats, RunOutcome};
    use std::time::Duration;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["followbot"]);
        assert!(cli.config.is_none());
        assert!(cli.log_level.is_none());
        assert!(cli.target.is_none());
        assert!(!cli.verbose);
        assert!(!cli.yes);

        let cli = Cli::parse_from(["followbot", "--config", "/path/to/followbot.toml"]);
        assert_eq!(cli.config, Some(PathBuf::from("/path/to/followbot.toml")));

        let cli = Cli::parse_from(["followbot", "--log-level", "debug"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));

        let cli = Cli::parse_from(["followbot", "-t", "octocat", "-y", "-v"]);
        assert_eq!(cli.target, Some("octocat".to_string()));
        assert!(cli.yes);
        assert!(cli.verbose);
    }

    #[test]
    fn test_followbot_config_env_var() {
        std::env::set_var("FOLLOWBOT_CONFIG", "/env/path/to/followbot.toml");

        let cli = Cli::parse_from(["followbot"]);
        assert_eq!(
            cli.config_path(),
            Some(PathBuf::from("/env/path/to/followbot.toml"))
        );

        // CLI arg overrides environment variable
        let cli = Cli::parse_from(["followbot", "--config", "/cli/followbot.toml"]);
        assert_eq!(cli.config_path(), Some(PathBuf::from("/cli/followbot.toml")));

        std::env::remove_var("FOLLOWBOT_CONFIG");

        let cli = Cli::parse_from(["followbot"]);
        assert_eq!(cli.config_path(), None);
    }

    #[test]
    fn test_exit_status() {
        let stats = FollowStats {
            followed: 2,
            skipped: 1,
            errored: 1,
        };
        assert_eq!(
            exit_status(&Ok(SessionOutcome::Finished(RunOutcome::Completed(stats)))),
            0
        );
        assert_eq!(
            exit_status(&Ok(SessionOutcome::Finished(RunOutcome::Interrupted(stats)))),
            0
        );
        assert_eq!(exit_status(&Ok(SessionOutcome::Declined)), 0);
        assert_eq!(exit_status(&Ok(SessionOutcome::NoFollowers)), 0);
        assert_eq!(exit_status(&Ok(SessionOutcome::Cancelled)), 0);
    }

    #[test]
    fn test_listing_failures_exit_cleanly() {
        let not_found = Err(FollowBotError::GitHub(GitHubError::TargetNotFound {
            user: "ghost".to_string(),
        }));
        assert_eq!(exit_status(&not_found), 0);
        assert_eq!(
            exit_status(&Err(FollowBotError::GitHub(GitHubError::RateLimited))),
            0
        );
        assert_eq!(
            exit_status(&Err(FollowBotError::GitHub(GitHubError::Transport(
                "connection refused".to_string()
            )))),
            0
        );

        assert_eq!(exit_status(&Err(FollowBotError::MissingInput("Token"))), 1);
        assert_eq!(
            exit_status(&Err(FollowBotError::InvalidData("bad".to_string()))),
            1
        );
    }

    #[tokio::test]
    async fn test_unless_cancelled_runs_task() {
        let mut cancellation = Cancellation::never();
        let output = unless_cancelled(&mut cancellation, async { 42 }).await;
        assert_eq!(output, Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_interrupts_pending_task() {
        let (handle, mut cancellation) = Cancellation::new();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            handle.cancel();
        });

        let output = unless_cancelled(&mut cancellation, std::future::pending::<()>()).await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_cancel_does_not_wait_for_blocked_prompt() {
        let (handle, mut cancellation) = Cancellation::new();
        let (_unblock, blocked) = std::sync::mpsc::channel::<()>();
        tokio::spawn(async move {
            tokio::task::yield_now().await;
            handle.cancel();
        });

        let output = unless_cancelled(
            &mut cancellation,
            on_prompt_thread(move || {
                let _ = blocked.recv();
                Ok(())
            }),
        )
        .await;
        assert!(output.is_none());
    }

    #[tokio::test]
    async fn test_prompt_thread_returns_answer() {
        let answer = on_prompt_thread(|| Ok("octocat".to_string())).await.unwrap();
        assert_eq!(answer, "octocat");

        let failed = on_prompt_thread(|| -> io::Result<String> {
            Err(io::Error::new(io::ErrorKind::UnexpectedEof, "closed"))
        })
        .await;
        assert!(matches!(failed, Err(FollowBotError::Io(_))));
    }
}

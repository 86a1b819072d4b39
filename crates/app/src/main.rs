mod terminal;

use std::fmt;
use std::str::FromStr;

use octa_core::model::{AgeRange, Gender};
use services::{AppServices, Clock, SessionError, SubmitOutcome, share_result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingFlag { flag: &'static str },
    UnknownArg(String),
    InvalidValue { flag: &'static str, raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingFlag { flag } => write!(f, "{flag} is required"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidValue { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_value<T: FromStr>(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<T, ArgsError> {
    let raw = require_value(args, flag)?;
    raw.parse().map_err(|_| ArgsError::InvalidValue {
        flag,
        raw: raw.clone(),
    })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app start  --gender <male|female> --age <under18|19-25|26-50|over51>");
    eprintln!("  app take   --attempt <attempt-id>");
    eprintln!("  app result --attempt <attempt-id> [--share]");
    eprintln!();
    eprintln!("Environment (also read from .env):");
    eprintln!("  OCTA_API_BASE_URL, OCTA_REQUEST_TIMEOUT_SECS,");
    eprintln!("  OCTA_RESULT_MAX_RETRIES, OCTA_RESULT_RETRY_DELAY_SECS,");
    eprintln!("  OCTA_PUBLIC_ORIGIN, OCTA_SITE_NAME, RUST_LOG");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Start,
    Take,
    Result,
}

impl Command {
    fn from_arg(arg: &str) -> Option<Self> {
        match arg {
            "start" => Some(Self::Start),
            "take" => Some(Self::Take),
            "result" => Some(Self::Result),
            _ => None,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Args {
    Start { gender: Gender, age_range: AgeRange },
    Take { attempt: String },
    Result { attempt: String, share: bool },
}

impl Args {
    fn parse(command: Command, args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        match command {
            Command::Start => Self::parse_start(args),
            Command::Take => {
                let (attempt, _) = Self::parse_attempt(args, false)?;
                Ok(Self::Take { attempt })
            }
            Command::Result => {
                let (attempt, share) = Self::parse_attempt(args, true)?;
                Ok(Self::Result { attempt, share })
            }
        }
    }

    fn parse_start(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut gender = None;
        let mut age_range = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--gender" => gender = Some(parse_value(args, "--gender")?),
                "--age" => age_range = Some(parse_value(args, "--age")?),
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self::Start {
            gender: gender.ok_or(ArgsError::MissingFlag { flag: "--gender" })?,
            age_range: age_range.ok_or(ArgsError::MissingFlag { flag: "--age" })?,
        })
    }

    fn parse_attempt(
        args: &mut impl Iterator<Item = String>,
        allow_share: bool,
    ) -> Result<(String, bool), ArgsError> {
        let mut attempt = None;
        let mut share = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--attempt" => attempt = Some(require_value(args, "--attempt")?),
                "--share" if allow_share => share = true,
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        // the id itself is validated by the services layer
        let attempt = attempt.ok_or(ArgsError::MissingFlag { flag: "--attempt" })?;
        Ok((attempt, share))
    }
}

fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "services=info,app=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

/// Turns a session error into the single line printed by `main`.
fn session_failure(err: SessionError) -> Box<dyn std::error::Error> {
    tracing::debug!(error = %err, kind = ?err.kind(), "command failed");
    if err.redirects_to_start() {
        eprintln!("Start a new test with: app start --gender <male|female> --age <range>");
    }
    err.user_message().into()
}

async fn start(
    services: &AppServices,
    gender: Gender,
    age_range: AgeRange,
) -> Result<(), Box<dyn std::error::Error>> {
    let attempt_id = services
        .starter()
        .start(gender, age_range)
        .await
        .map_err(session_failure)?;
    println!("{attempt_id}");
    eprintln!("Take the test with: app take --attempt {attempt_id}");
    Ok(())
}

async fn take(
    services: &AppServices,
    raw_attempt: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let controller = services.new_attempt_controller();

    let mut loaded = controller.open(Some(raw_attempt)).await;
    let total_pages = loop {
        match loaded {
            Ok(pages) => break pages,
            Err(err) if err.is_transient() => {
                eprintln!("{}", err.user_message());
                if !terminal::ask_yes_no("Retry loading the questions?") {
                    return Err(session_failure(err));
                }
                loaded = controller.retry_load().await;
            }
            Err(err) => return Err(session_failure(err)),
        }
    };
    println!("{total_pages} pages. Rate each statement from 1 (not at all) to 10 (completely).");

    'pages: loop {
        let snapshot = controller.snapshot();
        terminal::print_page_header(&snapshot);

        for question in &snapshot.questions {
            loop {
                let Some(line) = terminal::prompt(&terminal::question_prompt(question))? else {
                    return Err("input closed before the test was submitted".into());
                };
                if line.eq_ignore_ascii_case("b") {
                    controller.prev_page().map_err(session_failure)?;
                    continue 'pages;
                }
                if line.is_empty() && question.rating.is_some() {
                    break;
                }
                let Ok(score) = line.parse::<i64>() else {
                    println!("    enter a whole number from 1 to 10");
                    continue;
                };
                match controller.set_answer(question.id, score) {
                    Ok(_) => break,
                    Err(err) => println!("    {}", err.user_message()),
                }
            }
        }

        if !controller.snapshot().is_last_page {
            controller.next_page().map_err(session_failure)?;
            continue;
        }

        match controller.submit(terminal::confirm_submission).await {
            Ok(SubmitOutcome::Submitted { attempt_id }) => {
                println!("Answers submitted.");
                let result = services
                    .results()
                    .fetch_for(attempt_id)
                    .await
                    .map_err(session_failure)?;
                terminal::print_result(&result);
                eprintln!("See it again with: app result --attempt {attempt_id}");
                return Ok(());
            }
            Ok(SubmitOutcome::Declined) => {
                println!("Not submitted. Review the last page or press b to go back.");
            }
            Err(err) if err.redirects_to_start() => return Err(session_failure(err)),
            Err(err) => {
                eprintln!("{}", err.user_message());
                if !terminal::ask_yes_no("Review and try submitting again?") {
                    return Err(session_failure(err));
                }
            }
        }
    }
}

async fn result(
    services: &AppServices,
    raw_attempt: &str,
    share: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let result = services
        .results()
        .fetch(raw_attempt)
        .await
        .map_err(session_failure)?;
    terminal::print_result(&result);

    if share {
        share_result(&terminal::TerminalShare, &result, services.share_config()).await?;
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let argv: Vec<String> = std::env::args().skip(1).collect();

    let cmd = match argv.first().map(String::as_str) {
        None | Some("--help" | "-h") => {
            print_usage();
            return Ok(());
        }
        Some(first) => Command::from_arg(first).ok_or_else(|| {
            eprintln!("unknown subcommand: {first}");
            print_usage();
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "unknown subcommand")
        })?,
    };

    let mut iter = argv.into_iter().skip(1);
    let parsed = Args::parse(cmd, &mut iter).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // .env and logging stay in the binary glue so services stay pure.
    dotenvy::dotenv().ok();
    init_tracing();
    let services = AppServices::from_env(Clock::system())?;

    match parsed {
        Args::Start { gender, age_range } => start(&services, gender, age_range).await,
        Args::Take { attempt } => take(&services, &attempt).await,
        Args::Result { attempt, share } => result(&services, &attempt, share).await,
    }
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(cmd: Command, args: &[&str]) -> Result<Args, ArgsError> {
        let mut iter = args.iter().map(|s| (*s).to_string());
        Args::parse(cmd, &mut iter)
    }

    #[test]
    fn start_reads_profile() {
        let args = parse(Command::Start, &["--gender", "Female", "--age", "26-50"]).unwrap();
        assert_eq!(
            args,
            Args::Start {
                gender: Gender::Female,
                age_range: AgeRange::From26To50
            }
        );
    }

    #[test]
    fn start_rejects_unknown_age() {
        let err = parse(Command::Start, &["--gender", "male", "--age", "40"]).unwrap_err();
        assert!(matches!(err, ArgsError::InvalidValue { flag: "--age", .. }));
    }

    #[test]
    fn share_flag_only_on_result() {
        let args = parse(Command::Result, &["--attempt", "x", "--share"]).unwrap();
        assert_eq!(
            args,
            Args::Result {
                attempt: "x".into(),
                share: true
            }
        );
        assert!(matches!(
            parse(Command::Take, &["--attempt", "x", "--share"]),
            Err(ArgsError::UnknownArg(_))
        ));
    }

    #[test]
    fn attempt_is_required() {
        assert!(matches!(
            parse(Command::Take, &[]),
            Err(ArgsError::MissingFlag { flag: "--attempt" })
        ));
    }
}

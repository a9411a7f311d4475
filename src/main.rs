use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use resource_stopper::config::{self, Config};
use resource_stopper::exit_codes::{self, codes};
use resource_stopper::runner;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "resource-stopper")]
#[command(
    about = "Stop running AWS resources that are not tagged KeepRunning=true",
    long_about = "resource-stopper is meant to run once a day from a scheduler.\n\nIt stops or pauses:\n  - EC2 instances\n  - SageMaker notebook instances\n  - RDS database instances\n  - RDS Aurora clusters\n  - Neptune clusters\n  - Redshift clusters\n\nAny resource tagged KeepRunning=true is left running."
)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    run: RunArgs,

    /// Configuration file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    /// Summary output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init {
        /// Where to write the config file
        #[arg(short, long, default_value = ".resource-stopper.toml")]
        path: PathBuf,
    },
}

#[derive(clap::Args)]
struct RunArgs {
    /// Log what would be stopped without stopping anything
    #[arg(long)]
    dry_run: bool,

    /// Comma-separated kinds to process, in order (e.g. ec2,rds,redshift)
    #[arg(long, value_name = "KINDS")]
    kinds: Option<String>,

    /// Use a local credentials profile and fixed region
    #[arg(
        long,
        env = "LOCAL_AWS",
        value_parser = parse_flag,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    local: Option<bool>,

    /// Credentials profile for local runs
    #[arg(long, env = "AWS_PROFILE")]
    profile: Option<String>,

    /// Region for local runs
    #[arg(long)]
    region: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

/// Accepts TRUE/true/1/yes as set, anything else as unset
fn parse_flag(raw: &str) -> std::result::Result<bool, String> {
    Ok(matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes"
    ))
}

/// Build the log subscriber writing to `writer`
///
/// `main` passes stderr: stdout is reserved for the run summary.
fn build_subscriber<W>(
    verbose: bool,
    format: LogFormat,
    writer: W,
) -> Box<dyn Subscriber + Send + Sync>
where
    W: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(writer);
    match format {
        LogFormat::Text => Box::new(builder.finish()),
        LogFormat::Json => Box::new(builder.json().finish()),
    }
}

fn init_logging(verbose: bool, format: LogFormat) {
    let subscriber = build_subscriber(verbose, format, std::io::stderr);
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to initialize logging: {}", e);
    }
}

fn apply_overrides(config: &mut Config, args: &RunArgs) -> Result<()> {
    if args.dry_run {
        config.stopper.dry_run = true;
    }
    if let Some(raw) = &args.kinds {
        config.stopper.kinds = config::parse_kind_list(raw)?;
    }
    if let Some(local) = args.local {
        config.aws.local = local;
    }
    if let Some(profile) = &args.profile {
        config.aws.profile = profile.clone();
    }
    if let Some(region) = &args.region {
        config.aws.region = region.clone();
    }
    Ok(())
}

async fn execute(cli: Cli) -> Result<i32> {
    if let Some(Commands::Init { path }) = cli.command {
        config::init_config(&path)?;
        return Ok(codes::SUCCESS);
    }

    let mut config = Config::load(cli.config.as_deref())?;
    apply_overrides(&mut config, &cli.run)?;

    let summary = runner::run(&config)
        .await
        .context("Resource stopper aborted before processing any resource kind")?;

    match cli.output {
        OutputFormat::Text => println!("{}", summary.to_table()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }
    Ok(summary.exit_code())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.log_format);

    let code = match execute(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            exit_codes::exit_code_for_anyhow(&e)
        }
    };
    std::process::exit(code);
}

#[cfg(test)]
mod tests {
    use super::*;
    use resource_stopper::ResourceKind;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl CapturedLogs {
        fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    #[test]
    fn test_init_parses_with_default_path() {
        let cli = Cli::try_parse_from(["resource-stopper", "init"]).unwrap();
        match cli.command {
            Some(Commands::Init { path }) => {
                assert_eq!(path, PathBuf::from(".resource-stopper.toml"))
            }
            None => panic!("expected init subcommand"),
        }
    }

    #[test]
    fn test_init_path_flag_and_global_output_coexist() {
        let cli = Cli::try_parse_from([
            "resource-stopper",
            "init",
            "--path",
            "x.toml",
            "--output",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.output, OutputFormat::Json));
        match cli.command {
            Some(Commands::Init { path }) => assert_eq!(path, PathBuf::from("x.toml")),
            None => panic!("expected init subcommand"),
        }
    }

    #[test]
    fn test_logs_go_to_the_configured_writer() {
        for format in [LogFormat::Text, LogFormat::Json] {
            let logs = CapturedLogs::default();
            let sink = logs.clone();
            let subscriber = build_subscriber(true, format, move || sink.clone());

            tracing::subscriber::with_default(subscriber, || {
                tracing::info!("Resolved account 123456789012");
            });

            assert!(logs.contents().contains("Resolved account 123456789012"));
        }
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "resource-stopper",
            "--dry-run",
            "--kinds",
            "redshift,ec2",
            "--local",
            "--profile",
            "sandbox",
            "--region",
            "eu-west-1",
        ])
        .unwrap();
        let mut config = Config::default();
        apply_overrides(&mut config, &cli.run).unwrap();

        assert!(config.stopper.dry_run);
        assert_eq!(
            config.stopper.kinds,
            vec![ResourceKind::Redshift, ResourceKind::Ec2]
        );
        assert!(config.aws.local);
        assert_eq!(config.aws.profile, "sandbox");
        assert_eq!(config.aws.region, "eu-west-1");
    }

    #[test]
    fn test_unknown_kind_flag_is_rejected() {
        let cli = Cli::try_parse_from(["resource-stopper", "--kinds", "ec2,lambda"]).unwrap();
        let mut config = Config::default();
        assert!(apply_overrides(&mut config, &cli.run).is_err());
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("TRUE"), Ok(true));
        assert_eq!(parse_flag("1"), Ok(true));
        assert_eq!(parse_flag("false"), Ok(false));
        assert_eq!(parse_flag(""), Ok(false));
    }
}

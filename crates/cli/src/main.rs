//! Docexec CLI - run shell commands and convert documents

mod config;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use docexec_core::application::{ArgumentEscaper, CommandRunner, ConversionService};
use docexec_core::domain::{
    Argument, Command, ConversionRequest, ExecutionOptions, ExecutionResult, InputSource,
};
use docexec_infra_system::{converter_for, LibcLocale, PathResolver, SubprocessExecutor};

use config::{expand_path, ConverterOverrides};

#[derive(Parser)]
#[command(name = "docexec")]
#[command(about = "Shell command execution engine and document converter", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program through the shell with escaped arguments
    Run(RunArgs),

    /// Convert a document with the configured converter
    Convert {
        /// Input document
        input: String,

        /// Output file
        #[arg(short, long)]
        output: String,

        #[command(flatten)]
        overrides: ConverterOverrides,
    },
}

#[derive(Args)]
struct RunArgs {
    /// Terminate the process after this many seconds (0 = no limit)
    #[arg(long, default_value = "0")]
    timeout: u64,

    /// Run without pipes, capturing stdout only
    #[arg(long)]
    blocking: bool,

    /// Keep stderr on the terminal in --blocking mode
    #[arg(long)]
    no_capture_stderr: bool,

    /// Working directory
    #[arg(long)]
    cwd: Option<String>,

    /// File piped into the process' stdin
    #[arg(long)]
    stdin_file: Option<String>,

    /// Escape arguments under this LC_CTYPE locale
    #[arg(long)]
    locale: Option<String>,

    /// Print the execution result as JSON
    #[arg(long)]
    json: bool,

    /// Program to run
    program: String,

    /// Arguments, each escaped as one token
    #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
    args: Vec<String>,
}

fn init_logging() {
    let log_format = std::env::var("DOCEXEC_LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("docexec=info"))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // Logs go to stderr so stdout stays the command's output
    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn runner() -> CommandRunner {
    CommandRunner::new(
        Arc::new(PathResolver::new()),
        Arc::new(SubprocessExecutor::new()),
    )
}

fn build_command(args: &RunArgs) -> Result<Command> {
    let mut escaper = ArgumentEscaper::default();
    if let Some(locale) = &args.locale {
        escaper = escaper.with_locale(locale.as_str(), Arc::new(LibcLocale::new()));
    }

    let options = ExecutionOptions {
        use_blocking_exec: args.blocking,
        capture_stderr: !args.no_capture_stderr,
        working_dir: args.cwd.as_deref().map(expand_path).transpose()?,
        ..Default::default()
    }
    .with_timeout_secs(args.timeout);

    let mut command = Command::new(args.program.as_str())
        .with_escaper(escaper)
        .with_options(options);
    command
        .add_args(args.args.iter().map(|a| Argument::positional(a.as_str())))
        .context("Failed to escape arguments")?;

    if let Some(path) = &args.stdin_file {
        let path = expand_path(path)?;
        let file = File::open(&path)
            .with_context(|| format!("Cannot open stdin file {}", path.display()))?;
        command.stdin(InputSource::reader(file));
    }

    Ok(command)
}

fn print_result(result: &ExecutionResult, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }

    print!("{}", result.raw_stdout());
    if result.succeeded() {
        return Ok(());
    }
    if result.timed_out() {
        eprintln!("{}", "✗ Command timed out".red().bold());
    }
    if !result.error().is_empty() {
        eprintln!("{} {}", "✗".red(), result.error());
    }
    Ok(())
}

async fn run(args: RunArgs) -> Result<i32> {
    let mut command = build_command(&args)?;
    let runner = runner();

    let result = tokio::task::spawn_blocking(move || {
        runner.execute(&mut command).map(|result| result.clone())
    })
    .await
    .context("Command task aborted")??;

    print_result(&result, args.json)?;
    Ok(result.exit_code().unwrap_or(1))
}

async fn convert(input: String, output: String, overrides: ConverterOverrides) -> Result<()> {
    let config = overrides.resolve()?;
    info!(converter = %config.kind, binary = %config.binary.display(), "Using converter");

    let options = ExecutionOptions::default().with_timeout_secs(config.timeout_secs.unwrap_or(0));
    let service = ConversionService::new(Arc::from(converter_for(&config)), runner())
        .with_options(options);

    let request = ConversionRequest::new(expand_path(&input)?, expand_path(&output)?);
    let produced: PathBuf = service
        .convert(&request)
        .await
        .with_context(|| format!("Failed to convert {}", input))?;

    println!(
        "{}",
        format!("✓ Converted to {}", produced.display()).green().bold()
    );
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => {
            let code = run(args).await?;
            std::process::exit(code);
        }
        Commands::Convert {
            input,
            output,
            overrides,
        } => convert(input, output, overrides).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_arguments_parse() {
        let cli = Cli::try_parse_from([
            "docexec", "run", "--timeout", "5", "--json", "--", "grep", "-r", "it's here",
        ])
        .unwrap();

        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };
        assert_eq!(args.timeout, 5);
        assert!(args.json);
        assert_eq!(args.program, "grep");
        assert_eq!(args.args, vec!["-r", "it's here"]);
    }

    #[test]
    fn test_build_command_escapes_each_argument() {
        let cli = Cli::try_parse_from(["docexec", "run", "--", "echo", "a b", "c"]).unwrap();
        let Commands::Run(args) = cli.command else {
            panic!("expected run");
        };

        let command = build_command(&args).unwrap();

        assert_eq!(command.args().len(), 2);
        assert_eq!(command.options().timeout, None);
        if cfg!(unix) {
            assert_eq!(command.args()[0], "'a b'");
        }
    }

    #[test]
    fn test_convert_arguments_parse() {
        let cli = Cli::try_parse_from([
            "docexec",
            "convert",
            "report.docx",
            "--output",
            "out/report.pdf",
            "--binary",
            "soffice",
        ])
        .unwrap();

        let Commands::Convert {
            input,
            output,
            overrides,
        } = cli.command
        else {
            panic!("expected convert");
        };
        assert_eq!(input, "report.docx");
        assert_eq!(output, "out/report.pdf");
        assert_eq!(overrides.binary.as_deref(), Some("soffice"));
    }
}

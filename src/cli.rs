use rowbeam::config::parse_batch_size;
use rowbeam::Config;
use std::num::NonZeroUsize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Process,
    Ages,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliArgs {
    pub command: Command,
    pub input: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub batch_size: Option<NonZeroUsize>,
    pub dry_run: bool,
}

impl CliArgs {
    /// Flags win over environment settings.
    pub fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input_path = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(size) = self.batch_size {
            config.insert_batch_size = size;
        }
        if self.dry_run {
            config.dry_run = true;
        }
    }
}

enum ParseOutcome {
    Args(CliArgs),
    Help,
}

fn usage() {
    eprintln!(
        "usage:
  rowbeam [process] [--input <path>] [--output-dir <dir>] [--batch-size <n>] [--dry-run]
  rowbeam ages
"
    );
}

fn value_for(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String, String> {
    args.next().ok_or_else(|| format!("{flag} requires a value"))
}

fn parse_args_impl(mut args: impl Iterator<Item = String>) -> Result<ParseOutcome, String> {
    let mut parsed = CliArgs {
        command: Command::Process,
        input: None,
        output_dir: None,
        batch_size: None,
        dry_run: false,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "process" => parsed.command = Command::Process,
            "ages" => parsed.command = Command::Ages,
            "--input" => parsed.input = Some(PathBuf::from(value_for("--input", &mut args)?)),
            "--output-dir" => {
                parsed.output_dir = Some(PathBuf::from(value_for("--output-dir", &mut args)?));
            }
            "--batch-size" => {
                let raw = value_for("--batch-size", &mut args)?;
                let size = parse_batch_size("--batch-size", &raw).map_err(|e| e.to_string())?;
                parsed.batch_size = Some(size);
            }
            "--dry-run" => parsed.dry_run = true,
            "-h" | "--help" | "help" => return Ok(ParseOutcome::Help),
            other => return Err(format!("unrecognized argument: {other}")),
        }
    }

    Ok(ParseOutcome::Args(parsed))
}

pub fn parse_args() -> CliArgs {
    match parse_args_impl(std::env::args().skip(1)) {
        Ok(ParseOutcome::Args(args)) => args,
        Ok(ParseOutcome::Help) => {
            usage();
            std::process::exit(0);
        }
        Err(error) => {
            eprintln!("error: {error}");
            usage();
            std::process::exit(2);
        }
    }
}

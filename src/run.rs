use crate::build::{BuildOutcome, Builder};
use crate::config::Config;
use crate::toolchain::{Javac, JdkExaminer};
use crate::{logging, trace};
use anyhow::Context;
use argh::FromArgs;
use std::path::PathBuf;

pub const EXIT_COMPILATION_ERROR: i32 = 1;
pub const EXIT_UNEXPECTED_FAILURE: i32 = 2;
pub const EXIT_ILLEGAL_ARGS: i32 = 3;

/// Recompile only the Java sources that changed, and those depending on
/// them, into an existing class directory.
#[derive(FromArgs)]
struct Args {
    /// directory of compiled classes; read as the classpath, written as output
    #[argh(positional)]
    classpath: PathBuf,

    /// directory of .java sources
    #[argh(positional)]
    sourcepath: PathBuf,
}

enum Parsed {
    Args(Args),
    Exit(i32),
}

fn parse_args(args: &[String]) -> Parsed {
    let (cmd, rest) = match args.split_first() {
        Some((cmd, rest)) => (cmd.as_str(), rest),
        None => ("incjc", args),
    };
    let rest: Vec<&str> = rest.iter().map(String::as_str).collect();
    match Args::from_args(&[cmd], &rest) {
        Ok(args) => Parsed::Args(args),
        Err(early) => match early.status {
            // --help
            Ok(()) => {
                println!("{}", early.output);
                Parsed::Exit(0)
            }
            Err(()) => {
                eprintln!("{}", early.output);
                eprintln!("Usage: incjc <classpath> <sourcepath>");
                Parsed::Exit(EXIT_ILLEGAL_ARGS)
            }
        },
    }
}

fn build(args: &Args, config: &Config) -> anyhow::Result<BuildOutcome> {
    let javac = Javac::new(config.jdk.clone());
    let examiner = JdkExaminer::new(config.jdk.clone());
    let builder = Builder::new(&javac, &examiner, &config.meta_root);
    trace::scope("build", || builder.build(&args.classpath, &args.sourcepath))
}

fn run_impl(args: &Args) -> anyhow::Result<BuildOutcome> {
    let config = Config::from_env()?;
    logging::init(config.debug);
    if let Some(path) = &config.trace_path {
        trace::open(path).with_context(|| format!("open trace {}", path.display()))?;
    }
    let result = build(args, &config);
    trace::close().context("write trace")?;
    result
}

/// Runs the command line, returning the process exit code.
pub fn run() -> i32 {
    let args: Vec<String> = std::env::args().collect();
    let args = match parse_args(&args) {
        Parsed::Args(args) => args,
        Parsed::Exit(code) => return code,
    };
    match run_impl(&args) {
        Ok(outcome) if outcome.success() => 0,
        Ok(_) => EXIT_COMPILATION_ERROR,
        Err(err) => {
            eprintln!("incjc: error: {:#}", err);
            EXIT_UNEXPECTED_FAILURE
        }
    }
}

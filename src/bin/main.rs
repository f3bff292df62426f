use clap::{ArgAction, Parser};
use log::{info, LevelFilter};
use monkeyscript::{eval::object::Object, eval::Evaluator, parse_source, repl, MonkeyError};
use simple_logger::SimpleLogger;
use std::{
    fs,
    path::{Path, PathBuf},
    process::ExitCode,
};

/// The Monkey programming language. Runs a program file, or starts an
/// interactive session when no file is given.
#[derive(Parser, Debug)]
#[command(name = "monkey", version, about, long_about = None)]
struct Args {
    /// Program to run.
    file: Option<PathBuf>,

    /// Print the parsed program instead of running it.
    #[arg(long)]
    parse_only: bool,

    /// Log more; repeat for more detail. RUST_LOG overrides this.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn main() -> ExitCode {
    let args = Args::parse();

    let level = match args.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    if let Err(e) = SimpleLogger::new().with_level(level).env().init() {
        eprintln!("could not initialize logging: {e}");
    }

    let result = match &args.file {
        Some(path) => run_file(path, args.parse_only),
        None => run_repl(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run_repl() -> Result<(), MonkeyError> {
    println!("Hello! This is the Monkey programming language!");
    println!("Feel free to type in commands");
    repl::start()?;

    Ok(())
}

fn run_file(path: &Path, parse_only: bool) -> Result<(), MonkeyError> {
    info!("running {}", path.display());

    let source = fs::read_to_string(path)?;
    let program = parse_source(&source)?;

    if parse_only {
        println!("{program}");
        return Ok(());
    }

    match Evaluator::new().eval(&program) {
        Object::Error(message) => Err(MonkeyError::Runtime(message)),
        result => {
            println!("{result}");
            Ok(())
        }
    }
}

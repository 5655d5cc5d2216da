use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};
use memmap2::Mmap;

use loxide::ast_printer::AstPrinter;
use loxide::interpreter::Interpreter;
use loxide::parser::Parser;
use loxide::resolver::Resolver;
use loxide::scanner;
use loxide::value::Value;

/// Exit code for static (lex/parse/resolve) errors.
const EXIT_STATIC_ERROR: u8 = 65;
/// Exit code for runtime errors.
const EXIT_RUNTIME_ERROR: u8 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox tree-walking interpreter", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable logging to loxide.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print each token of the input file
    Tokenize {
        filename: PathBuf,

        /// Dump the token stream as JSON instead of one token per line
        #[arg(long)]
        json: bool,
    },

    /// Parse the input file as a single expression and print its AST
    Parse { filename: PathBuf },

    /// Run the input file as a program
    Run { filename: PathBuf },
}

/// Map the script read-only; the scanner and every token lexeme borrow
/// straight from the mapping.
fn map_file(filename: &Path) -> Result<Mmap> {
    info!("Mapping file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;

    // SAFETY: the mapping is read-only and lives for the whole run; we
    // accept the usual caveat that an external truncation of the file
    // mid-run is undefined.
    let mmap = unsafe { Mmap::map(&file) }.context(format!("Failed to map file {:?}", filename))?;

    info!("Mapped {} bytes from {:?}", mmap.len(), filename);

    Ok(mmap)
}

fn init_logger(enabled: bool) -> Result<()> {
    if !enabled {
        Builder::new().filter_level(log::LevelFilter::Off).init();

        return Ok(());
    }

    let log_file = File::create("loxide.log").context("Failed to create loxide.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("loxide::")
                .unwrap_or(record.module_path().unwrap_or("<unnamed>"));

            writeln!(
                buf,
                "[{}:{}] - {}",
                module,
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(log_file)))
        .filter(None, log::LevelFilter::Debug)
        .init();

    info!("Logger initialized, writing to loxide.log");

    Ok(())
}

/// Seconds since the Unix epoch, as a Lox number.
fn clock_native<'a>(_args: &[Value<'a>]) -> std::result::Result<Value<'a>, String> {
    Ok(Value::Number(
        chrono::Utc::now().timestamp_millis() as f64 / 1000.0,
    ))
}

fn tokenize(source: &[u8], json: bool) -> Result<ExitCode> {
    let (tokens, errors) = scanner::scan(source);

    for e in &errors {
        eprintln!("{}", e);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&tokens)?);
    } else {
        for token in &tokens {
            println!("{}", token);
        }
    }

    if !errors.is_empty() {
        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    Ok(ExitCode::SUCCESS)
}

fn parse(source: &[u8]) -> Result<ExitCode> {
    let (tokens, errors) = scanner::scan(source);

    for e in &errors {
        eprintln!("{}", e);
    }

    let mut parser = Parser::new(&tokens);

    let result = parser.parse_expression();

    // non-fatal diagnostics accumulate even when an expression came back
    for e in parser.errors() {
        eprintln!("{}", e);
    }

    match result {
        Ok(expr) => {
            println!("{}", AstPrinter::print(&expr));

            if errors.is_empty() && parser.errors().is_empty() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::from(EXIT_STATIC_ERROR))
            }
        }

        Err(e) => {
            eprintln!("{}", e);

            Ok(ExitCode::from(EXIT_STATIC_ERROR))
        }
    }
}

fn run(source: &[u8]) -> Result<ExitCode> {
    let (tokens, lex_errors) = scanner::scan(source);

    let mut parser = Parser::new(&tokens);
    let statements = parser.parse();

    debug!("Parsed {} statement(s)", statements.len());

    let (locals, resolve_errors) = Resolver::new().resolve(&statements);

    // every static error from every pass is reported before evaluation
    let mut had_static_error = false;

    for e in lex_errors
        .iter()
        .chain(parser.errors())
        .chain(resolve_errors.iter())
    {
        had_static_error = true;

        eprintln!("{}", e);
    }

    if had_static_error {
        debug!("Static errors found, skipping evaluation");

        return Ok(ExitCode::from(EXIT_STATIC_ERROR));
    }

    let mut interpreter = Interpreter::new();

    // host-supplied global bindings
    interpreter.globals().borrow_mut().define(
        "clock",
        Value::NativeFunction {
            name: "clock".to_string(),
            arity: 0,
            func: clock_native,
        },
    );

    if let Err(e) = interpreter.interpret(&statements, locals) {
        eprintln!("{}", e);

        return Ok(ExitCode::from(EXIT_RUNTIME_ERROR));
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> Result<ExitCode> {
    let args: Cli = Cli::parse();

    init_logger(args.log)?;

    info!("CLI arguments: {:?}", args);

    match args.command {
        Commands::Tokenize { filename, json } => {
            let mmap = map_file(&filename)?;

            tokenize(&mmap, json)
        }

        Commands::Parse { filename } => {
            let mmap = map_file(&filename)?;

            parse(&mmap)
        }

        Commands::Run { filename } => {
            let mmap = map_file(&filename)?;

            run(&mmap)
        }
    }
}

use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use rslox::ast_printer::AstPrinter;
use rslox::error::LoxError;
use rslox::interpreter::Interpreter;
use rslox::parser::Parser;
use rslox::resolver::Resolver;
use rslox::scanner::Scanner;
use rslox::stmt::Stmt;

/// Static (lex/parse/resolve) errors.
const EXIT_STATIC: i32 = 65;
/// Runtime errors.
const EXIT_RUNTIME: i32 = 70;

#[derive(ClapParser, Debug)]
#[command(version, about = "Lox language interpreter", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Tokenizes input from a file, printing each token
    Tokenize { filename: PathBuf },

    /// Parses input from a file and prints each declaration's AST
    Parse { filename: PathBuf },

    /// Runs input from a file as a Lox program
    Run { filename: PathBuf },

    /// Starts an interactive read-eval-print loop
    Repl,
}

/// Reads the contents of a file into a String.
fn read_file(filename: &PathBuf) -> Result<String> {
    info!("Reading file: {:?}", filename);

    let file = File::open(filename).context(format!("Failed to open file {:?}", filename))?;
    let mut reader = BufReader::new(file);
    let mut source = String::new();

    let bytes = reader
        .read_to_string(&mut source)
        .context(format!("Failed to read file {:?}", filename))?;

    info!("Read {} bytes from {:?}", bytes, filename);

    Ok(source)
}

fn init_logger() -> Result<()> {
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("rslox::")
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

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Scan + parse, reporting every accumulated front-end error.
fn parse_source(source: &str) -> std::result::Result<Vec<Stmt>, Vec<LoxError>> {
    let (tokens, lex_errors) = Scanner::scan_all(source);
    if !lex_errors.is_empty() {
        return Err(lex_errors);
    }

    Parser::new(tokens).parse()
}

/// Full pipeline for one program: scan → parse → resolve → interpret.
/// Returns the exit code to use, 0 on success.
fn run_source(source: &str) -> i32 {
    let statements = match parse_source(source) {
        Ok(statements) => statements,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            return EXIT_STATIC;
        }
    };

    let locals = match Resolver::new().resolve(&statements) {
        Ok(locals) => locals,
        Err(errors) => {
            for e in &errors {
                eprintln!("{}", e);
            }
            return EXIT_STATIC;
        }
    };

    let mut interpreter = Interpreter::new();
    match interpreter.interpret(&statements, locals) {
        Ok(()) => 0,
        Err(e) => {
            debug!("Runtime failure: {}", e);
            eprintln!("{}", e);
            EXIT_RUNTIME
        }
    }
}

fn repl() -> Result<()> {
    let stdin = io::stdin();
    let mut line = String::new();

    loop {
        print!("> ");
        io::stdout().flush()?;

        line.clear();
        if stdin.read_line(&mut line)? == 0 {
            break; // EOF
        }

        // Errors are reported but never end the session.  Each line gets a
        // fresh interpreter, matching the original front end.
        run_source(&line);
    }

    Ok(())
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    if args.log {
        init_logger()?;
    } else {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tokenize { filename } => {
            let source = read_file(&filename)?;
            let (tokens, errors) = Scanner::scan_all(&source);

            for e in &errors {
                eprintln!("{}", e);
            }
            for token in &tokens {
                println!("{}", token);
            }

            if !errors.is_empty() {
                std::process::exit(EXIT_STATIC);
            }
        }

        Commands::Parse { filename } => {
            let source = read_file(&filename)?;

            match parse_source(&source) {
                Ok(statements) => {
                    for stmt in &statements {
                        if let Stmt::Expression(expr) | Stmt::Print(expr) = stmt {
                            println!("{}", AstPrinter::print(expr));
                        } else {
                            println!("{:?}", stmt);
                        }
                    }
                }
                Err(errors) => {
                    for e in &errors {
                        eprintln!("{}", e);
                    }
                    std::process::exit(EXIT_STATIC);
                }
            }
        }

        Commands::Run { filename } => {
            let source = read_file(&filename)?;

            let code = run_source(&source);
            if code != 0 {
                std::process::exit(code);
            }
        }

        Commands::Repl => {
            repl()?;
        }
    }

    Ok(())
}

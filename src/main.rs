use std::fs::File;
use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser as ClapParser;
use clap::Subcommand;
use env_logger::Builder;
use log::{debug, info};

use cmm_interpreter as cmm;

use cmm::ast::Expr;
use cmm::ast_printer::AstPrinter;
use cmm::error::InterpError;
use cmm::frontend;
use cmm::interpreter::{exit_status, run_on_large_stack};
use cmm::parser::parse_ast;

#[derive(ClapParser, Debug)]
#[command(version, about = "Tree-walking interpreter for front-end AST output", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    commands: Commands,

    /// Enable logging to app.log
    #[arg(long, global = true)]
    log: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Builds the tree from AST text and prints it
    Tree {
        /// AST text file; stdin when omitted
        filename: Option<PathBuf>,

        /// Print the raw node tree as JSON instead of an S-expression
        #[arg(long)]
        json: bool,
    },

    /// Interprets a program and exits with the low byte of its integer result.
    /// Errors exit with 65 (bad input) or 70 (runtime), which a program can
    /// also return; errors additionally print a message to stderr
    Run {
        /// AST text file, or the source file when --frontend is given; stdin when omitted
        filename: Option<PathBuf>,

        /// Front-end command that turns source on stdin into AST text (e.g. ./mycc)
        #[arg(long)]
        frontend: Option<String>,

        /// Echo the AST lines before running
        #[arg(long)]
        debug: bool,
    },
}

/// Reads a file, or stdin when no file is given, into a String
fn read_input(filename: Option<PathBuf>) -> Result<String> {
    let mut buf = String::new();

    match filename {
        Some(filename) => {
            info!("Reading file: {:?}", filename);
            let file =
                File::open(&filename).context(format!("Failed to open file {:?}", filename))?;
            BufReader::new(file)
                .read_to_string(&mut buf)
                .context(format!("Failed to read file {:?}", filename))?;
        }
        None => {
            info!("Reading stdin");
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
        }
    }

    info!("Read {} bytes", buf.len());

    Ok(buf)
}

fn init_logger() -> Result<()> {
    // Create or open the log file
    let log_file = File::create("app.log").context("Failed to create app.log")?;

    // Configure env_logger to write to file with module and source line
    Builder::new()
        .format(|buf, record| {
            let module = record
                .module_path()
                .unwrap_or("<unnamed>")
                .strip_prefix("cmm_interpreter::")
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
        .filter(None, log::LevelFilter::Debug) // Default to Debug, override with RUST_LOG
        .parse_default_env()
        .init();

    info!("Logger initialized, writing to app.log");
    Ok(())
}

/// Prints `err` and exits: 65 for bad input, 70 for runtime failures.
fn fail(err: InterpError) -> ! {
    debug!("Failure debug: {:?}", err);
    eprintln!("{}", err);

    if err.is_input_error() {
        std::process::exit(65);
    }
    std::process::exit(70);
}

fn main() -> Result<()> {
    let args: Cli = Cli::parse();

    // Initialize logger only if --log flag is provided
    if args.log {
        init_logger()?;
    } else {
        // Initialize a minimal logger to avoid "no logger" errors
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Off)
            .init();
    }

    info!("CLI arguments: {:?}", args);

    match args.commands {
        Commands::Tree { filename, json } => {
            info!("Running Tree subcommand");
            let text = read_input(filename)?;
            let root = parse_ast(&text).unwrap_or_else(|e| fail(e));

            if json {
                println!("{}", serde_json::to_string_pretty(&root)?);
            } else {
                let program = Expr::lower(&root).unwrap_or_else(|e| fail(e));
                println!("{}", AstPrinter.print(&program));
            }

            info!("Tree subcommand completed");
        }

        Commands::Run {
            filename,
            frontend: command,
            debug,
        } => {
            info!("Running Run subcommand");

            let text = match command {
                Some(command) => {
                    let source = filename.context("--frontend needs a source file")?;
                    frontend::compile(&command, &source).unwrap_or_else(|e| fail(e))
                }
                None => read_input(filename)?,
            };

            if debug {
                for line in text.lines() {
                    println!("{}", line);
                }
            }

            let root = parse_ast(&text).unwrap_or_else(|e| fail(e));
            let (result, _) = run_on_large_stack(root, io::stdout()).unwrap_or_else(|e| fail(e));

            info!("Program finished with: {:?}", result);

            std::process::exit(exit_status(result));
        }
    }

    Ok(())
}

// ABOUTME: Command-line driver: run mode, build mode, and the interactive prompt

use clap::{Parser as ClapParser, Subcommand};
use loxide::codegen::IrCompiler;
use loxide::config;
use loxide::error::Reporter;
use loxide::highlighter::LoxHelper;
use loxide::interpreter::Interpreter;
use loxide::parser::Parser;
use loxide::resolver::Resolver;
use loxide::scanner::Scanner;
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Interpreter and LLVM IR compiler for a Lox-flavored scripting language
#[derive(ClapParser, Debug)]
#[command(name = "loxide")]
#[command(version = config::VERSION)]
#[command(about = "A tree-walking interpreter and LLVM IR compiler")]
struct CliArgs {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse, resolve and interpret a script
    Run {
        /// Script file to execute
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Lower a script to an LLVM module at ./output.ll
    Build {
        /// Script file to compile
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

fn main() -> ExitCode {
    let args = CliArgs::parse();

    let status = match args.command {
        Some(Command::Run { file }) => run_file(&file),
        Some(Command::Build { file }) => build_file(&file),
        None => run_prompt(),
    };
    ExitCode::from(status)
}

/// Execute a script file, mapping reporter flags to exit codes.
fn run_file(path: &Path) -> u8 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(status) => return status,
    };

    let mut reporter = Reporter::new();
    let mut interpreter = Interpreter::new();
    run(&source, &mut interpreter, &mut reporter);

    if reporter.had_error {
        return config::EXIT_COMPILE_ERROR;
    }
    if reporter.had_runtime_error {
        return config::EXIT_RUNTIME_ERROR;
    }
    0
}

/// Lower a script file to LLVM IR, echoing the module and writing it to
/// the output file.
fn build_file(path: &Path) -> u8 {
    let source = match read_source(path) {
        Ok(source) => source,
        Err(status) => return status,
    };

    let mut reporter = Reporter::new();
    let tokens = Scanner::new(&source, &mut reporter).scan_tokens();
    let statements = Parser::new(tokens, &mut reporter).parse();
    if reporter.had_error {
        reporter.report();
        return config::EXIT_COMPILE_ERROR;
    }

    let mut compiler = IrCompiler::new();
    let module = compiler.compile(&statements);
    print!("{}", module);
    if let Err(error) = fs::write(config::IR_OUTPUT_FILE, module) {
        eprintln!("Failed to write {}: {}", config::IR_OUTPUT_FILE, error);
        return config::EXIT_IO_ERROR;
    }
    0
}

fn read_source(path: &Path) -> Result<String, u8> {
    fs::read_to_string(path).map_err(|error| {
        eprintln!("Failed to open file {}: {}", path.display(), error);
        config::EXIT_IO_ERROR
    })
}

/// One trip through the pipeline: scan, parse, resolve, interpret.
/// Each stage stops the run if the previous one reported errors.
fn run(source: &str, interpreter: &mut Interpreter, reporter: &mut Reporter) {
    let tokens = Scanner::new(source, reporter).scan_tokens();
    let statements = Parser::new(tokens, reporter).parse();
    // Stop if there was a syntax error.
    if reporter.had_error {
        reporter.report();
        return;
    }

    Resolver::new(interpreter, reporter).resolve(&statements);
    // Stop if there was a resolution error.
    if reporter.had_error {
        reporter.report();
        return;
    }

    interpreter.interpret(&statements, reporter);
    if reporter.had_runtime_error {
        reporter.report();
    }
}

/// Interactive prompt. Definitions persist across lines; error flags are
/// reset after each one.
fn run_prompt() -> u8 {
    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl: Editor<LoxHelper, DefaultHistory> = match Editor::with_config(rl_config) {
        Ok(editor) => editor,
        Err(error) => {
            eprintln!("Failed to initialize REPL: {}", error);
            return 1;
        }
    };
    rl.set_helper(Some(LoxHelper::new()));
    let _ = rl.load_history(config::HISTORY_FILE);

    println!("{} v{}", config::WELCOME_MESSAGE, config::VERSION);
    println!("{}", config::WELCOME_FOOTER);

    let mut interpreter = Interpreter::new();
    let mut reporter = Reporter::new();

    loop {
        match rl.readline(config::PROMPT) {
            Ok(line) => {
                if line.trim().is_empty() {
                    continue;
                }
                run(&line, &mut interpreter, &mut reporter);
                reporter.reset();
                reporter.had_runtime_error = false;
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(error) => {
                eprintln!("Error: {}", error);
                break;
            }
        }
    }

    let _ = rl.save_history(config::HISTORY_FILE);
    0
}

use crate::config::{Config, OutputFormat};
use crate::error::{CompilerError, ErrorStore};
use crate::lexer::{Lexer, LexerOptions};
use crate::parser::Parser;
use crate::report::Report;
use clap::{Parser as ClapParser, Subcommand};
use std::fs;
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod error;
mod functions;
mod lexer;
mod parser;
mod report;
mod similarity;
mod stream;
mod token;

#[cfg(test)]
mod adversarial_tests;

#[derive(ClapParser)]
#[command(author, version, about = "Lua syntax checker")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check a Lua file: report every error, or list the declared functions
    Check {
        /// Lua source file; asked for on stdin when omitted
        file: Option<PathBuf>,
        /// Output format
        #[arg(long, value_enum)]
        format: Option<OutputFormat>,
        /// Similarity above which an unexpected token is read as a typo
        #[arg(long)]
        threshold: Option<f64>,
        /// Skip Lua comments
        #[arg(long)]
        comments: bool,
        /// Exit with status 1 when errors are found
        #[arg(long)]
        deny_errors: bool,
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Print the token stream of a Lua file
    Tokens {
        file: PathBuf,
        /// Skip Lua comments
        #[arg(long)]
        comments: bool,
    },
    /// Manage luaparse configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
        /// Config file to use instead of the default location
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Show the effective configuration
    Show,
    /// Write a config file with defaults
    Init,
    /// Print the config file location
    Path,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

fn lexer_options(config: &Config) -> LexerOptions {
    LexerOptions {
        lua_comments: config.lua_comments,
    }
}

/// Runs the lexer and parser over `source`.
fn check_source(source: &str, config: &Config) -> Report {
    let mut errors = ErrorStore::new();

    let tokens = Lexer::new(source, &mut errors)
        .with_options(lexer_options(config))
        .tokenize();

    let functions = Parser::new(tokens, &mut errors)
        .with_threshold(config.similarity_threshold)
        .parse();

    Report::new(&errors, functions)
}

fn read_source(path: &Path) -> Result<String, CompilerError> {
    fs::read_to_string(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => CompilerError::FileNotFound(path.to_path_buf()),
        _ => CompilerError::Io(e),
    })
}

fn process_lua_file(path: &Path, config: &Config) -> Result<Report, CompilerError> {
    let source = read_source(path)?;
    info!(file = %path.display(), "checking");

    let report = check_source(&source, config);
    info!(
        errors = report.errors.len(),
        functions = report.functions.len(),
        "checked"
    );
    Ok(report)
}

fn prompt_filename() -> Result<PathBuf, CompilerError> {
    println!("Give filename:");
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(PathBuf::from(line.trim()))
}

fn run(cli: Cli) -> Result<ExitCode, CompilerError> {
    match cli.command {
        Commands::Check {
            file,
            format,
            threshold,
            comments,
            deny_errors,
            config,
        } => {
            let mut settings = Config::load(config.as_deref())?;
            if let Some(format) = format {
                settings.format = format;
            }
            if let Some(threshold) = threshold {
                settings.similarity_threshold = threshold;
            }
            settings.lua_comments |= comments;
            settings.validate()?;

            let path = match file {
                Some(path) => path,
                None => prompt_filename()?,
            };

            let report = process_lua_file(&path, &settings)?;
            match settings.format {
                OutputFormat::Text => print!("{}", report),
                OutputFormat::Json => println!("{}", report.to_json()?),
            }

            if deny_errors && report.has_errors() {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Tokens { file, comments } => {
            let source = read_source(&file)?;
            let mut errors = ErrorStore::new();
            let tokens = Lexer::new(&source, &mut errors)
                .with_options(LexerOptions { lua_comments: comments })
                .tokenize();

            for token in &tokens {
                println!(
                    "{} {}..{} {} {}",
                    token.line,
                    token.position,
                    token.position + token.width,
                    token.kind,
                    token.value
                );
            }
            for diagnostic in errors.diagnostics() {
                println!("{}", diagnostic);
            }
        }
        Commands::Config { command, config } => {
            let path = config.unwrap_or_else(Config::get_config_path);
            match command {
                ConfigCommands::Show => {
                    let settings = Config::load(Some(&path)).or_else(|e| match e {
                        CompilerError::FileNotFound(_) => Ok(Config::default()),
                        e => Err(e),
                    })?;
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                }
                ConfigCommands::Init => {
                    if path.exists() {
                        println!("Config file already exists at: {}", path.display());
                        println!("Remove it to reinitialize.");
                    } else {
                        Config::default().save(&path)?;
                        println!("Initialized new config file at: {}", path.display());
                    }
                }
                ConfigCommands::Path => println!("{}", path.display()),
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{}", err);
            ExitCode::FAILURE
        }
    }
}

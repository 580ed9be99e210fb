use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;

use bellaciao::ast::printer;
use bellaciao::error::CompileError;
use bellaciao::interpreter::{Evaluator, Workspace};
use bellaciao::parser::Parser as BellaParser;
use bellaciao::scanner;

#[derive(Parser, Debug)]
#[command(
    name = "bellaciao",
    about = "The BellaCiao scripting language - 'La Casa de Papel' edition"
)]
struct Cli {
    /// BellaCiao source file to run (omit for the interactive shell)
    file: Option<PathBuf>,

    /// Dump tokens and exit
    #[arg(long)]
    dump_tokens: bool,

    /// Dump AST and exit
    #[arg(long)]
    dump_ast: bool,

    /// AST output format
    #[arg(long, default_value = "sexp", value_parser = ["sexp", "json"])]
    ast_format: String,
}

fn read_source(cli: &Cli) -> Result<String> {
    match &cli.file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("read source file '{}'", path.display())),
        None => bail!("source file required for this operation"),
    }
}

fn source_name(cli: &Cli) -> String {
    cli.file
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "<script>".to_string())
}

fn report_compile_error(error: CompileError, name: &str, source: &str) -> anyhow::Error {
    let report = miette::Report::new(error.with_source_code(name, source));
    eprintln!("{report:?}");
    anyhow::anyhow!("compilation failed")
}

fn run_source(source: &str, name: &str) -> Result<()> {
    let tokens = scanner::scan(source).map_err(|e| report_compile_error(e, name, source))?;
    let program = BellaParser::new(tokens)
        .parse()
        .map_err(|e| report_compile_error(e, name, source))?;
    let mut workspace = Workspace::new();
    let mut evaluator = Evaluator::new();
    evaluator
        .evaluate(&program, &mut workspace.env, &mut workspace.blocks)
        .map_err(|e| anyhow::anyhow!(e.display_with_line(source)))?;
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.dump_tokens {
        let source = read_source(&cli)?;
        let tokens = scanner::scan(&source)
            .map_err(|e| report_compile_error(e, &source_name(&cli), &source))?;
        for token in &tokens {
            println!("{token}");
        }
        return Ok(());
    }

    if cli.dump_ast {
        let source = read_source(&cli)?;
        let name = source_name(&cli);
        let tokens =
            scanner::scan(&source).map_err(|e| report_compile_error(e, &name, &source))?;
        let program = BellaParser::new(tokens)
            .parse()
            .map_err(|e| report_compile_error(e, &name, &source))?;
        match cli.ast_format.as_str() {
            "json" => print!("{}", printer::to_json(&program)),
            _ => print!("{}", printer::to_sexp(&program)),
        }
        return Ok(());
    }

    match cli.file {
        Some(_) => {
            let source = read_source(&cli)?;
            run_source(&source, &source_name(&cli))
        }
        None => {
            bellaciao::repl::run_repl();
            Ok(())
        }
    }
}

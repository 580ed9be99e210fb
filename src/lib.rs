pub mod ast;
pub mod error;
pub mod interpreter;
pub mod parser;
pub mod repl;
pub mod scanner;

// Re-export error types for convenience
pub use error::{CompileError, Error, RuntimeError};

use interpreter::{Evaluator, ValueSeq, Workspace};

/// Scan, parse, and evaluate one batch of source against a workspace,
/// returning one value sequence per top-level statement. Print output
/// goes to stdout; the workspace keeps whatever state was written
/// before an error, if any.
pub fn run(source: &str, workspace: &mut Workspace) -> Result<Vec<ValueSeq>, Error> {
    let tokens = scanner::scan(source)?;
    let program = parser::Parser::new(tokens).parse()?;
    let mut evaluator = Evaluator::new();
    Ok(evaluator.evaluate(&program, &mut workspace.env, &mut workspace.blocks)?)
}

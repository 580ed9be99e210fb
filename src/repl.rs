use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

use crate::ast::Stmt;
use crate::interpreter::builtins::Builtin;
use crate::interpreter::{Evaluator, Workspace};
use crate::parser::Parser;
use crate::scanner;

/// Run the interactive shell. The workspace persists across lines until
/// `clear` swaps in a fresh one.
pub fn run_repl() {
    println!("BellaCiao Programming Language - 'La Casa de Papel' Edition");
    println!("Type 'exit' to quit, 'help' for commands, or start planning your heist!");

    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("cannot start line editor: {e}");
            return;
        }
    };
    let mut evaluator = Evaluator::new();
    let mut workspace = Workspace::new();

    loop {
        let line = match editor.readline(">>> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => {
                println!("Ciao! The heist is over.");
                break;
            }
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        };

        let code = line.trim();
        if code.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(code);

        if code.eq_ignore_ascii_case("exit") {
            println!("Ciao! The heist is over.");
            break;
        } else if code.eq_ignore_ascii_case("help") {
            show_help();
        } else if code.eq_ignore_ascii_case("clear") {
            workspace = Workspace::new();
            println!("Workspace cleared. Start a new heist!");
        } else {
            run_line(code, &mut evaluator, &mut workspace);
        }
    }
}

fn run_line(code: &str, evaluator: &mut Evaluator, workspace: &mut Workspace) {
    let tokens = match scanner::scan(code) {
        Ok(tokens) => tokens,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };
    let program = match Parser::new(tokens).parse() {
        Ok(program) => program,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };
    let results = match evaluator.evaluate(&program, &mut workspace.env, &mut workspace.blocks) {
        Ok(results) => results,
        Err(e) => {
            println!("Error: {e}");
            return;
        }
    };

    // print statements already wrote their lines through the evaluator;
    // only assignment and heist-definition results get echoed here
    for (statement, values) in program.statements.iter().zip(&results) {
        if echoes_result(statement) {
            for value in values {
                println!("{value}");
            }
        }
    }
}

fn echoes_result(statement: &Stmt) -> bool {
    matches!(statement, Stmt::Assign(_) | Stmt::Heist(_))
}

fn show_help() {
    println!("\nBellaCiao Language Commands:");
    println!("{}", help_line("exit", "Exit the BellaCiao shell"));
    println!("{}", help_line("help", "Show this help message"));
    println!("{}", help_line("clear", "Clear the current workspace"));
    println!("\nBuilt-in Functions:");
    for builtin in Builtin::ALL {
        println!("{}", help_line(builtin.name(), builtin.description()));
    }
    println!("\nExample:");
    println!("  heist royal_mint plan");
    println!("    print \"Team leader:\";");
    println!("    print professor;");
    println!("    print \"Escape route:\";");
    println!("    print escape_route;");
    println!("  end;");
    println!("  execute royal_mint;");
    println!();
}

/// Pad short names to a 14-column gutter; longer names just get a
/// separating space.
fn help_line(name: &str, description: &str) -> String {
    if name.len() < 14 {
        format!("  {name:<14}- {description}")
    } else {
        format!("  {name} - {description}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_line(source: &str) -> Vec<Stmt> {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens)
            .parse()
            .expect("parse should succeed")
            .statements
    }

    #[test]
    fn assignments_and_heists_echo() {
        let statements = parse_line("x = 1; heist v plan print 1; end");
        assert!(echoes_result(&statements[0]));
        assert!(echoes_result(&statements[1]));
    }

    #[test]
    fn printing_statements_do_not_echo() {
        let statements = parse_line(
            "print 1; execute v; if 1 { print 2; } while 0 { print 3; }",
        );
        for statement in &statements {
            assert!(!echoes_result(statement));
        }
    }

    #[test]
    fn help_line_pads_short_names() {
        assert_eq!(
            help_line("exit", "Exit the BellaCiao shell"),
            "  exit          - Exit the BellaCiao shell"
        );
    }

    #[test]
    fn help_line_keeps_long_names_flush() {
        assert_eq!(
            help_line("police_response_time", "Get estimated police response time"),
            "  police_response_time - Get estimated police response time"
        );
    }
}

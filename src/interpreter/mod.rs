pub mod builtins;
pub mod environment;
pub mod value;

use std::collections::HashMap;
use std::io::Write;

use crate::ast::*;
use crate::error::RuntimeError;
use crate::interpreter::environment::Environment;
use crate::interpreter::value::Value;
use crate::scanner::token::Span;

/// The values produced by one top-level statement. Simple statements
/// yield a single value; `execute`, `if`, and `while` yield the
/// flattened values of every statement they ran.
pub type ValueSeq = Vec<Value>;

/// Named plan bodies, populated by `heist` definitions and read back by
/// `execute`. Redefining a name replaces the stored body silently.
#[derive(Debug, Default)]
pub struct BlockRegistry {
    blocks: HashMap<String, Vec<Stmt>>,
}

impl BlockRegistry {
    pub fn new() -> Self {
        Self {
            blocks: HashMap::new(),
        }
    }

    pub fn define(&mut self, name: String, body: Vec<Stmt>) {
        self.blocks.insert(name, body);
    }

    pub fn get(&self, name: &str) -> Option<Vec<Stmt>> {
        self.blocks.get(name).cloned()
    }
}

/// All mutable interpreter state: the variable environment plus the
/// stored plans. "Clear workspace" means constructing a fresh one, not
/// resetting fields in place.
#[derive(Debug, Default)]
pub struct Workspace {
    pub env: Environment,
    pub blocks: BlockRegistry,
}

impl Workspace {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct Evaluator {
    output: Vec<String>,
    /// Writer for print output (allows testing without stdout)
    writer: Box<dyn Write>,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            output: Vec::new(),
            writer: Box::new(std::io::stdout()),
        }
    }

    /// Create an evaluator that captures output (for testing).
    #[cfg(test)]
    fn new_capturing() -> Self {
        Self {
            output: Vec::new(),
            writer: Box::new(Vec::<u8>::new()),
        }
    }

    /// Evaluate each top-level statement in order, one value sequence
    /// per statement. An error aborts the remaining statements of the
    /// batch; state already written to `env` or `blocks` stays put.
    pub fn evaluate(
        &mut self,
        program: &Program,
        env: &mut Environment,
        blocks: &mut BlockRegistry,
    ) -> Result<Vec<ValueSeq>, RuntimeError> {
        let mut results = Vec::with_capacity(program.statements.len());
        for statement in &program.statements {
            results.push(self.execute_stmt(statement, env, blocks)?);
        }
        Ok(results)
    }

    /// Lines printed so far, in order.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    fn execute_stmt(
        &mut self,
        stmt: &Stmt,
        env: &mut Environment,
        blocks: &mut BlockRegistry,
    ) -> Result<ValueSeq, RuntimeError> {
        match stmt {
            Stmt::Assign(a) => {
                let value = self.evaluate_expr(&a.value, env)?;
                env.define(a.name.clone(), value.clone());
                Ok(vec![value])
            }
            Stmt::Print(p) => {
                let value = self.evaluate_expr(&p.expression, env)?;
                let text = format!("{value}");
                writeln!(self.writer, "{text}").expect("write should succeed");
                self.output.push(text);
                Ok(vec![value])
            }
            Stmt::Heist(h) => {
                blocks.define(h.name.clone(), h.body.clone());
                Ok(vec![Value::Str(format!("heist '{}' planned", h.name))])
            }
            Stmt::Execute(e) => {
                let body = blocks
                    .get(&e.name)
                    .ok_or_else(|| RuntimeError::UndefinedBlock {
                        name: e.name.clone(),
                        span: e.span,
                    })?;
                // the stored body sees whatever the environment holds at
                // invocation time, not a definition-time snapshot
                self.run_body(&body, env, blocks)
            }
            Stmt::If(i) => {
                let condition = self.evaluate_expr(&i.condition, env)?;
                if condition.is_truthy() {
                    self.run_body(&i.then_body, env, blocks)
                } else if let Some(ref else_body) = i.else_body {
                    self.run_body(else_body, env, blocks)
                } else {
                    Ok(Vec::new())
                }
            }
            Stmt::While(w) => {
                let mut values = Vec::new();
                while self.evaluate_expr(&w.condition, env)?.is_truthy() {
                    values.extend(self.run_body(&w.body, env, blocks)?);
                }
                Ok(values)
            }
        }
    }

    fn run_body(
        &mut self,
        body: &[Stmt],
        env: &mut Environment,
        blocks: &mut BlockRegistry,
    ) -> Result<ValueSeq, RuntimeError> {
        let mut values = Vec::new();
        for statement in body {
            values.extend(self.execute_stmt(statement, env, blocks)?);
        }
        Ok(values)
    }

    fn evaluate_expr(&self, expr: &Expr, env: &Environment) -> Result<Value, RuntimeError> {
        match expr {
            Expr::Literal(l) => Ok(match &l.value {
                LiteralValue::Int(n) => Value::Int(*n),
                LiteralValue::Float(n) => Value::Float(*n),
                LiteralValue::Str(s) => Value::Str(s.clone()),
            }),
            Expr::Grouping(g) => self.evaluate_expr(&g.expression, env),
            Expr::Variable(v) => look_up_variable(&v.name, v.span, env),
            Expr::Binary(b) => {
                // both operands evaluate eagerly, left first
                let left = self.evaluate_expr(&b.left, env)?;
                let right = self.evaluate_expr(&b.right, env)?;
                match b.operator {
                    BinOp::Add => add_values(left, right, b.span),
                    BinOp::Subtract => arithmetic(
                        "subtract",
                        left,
                        right,
                        |a, c| a.wrapping_sub(c),
                        |a, c| a - c,
                        b.span,
                    ),
                    BinOp::Multiply => arithmetic(
                        "multiply",
                        left,
                        right,
                        |a, c| a.wrapping_mul(c),
                        |a, c| a * c,
                        b.span,
                    ),
                    BinOp::Divide => divide_values(left, right, b.span),
                }
            }
            Expr::Comparison(c) => {
                let left = self.evaluate_expr(&c.left, env)?;
                let right = self.evaluate_expr(&c.right, env)?;
                compare_values(c.operator, left, right, c.span)
            }
        }
    }
}

/// Environment first, builtin table second, so an assignment shadows a
/// builtin of the same name until the workspace is cleared.
fn look_up_variable(name: &str, span: Span, env: &Environment) -> Result<Value, RuntimeError> {
    if let Some(value) = env.get(name) {
        return Ok(value);
    }
    if let Some(builtin) = builtins::lookup(name) {
        return Ok(builtin.call());
    }
    Err(RuntimeError::UndefinedVariable {
        name: name.to_string(),
        span,
    })
}

/// `+` concatenates two strings; everything else takes the numeric
/// path.
fn add_values(left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Str(a), Value::Str(b)) => Ok(Value::Str(format!("{a}{b}"))),
        (left, right) => {
            arithmetic("add", left, right, |a, c| a.wrapping_add(c), |a, c| a + c, span)
        }
    }
}

/// Int with Int stays in i64 and wraps at the boundary; any Float
/// operand promotes the operation to f64.
fn arithmetic(
    verb: &str,
    left: Value,
    right: Value,
    int_op: fn(i64, i64) -> i64,
    float_op: fn(f64, f64) -> f64,
    span: Span,
) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Int(int_op(a, b))),
        (Value::Float(a), Value::Float(b)) => Ok(Value::Float(float_op(a, b))),
        (Value::Int(a), Value::Float(b)) => Ok(Value::Float(float_op(a as f64, b))),
        (Value::Float(a), Value::Int(b)) => Ok(Value::Float(float_op(a, b as f64))),
        (l, r) => Err(type_error(verb, &l, &r, span)),
    }
}

/// Division always produces a Float, even for two Int operands, and a
/// zero divisor of either kind is an error before any native division
/// runs, so no Inf or NaN can escape.
fn divide_values(left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero { span })
            } else {
                Ok(Value::Float(a as f64 / b as f64))
            }
        }
        (Value::Float(a), Value::Float(b)) => {
            if b == 0.0 {
                Err(RuntimeError::DivisionByZero { span })
            } else {
                Ok(Value::Float(a / b))
            }
        }
        (Value::Int(a), Value::Float(b)) => {
            if b == 0.0 {
                Err(RuntimeError::DivisionByZero { span })
            } else {
                Ok(Value::Float(a as f64 / b))
            }
        }
        (Value::Float(a), Value::Int(b)) => {
            if b == 0 {
                Err(RuntimeError::DivisionByZero { span })
            } else {
                Ok(Value::Float(a / b as f64))
            }
        }
        (l, r) => Err(type_error("divide", &l, &r, span)),
    }
}

/// Int pairs compare in i64, so values past the f64 precision limit
/// stay distinct; a Float on either side promotes both to f64. Strings
/// compare lexicographically. Any string with a number, equality
/// included, is a type error rather than a silent coercion.
fn compare_values(op: CmpOp, left: Value, right: Value, span: Span) -> Result<Value, RuntimeError> {
    match (&left, &right) {
        (Value::Int(a), Value::Int(b)) => Ok(Value::Bool(cmp_holds(op, a, b))),
        (Value::Int(_) | Value::Float(_), Value::Int(_) | Value::Float(_)) => {
            Ok(Value::Bool(cmp_holds(op, as_f64(&left), as_f64(&right))))
        }
        (Value::Str(a), Value::Str(b)) => Ok(Value::Bool(cmp_holds(op, a, b))),
        (l, r) => Err(type_error("compare", l, r, span)),
    }
}

fn cmp_holds<T: PartialOrd>(op: CmpOp, a: T, b: T) -> bool {
    match op {
        CmpOp::Equal => a == b,
        CmpOp::NotEqual => a != b,
        CmpOp::Less => a < b,
        CmpOp::LessEqual => a <= b,
        CmpOp::Greater => a > b,
        CmpOp::GreaterEqual => a >= b,
    }
}

fn as_f64(value: &Value) -> f64 {
    match value {
        Value::Int(n) => *n as f64,
        Value::Float(n) => *n,
        _ => unreachable!("only called on numeric values"),
    }
}

fn type_error(verb: &str, left: &Value, right: &Value, span: Span) -> RuntimeError {
    RuntimeError::Type {
        message: format!(
            "cannot {verb} {} and {}",
            left.type_name(),
            right.type_name()
        ),
        span,
    }
}

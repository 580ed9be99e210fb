use crate::ast::*;
use crate::error::CompileError;
use crate::scanner::token::{Span, Token, TokenKind};

/// Which construct a statement list belongs to. The kind decides what
/// ends the list and when a trailing ';' may be omitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BodyKind {
    TopLevel,
    Braced,
    Plan,
}

pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    pub fn parse(mut self) -> Result<Program, CompileError> {
        let statements = self.statement_list(BodyKind::TopLevel)?;
        Ok(Program { statements })
    }

    fn statement_list(&mut self, body: BodyKind) -> Result<Vec<Stmt>, CompileError> {
        let mut statements = Vec::new();
        while !self.at_body_end(body) {
            if self.match_token(TokenKind::Semicolon) {
                continue;
            }
            // tolerate a stray 'end' left over from the lookahead dialect
            if body == BodyKind::TopLevel && self.match_token(TokenKind::End) {
                continue;
            }
            let statement = self.statement()?;
            let needs_semicolon = matches!(
                statement,
                Stmt::Assign(_) | Stmt::Print(_) | Stmt::Execute(_)
            );
            statements.push(statement);
            if needs_semicolon {
                self.end_of_statement(body)?;
            }
        }
        Ok(statements)
    }

    fn at_body_end(&self, body: BodyKind) -> bool {
        if self.is_at_end() {
            return true;
        }
        match body {
            BodyKind::TopLevel => false,
            BodyKind::Braced => self.check(TokenKind::RightBrace),
            BodyKind::Plan => self.check(TokenKind::End) || self.check(TokenKind::Execute),
        }
    }

    fn end_of_statement(&mut self, body: BodyKind) -> Result<(), CompileError> {
        if self.match_token(TokenKind::Semicolon) || self.at_body_end(body) {
            return Ok(());
        }
        Err(self.unexpected("';' after statement"))
    }

    fn statement(&mut self) -> Result<Stmt, CompileError> {
        match self.peek().kind {
            TokenKind::Print => self.print_statement(),
            TokenKind::Heist => self.heist_statement(),
            TokenKind::Execute => self.execute_statement(),
            TokenKind::If => self.if_statement(),
            TokenKind::While => self.while_statement(),
            TokenKind::Identifier => self.assign_statement(),
            _ => Err(self.unexpected("a statement")),
        }
    }

    fn assign_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        let name = self.expect_identifier("variable name")?;
        self.consume(TokenKind::Assign, "'=' after variable name")?;
        let value = self.expression()?;
        let span = self.span_from(start);
        Ok(Stmt::Assign(AssignStmt { name, value, span }))
    }

    fn print_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'print'
        let expression = self.expression()?;
        let span = self.span_from(start);
        Ok(Stmt::Print(PrintStmt { expression, span }))
    }

    fn heist_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'heist'
        let name = self.expect_identifier("heist name")?;
        self.consume(TokenKind::Plan, "'plan' after heist name")?;
        let body = self.statement_list(BodyKind::Plan)?;
        // 'end' closes the plan; an upcoming 'execute' or the end of input
        // also stops it and is left for the enclosing list.
        self.match_token(TokenKind::End);
        let span = self.span_from(start);
        Ok(Stmt::Heist(HeistStmt { name, body, span }))
    }

    fn execute_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'execute'
        let name = self.expect_identifier("heist name after 'execute'")?;
        let span = self.span_from(start);
        Ok(Stmt::Execute(ExecuteStmt { name, span }))
    }

    fn if_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'if'
        let condition = self.condition()?;
        let then_body = self.braced_body("if body")?;
        let else_body = if self.match_token(TokenKind::Else) {
            Some(self.braced_body("else body")?)
        } else {
            None
        };
        let span = self.span_from(start);
        Ok(Stmt::If(IfStmt {
            condition,
            then_body,
            else_body,
            span,
        }))
    }

    fn while_statement(&mut self) -> Result<Stmt, CompileError> {
        let start = self.current_span();
        self.advance(); // consume 'while'
        let condition = self.condition()?;
        let body = self.braced_body("while body")?;
        let span = self.span_from(start);
        Ok(Stmt::While(WhileStmt {
            condition,
            body,
            span,
        }))
    }

    fn braced_body(&mut self, context: &str) -> Result<Vec<Stmt>, CompileError> {
        self.consume(TokenKind::LeftBrace, &format!("'{{' before {context}"))?;
        let body = self.statement_list(BodyKind::Braced)?;
        self.consume(TokenKind::RightBrace, &format!("'}}' after {context}"))?;
        Ok(body)
    }

    /// A condition is one expression, optionally compared against a second.
    /// At most one comparison is allowed, so `1 < 2 < 3` does not parse.
    fn condition(&mut self) -> Result<Expr, CompileError> {
        let left = self.expression()?;
        let Some(op) = self.match_comparison_op() else {
            return Ok(left);
        };
        let right = self.expression()?;
        let span = Span::new(
            left.span().offset,
            right.span().offset + right.span().len - left.span().offset,
        );
        Ok(Expr::Comparison(ComparisonExpr {
            left: Box::new(left),
            operator: op,
            right: Box::new(right),
            span,
        }))
    }

    fn expression(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.term()?;
        while let Some(op) = self.match_binary_op(&[TokenKind::Plus, TokenKind::Minus]) {
            let right = self.term()?;
            let span = Span::new(
                expr.span().offset,
                right.span().offset + right.span().len - expr.span().offset,
            );
            expr = Expr::Binary(BinaryExpr {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn term(&mut self) -> Result<Expr, CompileError> {
        let mut expr = self.factor()?;
        while let Some(op) = self.match_binary_op(&[TokenKind::Star, TokenKind::Slash]) {
            let right = self.factor()?;
            let span = Span::new(
                expr.span().offset,
                right.span().offset + right.span().len - expr.span().offset,
            );
            expr = Expr::Binary(BinaryExpr {
                left: Box::new(expr),
                operator: op,
                right: Box::new(right),
                span,
            });
        }
        Ok(expr)
    }

    fn factor(&mut self) -> Result<Expr, CompileError> {
        let token = self.peek().clone();
        match token.kind {
            TokenKind::Number => {
                self.advance();
                let value = number_literal_value(&token)?;
                Ok(Expr::Literal(LiteralExpr {
                    value,
                    span: token.span,
                }))
            }
            TokenKind::Str => {
                self.advance();
                Ok(Expr::Literal(LiteralExpr {
                    value: LiteralValue::Str(token.lexeme),
                    span: token.span,
                }))
            }
            TokenKind::Identifier => {
                self.advance();
                Ok(Expr::Variable(VariableExpr {
                    name: token.lexeme,
                    span: token.span,
                }))
            }
            TokenKind::LeftParen => {
                self.advance();
                let expr = self.expression()?;
                self.consume(TokenKind::RightParen, "')' after expression")?;
                let span = Span::new(
                    token.span.offset,
                    self.previous_span().offset + self.previous_span().len - token.span.offset,
                );
                Ok(Expr::Grouping(GroupingExpr {
                    expression: Box::new(expr),
                    span,
                }))
            }
            _ => Err(self.unexpected("an expression")),
        }
    }

    // --- Helper methods ---

    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    fn is_at_end(&self) -> bool {
        self.peek().kind == TokenKind::Eof
    }

    fn advance(&mut self) -> &Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        &self.tokens[self.current - 1]
    }

    fn check(&self, kind: TokenKind) -> bool {
        self.peek().kind == kind
    }

    fn match_token(&mut self, kind: TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn match_binary_op(&mut self, kinds: &[TokenKind]) -> Option<BinOp> {
        for &kind in kinds {
            if self.check(kind) {
                self.advance();
                return Some(token_to_binary_op(kind));
            }
        }
        None
    }

    fn match_comparison_op(&mut self) -> Option<CmpOp> {
        let op = match self.peek().kind {
            TokenKind::EqualEqual => CmpOp::Equal,
            TokenKind::BangEqual => CmpOp::NotEqual,
            TokenKind::Less => CmpOp::Less,
            TokenKind::LessEqual => CmpOp::LessEqual,
            TokenKind::Greater => CmpOp::Greater,
            TokenKind::GreaterEqual => CmpOp::GreaterEqual,
            _ => return None,
        };
        self.advance();
        Some(op)
    }

    fn consume(&mut self, kind: TokenKind, message: &str) -> Result<&Token, CompileError> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.unexpected(message))
        }
    }

    fn expect_identifier(&mut self, context: &str) -> Result<String, CompileError> {
        if self.check(TokenKind::Identifier) {
            let token = self.advance().clone();
            Ok(token.lexeme)
        } else {
            Err(self.unexpected(context))
        }
    }

    fn unexpected(&self, expected: &str) -> CompileError {
        let token = self.peek();
        let found = if token.kind == TokenKind::Eof {
            "end of input".to_string()
        } else {
            format!("'{}'", token.lexeme)
        };
        CompileError::parse(
            format!("expected {expected}, found {found}"),
            token.span.offset,
            token.span.len.max(1),
        )
    }

    fn current_span(&self) -> Span {
        self.peek().span
    }

    fn previous_span(&self) -> Span {
        self.tokens[self.current - 1].span
    }

    fn span_from(&self, start: Span) -> Span {
        let prev = self.previous_span();
        Span::new(start.offset, prev.offset + prev.len - start.offset)
    }
}

fn token_to_binary_op(kind: TokenKind) -> BinOp {
    match kind {
        TokenKind::Plus => BinOp::Add,
        TokenKind::Minus => BinOp::Subtract,
        TokenKind::Star => BinOp::Multiply,
        TokenKind::Slash => BinOp::Divide,
        _ => unreachable!("only called with matched operator tokens"),
    }
}

/// A lexeme containing '.' is a float, anything else an int, matching
/// the scanner's digits-plus-optional-fraction rule.
fn number_literal_value(token: &Token) -> Result<LiteralValue, CompileError> {
    if token.lexeme.contains('.') {
        let value: f64 = token
            .lexeme
            .parse()
            .expect("scanner guarantees valid float");
        Ok(LiteralValue::Float(value))
    } else {
        token.lexeme.parse::<i64>().map(LiteralValue::Int).map_err(|_| {
            CompileError::parse(
                format!("integer literal '{}' is out of range", token.lexeme),
                token.span.offset,
                token.span.len,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scanner;
    use rstest::rstest;

    fn parse_ok(source: &str) -> Program {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens).parse().expect("parse should succeed")
    }

    fn parse_err(source: &str) -> String {
        let tokens = scanner::scan(source).expect("scan should succeed");
        Parser::new(tokens)
            .parse()
            .expect_err("parse should fail")
            .to_string()
    }

    fn parse_sexp(source: &str) -> String {
        let program = parse_ok(source);
        crate::ast::printer::to_sexp(&program).trim().to_string()
    }

    #[test]
    fn precedence_add_mul() {
        assert_eq!(parse_sexp("x = 1 + 2 * 3;"), "(= x (+ 1 (* 2 3)))");
    }

    #[test]
    fn precedence_group() {
        assert_eq!(parse_sexp("x = (1 + 2) * 3;"), "(= x (* (group (+ 1 2)) 3))");
    }

    #[test]
    fn division_is_left_associative() {
        assert_eq!(parse_sexp("x = 8 / 2 / 2;"), "(= x (/ (/ 8 2) 2))");
    }

    #[test]
    fn print_statement() {
        assert_eq!(parse_sexp("print \"go\";"), "(print \"go\")");
    }

    #[test]
    fn assignment() {
        assert_eq!(parse_sexp("x = 42;"), "(= x 42)");
    }

    #[test]
    fn float_literal() {
        assert_eq!(parse_sexp("x = 3.14;"), "(= x 3.14)");
    }

    #[test]
    fn trailing_dot_is_a_float() {
        assert_eq!(parse_sexp("x = 3.;"), "(= x 3.0)");
    }

    #[test]
    fn last_statement_without_semicolon() {
        assert_eq!(parse_sexp("x = 1"), "(= x 1)");
    }

    #[test]
    fn stray_semicolons_skipped() {
        let program = parse_ok(";; x = 1; ;");
        assert_eq!(program.statements.len(), 1);
    }

    #[test]
    fn heist_closed_by_end() {
        assert_eq!(
            parse_sexp("heist vault plan print \"go\"; end"),
            "(heist vault (print \"go\"))"
        );
    }

    #[test]
    fn heist_closed_by_execute_lookahead() {
        let sexp = parse_sexp("heist vault plan print \"go\"; execute vault;");
        assert_eq!(sexp, "(heist vault (print \"go\"))\n(execute vault)");
    }

    #[test]
    fn heist_closed_by_end_of_input() {
        assert_eq!(
            parse_sexp("heist vault plan print \"go\";"),
            "(heist vault (print \"go\"))"
        );
    }

    #[test]
    fn empty_plan() {
        assert_eq!(parse_sexp("heist idle plan end"), "(heist idle)");
    }

    #[test]
    fn nested_heists() {
        assert_eq!(
            parse_sexp("heist outer plan heist inner plan print \"i\"; end; end"),
            "(heist outer (heist inner (print \"i\")))"
        );
    }

    #[test]
    fn stray_end_at_top_level_is_skipped() {
        let sexp = parse_sexp("heist vault plan print \"go\"; execute vault; end;");
        assert_eq!(sexp, "(heist vault (print \"go\"))\n(execute vault)");
    }

    #[test]
    fn execute_inside_braces_stays_in_the_plan() {
        // the execute lookahead closes a plan only at plan depth, not
        // inside an if or while body
        assert_eq!(
            parse_sexp("heist a plan if 1 { execute b; } end"),
            "(heist a (if 1 (then (execute b))))"
        );
    }

    #[test]
    fn if_else() {
        assert_eq!(
            parse_sexp("if 1 > 2 { print \"a\"; } else { print \"b\"; }"),
            "(if (> 1 2) (then (print \"a\")) (else (print \"b\")))"
        );
    }

    #[test]
    fn if_without_else() {
        assert_eq!(
            parse_sexp("if x { print \"t\"; }"),
            "(if x (then (print \"t\")))"
        );
    }

    #[test]
    fn while_loop() {
        assert_eq!(
            parse_sexp("while i < 3 { i = i + 1; }"),
            "(while (< i 3) (= i (+ i 1)))"
        );
    }

    #[test]
    fn last_statement_in_braces_without_semicolon() {
        assert_eq!(
            parse_sexp("if 1 < 2 { x = 1 }"),
            "(if (< 1 2) (then (= x 1)))"
        );
    }

    #[rstest]
    #[case("==", "(== 1 2)")]
    #[case("!=", "(!= 1 2)")]
    #[case("<", "(< 1 2)")]
    #[case("<=", "(<= 1 2)")]
    #[case(">", "(> 1 2)")]
    #[case(">=", "(>= 1 2)")]
    fn comparison_operators(#[case] op: &str, #[case] expected: &str) {
        let sexp = parse_sexp(&format!("if 1 {op} 2 {{ }}"));
        assert_eq!(sexp, format!("(if {expected} (then))"));
    }

    #[test]
    fn missing_semicolon_between_statements() {
        let message = parse_err("x = 1 y = 2");
        assert!(message.contains("expected ';' after statement, found 'y'"));
    }

    #[test]
    fn missing_assign() {
        let message = parse_err("x 1;");
        assert!(message.contains("expected '=' after variable name, found '1'"));
    }

    #[test]
    fn missing_value_after_assign() {
        let message = parse_err("x =");
        assert!(message.contains("expected an expression, found end of input"));
    }

    #[test]
    fn chained_comparison_rejected() {
        let message = parse_err("if 1 < 2 < 3 { }");
        assert!(message.contains("expected '{' before if body, found '<'"));
    }

    #[test]
    fn bare_expression_rejected() {
        let message = parse_err("1 + 2;");
        assert!(message.contains("expected a statement, found '1'"));
    }

    #[test]
    fn missing_heist_name() {
        let message = parse_err("heist plan end");
        assert!(message.contains("expected heist name, found 'plan'"));
    }

    #[test]
    fn missing_plan_keyword() {
        let message = parse_err("heist vault print 1; end");
        assert!(message.contains("expected 'plan' after heist name, found 'print'"));
    }

    #[test]
    fn execute_without_name() {
        let message = parse_err("execute;");
        assert!(message.contains("expected heist name after 'execute', found ';'"));
    }

    #[test]
    fn unclosed_brace() {
        let message = parse_err("if 1 < 2 { print \"a\";");
        assert!(message.contains("expected '}' after if body, found end of input"));
    }

    #[test]
    fn stray_right_brace() {
        let message = parse_err("}");
        assert!(message.contains("expected a statement, found '}'"));
    }

    #[test]
    fn integer_literal_out_of_range() {
        let message = parse_err("x = 99999999999999999999;");
        assert!(message.contains("out of range"));
    }

    #[test]
    fn json_output_is_valid() {
        let program = parse_ok("loot = 988;");
        let json = crate::ast::printer::to_json(&program);
        let _: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");
    }
}

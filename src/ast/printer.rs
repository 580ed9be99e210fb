use crate::ast::*;

pub fn to_sexp(program: &Program) -> String {
    let mut buf = String::new();
    for stmt in &program.statements {
        sexp_stmt(&mut buf, stmt);
        buf.push('\n');
    }
    buf
}

pub fn to_json(program: &Program) -> String {
    serde_json::to_string_pretty(program).expect("AST should be serializable")
}

fn sexp_stmt(buf: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::Assign(a) => {
            buf.push_str("(= ");
            buf.push_str(&a.name);
            buf.push(' ');
            sexp_expr(buf, &a.value);
            buf.push(')');
        }
        Stmt::Print(p) => {
            buf.push_str("(print ");
            sexp_expr(buf, &p.expression);
            buf.push(')');
        }
        Stmt::Heist(h) => {
            buf.push_str("(heist ");
            buf.push_str(&h.name);
            for stmt in &h.body {
                buf.push(' ');
                sexp_stmt(buf, stmt);
            }
            buf.push(')');
        }
        Stmt::Execute(e) => {
            buf.push_str("(execute ");
            buf.push_str(&e.name);
            buf.push(')');
        }
        Stmt::If(i) => {
            buf.push_str("(if ");
            sexp_expr(buf, &i.condition);
            buf.push_str(" (then");
            for stmt in &i.then_body {
                buf.push(' ');
                sexp_stmt(buf, stmt);
            }
            buf.push(')');
            if let Some(ref else_body) = i.else_body {
                buf.push_str(" (else");
                for stmt in else_body {
                    buf.push(' ');
                    sexp_stmt(buf, stmt);
                }
                buf.push(')');
            }
            buf.push(')');
        }
        Stmt::While(w) => {
            buf.push_str("(while ");
            sexp_expr(buf, &w.condition);
            for stmt in &w.body {
                buf.push(' ');
                sexp_stmt(buf, stmt);
            }
            buf.push(')');
        }
    }
}

fn sexp_expr(buf: &mut String, expr: &Expr) {
    match expr {
        Expr::Binary(b) => {
            buf.push('(');
            buf.push_str(&b.operator.to_string());
            buf.push(' ');
            sexp_expr(buf, &b.left);
            buf.push(' ');
            sexp_expr(buf, &b.right);
            buf.push(')');
        }
        Expr::Comparison(c) => {
            buf.push('(');
            buf.push_str(&c.operator.to_string());
            buf.push(' ');
            sexp_expr(buf, &c.left);
            buf.push(' ');
            sexp_expr(buf, &c.right);
            buf.push(')');
        }
        Expr::Literal(l) => match &l.value {
            LiteralValue::Int(n) => buf.push_str(&format!("{n}")),
            LiteralValue::Float(n) => {
                // always show at least one decimal place for floats
                if n.fract() == 0.0 && n.is_finite() {
                    buf.push_str(&format!("{n:.1}"));
                } else {
                    buf.push_str(&format!("{n}"));
                }
            }
            LiteralValue::Str(s) => {
                buf.push('"');
                buf.push_str(s);
                buf.push('"');
            }
        },
        Expr::Grouping(g) => {
            buf.push_str("(group ");
            sexp_expr(buf, &g.expression);
            buf.push(')');
        }
        Expr::Variable(v) => buf.push_str(&v.name),
    }
}

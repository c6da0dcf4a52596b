//! Regenerating source text from nodes.
//!
//! Trace records carry the source text of the call or assignment that
//! produced them. The producer's original text is gone by the time nodes
//! reach the interpreter, so it is rebuilt here: compact, precedence-aware,
//! and preferring the parser-supplied `raw` spelling for literals.

use std::fmt::Write;

use ecow::EcoString;

use crate::ast::{
    Expr, ForInTarget, ForInit, Function, Literal, LiteralValue, LogicalOp,
    PropertyKey, Stmt, VarDeclaration,
};

/// Regenerate the source text of an expression.
pub fn unparse(expr: &Expr) -> EcoString {
    let mut out = String::new();
    write_expr(&mut out, expr, 0);
    out.into()
}

/// Write `expr`, parenthesized if it binds looser than `min`.
fn write_expr(out: &mut String, expr: &Expr, min: u8) {
    let prec = precedence(expr);
    if prec < min {
        out.push('(');
        write_expr(out, expr, 0);
        out.push(')');
        return;
    }

    match expr {
        Expr::ThisExpression { .. } => out.push_str("this"),
        Expr::Identifier(ident) => out.push_str(&ident.name),
        Expr::Literal(literal) => write_literal(out, literal),
        Expr::ArrayExpression { elements, .. } => {
            out.push('[');
            for (i, element) in elements.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                if let Some(element) = element {
                    write_expr(out, element, 3);
                }
            }
            out.push(']');
        }
        Expr::ObjectExpression { properties, .. } => {
            out.push('{');
            for (i, property) in properties.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                match &property.key {
                    PropertyKey::Identifier(ident) => out.push_str(&ident.name),
                    PropertyKey::Literal(literal) => write_literal(out, literal),
                }
                out.push_str(": ");
                write_expr(out, &property.value, 3);
            }
            out.push('}');
        }
        Expr::FunctionExpression(function) => write_function(out, function),
        Expr::UnaryExpression { operator, argument, .. } => {
            let op = operator.as_str();
            out.push_str(op);
            if op.chars().all(|c| c.is_ascii_alphabetic()) {
                out.push(' ');
            }
            // Nested prefixes are parenthesized so `-(-x)` never prints as a
            // decrement.
            write_expr(out, argument, 16);
        }
        Expr::UpdateExpression { operator, argument, prefix, .. } => {
            if *prefix {
                out.push_str(operator.as_str());
                write_expr(out, argument, 15);
            } else {
                write_expr(out, argument, 16);
                out.push_str(operator.as_str());
            }
        }
        Expr::BinaryExpression { operator, left, right, .. } => {
            let prec = operator.precedence();
            write_expr(out, left, prec);
            write!(out, " {} ", operator.as_str()).unwrap();
            write_expr(out, right, prec + 1);
        }
        Expr::LogicalExpression { operator, left, right, .. } => {
            write_expr(out, left, prec);
            write!(out, " {} ", operator.as_str()).unwrap();
            write_expr(out, right, prec + 1);
        }
        Expr::AssignmentExpression { operator, left, right, .. } => {
            write_expr(out, left, 16);
            write!(out, " {} ", operator.as_str()).unwrap();
            write_expr(out, right, 3);
        }
        Expr::ConditionalExpression { test, consequent, alternate, .. } => {
            write_expr(out, test, 5);
            out.push_str(" ? ");
            write_expr(out, consequent, 3);
            out.push_str(" : ");
            write_expr(out, alternate, 3);
        }
        Expr::MemberExpression { object, property, computed, .. } => {
            write_expr(out, object, 17);
            if *computed {
                out.push('[');
                write_expr(out, property, 0);
                out.push(']');
            } else {
                out.push('.');
                write_expr(out, property, 0);
            }
        }
        Expr::CallExpression { callee, arguments, .. } => {
            write_expr(out, callee, 17);
            write_args(out, arguments);
        }
        Expr::NewExpression { callee, arguments, .. } => {
            out.push_str("new ");
            write_expr(out, callee, 17);
            write_args(out, arguments);
        }
        Expr::SequenceExpression { expressions, .. } => {
            for (i, expression) in expressions.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_expr(out, expression, 3);
            }
        }
    }
}

fn write_args(out: &mut String, arguments: &[Expr]) {
    out.push('(');
    for (i, argument) in arguments.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_expr(out, argument, 3);
    }
    out.push(')');
}

fn write_literal(out: &mut String, literal: &Literal) {
    if let Some(raw) = &literal.raw {
        out.push_str(raw);
    } else if let Some(regex) = &literal.regex {
        write!(out, "/{}/{}", regex.pattern, regex.flags).unwrap();
    } else {
        match &literal.value {
            LiteralValue::Null => out.push_str("null"),
            LiteralValue::Bool(b) => write!(out, "{b}").unwrap(),
            LiteralValue::Num(n) => write!(out, "{n}").unwrap(),
            LiteralValue::Str(s) => write!(out, "{s:?}").unwrap(),
            LiteralValue::Object(_) => out.push_str("{}"),
        }
    }
}

fn write_function(out: &mut String, function: &Function) {
    out.push_str("function");
    if let Some(id) = &function.id {
        out.push(' ');
        out.push_str(&id.name);
    }
    out.push('(');
    for (i, param) in function.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&param.name);
    }
    out.push_str(") ");
    write_block(out, &function.body.body);
}

fn write_block(out: &mut String, body: &[Stmt]) {
    out.push('{');
    for stmt in body {
        out.push(' ');
        write_stmt(out, stmt);
    }
    out.push_str(" }");
}

/// Write a statement on a single line.
fn write_stmt(out: &mut String, stmt: &Stmt) {
    match stmt {
        Stmt::ExpressionStatement { expression } => {
            write_expr(out, expression, 0);
            out.push(';');
        }
        Stmt::BlockStatement { body } => write_block(out, body),
        Stmt::EmptyStatement {} => out.push(';'),
        Stmt::ReturnStatement { argument } => {
            out.push_str("return");
            if let Some(argument) = argument {
                out.push(' ');
                write_expr(out, argument, 0);
            }
            out.push(';');
        }
        Stmt::LabeledStatement { label, body } => {
            write!(out, "{}: ", label.name).unwrap();
            write_stmt(out, body);
        }
        Stmt::BreakStatement { label } => {
            out.push_str("break");
            if let Some(label) = label {
                write!(out, " {}", label.name).unwrap();
            }
            out.push(';');
        }
        Stmt::ContinueStatement { label } => {
            out.push_str("continue");
            if let Some(label) = label {
                write!(out, " {}", label.name).unwrap();
            }
            out.push(';');
        }
        Stmt::IfStatement { test, consequent, alternate } => {
            out.push_str("if (");
            write_expr(out, test, 0);
            out.push_str(") ");
            write_stmt(out, consequent);
            if let Some(alternate) = alternate {
                out.push_str(" else ");
                write_stmt(out, alternate);
            }
        }
        Stmt::SwitchStatement { discriminant, cases } => {
            out.push_str("switch (");
            write_expr(out, discriminant, 0);
            out.push_str(") {");
            for case in cases {
                match &case.test {
                    Some(test) => {
                        out.push_str(" case ");
                        write_expr(out, test, 0);
                        out.push(':');
                    }
                    None => out.push_str(" default:"),
                }
                for stmt in &case.consequent {
                    out.push(' ');
                    write_stmt(out, stmt);
                }
            }
            out.push_str(" }");
        }
        Stmt::ThrowStatement { argument } => {
            out.push_str("throw ");
            write_expr(out, argument, 0);
            out.push(';');
        }
        Stmt::TryStatement { block, handler, finalizer } => {
            out.push_str("try ");
            write_block(out, &block.body);
            if let Some(handler) = handler {
                write!(out, " catch ({}) ", handler.param.name).unwrap();
                write_block(out, &handler.body.body);
            }
            if let Some(finalizer) = finalizer {
                out.push_str(" finally ");
                write_block(out, &finalizer.body);
            }
        }
        Stmt::WhileStatement { test, body } => {
            out.push_str("while (");
            write_expr(out, test, 0);
            out.push_str(") ");
            write_stmt(out, body);
        }
        Stmt::DoWhileStatement { body, test } => {
            out.push_str("do ");
            write_stmt(out, body);
            out.push_str(" while (");
            write_expr(out, test, 0);
            out.push_str(");");
        }
        Stmt::ForStatement { init, test, update, body } => {
            out.push_str("for (");
            match init {
                Some(ForInit::Declaration(declaration)) => {
                    write_declaration(out, declaration)
                }
                Some(ForInit::Expr(expression)) => write_expr(out, expression, 0),
                None => {}
            }
            out.push_str("; ");
            if let Some(test) = test {
                write_expr(out, test, 0);
            }
            out.push_str("; ");
            if let Some(update) = update {
                write_expr(out, update, 0);
            }
            out.push_str(") ");
            write_stmt(out, body);
        }
        Stmt::ForInStatement { left, right, body } => {
            out.push_str("for (");
            match left {
                ForInTarget::Declaration(declaration) => {
                    write_declaration(out, declaration)
                }
                ForInTarget::Ident(ident) => out.push_str(&ident.name),
            }
            out.push_str(" in ");
            write_expr(out, right, 0);
            out.push_str(") ");
            write_stmt(out, body);
        }
        Stmt::FunctionDeclaration(function) => write_function(out, function),
        Stmt::VariableDeclaration(declaration) => {
            write_declaration(out, declaration);
            out.push(';');
        }
    }
}

fn write_declaration(out: &mut String, declaration: &VarDeclaration) {
    write!(out, "{} ", declaration.kind).unwrap();
    for (i, declarator) in declaration.declarations.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        out.push_str(&declarator.id.name);
        if let Some(init) = &declarator.init {
            out.push_str(" = ");
            write_expr(out, init, 3);
        }
    }
}

/// How tightly an expression binds, on the usual JavaScript scale.
fn precedence(expr: &Expr) -> u8 {
    match expr {
        Expr::SequenceExpression { .. } => 1,
        Expr::AssignmentExpression { .. } => 3,
        Expr::ConditionalExpression { .. } => 4,
        Expr::LogicalExpression { operator, .. } => match operator {
            LogicalOp::Or => 5,
            LogicalOp::And => 6,
        },
        Expr::BinaryExpression { operator, .. } => operator.precedence(),
        Expr::UnaryExpression { .. } => 15,
        Expr::UpdateExpression { prefix, .. } => {
            if *prefix {
                15
            } else {
                16
            }
        }
        Expr::CallExpression { .. }
        | Expr::NewExpression { .. }
        | Expr::MemberExpression { .. } => 17,
        Expr::ThisExpression { .. }
        | Expr::ArrayExpression { .. }
        | Expr::ObjectExpression { .. }
        | Expr::FunctionExpression(_)
        | Expr::Identifier(_)
        | Expr::Literal(_) => 18,
    }
}

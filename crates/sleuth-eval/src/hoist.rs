use ecow::EcoString;
use rustc_hash::FxHashSet;
use sleuth_library::foundations::Value;
use sleuth_syntax::ast;

use crate::Vm;

/// Install every name the statement list hoists as `undefined` in the
/// current scope. Function declarations get their values right afterwards,
/// when the statement loop binds them.
pub(crate) fn install(vm: &mut Vm, stmts: &[ast::Stmt]) {
    for name in collect(stmts) {
        vm.define(name, Value::Undefined);
    }
}

/// Collect the names a statement list hoists: `var` declarations and
/// function declarations, recursing through control-flow statements but
/// never into nested functions.
pub(crate) fn collect(stmts: &[ast::Stmt]) -> Vec<EcoString> {
    let mut names = Vec::new();
    let mut seen = FxHashSet::default();
    for stmt in stmts {
        collect_stmt(stmt, &mut names, &mut seen);
    }
    names
}

fn collect_stmt(
    stmt: &ast::Stmt,
    names: &mut Vec<EcoString>,
    seen: &mut FxHashSet<EcoString>,
) {
    match stmt {
        ast::Stmt::FunctionDeclaration(function) => {
            if let Some(id) = &function.id {
                push(&id.name, names, seen);
            }
        }
        ast::Stmt::VariableDeclaration(declaration) if declaration.kind == "var" => {
            for declarator in &declaration.declarations {
                push(&declarator.id.name, names, seen);
            }
        }
        ast::Stmt::BlockStatement { body } => {
            for stmt in body {
                collect_stmt(stmt, names, seen);
            }
        }
        ast::Stmt::IfStatement { consequent, alternate, .. } => {
            collect_stmt(consequent, names, seen);
            if let Some(alternate) = alternate {
                collect_stmt(alternate, names, seen);
            }
        }
        ast::Stmt::SwitchStatement { cases, .. } => {
            for case in cases {
                for stmt in &case.consequent {
                    collect_stmt(stmt, names, seen);
                }
            }
        }
        ast::Stmt::TryStatement { block, handler, finalizer } => {
            for stmt in &block.body {
                collect_stmt(stmt, names, seen);
            }
            if let Some(handler) = handler {
                for stmt in &handler.body.body {
                    collect_stmt(stmt, names, seen);
                }
            }
            if let Some(finalizer) = finalizer {
                for stmt in &finalizer.body {
                    collect_stmt(stmt, names, seen);
                }
            }
        }
        ast::Stmt::ForStatement { init, body, .. } => {
            if let Some(ast::ForInit::Declaration(declaration)) = init
                && declaration.kind == "var"
            {
                for declarator in &declaration.declarations {
                    push(&declarator.id.name, names, seen);
                }
            }
            collect_stmt(body, names, seen);
        }
        ast::Stmt::ForInStatement { left, body, .. } => {
            if let ast::ForInTarget::Declaration(declaration) = left
                && declaration.kind == "var"
            {
                for declarator in &declaration.declarations {
                    push(&declarator.id.name, names, seen);
                }
            }
            collect_stmt(body, names, seen);
        }
        ast::Stmt::WhileStatement { body, .. }
        | ast::Stmt::DoWhileStatement { body, .. } => {
            collect_stmt(body, names, seen);
        }
        _ => {}
    }
}

fn push(name: &EcoString, names: &mut Vec<EcoString>, seen: &mut FxHashSet<EcoString>) {
    if seen.insert(name.clone()) {
        names.push(name.clone());
    }
}

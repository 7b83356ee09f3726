//! Default traversal for `Visitor`.

use super::Visitor;
use crate::tree::{Expression, Node, NodeId, Statement, Tree};

pub fn walk_tree<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree) {
    for root in tree.roots() {
        visitor.visit_statement(tree, *root);
    }
}

pub fn walk_statement<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) {
    match tree.statement(id) {
        Some(Statement::Return(_)) => visitor.visit_return(tree, id),
        Some(Statement::Expression(_)) => visitor.visit_expression_statement(tree, id),
        Some(Statement::Assign { .. }) => visitor.visit_assign(tree, id),
        Some(Statement::If { .. }) => visitor.visit_if(tree, id),
        None => {}
    }
}

pub fn walk_expression<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) {
    let Some(expr) = tree.expression(id) else {
        return;
    };
    match expr {
        Expression::Literal(_) => visitor.visit_literal(tree, id),
        Expression::Capture { .. } => visitor.visit_capture(tree, id),
        Expression::Local { .. } => visitor.visit_local(tree, id),
        Expression::FieldAccess { .. } => visitor.visit_field_access(tree, id),
        Expression::MethodInvocation { .. } => visitor.visit_method_invocation(tree, id),
        Expression::Operation { .. } => visitor.visit_operation(tree, id),
        Expression::InstanceOf { .. } => visitor.visit_instance_of(tree, id),
        Expression::ArrayLiteral { .. } => visitor.visit_array_literal(tree, id),
        Expression::ArrayElement { .. } => visitor.visit_array_element(tree, id),
        Expression::New { .. } => visitor.visit_new(tree, id),
        Expression::Closure(_) => visitor.visit_closure(tree, id),
    }
}

/// Visit every child of `id`, dispatching on whether it is a statement.
pub fn walk_children<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) {
    for child in tree.children(id) {
        match tree.node(child) {
            Node::Statement(_) => visitor.visit_statement(tree, child),
            Node::Expression(_) => visitor.visit_expression(tree, child),
        }
    }
}

pub fn walk_if<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) {
    if let Some(Statement::If {
        condition,
        then_branch,
        else_branch,
    }) = tree.statement(id)
    {
        visitor.visit_expression(tree, *condition);
        for stmt in then_branch.iter().chain(else_branch) {
            visitor.visit_statement(tree, *stmt);
        }
    }
}

pub fn walk_closure<V: Visitor + ?Sized>(visitor: &mut V, tree: &Tree, id: NodeId) {
    if let Some(Expression::Closure(nested)) = tree.expression(id) {
        visitor.visit_tree(&nested.tree);
    }
}

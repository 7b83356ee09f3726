//! Structural hashing and equality.
//!
//! Two subtrees are structurally equal when they have the same shape and
//! payloads, regardless of the arena or the node ids they live at. Hashes use
//! `FxHasher` so operand order is reproducible from run to run.

use super::{Expression, Node, NodeId, Statement, Tree};
use rustc_hash::FxHasher;
use std::hash::{Hash, Hasher};
use std::mem;

impl Tree {
    pub fn structural_hash(&self, id: NodeId) -> u64 {
        let mut hasher = FxHasher::default();
        self.hash_subtree(id, &mut hasher);
        hasher.finish()
    }

    /// Hash of the whole statement list.
    pub fn tree_hash(&self) -> u64 {
        let mut hasher = FxHasher::default();
        self.roots().len().hash(&mut hasher);
        for root in self.roots() {
            self.hash_subtree(*root, &mut hasher);
        }
        hasher.finish()
    }

    fn hash_subtree<H: Hasher>(&self, id: NodeId, state: &mut H) {
        match self.node(id) {
            Node::Expression(expr) => {
                mem::discriminant(expr).hash(state);
                match expr {
                    Expression::Literal(literal) => literal.hash(state),
                    Expression::Capture { index, ty } => {
                        index.hash(state);
                        ty.hash(state);
                    }
                    Expression::Local { slot, name, ty } => {
                        slot.hash(state);
                        name.hash(state);
                        ty.hash(state);
                    }
                    Expression::FieldAccess { field, .. } => field.hash(state),
                    Expression::MethodInvocation { method, .. } => method.hash(state),
                    Expression::Operation { operator, .. } => operator.hash(state),
                    Expression::InstanceOf { ty, .. } => ty.hash(state),
                    Expression::ArrayLiteral { element, .. } => element.hash(state),
                    Expression::ArrayElement { ty, .. } => ty.hash(state),
                    Expression::New { class, arguments } => {
                        class.hash(state);
                        arguments.is_some().hash(state);
                    }
                    Expression::Closure(nested) => {
                        nested.site.hash(state);
                        nested.arguments.hash(state);
                        nested.captures.hash(state);
                        nested.tree.tree_hash().hash(state);
                    }
                }
            }
            Node::Statement(stmt) => {
                mem::discriminant(stmt).hash(state);
                if let Statement::If {
                    then_branch,
                    else_branch,
                    ..
                } = stmt
                {
                    then_branch.len().hash(state);
                    else_branch.len().hash(state);
                }
            }
        }
        let children = self.children(id);
        children.len().hash(state);
        for child in children {
            self.hash_subtree(child, state);
        }
    }

    /// Structural equality of `id` in `self` and `other_id` in `other`.
    pub fn subtree_eq(&self, id: NodeId, other: &Tree, other_id: NodeId) -> bool {
        let same_payload = match (self.node(id), other.node(other_id)) {
            (Node::Expression(a), Node::Expression(b)) => match (a, b) {
                (Expression::Literal(x), Expression::Literal(y)) => x == y,
                (
                    Expression::Capture { index: i, ty: t },
                    Expression::Capture { index: j, ty: u },
                ) => i == j && t == u,
                (
                    Expression::Local {
                        slot: s,
                        name: n,
                        ty: t,
                    },
                    Expression::Local {
                        slot: r,
                        name: m,
                        ty: u,
                    },
                ) => s == r && n == m && t == u,
                (
                    Expression::FieldAccess { field: f, .. },
                    Expression::FieldAccess { field: g, .. },
                ) => f == g,
                (
                    Expression::MethodInvocation { method: f, .. },
                    Expression::MethodInvocation { method: g, .. },
                ) => f == g,
                (
                    Expression::Operation { operator: p, .. },
                    Expression::Operation { operator: q, .. },
                ) => p == q,
                (Expression::InstanceOf { ty: t, .. }, Expression::InstanceOf { ty: u, .. }) => {
                    t == u
                }
                (
                    Expression::ArrayLiteral { element: t, .. },
                    Expression::ArrayLiteral { element: u, .. },
                ) => t == u,
                (
                    Expression::ArrayElement { ty: t, .. },
                    Expression::ArrayElement { ty: u, .. },
                ) => t == u,
                (
                    Expression::New {
                        class: c,
                        arguments: x,
                    },
                    Expression::New {
                        class: d,
                        arguments: y,
                    },
                ) => c == d && x.is_some() == y.is_some(),
                (Expression::Closure(x), Expression::Closure(y)) => x == y,
                _ => false,
            },
            (Node::Statement(a), Node::Statement(b)) => match (a, b) {
                (
                    Statement::If {
                        then_branch: t1,
                        else_branch: e1,
                        ..
                    },
                    Statement::If {
                        then_branch: t2,
                        else_branch: e2,
                        ..
                    },
                ) => t1.len() == t2.len() && e1.len() == e2.len(),
                _ => mem::discriminant(a) == mem::discriminant(b),
            },
            _ => false,
        };
        if !same_payload {
            return false;
        }

        let left = self.children(id);
        let right = other.children(other_id);
        left.len() == right.len()
            && left
                .iter()
                .zip(right.iter())
                .all(|(a, b)| self.subtree_eq(*a, other, *b))
    }
}

impl PartialEq for Tree {
    fn eq(&self, other: &Self) -> bool {
        self.roots().len() == other.roots().len()
            && self
                .roots()
                .iter()
                .zip(other.roots())
                .all(|(a, b)| self.subtree_eq(*a, other, *b))
    }
}

//! Visitor pattern for lifted tree traversal.
//!
//! Every callback receives the tree and the id of the node being visited.
//! The defaults call the matching `walk_*` function, so an implementation
//! only overrides the variants it cares about and calls `walk_*` itself when
//! it still wants the children visited.

pub mod walk;

use crate::tree::{NodeId, Tree};

pub trait Visitor {
    fn visit_tree(&mut self, tree: &Tree) {
        walk::walk_tree(self, tree);
    }

    fn visit_statement(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_statement(self, tree, id);
    }

    fn visit_expression(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_expression(self, tree, id);
    }

    // Statements

    fn visit_return(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_expression_statement(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_assign(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_if(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_if(self, tree, id);
    }

    // Expressions

    fn visit_literal(&mut self, _tree: &Tree, _id: NodeId) {}

    fn visit_capture(&mut self, _tree: &Tree, _id: NodeId) {}

    fn visit_local(&mut self, _tree: &Tree, _id: NodeId) {}

    fn visit_field_access(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_method_invocation(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_operation(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_instance_of(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_array_literal(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_array_element(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    fn visit_new(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_children(self, tree, id);
    }

    /// Descends into the nested closure's own tree.
    fn visit_closure(&mut self, tree: &Tree, id: NodeId) {
        walk::walk_closure(self, tree, id);
    }
}

/// Counts `Capture` nodes, including those inside nested closures.
#[derive(Debug, Default)]
pub struct CaptureCounter {
    pub count: usize,
}

impl Visitor for CaptureCounter {
    fn visit_capture(&mut self, _tree: &Tree, _id: NodeId) {
        self.count += 1;
    }
}

impl Tree {
    /// Number of unresolved capture references reachable from the roots.
    pub fn capture_count(&self) -> usize {
        let mut counter = CaptureCounter::default();
        counter.visit_tree(self);
        counter.count
    }
}

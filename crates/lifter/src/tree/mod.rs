//! Arena-backed expression/statement tree
//!
//! Nodes live in a `Tree` and are addressed by `NodeId`. The arena keeps the
//! parent of every node in a side table, so rewrites can replace a node in
//! whatever slot currently holds it.
//!
//! Invariants:
//! - a node is held by at most one parent; attaching a node that already has
//!   a parent attaches a deep copy instead
//! - operands of commutative operations are sorted by structural hash when
//!   the operation is created
//! - replaced and removed nodes are marked orphaned and are never reachable
//!   from the roots

pub mod display;
pub mod node;
pub mod structural;

pub use node::{
    Argument, Arguments, Expression, Literal, NestedClosure, Node, NodeId, Number, Operands,
    Operator, Statement,
};

use crate::error::{LiftError, LiftResult};
use quarry_bytecode::{OBJECT_CLASS, TypeRef};
use smallvec::{SmallVec, smallvec};

#[derive(Debug, Clone, Default)]
pub struct Tree {
    nodes: Vec<Node>,
    parents: Vec<Option<NodeId>>,
    orphaned: Vec<bool>,
    roots: Vec<NodeId>,
}

impl Tree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of allocated nodes, including orphaned ones.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Top-level statements in order.
    pub fn roots(&self) -> &[NodeId] {
        &self.roots
    }

    pub fn push_root(&mut self, statement: NodeId) -> LiftResult<()> {
        if self.statement(statement).is_none() {
            return Err(LiftError::structural(format!(
                "{} is not a statement",
                statement
            )));
        }
        if self.parents[statement.index()].is_some() || self.roots.contains(&statement) {
            return Err(LiftError::structural(format!(
                "{} is already attached",
                statement
            )));
        }
        self.roots.push(statement);
        Ok(())
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn expression(&self, id: NodeId) -> Option<&Expression> {
        match self.nodes.get(id.index()) {
            Some(Node::Expression(expr)) => Some(expr),
            _ => None,
        }
    }

    pub fn statement(&self, id: NodeId) -> Option<&Statement> {
        match self.nodes.get(id.index()) {
            Some(Node::Statement(stmt)) => Some(stmt),
            _ => None,
        }
    }

    pub fn literal(&self, id: NodeId) -> Option<&Literal> {
        match self.expression(id) {
            Some(Expression::Literal(literal)) => Some(literal),
            _ => None,
        }
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.parents.get(id.index()).copied().flatten()
    }

    pub fn children(&self, id: NodeId) -> SmallVec<[NodeId; 4]> {
        self.node(id).children()
    }

    pub fn is_orphaned(&self, id: NodeId) -> bool {
        self.orphaned.get(id.index()).copied().unwrap_or(true)
    }

    /// Whether `id` is reachable from the roots.
    pub fn is_live(&self, mut id: NodeId) -> bool {
        loop {
            if self.is_orphaned(id) {
                return false;
            }
            match self.parent(id) {
                Some(parent) => id = parent,
                None => return self.roots.contains(&id),
            }
        }
    }

    pub fn add_expression(&mut self, mut expr: Expression) -> NodeId {
        expr.for_each_child_mut(|child| *child = self.adoptable(*child));
        if let Expression::Operation { operator, operands } = &mut expr
            && operator.is_commutative()
        {
            operands.sort_by_cached_key(|operand| self.structural_hash(*operand));
        }
        self.alloc(Node::Expression(expr))
    }

    pub fn add_statement(&mut self, mut stmt: Statement) -> NodeId {
        stmt.for_each_child_mut(|child| *child = self.adoptable(*child));
        self.alloc(Node::Statement(stmt))
    }

    pub fn add_literal(&mut self, literal: Literal) -> NodeId {
        self.add_expression(Expression::Literal(literal))
    }

    pub fn add_boolean(&mut self, value: bool) -> NodeId {
        self.add_literal(Literal::Boolean(value))
    }

    pub fn add_operation(&mut self, operator: Operator, operands: Operands) -> NodeId {
        self.add_expression(Expression::Operation { operator, operands })
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        for child in node.children() {
            self.parents[child.index()] = Some(id);
        }
        self.nodes.push(node);
        self.parents.push(None);
        self.orphaned.push(false);
        id
    }

    /// `id` itself when it is free, otherwise a copy.
    fn adoptable(&mut self, id: NodeId) -> NodeId {
        if self.parents[id.index()].is_some() || self.roots.contains(&id) {
            self.duplicate(id)
        } else {
            id
        }
    }

    /// Deep copy of the subtree at `id`. The copy has no parent.
    pub fn duplicate(&mut self, id: NodeId) -> NodeId {
        let mut node = self.node(id).clone();
        node.for_each_child_mut(|child| *child = self.duplicate(*child));
        self.alloc(node)
    }

    /// Fill the element at `index` of an array literal under construction.
    pub fn set_array_element(&mut self, array: NodeId, index: usize, value: NodeId) -> LiftResult<()> {
        let value = self.adoptable(value);
        let previous = match &mut self.nodes[array.index()] {
            Node::Expression(Expression::ArrayLiteral { elements, .. }) => {
                let slot = elements.get_mut(index).ok_or_else(|| {
                    LiftError::structural(format!("array index {} out of bounds", index))
                })?;
                std::mem::replace(slot, value)
            }
            _ => {
                return Err(LiftError::structural(format!(
                    "{} is not an array literal",
                    array
                )));
            }
        };
        self.orphan(previous);
        self.parents[value.index()] = Some(array);
        Ok(())
    }

    /// Supply the constructor arguments of a pending instantiation.
    pub fn complete_new(&mut self, new: NodeId, arguments: Arguments) -> LiftResult<()> {
        let arguments: Arguments = arguments
            .into_iter()
            .map(|argument| self.adoptable(argument))
            .collect();
        match &mut self.nodes[new.index()] {
            Node::Expression(Expression::New {
                arguments: slot @ None,
                ..
            }) => *slot = Some(arguments.clone()),
            _ => {
                return Err(LiftError::structural(format!(
                    "{} is not a pending instantiation",
                    new
                )));
            }
        }
        for argument in arguments {
            self.parents[argument.index()] = Some(new);
        }
        Ok(())
    }

    /// Put `new` in the slot holding `old` and orphan `old`.
    ///
    /// `new` must be free or part of the subtree of `old`.
    pub fn replace_element(&mut self, old: NodeId, new: NodeId) -> LiftResult<()> {
        if old == new {
            return Ok(());
        }
        match self.parent(old) {
            Some(parent) => {
                let mut found = false;
                self.nodes[parent.index()].for_each_child_mut(|child| {
                    if *child == old && !found {
                        *child = new;
                        found = true;
                    }
                });
                if !found {
                    return Err(LiftError::structural(format!(
                        "{} does not hold {}",
                        parent, old
                    )));
                }
            }
            None => {
                let slot = self.roots.iter_mut().find(|root| **root == old).ok_or_else(|| {
                    LiftError::structural(format!("{} is not attached", old))
                })?;
                *slot = new;
            }
        }
        self.parents[new.index()] = self.parents[old.index()];
        self.orphan(old);
        Ok(())
    }

    /// Remove an operand. The parent operation drops it when it has more than
    /// two operands and collapses to the remaining sibling when it has two.
    /// Anything else is replaced by a `true` literal.
    pub fn remove(&mut self, operand: NodeId) -> LiftResult<()> {
        let enclosing = self
            .parent(operand)
            .and_then(|parent| match self.expression(parent) {
                Some(Expression::Operation { operands, .. }) if operands.len() >= 2 => {
                    Some((parent, operands.clone()))
                }
                _ => None,
            });
        if let Some((parent, operands)) = enclosing {
            if operands.len() == 2 {
                let sibling = if operands[0] == operand {
                    operands[1]
                } else {
                    operands[0]
                };
                self.replace_element(parent, sibling)?;
                self.orphan(operand);
                return Ok(());
            }
            if let Node::Expression(Expression::Operation { operands, .. }) =
                &mut self.nodes[parent.index()]
            {
                operands.retain(|o| *o != operand);
            }
            self.orphan(operand);
            return Ok(());
        }
        let truth = self.add_boolean(true);
        self.replace_element(operand, truth)
    }

    fn orphan(&mut self, id: NodeId) {
        self.parents[id.index()] = None;
        self.orphaned[id.index()] = true;
    }

    /// Logically negated equivalent of a boolean expression.
    ///
    /// Fails for expressions that have no negated form of their own.
    pub fn inverse(&mut self, id: NodeId) -> LiftResult<NodeId> {
        let expr = self.expression(id).cloned().ok_or_else(|| {
            LiftError::structural(format!("{} is not an expression", id))
        })?;
        match expr {
            Expression::Literal(Literal::Boolean(value)) => Ok(self.add_boolean(!value)),
            Expression::Operation { operator, operands } => {
                if let Some(inverse) = operator.inverse_comparison() {
                    return Ok(self.add_operation(inverse, operands));
                }
                match operator {
                    Operator::Not if operands.len() == 1 => Ok(self.duplicate(operands[0])),
                    Operator::And | Operator::Or => {
                        let dual = if operator == Operator::And {
                            Operator::Or
                        } else {
                            Operator::And
                        };
                        let negated: Operands =
                            operands.iter().map(|operand| self.negate(*operand)).collect();
                        Ok(self.add_operation(dual, negated))
                    }
                    other => Err(LiftError::unsupported(
                        format!("negation of `{}` operation", other.as_str()),
                        None,
                    )),
                }
            }
            other => Err(LiftError::unsupported(
                format!("negation of {}", other.kind_name()),
                None,
            )),
        }
    }

    /// `inverse(id)`, or `Not[id]` when there is no inverse.
    pub fn negate(&mut self, id: NodeId) -> NodeId {
        match self.inverse(id) {
            Ok(inverse) => inverse,
            Err(_) => self.add_operation(Operator::Not, smallvec![id]),
        }
    }

    /// Static type of an expression.
    pub fn type_of(&self, id: NodeId) -> TypeRef {
        let Some(expr) = self.expression(id) else {
            return TypeRef::Void;
        };
        match expr {
            Expression::Literal(literal) => literal.type_ref(),
            Expression::Capture { ty, .. }
            | Expression::Local { ty, .. }
            | Expression::ArrayElement { ty, .. } => ty.clone(),
            Expression::FieldAccess { field, .. } => field.ty.clone(),
            Expression::MethodInvocation { method, .. } => method.descriptor.return_type.clone(),
            Expression::Operation { operator, operands } => {
                if operator.is_comparison() || operator.is_logical() {
                    TypeRef::Boolean
                } else if *operator == Operator::Compare {
                    TypeRef::Int
                } else {
                    operands
                        .first()
                        .map_or(TypeRef::Int, |operand| self.type_of(*operand))
                }
            }
            Expression::InstanceOf { .. } => TypeRef::Boolean,
            Expression::ArrayLiteral { element, .. } => TypeRef::array_of(element.clone()),
            Expression::New { class, .. } => TypeRef::object(class.as_str()),
            Expression::Closure(_) => TypeRef::object(OBJECT_CLASS),
        }
    }

    /// Live nodes, children before parents, roots in order.
    pub fn post_order(&self) -> Vec<NodeId> {
        fn visit(tree: &Tree, id: NodeId, out: &mut Vec<NodeId>) {
            for child in tree.children(id) {
                visit(tree, child, out);
            }
            out.push(id);
        }

        let mut out = Vec::with_capacity(self.nodes.len());
        for root in &self.roots {
            visit(self, *root, &mut out);
        }
        out
    }
}

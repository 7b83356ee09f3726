//! Source-like rendering of lifted trees, for diagnostics and test output.

use super::{Expression, Literal, Node, NodeId, Operator, Statement, Tree};
use std::fmt::{self, Write};

impl Tree {
    /// Render the statement list, one statement per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for root in self.roots() {
            // Writing to a String cannot fail.
            let _ = self.write_statement(&mut out, *root, 0);
        }
        out
    }

    /// Render a single expression.
    pub fn render_expression(&self, id: NodeId) -> String {
        let mut out = String::new();
        let _ = self.write_expression(&mut out, id);
        out
    }

    fn write_statement(&self, out: &mut String, id: NodeId, depth: usize) -> fmt::Result {
        let indent = "    ".repeat(depth);
        match self.node(id) {
            Node::Statement(Statement::Return(value)) => {
                write!(out, "{}return ", indent)?;
                self.write_expression(out, *value)?;
                writeln!(out, ";")
            }
            Node::Statement(Statement::Expression(value)) => {
                write!(out, "{}", indent)?;
                self.write_expression(out, *value)?;
                writeln!(out, ";")
            }
            Node::Statement(Statement::Assign { target, value }) => {
                write!(out, "{}", indent)?;
                self.write_expression(out, *target)?;
                write!(out, " = ")?;
                self.write_expression(out, *value)?;
                writeln!(out, ";")
            }
            Node::Statement(Statement::If {
                condition,
                then_branch,
                else_branch,
            }) => {
                let condition = self.render_expression(*condition);
                if condition.starts_with('(') {
                    writeln!(out, "{}if {} {{", indent, condition)?;
                } else {
                    writeln!(out, "{}if ({}) {{", indent, condition)?;
                }
                for stmt in then_branch {
                    self.write_statement(out, *stmt, depth + 1)?;
                }
                if !else_branch.is_empty() {
                    writeln!(out, "{}}} else {{", indent)?;
                    for stmt in else_branch {
                        self.write_statement(out, *stmt, depth + 1)?;
                    }
                }
                writeln!(out, "{}}}", indent)
            }
            Node::Expression(_) => {
                write!(out, "{}", indent)?;
                self.write_expression(out, id)?;
                writeln!(out)
            }
        }
    }

    fn write_list(&self, out: &mut String, items: &[NodeId]) -> fmt::Result {
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                write!(out, ", ")?;
            }
            self.write_expression(out, *item)?;
        }
        Ok(())
    }

    fn write_expression(&self, out: &mut String, id: NodeId) -> fmt::Result {
        let Some(expr) = self.expression(id) else {
            return write!(out, "<{}>", id);
        };
        match expr {
            Expression::Literal(literal) => write!(out, "{}", literal),
            Expression::Capture { index, .. } => write!(out, "capture${}", index),
            Expression::Local { name, .. } => write!(out, "{}", name),
            Expression::FieldAccess { source, field } => {
                self.write_expression(out, *source)?;
                write!(out, ".{}", field.name)
            }
            Expression::MethodInvocation {
                source,
                method,
                arguments,
            } => {
                self.write_expression(out, *source)?;
                write!(out, ".{}(", method.name)?;
                self.write_list(out, arguments)?;
                write!(out, ")")
            }
            Expression::Operation { operator, operands } => match operator {
                Operator::Not => {
                    write!(out, "!")?;
                    self.write_list(out, operands)
                }
                Operator::Compare => {
                    write!(out, "compare(")?;
                    self.write_list(out, operands)?;
                    write!(out, ")")
                }
                _ => {
                    write!(out, "(")?;
                    for (i, operand) in operands.iter().enumerate() {
                        if i > 0 {
                            write!(out, " {} ", operator.as_str())?;
                        }
                        self.write_expression(out, *operand)?;
                    }
                    write!(out, ")")
                }
            },
            Expression::InstanceOf { source, ty } => {
                write!(out, "(")?;
                self.write_expression(out, *source)?;
                write!(out, " instanceof {})", ty)
            }
            Expression::ArrayLiteral { element, elements } => {
                write!(out, "new {}[] {{", element)?;
                self.write_list(out, elements)?;
                write!(out, "}}")
            }
            Expression::ArrayElement { array, index, .. } => {
                self.write_expression(out, *array)?;
                write!(out, "[")?;
                self.write_expression(out, *index)?;
                write!(out, "]")
            }
            Expression::New { class, arguments } => {
                write!(out, "new {}(", class.replace('/', "."))?;
                if let Some(arguments) = arguments {
                    self.write_list(out, arguments)?;
                }
                write!(out, ")")
            }
            Expression::Closure(nested) => {
                write!(out, "(")?;
                for (i, argument) in nested.arguments.iter().enumerate() {
                    if i > 0 {
                        write!(out, ", ")?;
                    }
                    write!(out, "{}", argument.name)?;
                }
                write!(out, ") -> {{ ")?;
                let body = nested.tree.render();
                write!(out, "{}", body.split_whitespace().collect::<Vec<_>>().join(" "))?;
                write!(out, " }}")
            }
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Boolean(b) => write!(f, "{}", b),
            Literal::Char(c) => write!(f, "{:?}", c),
            Literal::Number(n) => write!(f, "{}", n),
            Literal::String(s) => write!(f, "{:?}", s),
            Literal::Null => write!(f, "null"),
            Literal::Class(ty) => write!(f, "{}.class", ty),
            Literal::Enum { class, constant } => {
                write!(f, "{}.{}", class.replace('/', "."), constant)
            }
            Literal::Object(object) => write!(f, "<{}>", object.class_name().replace('/', ".")),
        }
    }
}

impl fmt::Display for Tree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

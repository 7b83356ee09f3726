//! Local variable table of the symbolic interpreter.
//!
//! Slot layout of a closure body: captured values first (the receiver of an
//! instance body is capture 0), then the declared arguments. `long` and
//! `double` values take two slots.

use crate::error::{LiftError, LiftResult};
use crate::tree::{Argument, NodeId};
use quarry_bytecode::{MethodBody, TypeRef};
use rustc_hash::FxHashMap;

/// What a load from a slot produces.
#[derive(Debug, Clone, PartialEq)]
pub enum Load {
    Capture { index: usize, ty: TypeRef },
    Bound(NodeId),
    Local { slot: u16, name: String, ty: TypeRef },
}

#[derive(Debug, Clone)]
pub struct LocalTable {
    captures: Vec<(u16, TypeRef)>,
    arguments: Vec<Argument>,
    bindings: FxHashMap<u16, NodeId>,
}

impl LocalTable {
    pub fn new(body: &MethodBody, capture_types: &[TypeRef]) -> LiftResult<Self> {
        if !body.is_static && capture_types.is_empty() {
            return Err(LiftError::structural(format!(
                "instance body {} lifted without its receiver",
                body.site()
            )));
        }

        let mut slot = 0u16;
        let mut captures = Vec::with_capacity(capture_types.len());
        for ty in capture_types {
            captures.push((slot, ty.clone()));
            slot += ty.slot_size();
        }

        let declared_captures = if body.is_static {
            capture_types.len()
        } else {
            capture_types.len() - 1
        };
        let parameters = body
            .descriptor
            .parameters
            .get(declared_captures..)
            .ok_or_else(|| {
                LiftError::structural(format!(
                    "{} captures {} values but declares {} parameters",
                    body.site(),
                    declared_captures,
                    body.descriptor.parameters.len()
                ))
            })?;

        let mut arguments = Vec::with_capacity(parameters.len());
        for (i, ty) in parameters.iter().enumerate() {
            let name = body
                .local_at(slot, 0)
                .map(|local| local.name.clone())
                .unwrap_or_else(|| format!("arg{}", i));
            arguments.push(Argument {
                slot,
                name,
                ty: ty.clone(),
            });
            slot += ty.slot_size();
        }

        Ok(Self {
            captures,
            arguments,
            bindings: FxHashMap::default(),
        })
    }

    pub fn arguments(&self) -> &[Argument] {
        &self.arguments
    }

    pub fn capture_count(&self) -> usize {
        self.captures.len()
    }

    pub fn bind(&mut self, slot: u16, value: NodeId) {
        self.bindings.insert(slot, value);
    }

    pub fn resolve(&self, body: &MethodBody, slot: u16, position: usize) -> LiftResult<Load> {
        if let Some(bound) = self.bindings.get(&slot) {
            return Ok(Load::Bound(*bound));
        }
        if let Some(index) = self.captures.iter().position(|(s, _)| *s == slot) {
            return Ok(Load::Capture {
                index,
                ty: self.captures[index].1.clone(),
            });
        }
        let declared = body.local_at(slot, position);
        if let Some(argument) = self.arguments.iter().find(|a| a.slot == slot) {
            return Ok(Load::Local {
                slot,
                name: declared.map_or_else(|| argument.name.clone(), |l| l.name.clone()),
                ty: argument.ty.clone(),
            });
        }
        match declared {
            Some(local) => Ok(Load::Local {
                slot,
                name: local.name.clone(),
                ty: local.ty.clone(),
            }),
            None => Err(LiftError::structural(format!(
                "load from unassigned slot {} at instruction {}",
                slot, position
            ))),
        }
    }
}

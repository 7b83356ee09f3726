//! Host collaborator traits
//!
//! The lifter never reflects on the host directly. Method bodies come from a
//! `MethodBodyLoader`, and member reads on class literals or captured objects
//! go through a `MemberResolver`.

use crate::body::{ClosureSite, MethodBody};
use crate::error::{BytecodeError, BytecodeResult, ResolveError};
use crate::instruction::{FieldRef, MethodRef};
use crate::value::{ObjectRef, Value};
use indexmap::IndexMap;
use std::fmt;
use std::sync::Arc;
use tracing::trace;

/// Source of compiled closure bodies.
pub trait MethodBodyLoader: Send + Sync {
    fn load(&self, site: &ClosureSite) -> BytecodeResult<Arc<MethodBody>>;
}

/// Loader backed by a fixed set of bodies.
#[derive(Debug, Default, Clone)]
pub struct InMemoryLoader {
    bodies: IndexMap<ClosureSite, Arc<MethodBody>>,
}

impl InMemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a body under its own site and return that site.
    pub fn insert(&mut self, body: MethodBody) -> ClosureSite {
        let site = body.site();
        self.bodies.insert(site.clone(), Arc::new(body));
        site
    }

    pub fn with_body(mut self, body: MethodBody) -> Self {
        self.insert(body);
        self
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }
}

impl MethodBodyLoader for InMemoryLoader {
    fn load(&self, site: &ClosureSite) -> BytecodeResult<Arc<MethodBody>> {
        self.bodies
            .get(site)
            .cloned()
            .ok_or_else(|| BytecodeError::MethodNotFound(site.to_string()))
    }
}

/// Receiver of a reflective member read.
#[derive(Debug, Clone, Copy)]
pub enum Receiver<'a> {
    /// Static access on a class, by internal name.
    Class(&'a str),
    Object(&'a ObjectRef),
}

impl Receiver<'_> {
    pub fn class_name(&self) -> &str {
        match self {
            Receiver::Class(name) => name,
            Receiver::Object(object) => object.class_name(),
        }
    }
}

impl fmt::Display for Receiver<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Receiver::Class(name) => write!(f, "class {}", name.replace('/', ".")),
            Receiver::Object(object) => {
                write!(f, "instance of {}", object.class_name().replace('/', "."))
            }
        }
    }
}

/// Reads fields and calls side-effect-free accessors on behalf of the lifter.
pub trait MemberResolver: Send + Sync {
    fn read_field(&self, receiver: Receiver<'_>, field: &FieldRef) -> Result<Value, ResolveError>;

    fn invoke(
        &self,
        receiver: Receiver<'_>,
        method: &MethodRef,
        arguments: &[Value],
    ) -> Result<Value, ResolveError>;
}

type StaticFn = Arc<dyn Fn(&[Value]) -> Result<Value, ResolveError> + Send + Sync>;

/// Resolver over explicitly registered static members. Object receivers are
/// delegated to the object itself.
#[derive(Default, Clone)]
pub struct StaticRegistry {
    fields: IndexMap<(String, String), Value>,
    methods: IndexMap<(String, String), StaticFn>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register_field(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        value: Value,
    ) -> &mut Self {
        self.fields.insert((class.into(), name.into()), value);
        self
    }

    /// Register every constant of an enum class as a static field.
    pub fn register_enum(&mut self, class: &str, constants: &[&str]) -> &mut Self {
        for constant in constants {
            self.register_field(class, *constant, Value::enum_constant(class, *constant));
        }
        self
    }

    pub fn register_method<F>(
        &mut self,
        class: impl Into<String>,
        name: impl Into<String>,
        method: F,
    ) -> &mut Self
    where
        F: Fn(&[Value]) -> Result<Value, ResolveError> + Send + Sync + 'static,
    {
        self.methods
            .insert((class.into(), name.into()), Arc::new(method));
        self
    }
}

impl fmt::Debug for StaticRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticRegistry")
            .field("fields", &self.fields)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl MemberResolver for StaticRegistry {
    fn read_field(&self, receiver: Receiver<'_>, field: &FieldRef) -> Result<Value, ResolveError> {
        trace!(%receiver, field = %field.name, "reading field");
        match receiver {
            Receiver::Object(object) => object.field(&field.name),
            Receiver::Class(class) => self
                .fields
                .get(&(class.to_string(), field.name.clone()))
                .cloned()
                .ok_or_else(|| ResolveError::missing(receiver.to_string(), &field.name)),
        }
    }

    fn invoke(
        &self,
        receiver: Receiver<'_>,
        method: &MethodRef,
        arguments: &[Value],
    ) -> Result<Value, ResolveError> {
        trace!(%receiver, method = %method.name, "invoking accessor");
        match receiver {
            Receiver::Object(object) => object.invoke(&method.name, arguments),
            Receiver::Class(class) => {
                let function = self
                    .methods
                    .get(&(class.to_string(), method.name.clone()))
                    .ok_or_else(|| ResolveError::missing(receiver.to_string(), &method.name))?;
                function(arguments)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::body::BodyBuilder;
    use crate::descriptor::TypeRef;
    use crate::instruction::{Constant, Instruction, ValueKind};

    #[test]
    fn test_in_memory_loader() {
        let mut builder = BodyBuilder::new("com/acme/Q", "lambda$0", "()I").unwrap();
        builder
            .push(Instruction::Const(Constant::Int(7)))
            .push(Instruction::Return(Some(ValueKind::Int)));
        let loader = InMemoryLoader::new().with_body(builder.build().unwrap());
        let site = ClosureSite::new("com/acme/Q", "lambda$0", "()I");
        assert_eq!(loader.load(&site).unwrap().len(), 2);

        let missing = ClosureSite::new("com/acme/Q", "lambda$1", "()I");
        assert!(matches!(
            loader.load(&missing),
            Err(BytecodeError::MethodNotFound(_))
        ));
    }

    #[test]
    fn test_static_registry() {
        let mut registry = StaticRegistry::new();
        registry
            .register_field("com/acme/Limits", "MAX", Value::Int(10))
            .register_enum("com/acme/Color", &["RED", "GREEN"])
            .register_method("com/acme/Limits", "min", |_| Ok(Value::Int(1)));

        let max = FieldRef::new("com/acme/Limits", "MAX", TypeRef::Int);
        assert_eq!(
            registry.read_field(Receiver::Class("com/acme/Limits"), &max),
            Ok(Value::Int(10))
        );

        let red = FieldRef::new("com/acme/Color", "RED", TypeRef::object("com/acme/Color"));
        assert_eq!(
            registry.read_field(Receiver::Class("com/acme/Color"), &red),
            Ok(Value::enum_constant("com/acme/Color", "RED"))
        );

        let min = MethodRef::new("com/acme/Limits", "min", "()I").unwrap();
        assert_eq!(
            registry.invoke(Receiver::Class("com/acme/Limits"), &min, &[]),
            Ok(Value::Int(1))
        );

        let absent = FieldRef::new("com/acme/Limits", "MIN", TypeRef::Int);
        assert!(matches!(
            registry.read_field(Receiver::Class("com/acme/Limits"), &absent),
            Err(ResolveError::MissingMember { .. })
        ));
    }
}

//! Runtime values captured by closures and produced by host resolution

use crate::body::ClosureSite;
use crate::descriptor::{CLASS_CLASS, OBJECT_CLASS, TypeRef};
use crate::error::ResolveError;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Host-side object whose members the lifter may read.
pub trait HostObject: fmt::Debug + Send + Sync {
    /// Internal (slash-separated) class name.
    fn class_name(&self) -> &str;

    fn field(&self, name: &str) -> Result<Value, ResolveError>;

    fn invoke(&self, name: &str, arguments: &[Value]) -> Result<Value, ResolveError>;
}

/// Shared handle to a host object. Compares by identity.
#[derive(Clone)]
pub struct ObjectRef(Arc<dyn HostObject>);

impl ObjectRef {
    pub fn new(object: impl HostObject + 'static) -> Self {
        ObjectRef(Arc::new(object))
    }

    pub fn from_arc(object: Arc<dyn HostObject>) -> Self {
        ObjectRef(object)
    }

    pub fn class_name(&self) -> &str {
        self.0.class_name()
    }

    pub fn field(&self, name: &str) -> Result<Value, ResolveError> {
        self.0.field(name)
    }

    pub fn invoke(&self, name: &str, arguments: &[Value]) -> Result<Value, ResolveError> {
        self.0.invoke(name, arguments)
    }

    fn address(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.address() == other.address()
    }
}

impl Eq for ObjectRef {}

impl Hash for ObjectRef {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.address().hash(state);
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectRef({}@{:p})", self.class_name(), self.address())
    }
}

/// A closure value captured by another closure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CapturedClosure {
    pub site: ClosureSite,
    pub captured: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Value {
    Null,
    Boolean(bool),
    Char(char),
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(OrderedFloat<f32>),
    Double(OrderedFloat<f64>),
    String(String),
    /// Class object, by internal name.
    Class(String),
    Enum {
        class: String,
        constant: String,
    },
    Array {
        element: TypeRef,
        items: Vec<Value>,
    },
    #[serde(skip)]
    Object(ObjectRef),
    Closure(CapturedClosure),
}

impl Value {
    pub fn object(object: impl HostObject + 'static) -> Self {
        Value::Object(ObjectRef::new(object))
    }

    pub fn enum_constant(class: impl Into<String>, constant: impl Into<String>) -> Self {
        Value::Enum {
            class: class.into(),
            constant: constant.into(),
        }
    }

    pub fn type_ref(&self) -> TypeRef {
        match self {
            Value::Null | Value::Closure(_) => TypeRef::object(OBJECT_CLASS),
            Value::Boolean(_) => TypeRef::Boolean,
            Value::Char(_) => TypeRef::Char,
            Value::Byte(_) => TypeRef::Byte,
            Value::Short(_) => TypeRef::Short,
            Value::Int(_) => TypeRef::Int,
            Value::Long(_) => TypeRef::Long,
            Value::Float(_) => TypeRef::Float,
            Value::Double(_) => TypeRef::Double,
            Value::String(_) => TypeRef::string(),
            Value::Class(_) => TypeRef::object(CLASS_CLASS),
            Value::Enum { class, .. } => TypeRef::object(class.as_str()),
            Value::Array { element, .. } => TypeRef::array_of(element.clone()),
            Value::Object(object) => TypeRef::object(object.class_name()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Boolean(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Int(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Long(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Double(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Char(c) => write!(f, "{:?}", c),
            Value::Byte(v) => write!(f, "{}", v),
            Value::Short(v) => write!(f, "{}", v),
            Value::Int(v) => write!(f, "{}", v),
            Value::Long(v) => write!(f, "{}L", v),
            Value::Float(v) => write!(f, "{}F", v),
            Value::Double(v) => write!(f, "{}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Class(name) => write!(f, "{}.class", name.replace('/', ".")),
            Value::Enum { class, constant } => {
                write!(f, "{}.{}", class.replace('/', "."), constant)
            }
            Value::Array { element, items } => {
                write!(f, "new {}[] {{", element)?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Object(object) => write!(f, "<{}>", object.class_name().replace('/', ".")),
            Value::Closure(closure) => write!(f, "<closure {}>", closure.site),
        }
    }
}

//! Type and method descriptors
//!
//! Types are written in the JVM descriptor grammar:
//! - `Z` boolean, `C` char, `B` byte, `S` short, `I` int, `J` long,
//!   `F` float, `D` double, `V` void
//! - `Lpkg/Name;` object types (internal, slash-separated names)
//! - `[T` arrays of `T`
//!
//! Method descriptors have the shape `(params)return`.

use crate::error::{BytecodeError, BytecodeResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const STRING_CLASS: &str = "java/lang/String";
pub const CLASS_CLASS: &str = "java/lang/Class";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TypeRef {
    Void,
    Boolean,
    Char,
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    Object(String),
    Array(Box<TypeRef>),
}

impl TypeRef {
    pub fn object(internal_name: impl Into<String>) -> Self {
        TypeRef::Object(internal_name.into())
    }

    pub fn array_of(element: TypeRef) -> Self {
        TypeRef::Array(Box::new(element))
    }

    pub fn string() -> Self {
        TypeRef::object(STRING_CLASS)
    }

    /// Parse a complete field descriptor such as `I` or `Ljava/lang/String;`.
    pub fn parse(descriptor: &str) -> BytecodeResult<Self> {
        let (ty, rest) = Self::parse_prefix(descriptor, descriptor)?;
        if !rest.is_empty() {
            return Err(invalid(descriptor, "trailing characters after type"));
        }
        Ok(ty)
    }

    fn parse_prefix<'s>(input: &'s str, whole: &str) -> BytecodeResult<(TypeRef, &'s str)> {
        let mut chars = input.chars();
        let tag = chars
            .next()
            .ok_or_else(|| invalid(whole, "unexpected end of descriptor"))?;
        let rest = chars.as_str();

        let ty = match tag {
            'V' => TypeRef::Void,
            'Z' => TypeRef::Boolean,
            'C' => TypeRef::Char,
            'B' => TypeRef::Byte,
            'S' => TypeRef::Short,
            'I' => TypeRef::Int,
            'J' => TypeRef::Long,
            'F' => TypeRef::Float,
            'D' => TypeRef::Double,
            'L' => {
                let end = rest
                    .find(';')
                    .ok_or_else(|| invalid(whole, "unterminated object type"))?;
                if end == 0 {
                    return Err(invalid(whole, "empty class name"));
                }
                return Ok((TypeRef::object(&rest[..end]), &rest[end + 1..]));
            }
            '[' => {
                let (element, rest) = Self::parse_prefix(rest, whole)?;
                if element == TypeRef::Void {
                    return Err(invalid(whole, "array of void"));
                }
                return Ok((TypeRef::array_of(element), rest));
            }
            other => return Err(invalid(whole, &format!("unknown type tag `{}`", other))),
        };

        Ok((ty, rest))
    }

    /// Render back to descriptor form.
    pub fn descriptor(&self) -> String {
        match self {
            TypeRef::Void => "V".to_string(),
            TypeRef::Boolean => "Z".to_string(),
            TypeRef::Char => "C".to_string(),
            TypeRef::Byte => "B".to_string(),
            TypeRef::Short => "S".to_string(),
            TypeRef::Int => "I".to_string(),
            TypeRef::Long => "J".to_string(),
            TypeRef::Float => "F".to_string(),
            TypeRef::Double => "D".to_string(),
            TypeRef::Object(name) => format!("L{};", name),
            TypeRef::Array(element) => format!("[{}", element.descriptor()),
        }
    }

    /// Number of local variable slots a value of this type occupies.
    pub fn slot_size(&self) -> u16 {
        match self {
            TypeRef::Void => 0,
            TypeRef::Long | TypeRef::Double => 2,
            _ => 1,
        }
    }

    pub fn is_wide(&self) -> bool {
        self.slot_size() == 2
    }

    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeRef::Boolean)
    }

    /// Numeric primitives. `char` and `boolean` are not numeric here.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            TypeRef::Byte
                | TypeRef::Short
                | TypeRef::Int
                | TypeRef::Long
                | TypeRef::Float
                | TypeRef::Double
        )
    }

    pub fn is_reference(&self) -> bool {
        matches!(self, TypeRef::Object(_) | TypeRef::Array(_))
    }

    pub fn class_name(&self) -> Option<&str> {
        match self {
            TypeRef::Object(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Boolean => write!(f, "boolean"),
            TypeRef::Char => write!(f, "char"),
            TypeRef::Byte => write!(f, "byte"),
            TypeRef::Short => write!(f, "short"),
            TypeRef::Int => write!(f, "int"),
            TypeRef::Long => write!(f, "long"),
            TypeRef::Float => write!(f, "float"),
            TypeRef::Double => write!(f, "double"),
            TypeRef::Object(name) => write!(f, "{}", name.replace('/', ".")),
            TypeRef::Array(element) => write!(f, "{}[]", element),
        }
    }
}

impl FromStr for TypeRef {
    type Err = BytecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TypeRef::parse(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodDescriptor {
    pub parameters: Vec<TypeRef>,
    pub return_type: TypeRef,
}

impl MethodDescriptor {
    pub fn new(parameters: Vec<TypeRef>, return_type: TypeRef) -> Self {
        Self {
            parameters,
            return_type,
        }
    }

    pub fn parse(descriptor: &str) -> BytecodeResult<Self> {
        let body = descriptor
            .strip_prefix('(')
            .ok_or_else(|| invalid(descriptor, "method descriptor must start with `(`"))?;

        let mut parameters = Vec::new();
        let mut rest = body;
        loop {
            if let Some(after) = rest.strip_prefix(')') {
                rest = after;
                break;
            }
            let (param, after) = TypeRef::parse_prefix(rest, descriptor)?;
            if param == TypeRef::Void {
                return Err(invalid(descriptor, "void parameter"));
            }
            parameters.push(param);
            rest = after;
        }

        let return_type = TypeRef::parse(rest).map_err(|_| invalid(descriptor, "bad return type"))?;
        Ok(Self::new(parameters, return_type))
    }

    pub fn descriptor(&self) -> String {
        let params: String = self.parameters.iter().map(TypeRef::descriptor).collect();
        format!("({}){}", params, self.return_type.descriptor())
    }

    /// Total slots taken by the parameters (excluding any receiver).
    pub fn parameter_slots(&self) -> u16 {
        self.parameters.iter().map(TypeRef::slot_size).sum()
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.descriptor())
    }
}

impl FromStr for MethodDescriptor {
    type Err = BytecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MethodDescriptor::parse(s)
    }
}

fn invalid(descriptor: &str, reason: &str) -> BytecodeError {
    BytecodeError::InvalidDescriptor {
        descriptor: descriptor.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_primitives_and_objects() {
        assert_eq!(TypeRef::parse("I").unwrap(), TypeRef::Int);
        assert_eq!(TypeRef::parse("Z").unwrap(), TypeRef::Boolean);
        assert_eq!(TypeRef::parse("Ljava/lang/String;").unwrap(), TypeRef::string());
        assert_eq!(
            TypeRef::parse("[[J").unwrap(),
            TypeRef::array_of(TypeRef::array_of(TypeRef::Long))
        );
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(TypeRef::parse("").is_err());
        assert!(TypeRef::parse("Ljava/lang/String").is_err());
        assert!(TypeRef::parse("II").is_err());
        assert!(TypeRef::parse("Q").is_err());
        assert!(TypeRef::parse("[V").is_err());
    }

    #[test]
    fn test_method_descriptor() {
        let desc = MethodDescriptor::parse("(IJLjava/lang/String;)Z").unwrap();
        assert_eq!(
            desc.parameters,
            vec![TypeRef::Int, TypeRef::Long, TypeRef::string()]
        );
        assert_eq!(desc.return_type, TypeRef::Boolean);
        assert_eq!(desc.parameter_slots(), 4);
        assert_eq!(desc.descriptor(), "(IJLjava/lang/String;)Z");
    }

    #[test]
    fn test_method_descriptor_errors() {
        assert!(MethodDescriptor::parse("I)V").is_err());
        assert!(MethodDescriptor::parse("(V)V").is_err());
        assert!(MethodDescriptor::parse("(I)").is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(TypeRef::string().to_string(), "java.lang.String");
        assert_eq!(TypeRef::array_of(TypeRef::Int).to_string(), "int[]");
    }
}

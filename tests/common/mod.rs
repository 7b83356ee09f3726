//! Shared closure bodies for the root integration tests

#![allow(dead_code)]

use quarry::{
    BodyBuilder, ClosureSite, Constant, FieldRef, HostObject, InMemoryLoader, Instruction,
    InvokeKind, JumpOp, MethodRef, ResolveError, TypeRef, Value, ValueKind,
};
use quarry_bytecode::Opcode;
use std::sync::Arc;

pub const FILTERS: &str = "com/acme/Filters";
pub const PERSON: &str = "com/acme/Person";

#[derive(Debug)]
pub struct Person {
    pub name: String,
    pub age: i32,
}

impl HostObject for Person {
    fn class_name(&self) -> &str {
        PERSON
    }

    fn field(&self, name: &str) -> Result<Value, ResolveError> {
        match name {
            "name" => Ok(Value::from(self.name.as_str())),
            "age" => Ok(Value::Int(self.age)),
            other => Err(ResolveError::missing(PERSON, other)),
        }
    }

    fn invoke(&self, name: &str, _arguments: &[Value]) -> Result<Value, ResolveError> {
        Err(ResolveError::missing(PERSON, name))
    }
}

pub struct Sites {
    /// `(String name, Person p) -> p.name.equals(name)`
    pub name_filter: ClosureSite,
    /// `(int limit, Person p) -> p.age > limit`
    pub age_filter: ClosureSite,
    /// `(String a, String b) -> b.equals(a)`
    pub string_equals: ClosureSite,
    /// `(Predicate pred, String s) -> pred.test(s)`
    pub predicate_call: ClosureSite,
    /// `(String s) -> s.length() > Limits.MAX`
    pub length_limit: ClosureSite,
    /// `(Person owner) -> owner.age`
    pub person_age: ClosureSite,
    /// A body using `monitorenter`.
    pub synchronized: ClosureSite,
}

fn aload(slot: u16) -> Instruction {
    Instruction::Load {
        kind: ValueKind::Reference,
        slot,
    }
}

fn iload(slot: u16) -> Instruction {
    Instruction::Load {
        kind: ValueKind::Int,
        slot,
    }
}

fn invoke(kind: InvokeKind, owner: &str, name: &str, descriptor: &str) -> Instruction {
    Instruction::Invoke {
        kind,
        method: MethodRef::new(owner, name, descriptor).unwrap(),
    }
}

fn ireturn() -> Instruction {
    Instruction::Return(Some(ValueKind::Int))
}

fn name_filter() -> BodyBuilder {
    let mut builder = BodyBuilder::new(
        FILTERS,
        "lambda$byName$0",
        "(Ljava/lang/String;Lcom/acme/Person;)Z",
    )
    .unwrap();
    builder
        .local(1, "p", TypeRef::object(PERSON))
        .push(aload(1))
        .push(Instruction::GetField(FieldRef::new(
            PERSON,
            "name",
            TypeRef::string(),
        )))
        .push(aload(0))
        .push(invoke(
            InvokeKind::Virtual,
            "java/lang/String",
            "equals",
            "(Ljava/lang/Object;)Z",
        ))
        .push(ireturn());
    builder
}

fn age_filter() -> BodyBuilder {
    let mut builder =
        BodyBuilder::new(FILTERS, "lambda$byAge$1", "(ILcom/acme/Person;)Z").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(1, "p", TypeRef::object(PERSON))
        .push(aload(1))
        .push(Instruction::GetField(FieldRef::new(
            PERSON,
            "age",
            TypeRef::Int,
        )))
        .push(iload(0))
        .push(Instruction::Jump {
            op: JumpOp::IfIcmple,
            target: otherwise,
        })
        .push(Instruction::Const(Constant::Int(1)))
        .push(ireturn())
        .bind(otherwise)
        .push(Instruction::Const(Constant::Int(0)))
        .push(ireturn());
    builder
}

fn string_equals() -> BodyBuilder {
    let mut builder = BodyBuilder::new(
        FILTERS,
        "lambda$equals$2",
        "(Ljava/lang/String;Ljava/lang/String;)Z",
    )
    .unwrap();
    builder
        .push(aload(1))
        .push(aload(0))
        .push(invoke(
            InvokeKind::Virtual,
            "java/lang/String",
            "equals",
            "(Ljava/lang/Object;)Z",
        ))
        .push(ireturn());
    builder
}

fn predicate_call() -> BodyBuilder {
    let mut builder = BodyBuilder::new(
        FILTERS,
        "lambda$compose$3",
        "(Ljava/util/function/Predicate;Ljava/lang/String;)Z",
    )
    .unwrap();
    builder
        .local(1, "s", TypeRef::string())
        .push(aload(0))
        .push(aload(1))
        .push(invoke(
            InvokeKind::Interface,
            "java/util/function/Predicate",
            "test",
            "(Ljava/lang/Object;)Z",
        ))
        .push(ireturn());
    builder
}

fn length_limit() -> BodyBuilder {
    let mut builder =
        BodyBuilder::new(FILTERS, "lambda$short$4", "(Ljava/lang/String;)Z").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(0, "s", TypeRef::string())
        .push(aload(0))
        .push(invoke(
            InvokeKind::Virtual,
            "java/lang/String",
            "length",
            "()I",
        ))
        .push(Instruction::GetStatic(FieldRef::new(
            "com/acme/Limits",
            "MAX",
            TypeRef::Int,
        )))
        .push(Instruction::Jump {
            op: JumpOp::IfIcmpge,
            target: otherwise,
        })
        .push(Instruction::Const(Constant::Int(1)))
        .push(ireturn())
        .bind(otherwise)
        .push(Instruction::Const(Constant::Int(0)))
        .push(ireturn());
    builder
}

fn person_age() -> BodyBuilder {
    let mut builder = BodyBuilder::new(FILTERS, "lambda$age$5", "(Lcom/acme/Person;)I").unwrap();
    builder
        .push(aload(0))
        .push(Instruction::GetField(FieldRef::new(
            PERSON,
            "age",
            TypeRef::Int,
        )))
        .push(ireturn());
    builder
}

fn synchronized() -> BodyBuilder {
    let mut builder =
        BodyBuilder::new(FILTERS, "lambda$locked$6", "(Ljava/lang/Object;)V").unwrap();
    builder
        .push(aload(0))
        .push(Instruction::Unsupported(Opcode::Monitorenter))
        .push(Instruction::Return(None));
    builder
}

/// Loader holding every fixture body.
pub fn loader() -> (Arc<InMemoryLoader>, Sites) {
    let mut loader = InMemoryLoader::new();
    let sites = Sites {
        name_filter: loader.insert(name_filter().build().unwrap()),
        age_filter: loader.insert(age_filter().build().unwrap()),
        string_equals: loader.insert(string_equals().build().unwrap()),
        predicate_call: loader.insert(predicate_call().build().unwrap()),
        length_limit: loader.insert(length_limit().build().unwrap()),
        person_age: loader.insert(person_age().build().unwrap()),
        synchronized: loader.insert(synchronized().build().unwrap()),
    };
    (Arc::new(loader), sites)
}

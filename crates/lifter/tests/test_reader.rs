//! Tests for the symbolic stack interpreter

use quarry_bytecode::{
    ArithmeticOp, BodyBuilder, ClosureFactory, ClosureSite, Constant, FieldRef, InMemoryLoader,
    Instruction, InvokeKind, MethodRef, NumericKind, Opcode, StaticRegistry, TypeRef, Value,
    ValueKind,
};
use quarry_lifter::{
    Analysis, Expression, LiftConfig, LiftError, LiftResult, RewriteContext, RewritePipeline,
    Statement, lift,
};

fn load(kind: ValueKind, slot: u16) -> Instruction {
    Instruction::Load { kind, slot }
}

fn int(value: i32) -> Instruction {
    Instruction::Const(Constant::Int(value))
}

fn invoke(kind: InvokeKind, owner: &str, name: &str, descriptor: &str) -> Instruction {
    Instruction::Invoke {
        kind,
        method: MethodRef::new(owner, name, descriptor).unwrap(),
    }
}

fn lift_with(
    builder: BodyBuilder,
    captures: &[TypeRef],
    config: &LiftConfig,
) -> LiftResult<Analysis> {
    let mut loader = InMemoryLoader::new();
    let site = loader.insert(builder.build().unwrap());
    lift(&site, captures, &loader, config)
}

fn lift_body(builder: BodyBuilder, captures: &[TypeRef]) -> LiftResult<Analysis> {
    lift_with(builder, captures, &LiftConfig::default())
}

#[test]
fn test_field_compared_to_capture() {
    let mut builder = BodyBuilder::new(
        "com/acme/Filters",
        "lambda$byName$0",
        "(Ljava/lang/String;Lcom/acme/Person;)Z",
    )
    .unwrap();
    builder
        .local(1, "p", TypeRef::object("com/acme/Person"))
        .push(load(ValueKind::Reference, 1))
        .push(Instruction::GetField(FieldRef::new(
            "com/acme/Person",
            "name",
            TypeRef::string(),
        )))
        .push(load(ValueKind::Reference, 0))
        .push(invoke(
            InvokeKind::Virtual,
            "java/lang/String",
            "equals",
            "(Ljava/lang/Object;)Z",
        ))
        .push(Instruction::Return(Some(ValueKind::Int)));

    let analysis = lift_body(builder, &[TypeRef::string()]).unwrap();
    assert_eq!(analysis.tree.render(), "return p.name.equals(capture$0);\n");
    assert_eq!(analysis.arguments.len(), 1);
    assert_eq!(analysis.arguments[0].name, "p");
    assert_eq!(analysis.tree.capture_count(), 1);
}

#[test]
fn test_stored_local_is_reused() {
    let mut builder = BodyBuilder::new("com/acme/Math", "lambda$0", "(I)I").unwrap();
    builder
        .local(0, "x", TypeRef::Int)
        .push(load(ValueKind::Int, 0))
        .push(int(2))
        .push(Instruction::Arithmetic {
            op: ArithmeticOp::Sub,
            kind: NumericKind::Int,
        })
        .push(Instruction::Store {
            kind: ValueKind::Int,
            slot: 1,
        })
        .push(load(ValueKind::Int, 1))
        .push(load(ValueKind::Int, 1))
        .push(Instruction::Arithmetic {
            op: ArithmeticOp::Add,
            kind: NumericKind::Int,
        })
        .push(Instruction::Return(Some(ValueKind::Int)));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return ((x - 2) + (x - 2));\n");
}

#[test]
fn test_void_call_becomes_statement() {
    let mut builder = BodyBuilder::new("com/acme/Log", "lambda$0", "()V").unwrap();
    builder
        .push(Instruction::GetStatic(FieldRef::new(
            "java/lang/System",
            "out",
            TypeRef::object("java/io/PrintStream"),
        )))
        .push(Instruction::Const(Constant::String("hi".into())))
        .push(invoke(
            InvokeKind::Virtual,
            "java/io/PrintStream",
            "println",
            "(Ljava/lang/String;)V",
        ))
        .push(Instruction::Return(None));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(
        analysis.tree.render(),
        "java.lang.System.class.out.println(\"hi\");\n"
    );
}

#[test]
fn test_constructor_call_completes_instantiation() {
    let mut builder = BodyBuilder::new("com/acme/Shapes", "lambda$0", "()Lcom/acme/Point;").unwrap();
    builder
        .push(Instruction::New("com/acme/Point".into()))
        .push(Instruction::Dup)
        .push(int(1))
        .push(int(2))
        .push(invoke(InvokeKind::Special, "com/acme/Point", "<init>", "(II)V"))
        .push(Instruction::Return(Some(ValueKind::Reference)));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return new com.acme.Point(1, 2);\n");
}

#[test]
fn test_array_literal_elements() {
    let mut builder = BodyBuilder::new("com/acme/Arrays", "lambda$0", "()[I").unwrap();
    builder
        .push(int(2))
        .push(Instruction::NewArray(TypeRef::Int))
        .push(Instruction::Dup)
        .push(int(0))
        .push(int(5))
        .push(Instruction::ArrayStore(ValueKind::Int))
        .push(Instruction::Return(Some(ValueKind::Reference)));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return new int[] {5, 0};\n");
}

#[test]
fn test_array_element_load() {
    let mut builder = BodyBuilder::new("com/acme/Arrays", "lambda$1", "([I)I").unwrap();
    builder
        .local(0, "values", TypeRef::array_of(TypeRef::Int))
        .push(load(ValueKind::Reference, 0))
        .push(int(1))
        .push(Instruction::ArrayLoad(ValueKind::Int))
        .push(Instruction::Return(Some(ValueKind::Int)));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return values[1];\n");
}

#[test]
fn test_literal_negation_folds() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()I").unwrap();
    builder
        .push(int(5))
        .push(Instruction::Negate(NumericKind::Int))
        .push(Instruction::Return(Some(ValueKind::Int)));
    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return -5;\n");

    let mut builder = BodyBuilder::new("A", "lambda$1", "(I)I").unwrap();
    builder
        .push(load(ValueKind::Int, 0))
        .push(Instruction::Negate(NumericKind::Int))
        .push(Instruction::Return(Some(ValueKind::Int)));
    assert!(matches!(
        lift_body(builder, &[]),
        Err(LiftError::UnsupportedConstruct {
            position: Some(1),
            ..
        })
    ));
}

#[test]
fn test_boolean_bitwise_is_logical() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(ZZ)Z").unwrap();
    builder
        .local(0, "a", TypeRef::Boolean)
        .local(1, "b", TypeRef::Boolean)
        .push(load(ValueKind::Int, 0))
        .push(load(ValueKind::Int, 1))
        .push(Instruction::Arithmetic {
            op: ArithmeticOp::And,
            kind: NumericKind::Int,
        })
        .push(Instruction::Return(Some(ValueKind::Int)));

    let analysis = lift_body(builder, &[]).unwrap();
    let rendered = analysis.tree.render();
    assert!(rendered == "return (a && b);\n" || rendered == "return (b && a);\n");
}

#[test]
fn test_discarded_call_is_kept() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(Ljava/util/List;)V").unwrap();
    builder
        .local(0, "items", TypeRef::object("java/util/List"))
        .push(load(ValueKind::Reference, 0))
        .push(invoke(InvokeKind::Interface, "java/util/List", "size", "()I"))
        .push(Instruction::Pop)
        .push(Instruction::Return(None));

    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "items.size();\n");
}

#[test]
fn test_unsupported_opcode_reports_position() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()V").unwrap();
    builder
        .push(Instruction::Nop)
        .push(Instruction::Unsupported(Opcode::Monitorenter))
        .push(Instruction::Return(None));

    let err = lift_body(builder, &[]).unwrap_err();
    assert_eq!(
        err,
        LiftError::UnsupportedConstruct {
            construct: "monitorenter".into(),
            position: Some(1),
        }
    );
}

#[test]
fn test_surrogate_char_constant_is_unsupported() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()C").unwrap();
    builder
        .push(Instruction::Nop)
        .push(int(0xD800))
        .push(Instruction::Return(Some(ValueKind::Int)));

    let err = lift_body(builder, &[]).unwrap_err();
    assert!(
        matches!(
            &err,
            LiftError::UnsupportedConstruct {
                position: Some(2),
                ..
            }
        ),
        "{}",
        err
    );

    let mut builder = BodyBuilder::new("A", "lambda$1", "()C").unwrap();
    builder
        .push(int(0x41))
        .push(Instruction::Return(Some(ValueKind::Int)));
    let analysis = lift_body(builder, &[]).unwrap();
    assert_eq!(analysis.tree.render(), "return 'A';\n");
}

#[test]
fn test_stack_underflow_is_structural() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()I").unwrap();
    builder.push(Instruction::Return(Some(ValueKind::Int)));
    assert!(matches!(
        lift_body(builder, &[]),
        Err(LiftError::StructuralInconsistency(_))
    ));
}

#[test]
fn test_missing_body_is_bytecode_error() {
    let loader = InMemoryLoader::new();
    let site = ClosureSite::new("A", "lambda$9", "()V");
    assert!(matches!(
        lift(&site, &[], &loader, &LiftConfig::default()),
        Err(LiftError::Bytecode(_))
    ));
}

fn nested_closure_loader() -> (InMemoryLoader, ClosureSite) {
    let inner_site = ClosureSite::new(
        "com/acme/Filters",
        "lambda$inner$1",
        "(Ljava/lang/String;Ljava/lang/String;)Z",
    );
    let mut inner = BodyBuilder::new(
        "com/acme/Filters",
        "lambda$inner$1",
        "(Ljava/lang/String;Ljava/lang/String;)Z",
    )
    .unwrap();
    inner
        .push(load(ValueKind::Reference, 1))
        .push(load(ValueKind::Reference, 0))
        .push(invoke(
            InvokeKind::Virtual,
            "java/lang/String",
            "equals",
            "(Ljava/lang/Object;)Z",
        ))
        .push(Instruction::Return(Some(ValueKind::Int)));

    let mut outer = BodyBuilder::new(
        "com/acme/Filters",
        "lambda$outer$0",
        "(Ljava/lang/String;)Ljava/util/function/Predicate;",
    )
    .unwrap();
    outer
        .push(load(ValueKind::Reference, 0))
        .push(Instruction::InvokeDynamic(ClosureFactory {
            site: inner_site,
            captured: vec![TypeRef::string()],
        }))
        .push(Instruction::Return(Some(ValueKind::Reference)));

    let mut loader = InMemoryLoader::new();
    loader.insert(inner.build().unwrap());
    let site = loader.insert(outer.build().unwrap());
    (loader, site)
}

#[test]
fn test_nested_closure_lifted_and_resolved() {
    let (loader, site) = nested_closure_loader();
    let config = LiftConfig::default();
    let mut analysis = lift(&site, &[TypeRef::string()], &loader, &config).unwrap();

    let Some(Statement::Return(value)) = analysis.tree.statement(analysis.tree.roots()[0]) else {
        panic!("expected a return");
    };
    let Some(Expression::Closure(nested)) = analysis.tree.expression(*value) else {
        panic!("expected a closure");
    };
    assert_eq!(nested.captures, vec![0]);
    assert!(!nested.resolved);

    let resolver = StaticRegistry::new();
    let values = [Value::from("foo")];
    RewritePipeline::standard()
        .run(
            &mut analysis.tree,
            &RewriteContext::new(&values, &resolver, &config),
        )
        .unwrap();
    assert_eq!(analysis.tree.capture_count(), 0);
    assert_eq!(
        analysis.tree.render(),
        "return (arg0) -> { return arg0.equals(\"foo\"); };\n"
    );
}

#[test]
fn test_closure_depth_limit() {
    let (loader, site) = nested_closure_loader();
    let config = LiftConfig::default().with_max_nested_closure_depth(0);
    assert!(matches!(
        lift(&site, &[TypeRef::string()], &loader, &config),
        Err(LiftError::UnsupportedConstruct { .. })
    ));
}

#[test]
fn test_instruction_limit() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()I").unwrap();
    builder.push(int(1)).push(Instruction::Return(Some(ValueKind::Int)));
    let config = LiftConfig::default().with_max_instructions(1);
    assert!(matches!(
        lift_with(builder, &[], &config),
        Err(LiftError::UnsupportedConstruct { position: None, .. })
    ));
}

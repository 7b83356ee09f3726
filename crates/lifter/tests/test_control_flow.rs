//! Tests for if-statement reconstruction

use quarry_bytecode::{
    BodyBuilder, CompareOp, Constant, FieldRef, InMemoryLoader, Instruction, JumpOp,
    StaticRegistry, TypeRef, ValueKind,
};
use quarry_lifter::{
    Analysis, Expression, LiftConfig, LiftError, LiftResult, Literal, NodeId, Operator,
    RewriteContext, RewritePipeline, Statement, Tree, lift,
};

fn lift_with(builder: BodyBuilder, config: &LiftConfig) -> LiftResult<Analysis> {
    let mut loader = InMemoryLoader::new();
    let site = loader.insert(builder.build().unwrap());
    lift(&site, &[], &loader, config)
}

fn pair_field(name: &str) -> Instruction {
    Instruction::GetField(FieldRef::new("com/acme/Pair", name, TypeRef::Int))
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

fn int(value: i32) -> Instruction {
    Instruction::Const(Constant::Int(value))
}

fn ireturn() -> Instruction {
    Instruction::Return(Some(ValueKind::Int))
}

/// `return a.f > a.g;` as javac emits it.
fn greater_than_body() -> BodyBuilder {
    let mut builder = BodyBuilder::new("com/acme/Pairs", "lambda$0", "(Lcom/acme/Pair;)Z").unwrap();
    let otherwise = builder.new_label();
    let done = builder.new_label();
    builder
        .local(0, "a", TypeRef::object("com/acme/Pair"))
        .push(aload(0))
        .push(pair_field("f"))
        .push(aload(0))
        .push(pair_field("g"))
        .push(Instruction::Jump {
            op: JumpOp::IfIcmple,
            target: otherwise,
        })
        .push(int(1))
        .push(Instruction::Goto(done))
        .bind(otherwise)
        .push(int(0))
        .bind(done)
        .push(ireturn());
    builder
}

fn single_if(tree: &Tree) -> (&Expression, Vec<&Statement>, Vec<&Statement>) {
    assert_eq!(tree.roots().len(), 1);
    let Some(Statement::If {
        condition,
        then_branch,
        else_branch,
    }) = tree.statement(tree.roots()[0])
    else {
        panic!("expected an if-statement, got {}", tree.render());
    };
    (
        tree.expression(*condition).unwrap(),
        statements(tree, then_branch),
        statements(tree, else_branch),
    )
}

fn statements<'t>(tree: &'t Tree, ids: &[NodeId]) -> Vec<&'t Statement> {
    ids.iter().filter_map(|id| tree.statement(*id)).collect()
}

fn returned_literal<'t>(tree: &'t Tree, statement: &Statement) -> Option<&'t Literal> {
    match statement {
        Statement::Return(value) => tree.literal(*value),
        _ => None,
    }
}

#[test]
fn test_greater_than_branch() {
    let analysis = lift_with(greater_than_body(), &LiftConfig::default()).unwrap();
    let tree = &analysis.tree;
    let (condition, then_branch, else_branch) = single_if(tree);

    let Expression::Operation { operator, operands } = condition else {
        panic!("expected a comparison");
    };
    assert_eq!(*operator, Operator::Greater);
    assert_eq!(operands.len(), 2);
    for operand in operands {
        assert!(matches!(
            tree.expression(*operand),
            Some(Expression::FieldAccess { .. })
        ));
    }

    assert_eq!(then_branch.len(), 1);
    assert_eq!(
        returned_literal(tree, then_branch[0]),
        Some(&Literal::Boolean(true))
    );
    assert_eq!(else_branch.len(), 1);
    assert_eq!(
        returned_literal(tree, else_branch[0]),
        Some(&Literal::Boolean(false))
    );
    assert_eq!(
        tree.render(),
        "if (a.f > a.g) {\n    return true;\n} else {\n    return false;\n}\n"
    );
}

#[test]
fn test_returns_in_both_branches() {
    let mut builder = BodyBuilder::new("com/acme/Pairs", "lambda$1", "(Lcom/acme/Pair;)Z").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(0, "a", TypeRef::object("com/acme/Pair"))
        .push(aload(0))
        .push(pair_field("f"))
        .push(aload(0))
        .push(pair_field("g"))
        .push(Instruction::Jump {
            op: JumpOp::IfIcmple,
            target: otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(otherwise)
        .push(int(0))
        .push(ireturn());

    let analysis = lift_with(builder, &LiftConfig::default()).unwrap();
    let expected = lift_with(greater_than_body(), &LiftConfig::default()).unwrap();
    assert_eq!(analysis.tree, expected.tree);
}

fn flag_branch(op: JumpOp) -> BodyBuilder {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(Z)I").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(0, "flag", TypeRef::Boolean)
        .push(iload(0))
        .push(Instruction::Jump {
            op,
            target: otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(otherwise)
        .push(int(2))
        .push(ireturn());
    builder
}

#[test]
fn test_boolean_jump_uses_operand() {
    let analysis = lift_with(flag_branch(JumpOp::Ifeq), &LiftConfig::default()).unwrap();
    assert!(analysis.tree.render().starts_with("if (flag) {\n"));

    let analysis = lift_with(flag_branch(JumpOp::Ifne), &LiftConfig::default()).unwrap();
    assert!(analysis.tree.render().starts_with("if (!flag) {\n"));
}

#[test]
fn test_long_compare_unfolds() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(J)Z").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(0, "x", TypeRef::Long)
        .push(Instruction::Load {
            kind: ValueKind::Long,
            slot: 0,
        })
        .push(Instruction::Const(Constant::Long(10)))
        .push(Instruction::Compare(CompareOp::Lcmp))
        .push(Instruction::Jump {
            op: JumpOp::Ifle,
            target: otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(otherwise)
        .push(int(0))
        .push(ireturn());

    let analysis = lift_with(builder, &LiftConfig::default()).unwrap();
    assert!(analysis.tree.render().starts_with("if (x > 10L) {\n"));
}

#[test]
fn test_null_check() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(Ljava/lang/String;)Z").unwrap();
    let otherwise = builder.new_label();
    builder
        .local(0, "s", TypeRef::string())
        .push(aload(0))
        .push(Instruction::Jump {
            op: JumpOp::Ifnonnull,
            target: otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(otherwise)
        .push(int(0))
        .push(ireturn());

    let analysis = lift_with(builder, &LiftConfig::default()).unwrap();
    let tree = &analysis.tree;
    let (condition, _, _) = single_if(tree);
    let Expression::Operation { operator, operands } = condition else {
        panic!("expected a comparison");
    };
    assert_eq!(*operator, Operator::Equals);
    assert!(
        operands
            .iter()
            .any(|operand| tree.literal(*operand) == Some(&Literal::Null))
    );
}

#[test]
fn test_nested_branches() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(II)Z").unwrap();
    let otherwise = builder.new_label();
    let inner_otherwise = builder.new_label();
    builder
        .local(0, "a", TypeRef::Int)
        .local(1, "b", TypeRef::Int)
        .push(iload(0))
        .push(Instruction::Jump {
            op: JumpOp::Ifle,
            target: otherwise,
        })
        .push(iload(1))
        .push(Instruction::Jump {
            op: JumpOp::Ifle,
            target: inner_otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(inner_otherwise)
        .push(int(0))
        .push(ireturn())
        .bind(otherwise)
        .push(int(0))
        .push(ireturn());

    let analysis = lift_with(builder, &LiftConfig::default()).unwrap();
    assert_eq!(
        analysis.tree.render(),
        "if (a > 0) {\n    if (b > 0) {\n        return true;\n    } else {\n        return false;\n    }\n} else {\n    return false;\n}\n"
    );

    let shallow = LiftConfig::default().with_max_branch_depth(1);
    assert!(matches!(
        lift_with(flag_branch(JumpOp::Ifeq), &shallow),
        Ok(_)
    ));
    let mut builder = BodyBuilder::new("A", "lambda$1", "(II)Z").unwrap();
    let otherwise = builder.new_label();
    let inner_otherwise = builder.new_label();
    builder
        .push(iload(0))
        .push(Instruction::Jump {
            op: JumpOp::Ifle,
            target: otherwise,
        })
        .push(iload(1))
        .push(Instruction::Jump {
            op: JumpOp::Ifle,
            target: inner_otherwise,
        })
        .push(int(1))
        .push(ireturn())
        .bind(inner_otherwise)
        .push(int(0))
        .push(ireturn())
        .bind(otherwise)
        .push(int(0))
        .push(ireturn());
    assert!(matches!(
        lift_with(builder, &shallow),
        Err(LiftError::UnsupportedConstruct {
            position: Some(3),
            ..
        })
    ));
}

#[test]
fn test_operand_carried_across_branch_is_rejected() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "(Z)I").unwrap();
    let otherwise = builder.new_label();
    builder
        .push(int(7))
        .push(iload(0))
        .push(Instruction::Jump {
            op: JumpOp::Ifeq,
            target: otherwise,
        })
        .push(ireturn())
        .bind(otherwise)
        .push(ireturn());

    assert!(matches!(
        lift_with(builder, &LiftConfig::default()),
        Err(LiftError::UnsupportedConstruct {
            position: Some(2),
            ..
        })
    ));
}

#[test]
fn test_backward_jump_is_rejected() {
    let mut builder = BodyBuilder::new("A", "lambda$0", "()V").unwrap();
    let top = builder.new_label();
    builder
        .bind(top)
        .push(Instruction::Nop)
        .push(Instruction::Goto(top));

    assert!(matches!(
        lift_with(builder, &LiftConfig::default()),
        Err(LiftError::UnsupportedConstruct { .. })
    ));
}

#[test]
fn test_branch_folding_collapses_to_return() {
    let config = LiftConfig::default().with_boolean_branch_folding(true);
    let mut analysis = lift_with(greater_than_body(), &config).unwrap();
    let resolver = StaticRegistry::new();
    let stats = RewritePipeline::for_config(&config)
        .run(
            &mut analysis.tree,
            &RewriteContext::new(&[], &resolver, &config),
        )
        .unwrap();

    assert_eq!(stats.get("branch-folding"), Some(1));
    assert_eq!(analysis.tree.render(), "return (a.f > a.g);\n");
}

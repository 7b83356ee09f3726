use criterion::{Criterion, criterion_group, criterion_main};
use quarry_bytecode::{
    BodyBuilder, ClosureSite, Constant, FieldRef, InMemoryLoader, Instruction, JumpOp,
    StaticRegistry, TypeRef, Value, ValueKind,
};
use quarry_lifter::{LiftConfig, RewriteContext, RewritePipeline, lift};
use std::hint::black_box;

/// A chain of `depth` nested comparisons of `p.f{i}` against captured values.
fn nested_filter(depth: usize) -> (InMemoryLoader, ClosureSite) {
    let descriptor = format!("({}Lcom/acme/Row;)Z", "I".repeat(depth));
    let mut builder = BodyBuilder::new("com/acme/Filters", "lambda$bench$0", &descriptor).unwrap();
    let otherwise = builder.new_label();
    let row_slot = depth as u16;
    builder.local(row_slot, "row", TypeRef::object("com/acme/Row"));

    for i in 0..depth {
        builder
            .push(Instruction::Load {
                kind: ValueKind::Reference,
                slot: row_slot,
            })
            .push(Instruction::GetField(FieldRef::new(
                "com/acme/Row",
                format!("f{}", i),
                TypeRef::Int,
            )))
            .push(Instruction::Load {
                kind: ValueKind::Int,
                slot: i as u16,
            })
            .push(Instruction::Jump {
                op: JumpOp::IfIcmple,
                target: otherwise,
            });
    }
    builder
        .push(Instruction::Const(Constant::Int(1)))
        .push(Instruction::Return(Some(ValueKind::Int)))
        .bind(otherwise)
        .push(Instruction::Const(Constant::Int(0)))
        .push(Instruction::Return(Some(ValueKind::Int)));

    let mut loader = InMemoryLoader::new();
    let site = loader.insert(builder.build().unwrap());
    (loader, site)
}

fn bench_lift(c: &mut Criterion) {
    let mut group = c.benchmark_group("lift");

    for depth in [1, 2, 4, 8].iter() {
        let (loader, site) = nested_filter(*depth);
        let captures = vec![TypeRef::Int; *depth];
        let config = LiftConfig::default();

        group.bench_function(format!("raw_depth_{}", depth), |b| {
            b.iter(|| black_box(lift(&site, &captures, &loader, &config).unwrap()));
        });
    }

    group.finish();
}

fn bench_rewrite(c: &mut Criterion) {
    let mut group = c.benchmark_group("rewrite");
    let resolver = StaticRegistry::new();

    for depth in [1, 4, 8].iter() {
        let (loader, site) = nested_filter(*depth);
        let captures = vec![TypeRef::Int; *depth];
        let values: Vec<Value> = (0..*depth as i32).map(Value::Int).collect();
        let config = LiftConfig::default().with_boolean_branch_folding(true);
        let analysis = lift(&site, &captures, &loader, &config).unwrap();
        let pipeline = RewritePipeline::for_config(&config);

        group.bench_function(format!("pipeline_depth_{}", depth), |b| {
            b.iter(|| {
                let mut tree = analysis.tree.clone();
                let context = RewriteContext::new(&values, &resolver, &config);
                black_box(pipeline.run(&mut tree, &context).unwrap());
                tree
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_lift, bench_rewrite);
criterion_main!(benches);

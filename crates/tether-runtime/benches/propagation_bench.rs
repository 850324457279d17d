//! Benchmarks for binding propagation and scope initialisation.
//!
//! Run with: `cargo bench --package tether-runtime --bench propagation_bench`
//!
//! # Performance Baselines
//!
//! - One view-model write fanned out to N bound labels
//! - Chained path (`address.city`) updates, including intermediate swaps
//! - Full `init_child_bindings` refresh of a scope with N hosts

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use std::rc::Rc;
use tether_core::{DynamicObject, ObjectRef, PropertySource, Value};
use tether_runtime::{BindingConfig, MemberBinding, ViewTree};

// ============================================================================
// Fixtures
// ============================================================================

fn person() -> Rc<DynamicObject> {
    let address = DynamicObject::builder("Address").property("city", "Lyon").build();
    DynamicObject::builder("Person")
        .property("name", "Alice")
        .property("age", 30)
        .property("address", address as ObjectRef)
        .build()
}

fn label() -> Rc<DynamicObject> {
    DynamicObject::builder("Label").property("text", "").build()
}

/// A scope with `hosts` labels bound to `name`.
fn populated_tree(hosts: usize) -> (ViewTree, tether_runtime::NodeId) {
    let mut tree = ViewTree::new();
    let scope = tree.add_node(tree.root(), "list").expect("scope node");
    tree.make_scope(scope).expect("make scope");
    for i in 0..hosts {
        let row = tree.add_node(scope, format!("row{i}")).expect("row node");
        tree.set_element(row, label()).expect("element");
        tree.add_binding(row, BindingConfig::one_way("name", "text"))
            .expect("binding");
    }
    (tree, scope)
}

// ============================================================================
// Propagation
// ============================================================================

fn bench_fan_out(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/fan_out");
    for &n in &[1usize, 16, 256] {
        let vm = person();
        let vm_ref: ObjectRef = vm.clone();
        let bindings: Vec<MemberBinding> = (0..n)
            .map(|_| {
                let ui: ObjectRef = label();
                MemberBinding::one_way(&ui, "name", "text", None, &vm_ref).expect("bind")
            })
            .collect();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                let name = if flip { "Bob" } else { "Alice" };
                vm.set("name", Value::from(name)).expect("set");
                black_box(&bindings);
            });
        });
    }
    group.finish();
}

fn bench_chained_path(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation/chained");
    let vm = person();
    let vm_ref: ObjectRef = vm.clone();
    let ui: ObjectRef = label();
    let _binding =
        MemberBinding::one_way(&ui, "address.city", "text", None, &vm_ref).expect("bind");

    group.bench_function("leaf_write", |b| {
        let address = vm
            .get("address")
            .and_then(|v| v.as_object().cloned())
            .expect("address");
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let city = if flip { "Paris" } else { "Lyon" };
            address.set("city", Value::from(city)).expect("set");
        });
    });

    group.bench_function("intermediate_swap", |b| {
        let paris: ObjectRef = DynamicObject::builder("Address")
            .property("city", "Paris")
            .build();
        let lyon: ObjectRef = DynamicObject::builder("Address")
            .property("city", "Lyon")
            .build();
        let mut flip = false;
        b.iter(|| {
            flip = !flip;
            let next = if flip { &paris } else { &lyon };
            vm.set("address", Value::Object(Rc::clone(next))).expect("set");
            black_box(ui.get("text"));
        });
    });
    group.finish();
}

// ============================================================================
// Scope initialisation
// ============================================================================

fn bench_init_child_bindings(c: &mut Criterion) {
    let mut group = c.benchmark_group("scope/init_child_bindings");
    for &n in &[8usize, 64, 512] {
        let (mut tree, scope) = populated_tree(n);
        let first: ObjectRef = person();
        let second: ObjectRef = person();
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, _| {
            let mut flip = false;
            b.iter(|| {
                flip = !flip;
                let vm = if flip { &first } else { &second };
                let report = tree
                    .init_child_bindings(scope, Value::Object(Rc::clone(vm)))
                    .expect("init");
                black_box(report.connected);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_fan_out,
    bench_chained_path,
    bench_init_child_bindings
);
criterion_main!(benches);

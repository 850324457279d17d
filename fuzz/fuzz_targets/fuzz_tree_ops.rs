#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use tether_core::{DynamicObject, ObjectRef, PropertySource, Value};
use tether_runtime::{BindingConfig, Lifecycle, NodeId, ViewTree};

#[derive(Arbitrary, Debug)]
enum Op {
    AddNode { parent: u8 },
    MakeScope { node: u8 },
    Bind { node: u8 },
    Init { node: u8, name: u8 },
    SetActive { node: u8, active: bool },
    Destroy { node: u8 },
    Write { name: u8 },
}

fuzz_target!(|ops: Vec<Op>| {
    let mut tree = ViewTree::new();
    let mut nodes: Vec<NodeId> = vec![tree.root()];
    let mut view_models: Vec<std::rc::Rc<DynamicObject>> = Vec::new();
    let pick = |nodes: &[NodeId], i: u8| nodes[usize::from(i) % nodes.len()];

    for op in ops.into_iter().take(256) {
        match op {
            Op::AddNode { parent } => {
                if let Ok(id) = tree.add_node(pick(&nodes, parent), "n") {
                    nodes.push(id);
                }
            }
            Op::MakeScope { node } => {
                let _ = tree.make_scope(pick(&nodes, node));
            }
            Op::Bind { node } => {
                let node = pick(&nodes, node);
                let label = DynamicObject::builder("Label").property("text", "").build();
                let _ = tree.set_element(node, label);
                let _ = tree.add_binding(node, BindingConfig::one_way("name", "text"));
            }
            Op::Init { node, name } => {
                let vm = DynamicObject::builder("Vm")
                    .property("name", i64::from(name))
                    .build();
                view_models.push(vm.clone());
                let _ = tree.init_child_bindings(pick(&nodes, node), vm as ObjectRef);
            }
            Op::SetActive { node, active } => {
                let _ = tree.set_active(pick(&nodes, node), active);
            }
            Op::Destroy { node } => {
                let node = pick(&nodes, node);
                let _ = tree.on_destroy(node);
                nodes.retain(|id| tree.contains(*id));
            }
            Op::Write { name } => {
                for vm in &view_models {
                    let _ = vm.set("name", Value::from(i64::from(name)));
                }
            }
        }
    }

    let stats = tree.stats();
    assert!(stats.connected <= stats.hosts);
    let live: usize = view_models
        .iter()
        .map(|vm| vm.notifier().map_or(0, |n| n.subscriber_count()))
        .sum();
    assert_eq!(live, stats.connected);
});

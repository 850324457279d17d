#![no_main]

use libfuzzer_sys::fuzz_target;
use tether_runtime::{BindingManifest, ViewTree};

fuzz_target!(|data: &str| {
    let Ok(manifest) = BindingManifest::from_toml_str(data) else {
        return;
    };
    let mut tree = ViewTree::new();
    let root = tree.root();
    for entry in &manifest.bindings {
        if tree.find_by_name(root, &entry.element).ok().flatten().is_none() {
            let _ = tree.add_node(root, entry.element.clone());
        }
    }
    let hosts = tree.apply_manifest(root, &manifest).expect("every element exists");
    assert_eq!(hosts.len(), manifest.len());
});

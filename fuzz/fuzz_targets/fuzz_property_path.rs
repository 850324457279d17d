#![no_main]

use libfuzzer_sys::fuzz_target;
use tether_core::PropertyPath;

fuzz_target!(|data: &str| {
    let Ok(path) = PropertyPath::parse(data) else {
        return;
    };
    assert!(!path.is_empty());
    assert!(path.segments().iter().all(|s| !s.is_empty()));
    let reparsed = PropertyPath::parse(&path.to_string()).expect("display output reparses");
    assert_eq!(reparsed.segments(), path.segments());
});

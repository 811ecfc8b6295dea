//! Files the crate manifests point at.

#![allow(clippy::unwrap_used)]

use std::path::Path;

#[test]
fn test_declared_readmes_exist() {
    let crates = Path::new(env!("CARGO_MANIFEST_DIR")).parent().unwrap();
    for krate in ["core", "storefront", "cli", "integration-tests"] {
        let dir = crates.join(krate);
        let manifest = std::fs::read_to_string(dir.join("Cargo.toml")).unwrap();
        let Some(readme) = manifest
            .lines()
            .find_map(|line| line.strip_prefix("readme = "))
        else {
            continue;
        };
        let path = dir.join(readme.trim_matches('"'));
        assert!(path.is_file(), "{} is missing", path.display());
    }
}

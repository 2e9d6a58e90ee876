use std::path::PathBuf;

fn main() {
    println!("cargo::rerun-if-changed=build.rs");
    println!("cargo::rerun-if-changed=tests");

    build_test_package("lang");
}

/// Generates one `#[test]` for every `.lox` program under `tests/<package>`,
/// named after its path.
fn build_test_package(package_name: &str) {
    let out_dir = PathBuf::from(std::env::var_os("OUT_DIR").expect("cargo sets OUT_DIR for build scripts"));

    let mut tests = Vec::new();
    for path in glob::glob(&format!("tests/{}/**/*.lox", package_name)).expect("Failed to read glob pattern").flatten() {
        let name = path
            .with_extension("")
            .strip_prefix(format!("tests/{}", package_name))
            .map(|p| p.to_string_lossy().replace(std::path::MAIN_SEPARATOR, "_"))
            .unwrap_or_default();

        if !name.is_empty() {
            tests.push((path.to_owned(), name));
        }
    }

    let test_defs = tests.iter()
        .map(|(path, name)| format!("#[test]\nfn {name}() {{\n    run_file({:?}).expect(\"no errors\")\n}}", path.display().to_string()))
        .collect::<Vec<_>>()
        .join("\n\n");

    println!("cargo::rerun-if-changed=tests/{package_name}/");
    std::fs::create_dir_all(out_dir.join("tests")).expect("Unable to create test directory");
    std::fs::write(out_dir.join("tests").join(format!("{package_name}.rs")), test_defs).expect("Unable to write test file")
}

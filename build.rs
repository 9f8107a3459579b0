//! Purpose: Compile the bundled rdb engine, or link a prebuilt one, for the Rust FFI layer.
//! Role: Cargo build-script; configures `cc` inputs/includes and rebuild triggers.
//! Invariants: `cargo:rerun-if-changed` covers the C sources and the header.
//! Invariants: Produces (or links) a static `rdb` library exporting the `rdb_*` ABI.
//! Invariants: `RDB_NATIVE_LIB_DIR` selects a prebuilt artifact and skips compilation.
//! Invariants: `cfg(rdb_bundled)` is set only when the bundled engine (with its fault hook) is built.
use std::env;
use std::path::{Path, PathBuf};

fn main() {
    let target = env::var("TARGET").unwrap_or_default();
    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR"));
    let native_dir = manifest_dir.join("native");

    println!("cargo:rerun-if-changed=native/rdb.c");
    println!("cargo:rerun-if-changed=native/rdb.h");
    println!("cargo:rerun-if-env-changed=RDB_NATIVE_LIB_DIR");
    println!("cargo:rustc-check-cfg=cfg(rdb_bundled)");

    if let Some(lib_dir) = env::var_os("RDB_NATIVE_LIB_DIR") {
        link_prebuilt(Path::new(&lib_dir), &target);
        return;
    }

    let mut build = cc::Build::new();
    build
        .include(&native_dir)
        .file(native_dir.join("rdb.c"))
        .warnings(true);

    configure_compiler(&mut build, &target);

    build.compile("rdb");
    println!("cargo:rustc-cfg=rdb_bundled");
}

fn link_prebuilt(lib_dir: &Path, target: &str) {
    let archive = if target.contains("windows-msvc") {
        lib_dir.join("rdb.lib")
    } else {
        lib_dir.join("librdb.a")
    };
    if !archive.exists() {
        panic!(
            "RDB_NATIVE_LIB_DIR is set but `{}` does not exist.\n\
             Fix: point RDB_NATIVE_LIB_DIR at the directory holding the prebuilt rdb archive \
             for target `{target}`, or unset it to build the bundled engine.",
            archive.display()
        );
    }
    println!("cargo:rerun-if-changed={}", archive.display());
    println!("cargo:rustc-link-search=native={}", lib_dir.display());
    println!("cargo:rustc-link-lib=static=rdb");
}

fn configure_compiler(build: &mut cc::Build, target: &str) {
    if target.contains("windows-msvc") {
        build.define("_CRT_SECURE_NO_WARNINGS", None);
    } else {
        build.flag_if_supported("-std=c11");
    }
}

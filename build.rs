// Build script that mirrors the demo page in `static/` into `dist/`.
// The wasm bundle itself is produced by `cargo run` (wasm-pack), which
// writes into static/pkg before this copy picks it up.
use std::{fs, path::Path};

use fs_extra::dir::{copy, CopyOptions};

fn main() {
    println!("cargo:rerun-if-changed=static");

    let out_dir = Path::new("dist");
    if out_dir.exists() {
        fs::remove_dir_all(out_dir).ok();
    }
    if let Err(e) = fs::create_dir_all(out_dir) {
        println!("cargo:warning=cannot create dist/: {e}");
        return;
    }

    let static_dir = Path::new("static");
    if static_dir.exists() {
        let options = CopyOptions {
            content_only: true,
            overwrite: true,
            ..CopyOptions::new()
        };
        if let Err(e) = copy(static_dir, out_dir, &options) {
            println!("cargo:warning=copying static/ to dist/ failed: {e}");
        }
    }
}

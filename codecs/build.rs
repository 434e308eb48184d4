use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-env-changed=LIBHEIF_DIR");

    // Link libheif for HEIC/HEIF decoding when the feature is enabled
    if env::var_os("CARGO_FEATURE_HEIF").is_none() {
        return;
    }

    let manifest_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let libs_dir = env::var_os("LIBHEIF_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| manifest_dir.join("..").join("libs"));

    println!("cargo:rustc-link-search=native={}", libs_dir.display());

    let heif_lib = libs_dir.join("libheif.a");
    if heif_lib.exists() {
        println!("cargo:rustc-link-lib=static=heif");
        // libheif dependencies
        println!("cargo:rustc-link-lib=de265"); // HEVC decoder
        println!("cargo:rustc-link-lib=stdc++");
    } else {
        // Try dynamic linking from system
        println!("cargo:rustc-link-lib=heif");
    }
}

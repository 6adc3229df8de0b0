//! Build script for Snip Upload.
//!
//! The Tauri build step (context generation, capability checks) only runs
//! when the `desktop` feature is on. The upload core has no build steps.

fn main() {
    println!("cargo:rerun-if-changed=tauri.conf.json");
    println!("cargo:rerun-if-changed=capabilities");

    #[cfg(feature = "desktop")]
    tauri_build::build();
}

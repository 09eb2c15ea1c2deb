use chrono::Utc;
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;

const FALLBACK: &str = "unknown";

fn main() {
    let out_dir = env::var_os("OUT_DIR").expect("OUT_DIR is set by cargo");
    let manifest_dir = env::var("CARGO_MANIFEST_DIR").expect("CARGO_MANIFEST_DIR is set by cargo");
    let manifest = Path::new(&manifest_dir).join("Cargo.toml");

    let api_version = fs::read_to_string(&manifest)
        .ok()
        .and_then(|contents| plugin_api_version(&contents))
        .unwrap_or_else(|| FALLBACK.to_string());
    let build_time = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
    let git_hash = short_git_hash().unwrap_or_else(|| FALLBACK.to_string());

    let generated = format!(
        "pub const PLUGIN_API_VERSION: &str = \"{api_version}\";\n\
         pub const BUILD_TIME: &str = \"{build_time}\";\n\
         pub const GIT_HASH: &str = \"{git_hash}\";\n"
    );
    fs::write(Path::new(&out_dir).join("version.rs"), generated)
        .expect("failed to write version.rs");

    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=Cargo.toml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}

/// `[package.metadata] plugin_api_version` from the manifest
fn plugin_api_version(manifest: &str) -> Option<String> {
    let table = manifest.parse::<toml::Table>().ok()?;
    table
        .get("package")?
        .as_table()?
        .get("metadata")?
        .as_table()?
        .get("plugin_api_version")?
        .as_integer()
        .map(|v| v.to_string())
}

fn short_git_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    String::from_utf8(output.stdout)
        .ok()
        .map(|s| s.trim().to_string())
}

// SPDX-License-Identifier: GPL-3.0-only

use std::process::Command;

fn main() {
    println!("cargo::rerun-if-changed=.git/HEAD");
    println!("cargo::rerun-if-env-changed=SCANNER_CAMERA_VERSION");

    // Packagers set the version explicitly; otherwise describe the checkout
    let version = std::env::var("SCANNER_CAMERA_VERSION")
        .ok()
        .or_else(git_describe)
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    println!("cargo::rustc-env=GIT_VERSION={version}");
}

/// `0.2.0` at a tag, `0.2.0-3-gabc1234` after it, the bare hash without tags
fn git_describe() -> Option<String> {
    let output = Command::new("git")
        .args(["describe", "--tags", "--always", "--match", "v*"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }

    let described = String::from_utf8_lossy(&output.stdout).trim().to_string();
    let described = described.strip_prefix('v').unwrap_or(&described);
    (!described.is_empty()).then(|| described.to_string())
}

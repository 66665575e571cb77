// src/commands/version.rs
use std::process::ExitCode;

use crate::config::available_profiles;
use crate::template::available_templates;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const GIT_SHA: &str = env!("VERGEN_GIT_SHA");
const GIT_DIRTY: &str = env!("VERGEN_GIT_DIRTY");
const DEBUG: &str = env!("VERGEN_CARGO_DEBUG");
const TARGET_TRIPLE: &str = env!("VERGEN_CARGO_TARGET_TRIPLE");
const BUILD_DATE: &str = env!("VERGEN_BUILD_DATE");

fn simplify_target(target: &str) -> String {
    target
        .replace("unknown-", "")
        .replace("-gnu", "")
        .replace("-musl", "")
}

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

fn describe(sha: &str, dirty: bool, release: bool, target: &str, date: &str) -> String {
    let sha = short_sha(sha);
    let target = simplify_target(target);
    if release && !dirty {
        // 0.3.0 (abc1234 release linux-x86_64, built 2026-10-18)
        format!("{VERSION} ({sha} release {target}, built {date})")
    } else {
        // 0.3.0 (abc1234+ debug linux-x86_64, built 2026-10-18)
        let dirty = if dirty { "+" } else { "" };
        let profile = if release { "release" } else { "debug" };
        format!("{VERSION} ({sha}{dirty} {profile} {target}, built {date})")
    }
}

pub fn version_string() -> &'static str {
    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();
    VERSION_STRING.get_or_init(|| {
        describe(
            GIT_SHA,
            GIT_DIRTY == "true",
            DEBUG != "true",
            TARGET_TRIPLE,
            BUILD_DATE,
        )
    })
}

pub fn print_version() -> ExitCode {
    println!("holesmith {}", version_string());
    println!("profiles: {}", available_profiles().join(", "));
    println!("templates: {}", available_templates().join(", "));
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn simplifies_target_triples() {
        assert_eq!(simplify_target("x86_64-unknown-linux-gnu"), "x86_64-linux");
        assert_eq!(simplify_target("aarch64-apple-darwin"), "aarch64-apple-darwin");
    }

    #[test]
    fn describes_builds() {
        assert_eq!(short_sha("abc"), "abc");
        let dev = describe("0123456789", true, false, "x86_64-unknown-linux-musl", "2026-10-18");
        assert_eq!(
            dev,
            format!("{VERSION} (0123456+ debug x86_64-linux, built 2026-10-18)")
        );
        let release = describe("0123456789", false, true, "x86_64-unknown-linux-gnu", "2026-10-18");
        assert!(release.contains("(0123456 release x86_64-linux"));
    }
}

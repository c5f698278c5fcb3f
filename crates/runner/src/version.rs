//! Node version gate for native TypeScript execution.

use regex::Regex;
use std::sync::LazyLock;

/// Lowest minor per major that strips TypeScript types natively.
const NATIVE_TS_FLOORS: [(u64, u64); 3] = [(22, 18), (23, 0), (24, 3)];
const LAST_GATED_MAJOR: u64 = 24;

static VERSION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^v?(\d+)\.(\d+)\.(\d+)").expect("valid regex"));

/// Parses the leading `major.minor.patch` of a `--version` string.
pub fn parse_version(raw: &str) -> Option<(u64, u64, u64)> {
    let caps = VERSION_RE.captures(raw.trim())?;
    let part = |i: usize| caps.get(i)?.as_str().parse::<u64>().ok();
    Some((part(1)?, part(2)?, part(3)?))
}

/// True when node at `version` can run `.ts` files without a loader.
///
/// ```
/// use skillx_runner::supports_native_typescript;
///
/// assert!(supports_native_typescript("v22.18.0"));
/// assert!(supports_native_typescript("v23.0.0"));
/// assert!(!supports_native_typescript("v24.2.9"));
/// assert!(!supports_native_typescript("not a version"));
/// ```
pub fn supports_native_typescript(version: &str) -> bool {
    let Some((major, minor, _)) = parse_version(version) else {
        return false;
    };
    if major > LAST_GATED_MAJOR {
        return true;
    }
    NATIVE_TS_FLOORS
        .iter()
        .find(|(m, _)| *m == major)
        .is_some_and(|(_, floor)| minor >= *floor)
}

//! The heap-size flag: deriving it from a memory limit and merging it into
//! an existing runtime-options string.

use crate::cgroup::MemoryLimit;

pub const HEAP_FLAG: &str = "--max-old-space-size";

/// The runtime accepts underscores in flag names as well.
const HEAP_FLAG_UNDERSCORE: &str = "--max_old_space_size";

const MEBIBYTE: u64 = 1024 * 1024;

/// `--max-old-space-size=<MiB>` for a positive limit, empty otherwise.
/// Megabytes are truncated, never rounded up.
pub fn derived_option(limit: MemoryLimit) -> String {
    match limit {
        MemoryLimit::Bytes(bytes) if bytes > 0 => format!("{HEAP_FLAG}={}", bytes / MEBIBYTE),
        _ => String::new(),
    }
}

/// True if any whitespace-separated token already sets the heap size.
pub fn has_explicit_heap_flag(options: &str) -> bool {
    options.split_whitespace().any(|token| {
        token.starts_with(HEAP_FLAG) || token.starts_with(HEAP_FLAG_UNDERSCORE)
    })
}

/// The value the options variable should carry for the child, or `None`
/// when the caller already chose a heap size and the variable stays as is.
///
/// The derived option is appended even when empty, which leaves a single
/// trailing space.
pub fn merge_options(existing: Option<&str>, derived: &str) -> Option<String> {
    let existing = existing.unwrap_or_default();
    if has_explicit_heap_flag(existing) {
        return None;
    }
    Some(format!("{existing} {derived}"))
}

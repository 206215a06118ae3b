// ─── Version Comparison ───
// Numeric dotted-version helpers. Launch behavior branches on a handful of
// Minecraft version thresholds (1.13 argument format, 1.17 merged client
// jar, 1.20 quick play).

use std::cmp::Ordering;

pub fn parse_numeric_version_parts(raw: &str) -> Vec<u32> {
    raw.split(|c: char| !c.is_ascii_digit())
        .filter(|segment| !segment.is_empty())
        .filter_map(|segment| segment.parse::<u32>().ok())
        .collect()
}

pub fn compare_versions(a: &str, b: &str) -> Ordering {
    let a_parts = parse_numeric_version_parts(a);
    let b_parts = parse_numeric_version_parts(b);

    let max_len = a_parts.len().max(b_parts.len());
    for idx in 0..max_len {
        let a_val = a_parts.get(idx).copied().unwrap_or(0);
        let b_val = b_parts.get(idx).copied().unwrap_or(0);
        match a_val.cmp(&b_val) {
            Ordering::Equal => continue,
            non_eq => return non_eq,
        }
    }

    Ordering::Equal
}

/// `true` when `actual` is the same as or newer than `minimum`.
pub fn version_at_least(minimum: &str, actual: &str) -> bool {
    compare_versions(actual, minimum) != Ordering::Less
}

//! Canonical metric-name normalization.
//!
//! Every entry point (bulk registration, framework dispatch, HTTP handlers,
//! FFI exports) resolves display names through this one function. Divergent
//! copies of this logic were the main correctness hazard in earlier iterations
//! of the system, so it lives here and nowhere else.

/// Transform a human-readable KPI display name into a canonical registry key.
///
/// Rules, in order: lower-case; spaces and hyphens become underscores;
/// parentheses are stripped; a leading digit gets a `g` prefix so the result
/// stays a valid identifier in exposition formats.
///
/// The transform is idempotent: applying it to its own output is a no-op.
pub fn normalize_metric_name(display_name: &str) -> String {
    let mut name = String::with_capacity(display_name.len() + 1);
    for c in display_name.chars() {
        match c {
            ' ' | '-' => name.push('_'),
            '(' | ')' => {}
            _ => name.extend(c.to_lowercase()),
        }
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        name.insert(0, 'g');
    }
    name
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn lowercases_and_replaces_separators() {
        assert_eq!(normalize_metric_name("CPU Usage (Percent)"), "cpu_usage_percent");
        assert_eq!(normalize_metric_name("packets-per-second"), "packets_per_second");
        assert_eq!(normalize_metric_name("Active Sessions"), "active_sessions");
    }

    #[test]
    fn guards_leading_digit() {
        let name = normalize_metric_name("5G Sessions");
        assert_eq!(name, "g5g_sessions");
        assert!(!name.starts_with(|c: char| c.is_ascii_digit()));
    }

    #[test]
    fn idempotent() {
        for raw in [
            "CPU Usage (Percent)",
            "5G Sessions",
            "already_normal",
            "Mixed-Case Name",
            "",
        ] {
            let once = normalize_metric_name(raw);
            assert_eq!(normalize_metric_name(&once), once);
        }
    }

    #[test]
    fn empty_stays_empty() {
        assert_eq!(normalize_metric_name(""), "");
        assert_eq!(normalize_metric_name("()"), "");
    }
}

//! Diff rendering for fixture comparison.

/// Render a text diff between expected and actual output.
///
/// Formatter output is usually one line, so besides the differing lines the
/// diff names the first byte where the two diverge. Control bytes are escaped.
#[must_use]
pub fn render_diff(expected: &str, actual: &str) -> String {
    if expected == actual {
        return String::from("[identical]");
    }

    let mut out = String::new();
    out.push_str("--- expected\n");
    out.push_str("+++ actual\n");
    let first = expected
        .bytes()
        .zip(actual.bytes())
        .position(|(e, a)| e != a)
        .unwrap_or_else(|| expected.len().min(actual.len()));
    out.push_str(&format!(
        "@@ byte {first} (expected len {}, actual len {}) @@\n",
        expected.len(),
        actual.len()
    ));

    let expected_lines: Vec<&str> = expected.split('\n').collect();
    let actual_lines: Vec<&str> = actual.split('\n').collect();
    for i in 0..expected_lines.len().max(actual_lines.len()) {
        let e = expected_lines.get(i);
        let a = actual_lines.get(i);
        if e == a {
            continue;
        }
        if expected_lines.len() > 1 || actual_lines.len() > 1 {
            out.push_str(&format!("@@ line {} @@\n", i + 1));
        }
        if let Some(e) = e {
            out.push_str(&format!("-{}\n", e.escape_debug()));
        }
        if let Some(a) = a {
            out.push_str(&format!("+{}\n", a.escape_debug()));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identical_inputs() {
        assert_eq!(render_diff("abc", "abc"), "[identical]");
    }

    #[test]
    fn single_line_reports_first_divergent_byte() {
        let diff = render_diff("1.50e+06", "1.51e+06");
        assert!(diff.contains("@@ byte 3 (expected len 8, actual len 8) @@"));
        assert!(diff.contains("-1.50e+06\n"));
        assert!(diff.contains("+1.51e+06\n"));
        assert!(!diff.contains("@@ line"));
    }

    #[test]
    fn prefix_difference_points_past_shorter() {
        let diff = render_diff("0123", "01");
        assert!(diff.contains("@@ byte 2 "));
    }

    #[test]
    fn extra_lines_are_shown() {
        let diff = render_diff("a\nb", "a\nb\nc");
        assert!(diff.contains("@@ line 3 @@\n+c\n"));
    }

    #[test]
    fn control_bytes_are_escaped() {
        let diff = render_diff("a\tb", "a b");
        assert!(diff.contains("-a\\tb"));
    }
}

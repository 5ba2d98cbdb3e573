//! Output formatting for CLI

use crate::models::RecordIssue;
use crate::validation::Detection;

/// One inspected row worth showing
pub struct InspectedRow {
    pub line: usize,
    pub handle: String,
    pub detection: Detection,
}

/// Format anomaly detection results
pub fn format_inspection(rows: &[InspectedRow], scanned: usize, out_of_scope: usize) -> String {
    let mut output = String::new();

    if rows.is_empty() {
        output.push_str(&format!("\n✅ No anomalies in {} row(s)\n", scanned));
    } else {
        output.push_str(&format!("\n⚠️  {} anomalous row(s):\n", rows.len()));
        for row in rows {
            match &row.detection {
                Detection::Shifted(sig) => output.push_str(&format!(
                    "  - line {} ({}): shift '{}' over {}..{} ({:?}, {} columns)\n",
                    row.line, row.handle, sig.rule, sig.start, sig.end, sig.direction, sig.magnitude
                )),
                Detection::Unrecognised { violations } => output.push_str(&format!(
                    "  - line {} ({}): unrecognised, bad values in {}\n",
                    row.line,
                    row.handle,
                    violations.join(", ")
                )),
                Detection::Clean | Detection::OutOfScope => {}
            }
        }
    }

    if out_of_scope > 0 {
        output.push_str(&format!(
            "\n{} row(s) outside the allow-list were not inspected (use --scan-all)\n",
            out_of_scope
        ));
    }
    output
}

/// Format per-record issues, at most `limit` of them
pub fn format_issues(issues: &[RecordIssue], limit: usize) -> String {
    let mut output = String::new();
    if issues.is_empty() {
        return output;
    }
    output.push_str(&format!("\n⚠️  {} issue(s):\n", issues.len()));
    for issue in issues.iter().take(limit) {
        output.push_str(&format!("  - {}\n", issue));
    }
    if issues.len() > limit {
        output.push_str(&format!("  ... and {} more\n", issues.len() - limit));
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_issues_truncates() {
        let issues: Vec<RecordIssue> = (0..5)
            .map(|line| RecordIssue::AssetNotFound {
                line,
                handle: format!("p{}", line),
            })
            .collect();
        let text = format_issues(&issues, 2);
        assert!(text.contains("5 issue(s)"));
        assert!(text.contains("... and 3 more"));
        assert!(format_issues(&[], 2).is_empty());
    }

    #[test]
    fn test_format_clean_inspection() {
        let text = format_inspection(&[], 12, 3);
        assert!(text.contains("No anomalies in 12 row(s)"));
        assert!(text.contains("--scan-all"));
    }
}

//! Output formatting for CLI

use crate::mapping::{FieldStatus, MappingStats};

/// Format the per-field mapping listing
pub fn format_field_statuses(statuses: &[FieldStatus]) -> String {
    let mut output = String::new();
    let width = statuses.iter().map(|s| s.field.len()).max().unwrap_or(0);
    for status in statuses {
        let marker = if status.is_mapped() { "✓" } else { "✗" };
        output.push_str(&format!(
            "  {} {:width$} ({}) {}",
            marker,
            status.field,
            status.target_type,
            status.describe(),
            width = width
        ));
        if status.has_override {
            output.push_str(" [custom]");
        }
        output.push('\n');
    }
    output
}

/// Format mapping statistics as a short summary block
pub fn format_stats(stats: &MappingStats) -> String {
    let mut output = String::new();
    output.push_str("Mapping Summary\n");
    output.push_str("===============\n");
    output.push_str(&format!("Source fields: {}\n", stats.source_fields));
    output.push_str(&format!("Target fields: {}\n", stats.target_fields));
    output.push_str(&format!(
        "Mapped: {} ({:.1}%)\n",
        stats.mapped_fields,
        stats.coverage() * 100.0
    ));
    output.push_str(&format!("Custom functions: {}\n", stats.override_count));
    if !stats.unmapped.is_empty() {
        output.push_str(&format!("Unmapped: {}\n", stats.unmapped.join(", ")));
    }
    output
}

/// Format validation messages, one per line
pub fn format_issues(issues: &[String]) -> String {
    if issues.is_empty() {
        return "✅ Output matches the target schema\n".to_string();
    }
    let mut output = format!("⚠️  {} issue(s):\n", issues.len());
    for issue in issues {
        output.push_str(&format!("  - {}\n", issue));
    }
    output
}

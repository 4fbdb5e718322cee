use std::fmt::Write;

use chrono::NaiveDate;

use crate::models::{CategoryShortfall, ContactNote, RiskTier, StudentProgress};

pub fn tier_mix(entries: &[StudentProgress]) -> Vec<(RiskTier, usize)> {
    let tiers = [
        RiskTier::Critical,
        RiskTier::AtRisk,
        RiskTier::Watch,
        RiskTier::OnTrack,
    ];

    tiers
        .into_iter()
        .map(|tier| {
            let count = entries
                .iter()
                .filter(|entry| entry.risk.tier == tier)
                .count();
            (tier, count)
        })
        .collect()
}

pub fn summarize_shortfalls(entries: &[StudentProgress]) -> Vec<CategoryShortfall> {
    let mut map: std::collections::HashMap<String, (usize, f64)> =
        std::collections::HashMap::new();

    for entry in entries {
        for deficiency in &entry.summary.deficiencies {
            let slot = map.entry(deficiency.category_name.clone()).or_insert((0, 0.0));
            slot.0 += 1;
            slot.1 += deficiency.needed;
        }
    }

    let mut shortfalls: Vec<CategoryShortfall> = map
        .into_iter()
        .map(|(category_name, (student_count, total_needed))| CategoryShortfall {
            category_name,
            student_count,
            total_needed,
        })
        .collect();

    shortfalls.sort_by(|a, b| b.student_count.cmp(&a.student_count));
    shortfalls
}

pub fn build_report(
    scope: Option<&str>,
    period: i32,
    generated_on: NaiveDate,
    entries: &[StudentProgress],
    notes: &[ContactNote],
) -> String {
    let mut output = String::new();
    let scope_label = scope.unwrap_or("all students");

    let _ = writeln!(output, "# Graduation Credit Risk Report");
    let _ = writeln!(
        output,
        "Generated for {} (trimester {}, {})",
        scope_label, period, generated_on
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Tier Mix");

    if entries.is_empty() {
        let _ = writeln!(output, "No students matched this scope.");
    } else {
        for (tier, count) in tier_mix(entries) {
            let _ = writeln!(output, "- {}: {} students", tier.label(), count);
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Students Most Behind");

    let flagged: Vec<&StudentProgress> = entries
        .iter()
        .filter(|entry| entry.risk.needs_attention())
        .collect();

    if flagged.is_empty() {
        let _ = writeln!(output, "No students behind expectation for this scope.");
    } else {
        for entry in flagged.iter().take(10) {
            let _ = writeln!(
                output,
                "- {} ({}, grade {}) {} behind by {:.1} credits ({} of {} expected)",
                entry.student.full_name,
                entry.student.email,
                entry.student.grade_level,
                entry.risk.tier.label(),
                entry.risk.credits_behind,
                entry.risk.earned_credits,
                entry.risk.expected_credits
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Deficiency Hotspots");

    let shortfalls = summarize_shortfalls(entries);
    if shortfalls.is_empty() {
        let _ = writeln!(output, "No category deficiencies in this scope.");
    } else {
        for shortfall in shortfalls.iter() {
            let _ = writeln!(
                output,
                "- {}: {} students short, {:.1} credits needed in total",
                shortfall.category_name, shortfall.student_count, shortfall.total_needed
            );
        }
    }

    let mut recent_notes = notes.to_vec();
    recent_notes.sort_by(|a, b| b.noted_on.cmp(&a.noted_on));
    let _ = writeln!(output);
    let _ = writeln!(output, "## Recent Contact Notes");

    if recent_notes.is_empty() {
        let _ = writeln!(output, "No contact notes recorded for this scope.");
    } else {
        for note in recent_notes.iter().take(5) {
            let _ = writeln!(
                output,
                "- {} ({}) on {}: {}",
                note.student_name, note.student_email, note.noted_on, note.note
            );
        }
    }

    output
}

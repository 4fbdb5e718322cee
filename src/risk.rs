use std::collections::HashMap;

use uuid::Uuid;

use crate::credits;
use crate::models::{
    CourseRecord, CreditCategory, ProgressSummary, RiskAssessment, RiskTier, StudentProgress,
    StudentRecord,
};

/// District policy: expected percent of total required credits by grade
/// (rows, 9 through 12) and trimester (columns, 1 through 3). Non-decreasing
/// along both axes.
const EXPECTED_PERCENT: [[i64; 3]; 4] = [
    [0, 8, 17],
    [25, 33, 42],
    [50, 58, 67],
    [75, 83, 92],
];

/// Baseline lookup. Grades outside 9-12 and periods outside 1-3 have no
/// configured expectation and resolve to 0, the most lenient reading.
pub fn expected_percent(grade_level: i32, period: i32) -> i64 {
    if !(9..=12).contains(&grade_level) || !(1..=3).contains(&period) {
        return 0;
    }
    EXPECTED_PERCENT[(grade_level - 9) as usize][(period - 1) as usize]
}

pub fn tier_for(credits_behind: f64) -> RiskTier {
    if credits_behind >= 3.0 {
        RiskTier::Critical
    } else if credits_behind >= 1.5 {
        RiskTier::AtRisk
    } else if credits_behind >= 0.5 {
        RiskTier::Watch
    } else {
        RiskTier::OnTrack
    }
}

/// Compares earned credits against the grade-and-period baseline. Behind is
/// floored at zero so ahead-of-schedule students read as on-track.
pub fn classify(grade_level: i32, period: i32, summary: &ProgressSummary) -> RiskAssessment {
    let expected_percentage = expected_percent(grade_level, period);
    let expected_credits = expected_percentage as f64 / 100.0 * summary.total_required;
    let credits_behind = (expected_credits - summary.total_earned).max(0.0);

    RiskAssessment {
        tier: tier_for(credits_behind),
        credits_behind,
        expected_credits,
        expected_percentage,
        earned_credits: summary.total_earned,
    }
}

/// Evaluates and classifies every student in the roster independently,
/// sorted most-behind first.
pub fn assess_caseload(
    students: &[StudentRecord],
    courses: &[CourseRecord],
    categories: &[CreditCategory],
    period: i32,
) -> Vec<StudentProgress> {
    let mut courses_by_student: HashMap<Uuid, Vec<CourseRecord>> = HashMap::new();
    for course in courses {
        courses_by_student
            .entry(course.student_id)
            .or_default()
            .push(course.clone());
    }

    let empty = Vec::new();
    let mut entries: Vec<StudentProgress> = students
        .iter()
        .map(|student| {
            let student_courses = courses_by_student.get(&student.id).unwrap_or(&empty);
            let summary = credits::evaluate(student_courses, categories);
            let risk = classify(student.grade_level, period, &summary);
            StudentProgress {
                student: student.clone(),
                summary,
                risk,
            }
        })
        .collect();

    entries.sort_by(|a, b| {
        b.risk
            .credits_behind
            .partial_cmp(&a.risk.credits_behind)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn summary_with(total_earned: f64, total_required: f64) -> ProgressSummary {
        ProgressSummary {
            credits_by_category: HashMap::new(),
            total_earned,
            total_required,
            percentage: 0,
            deficiencies: Vec::new(),
            associate_credits: 0.0,
            transfer_credits: 0.0,
            total_dual_credits: 0.0,
        }
    }

    fn sample_student(grade_level: i32) -> StudentRecord {
        StudentRecord {
            id: Uuid::new_v4(),
            full_name: "Avery Lee".to_string(),
            email: "avery.lee@rosemont.edu".to_string(),
            grade_level,
            graduation_year: 2027,
        }
    }

    fn sample_course(student_id: Uuid, credits: f64) -> CourseRecord {
        CourseRecord {
            id: Uuid::new_v4(),
            student_id,
            name: "English 9".to_string(),
            credits,
            category_id: None,
            term: "2025-T1".to_string(),
            grade: None,
            is_dual_credit: false,
            dual_credit_type: None,
            recorded_at: NaiveDate::from_ymd_opt(2025, 11, 4).unwrap(),
        }
    }

    #[test]
    fn expectation_table_anchor_points() {
        assert_eq!(expected_percent(9, 1), 0);
        assert_eq!(expected_percent(11, 1), 50);
        assert_eq!(expected_percent(12, 3), 92);
    }

    #[test]
    fn expectation_table_is_monotone() {
        for grade in 9..=12 {
            for period in 1..=2 {
                assert!(expected_percent(grade, period) <= expected_percent(grade, period + 1));
            }
        }
        for period in 1..=3 {
            for grade in 9..=11 {
                assert!(expected_percent(grade, period) <= expected_percent(grade + 1, period));
            }
        }
    }

    #[test]
    fn unknown_grade_or_period_expects_nothing() {
        assert_eq!(expected_percent(8, 1), 0);
        assert_eq!(expected_percent(13, 2), 0);
        assert_eq!(expected_percent(10, 0), 0);
        assert_eq!(expected_percent(10, 9), 0);
    }

    #[test]
    fn tier_boundaries_are_inclusive_on_the_lower_bound() {
        assert_eq!(tier_for(3.0), RiskTier::Critical);
        assert_eq!(tier_for(1.5), RiskTier::AtRisk);
        assert_eq!(tier_for(0.5), RiskTier::Watch);
        assert_eq!(tier_for(0.49999), RiskTier::OnTrack);
        assert_eq!(tier_for(0.0), RiskTier::OnTrack);
        assert_eq!(tier_for(5.5), RiskTier::Critical);
    }

    #[test]
    fn eleventh_grader_three_behind_is_critical() {
        let summary = summary_with(9.0, 24.0);
        let risk = classify(11, 1, &summary);

        assert!((risk.expected_credits - 12.0).abs() < 1e-9);
        assert!((risk.credits_behind - 3.0).abs() < 1e-9);
        assert_eq!(risk.tier, RiskTier::Critical);
        assert_eq!(risk.expected_percentage, 50);
        assert!(risk.needs_attention());
    }

    #[test]
    fn fresh_ninth_grader_is_on_track() {
        let summary = summary_with(0.0, 24.0);
        let risk = classify(9, 1, &summary);

        assert!((risk.credits_behind - 0.0).abs() < 1e-9);
        assert_eq!(risk.tier, RiskTier::OnTrack);
        assert!(!risk.needs_attention());
    }

    #[test]
    fn ahead_of_schedule_floors_at_zero_behind() {
        let summary = summary_with(20.0, 24.0);
        let risk = classify(10, 2, &summary);

        assert!((risk.credits_behind - 0.0).abs() < 1e-9);
        assert_eq!(risk.tier, RiskTier::OnTrack);
    }

    #[test]
    fn grade_outside_nine_through_twelve_is_neutral() {
        let summary = summary_with(0.0, 24.0);
        let risk = classify(7, 3, &summary);

        assert_eq!(risk.tier, RiskTier::OnTrack);
        assert!((risk.expected_credits - 0.0).abs() < 1e-9);
        assert_eq!(risk.expected_percentage, 0);
    }

    #[test]
    fn later_periods_never_ease_the_classification() {
        let summary = summary_with(9.0, 24.0);
        let mut previous_behind = 0.0;
        let mut previous_tier = RiskTier::OnTrack;

        for period in 1..=3 {
            let risk = classify(11, period, &summary);
            assert!(risk.credits_behind >= previous_behind);
            assert!(risk.tier >= previous_tier);
            previous_behind = risk.credits_behind;
            previous_tier = risk.tier;
        }
    }

    #[test]
    fn caseload_sorts_most_behind_first() {
        let behind = sample_student(12);
        let fresh = sample_student(9);
        let courses = vec![sample_course(behind.id, 2.0)];
        let categories = vec![CreditCategory {
            id: Uuid::new_v4(),
            name: "English".to_string(),
            required_credits: 24.0,
            display_order: 1,
        }];

        let entries = assess_caseload(
            &[fresh.clone(), behind.clone()],
            &courses,
            &categories,
            1,
        );

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].student.id, behind.id);
        assert_eq!(entries[0].risk.tier, RiskTier::Critical);
        assert_eq!(entries[1].student.id, fresh.id);
        assert_eq!(entries[1].risk.tier, RiskTier::OnTrack);
    }

    #[test]
    fn students_without_courses_get_zero_summaries() {
        let student = sample_student(9);
        let entries = assess_caseload(&[student.clone()], &[], &[], 1);

        assert_eq!(entries.len(), 1);
        assert!((entries[0].summary.total_earned - 0.0).abs() < 1e-9);
        assert_eq!(entries[0].risk.tier, RiskTier::OnTrack);
    }

    #[test]
    fn course_order_does_not_change_results() {
        let student = sample_student(11);
        let categories = vec![CreditCategory {
            id: Uuid::new_v4(),
            name: "English".to_string(),
            required_credits: 24.0,
            display_order: 1,
        }];
        let a = sample_course(student.id, 1.0);
        let b = sample_course(student.id, 2.5);

        let forward = assess_caseload(
            &[student.clone()],
            &[a.clone(), b.clone()],
            &categories,
            2,
        );
        let reversed = assess_caseload(&[student.clone()], &[b, a], &categories, 2);

        assert_eq!(forward[0].summary, reversed[0].summary);
        assert_eq!(forward[0].risk, reversed[0].risk);
    }
}

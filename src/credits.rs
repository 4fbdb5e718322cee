use std::collections::HashMap;

use crate::models::{CourseRecord, CreditCategory, Deficiency, ProgressSummary};

/// Sums a student's credits against the school's category requirements.
///
/// Total over all inputs: unknown or missing category ids land in the grand
/// total only, an empty category table degrades to percentage 0, and credit
/// values are passed through arithmetically as stored.
pub fn evaluate(courses: &[CourseRecord], categories: &[CreditCategory]) -> ProgressSummary {
    let mut credits_by_category: HashMap<uuid::Uuid, f64> =
        categories.iter().map(|category| (category.id, 0.0)).collect();

    let mut total_earned = 0.0;
    let mut associate_credits = 0.0;
    let mut transfer_credits = 0.0;
    let mut total_dual_credits = 0.0;

    for course in courses {
        total_earned += course.credits;

        if let Some(category_id) = course.category_id {
            if let Some(earned) = credits_by_category.get_mut(&category_id) {
                *earned += course.credits;
            }
        }

        if course.is_dual_credit {
            total_dual_credits += course.credits;
            if let Some(dual_type) = course.dual_credit_type {
                if dual_type.counts_toward_associate() {
                    associate_credits += course.credits;
                }
                if dual_type.counts_toward_transfer() {
                    transfer_credits += course.credits;
                }
            }
        }
    }

    let total_required: f64 = categories.iter().map(|c| c.required_credits).sum();
    let percentage = if total_required > 0.0 {
        round_half_up(total_earned / total_required * 100.0).max(0)
    } else {
        0
    };

    let mut ordered: Vec<&CreditCategory> = categories.iter().collect();
    ordered.sort_by_key(|category| category.display_order);

    let mut deficiencies = Vec::new();
    for category in ordered {
        let earned = credits_by_category.get(&category.id).copied().unwrap_or(0.0);
        if earned < category.required_credits {
            deficiencies.push(Deficiency {
                category_id: category.id,
                category_name: category.name.clone(),
                earned,
                required: category.required_credits,
                needed: category.required_credits - earned,
            });
        }
    }

    ProgressSummary {
        credits_by_category,
        total_earned,
        total_required,
        percentage,
        deficiencies,
        associate_credits,
        transfer_credits,
        total_dual_credits,
    }
}

/// Per-category completion percent for display, capped at 100.
pub fn category_percent(earned: f64, required: f64) -> i64 {
    if required <= 0.0 {
        return 100;
    }
    round_half_up(earned / required * 100.0).clamp(0, 100)
}

pub fn round_half_up(value: f64) -> i64 {
    (value + 0.5).floor() as i64
}

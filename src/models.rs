use std::collections::HashMap;

use chrono::NaiveDate;
use serde::Serialize;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DualCreditType {
    Associate,
    Transfer,
    Both,
}

impl DualCreditType {
    /// Resolves the loosely-typed strings that arrive from imports and legacy
    /// rows. Anything unrecognized is treated as an untyped dual-credit flag.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "associate" => Some(DualCreditType::Associate),
            "transfer" => Some(DualCreditType::Transfer),
            "both" => Some(DualCreditType::Both),
            _ => None,
        }
    }

    pub fn counts_toward_associate(self) -> bool {
        matches!(self, DualCreditType::Associate | DualCreditType::Both)
    }

    pub fn counts_toward_transfer(self) -> bool {
        matches!(self, DualCreditType::Transfer | DualCreditType::Both)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DualCreditType::Associate => "associate",
            DualCreditType::Transfer => "transfer",
            DualCreditType::Both => "both",
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreditCategory {
    pub id: Uuid,
    pub name: String,
    pub required_credits: f64,
    pub display_order: i32,
}

#[derive(Debug, Clone)]
pub struct CourseRecord {
    pub id: Uuid,
    pub student_id: Uuid,
    pub name: String,
    pub credits: f64,
    pub category_id: Option<Uuid>,
    pub term: String,
    pub grade: Option<String>,
    pub is_dual_credit: bool,
    pub dual_credit_type: Option<DualCreditType>,
    pub recorded_at: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct StudentRecord {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
    pub grade_level: i32,
    pub graduation_year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deficiency {
    pub category_id: Uuid,
    pub category_name: String,
    pub earned: f64,
    pub required: f64,
    pub needed: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub credits_by_category: HashMap<Uuid, f64>,
    pub total_earned: f64,
    pub total_required: f64,
    pub percentage: i64,
    pub deficiencies: Vec<Deficiency>,
    pub associate_credits: f64,
    pub transfer_credits: f64,
    pub total_dual_credits: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RiskTier {
    OnTrack,
    Watch,
    AtRisk,
    Critical,
}

impl RiskTier {
    pub fn label(self) -> &'static str {
        match self {
            RiskTier::OnTrack => "on-track",
            RiskTier::Watch => "watch",
            RiskTier::AtRisk => "at-risk",
            RiskTier::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub credits_behind: f64,
    pub expected_credits: f64,
    pub expected_percentage: i64,
    pub earned_credits: f64,
}

impl RiskAssessment {
    pub fn needs_attention(&self) -> bool {
        self.tier != RiskTier::OnTrack
    }
}

#[derive(Debug, Clone)]
pub struct StudentProgress {
    pub student: StudentRecord,
    pub summary: ProgressSummary,
    pub risk: RiskAssessment,
}

#[derive(Debug, Clone)]
pub struct ContactNote {
    pub student_name: String,
    pub student_email: String,
    pub note: String,
    pub noted_on: NaiveDate,
}

#[derive(Debug, Clone)]
pub struct CategoryShortfall {
    pub category_name: String,
    pub student_count: usize,
    pub total_needed: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dual_credit_type_parses_case_insensitively() {
        assert_eq!(DualCreditType::parse("Associate"), Some(DualCreditType::Associate));
        assert_eq!(DualCreditType::parse(" TRANSFER "), Some(DualCreditType::Transfer));
        assert_eq!(DualCreditType::parse("both"), Some(DualCreditType::Both));
        assert_eq!(DualCreditType::parse("dual"), None);
        assert_eq!(DualCreditType::parse(""), None);
    }

    #[test]
    fn both_counts_toward_each_pathway() {
        assert!(DualCreditType::Both.counts_toward_associate());
        assert!(DualCreditType::Both.counts_toward_transfer());
        assert!(DualCreditType::Associate.counts_toward_associate());
        assert!(!DualCreditType::Associate.counts_toward_transfer());
        assert!(!DualCreditType::Transfer.counts_toward_associate());
    }

    #[test]
    fn tiers_order_by_severity() {
        assert!(RiskTier::Critical > RiskTier::AtRisk);
        assert!(RiskTier::AtRisk > RiskTier::Watch);
        assert!(RiskTier::Watch > RiskTier::OnTrack);
    }
}

//! Rule-based risk classification.
//!
//! Two cutoffs live here. The label stamped onto a record at generation time
//! always uses [`GRADE_CUTOFF`] and [`ATTENDANCE_CUTOFF`]. The analysis view
//! takes a caller-chosen grade threshold, so the two may disagree when that
//! threshold is not 60.

use crate::record::StudentRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const GRADE_CUTOFF: f64 = 60.0;
pub const ATTENDANCE_CUTOFF: f64 = 0.7;

/// One human-readable reason a student may be struggling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskFactor {
    #[serde(rename = "Low final grade")]
    LowFinalGrade,
    #[serde(rename = "Poor attendance")]
    PoorAttendance,
    #[serde(rename = "Low assignment scores")]
    LowAssignmentScores,
    #[serde(rename = "Low quiz scores")]
    LowQuizScores,
    #[serde(rename = "Frequent late submissions")]
    FrequentLateSubmissions,
    #[serde(rename = "Low engagement")]
    LowEngagement,
    #[serde(rename = "Insufficient study time")]
    InsufficientStudyTime,
}

impl RiskFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFactor::LowFinalGrade => "Low final grade",
            RiskFactor::PoorAttendance => "Poor attendance",
            RiskFactor::LowAssignmentScores => "Low assignment scores",
            RiskFactor::LowQuizScores => "Low quiz scores",
            RiskFactor::FrequentLateSubmissions => "Frequent late submissions",
            RiskFactor::LowEngagement => "Low engagement",
            RiskFactor::InsufficientStudyTime => "Insufficient study time",
        }
    }
}

impl fmt::Display for RiskFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lists every risk factor that applies to `record`.
///
/// Checks run in a fixed order so the output is stable.
pub fn risk_factors(record: &StudentRecord) -> Vec<RiskFactor> {
    let checks = [
        (record.final_grade < GRADE_CUTOFF, RiskFactor::LowFinalGrade),
        (record.attendance_rate < ATTENDANCE_CUTOFF, RiskFactor::PoorAttendance),
        (record.avg_assignment_score < 60.0, RiskFactor::LowAssignmentScores),
        (record.avg_quiz_score < 60.0, RiskFactor::LowQuizScores),
        (record.n_late_submissions > 5, RiskFactor::FrequentLateSubmissions),
        (record.forum_posts < 3, RiskFactor::LowEngagement),
        (record.time_on_platform < 3.0, RiskFactor::InsufficientStudyTime),
    ];

    checks
        .into_iter()
        .filter_map(|(applies, factor)| applies.then_some(factor))
        .collect()
}

/// Generation-time label: fixed 60 / 0.7 cutoffs.
pub fn at_risk_label(final_grade: f64, attendance_rate: f64) -> u8 {
    u8::from(final_grade < GRADE_CUTOFF || attendance_rate < ATTENDANCE_CUTOFF)
}

/// Analysis-time rule with a configurable grade threshold.
pub fn qualifies_as_at_risk(record: &StudentRecord, grade_threshold: f64) -> bool {
    record.final_grade < grade_threshold || record.attendance_rate < ATTENDANCE_CUTOFF
}

/// Derived copy of a record with its risk factors attached.
///
/// The source dataset is never touched.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AtRiskStudent {
    #[serde(flatten)]
    pub record: StudentRecord,
    pub risk_factors: Vec<RiskFactor>,
}

impl AtRiskStudent {
    pub fn from_record(record: &StudentRecord) -> Self {
        AtRiskStudent {
            risk_factors: risk_factors(record),
            record: record.clone(),
        }
    }

    pub fn factor_labels(&self) -> Vec<&'static str> {
        self.risk_factors.iter().map(RiskFactor::as_str).collect()
    }
}

use serde::{Deserialize, Serialize};

/// Feature columns handed to the risk predictor, in this exact order.
pub const FEATURE_COLUMNS: [&str; 6] = [
    "attendance_rate",
    "avg_assignment_score",
    "avg_quiz_score",
    "forum_posts",
    "time_on_platform",
    "n_late_submissions",
];

/// Label column the predictor trains against.
pub const LABEL_COLUMN: &str = "at_risk";

/// One synthetic student row.
///
/// Field names double as the CSV header, so they must not be renamed.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct StudentRecord {
    pub student_id: String,
    pub name: String,
    pub age: u32,
    pub attendance_rate: f64,
    pub avg_assignment_score: f64,
    pub avg_quiz_score: f64,
    pub forum_posts: u32,
    pub time_on_platform: f64,
    pub n_late_submissions: u32,
    pub final_grade: f64,
    pub at_risk: u8,
}

impl StudentRecord {
    /// The six predictor features, ordered as in [`FEATURE_COLUMNS`].
    pub fn features(&self) -> [f64; 6] {
        [
            self.attendance_rate,
            self.avg_assignment_score,
            self.avg_quiz_score,
            self.forum_posts as f64,
            self.time_on_platform,
            self.n_late_submissions as f64,
        ]
    }

    pub fn is_labelled_at_risk(&self) -> bool {
        self.at_risk == 1
    }
}

/// Ordered collection of records in generation order.
pub type Dataset = Vec<StudentRecord>;

/// Formats the 1-based sequence number as `STU0001`.
///
/// Only 1..=9999 fit the format; the generator rejects larger datasets
/// before any id is built.
pub fn student_id(sequence: usize) -> String {
    format!("STU{:04}", sequence)
}

/// Rounds to two decimals, the precision every stored float uses.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

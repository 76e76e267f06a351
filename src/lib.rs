//! Student performance analytics: synthetic cohort generation, risk
//! labelling, descriptive statistics and an at-risk classifier.
//!
//! ```no_run
//! use student_analytics::{StudentAnalyzer, StudentDataGenerator};
//!
//! let data = StudentDataGenerator::new(42).generate_student_data(100)?;
//! let summary = StudentAnalyzer::new(&data).get_summary_statistics()?;
//! println!("{} of {} students at risk", summary.at_risk_count, summary.total_students);
//! # Ok::<(), student_analytics::AnalyticsError>(())
//! ```

pub mod analytics;
pub mod api;
pub mod charts;
pub mod config;
pub mod data;
pub mod error;
pub mod generator;
pub mod model;
pub mod plot;
pub mod record;
pub mod risk;

pub use analytics::{
    AnalysisReport, CorrelationEntry, Distribution, EngagementMetrics, StudentAnalyzer,
    SummaryStats, TopPerformer,
};
pub use config::AppConfig;
pub use error::{AnalyticsError, Result};
pub use generator::{StudentDataGenerator, WeeklyRecord};
pub use model::{FeatureImportance, RiskPredictor, TrainingMetrics};
pub use record::{Dataset, StudentRecord, FEATURE_COLUMNS, LABEL_COLUMN};
pub use risk::{risk_factors, AtRiskStudent, RiskFactor};

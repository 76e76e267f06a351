use crate::error::{AnalyticsError, Result};
use crate::generator::WeeklyRecord;
use crate::record::{round2, round3, StudentRecord, FEATURE_COLUMNS};
use crate::risk::{qualifies_as_at_risk, AtRiskStudent, GRADE_CUTOFF};
use serde::Serialize;
use std::cmp::Ordering;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct SummaryStats {
    pub total_students: usize,
    pub at_risk_count: usize,
    pub at_risk_percentage: f64,
    pub avg_final_grade: f64,
    pub avg_attendance: f64,
    pub avg_assignment_score: f64,
    pub avg_quiz_score: f64,
    pub total_forum_posts: u64,
    pub avg_time_on_platform: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct TopPerformer {
    pub student_id: String,
    pub name: String,
    pub final_grade: f64,
    pub attendance_rate: f64,
    pub avg_assignment_score: f64,
}

/// Pearson correlation of one feature against `final_grade`.
///
/// `correlation` is `None` when either column has zero variance.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct CorrelationEntry {
    pub feature: String,
    pub correlation: Option<f64>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Distribution {
    pub excellent: usize,
    pub good: usize,
    pub satisfactory: usize,
    pub poor: usize,
    pub mean: f64,
    pub median: f64,
    /// Sample standard deviation; `None` for a single record.
    pub std: Option<f64>,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct EngagementMetrics {
    pub avg_forum_posts: f64,
    pub median_forum_posts: f64,
    pub highly_engaged: usize,
    pub low_engagement: usize,
    pub avg_platform_time: f64,
}

/// Every analysis section computed over one dataset.
#[derive(Debug, Serialize, Clone)]
pub struct AnalysisReport {
    pub summary: SummaryStats,
    pub at_risk: Vec<AtRiskStudent>,
    pub correlations: Vec<CorrelationEntry>,
    pub distribution: Distribution,
    pub top_performers: Vec<TopPerformer>,
    pub engagement: EngagementMetrics,
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum TrendDirection {
    Improving,
    Declining,
    Stable,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct StudentTrend {
    pub student_id: String,
    pub weeks: usize,
    pub avg_weekly_score: f64,
    pub avg_hours_studied: f64,
    pub total_assignments: u32,
    pub score_change: f64,
    pub overall_trend: TrendDirection,
}

/// Read-only analysis over a dataset. Never mutates the records it borrows.
pub struct StudentAnalyzer<'a> {
    data: &'a [StudentRecord],
}

impl<'a> StudentAnalyzer<'a> {
    pub fn new(data: &'a [StudentRecord]) -> Self {
        StudentAnalyzer { data }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get_summary_statistics(&self) -> Result<SummaryStats> {
        self.require_records("summary statistics")?;

        let at_risk_count = self.data.iter().filter(|s| s.is_labelled_at_risk()).count();
        let at_risk_share = self.mean_of(|s| f64::from(s.at_risk));

        Ok(SummaryStats {
            total_students: self.data.len(),
            at_risk_count,
            at_risk_percentage: round2(at_risk_share * 100.0),
            avg_final_grade: round2(self.mean_of(|s| s.final_grade)),
            avg_attendance: round2(self.mean_of(|s| s.attendance_rate)),
            avg_assignment_score: round2(self.mean_of(|s| s.avg_assignment_score)),
            avg_quiz_score: round2(self.mean_of(|s| s.avg_quiz_score)),
            total_forum_posts: self.data.iter().map(|s| u64::from(s.forum_posts)).sum(),
            avg_time_on_platform: round2(self.mean_of(|s| s.time_on_platform)),
        })
    }

    /// Students under `threshold` or with poor attendance, lowest grade first.
    pub fn identify_at_risk_students(&self, threshold: f64) -> Result<Vec<AtRiskStudent>> {
        self.require_records("at-risk identification")?;
        if !threshold.is_finite() || threshold < 0.0 {
            return Err(AnalyticsError::invalid(format!(
                "risk threshold must be a non-negative number, got {}",
                threshold
            )));
        }

        let mut at_risk: Vec<AtRiskStudent> = self
            .data
            .iter()
            .filter(|s| qualifies_as_at_risk(s, threshold))
            .map(AtRiskStudent::from_record)
            .collect();
        // sort_by is stable, ties keep dataset order
        at_risk.sort_by(|a, b| a.record.final_grade.total_cmp(&b.record.final_grade));
        Ok(at_risk)
    }

    pub fn identify_at_risk_default(&self) -> Result<Vec<AtRiskStudent>> {
        self.identify_at_risk_students(GRADE_CUTOFF)
    }

    /// The `n` best final grades; returns everyone when `n` exceeds the dataset.
    pub fn get_top_performers(&self, n: usize) -> Result<Vec<TopPerformer>> {
        self.require_records("top performers")?;
        if n == 0 {
            return Err(AnalyticsError::invalid("top-N must be at least 1"));
        }

        let mut ranked: Vec<&StudentRecord> = self.data.iter().collect();
        ranked.sort_by(|a, b| b.final_grade.total_cmp(&a.final_grade));

        Ok(ranked
            .into_iter()
            .take(n)
            .map(|s| TopPerformer {
                student_id: s.student_id.clone(),
                name: s.name.clone(),
                final_grade: s.final_grade,
                attendance_rate: s.attendance_rate,
                avg_assignment_score: s.avg_assignment_score,
            })
            .collect())
    }

    /// Features ranked by |r| against final grade; undefined ones go last.
    pub fn calculate_correlations(&self) -> Result<Vec<CorrelationEntry>> {
        self.require_records("correlations")?;

        let grades: Vec<f64> = self.data.iter().map(|s| s.final_grade).collect();
        let mut correlations: Vec<CorrelationEntry> = FEATURE_COLUMNS
            .iter()
            .enumerate()
            .map(|(column, name)| {
                let values: Vec<f64> = self.data.iter().map(|s| s.features()[column]).collect();
                CorrelationEntry {
                    feature: name.to_string(),
                    correlation: pearson(&values, &grades).map(round3),
                }
            })
            .collect();

        correlations.sort_by(|a, b| match (a.correlation, b.correlation) {
            (Some(x), Some(y)) => y.abs().total_cmp(&x.abs()),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        });
        Ok(correlations)
    }

    pub fn analyze_performance_distribution(&self) -> Result<Distribution> {
        self.require_records("performance distribution")?;

        let grades: Vec<f64> = self.data.iter().map(|s| s.final_grade).collect();
        let mut distribution = Distribution {
            excellent: 0,
            good: 0,
            satisfactory: 0,
            poor: 0,
            mean: round2(mean(&grades)),
            median: round2(median(&grades)),
            std: sample_std(&grades).map(round2),
            min: round2(grades.iter().copied().fold(f64::INFINITY, f64::min)),
            max: round2(grades.iter().copied().fold(f64::NEG_INFINITY, f64::max)),
        };

        for grade in &grades {
            match *grade {
                g if g >= 90.0 => distribution.excellent += 1,
                g if g >= 75.0 => distribution.good += 1,
                g if g >= 60.0 => distribution.satisfactory += 1,
                _ => distribution.poor += 1,
            }
        }
        Ok(distribution)
    }

    pub fn get_engagement_metrics(&self) -> Result<EngagementMetrics> {
        self.require_records("engagement metrics")?;

        let posts: Vec<f64> = self.data.iter().map(|s| f64::from(s.forum_posts)).collect();
        Ok(EngagementMetrics {
            avg_forum_posts: round2(mean(&posts)),
            median_forum_posts: median(&posts),
            highly_engaged: self.data.iter().filter(|s| s.forum_posts > 10).count(),
            low_engagement: self.data.iter().filter(|s| s.forum_posts < 3).count(),
            avg_platform_time: round2(self.mean_of(|s| s.time_on_platform)),
        })
    }

    pub fn full_report(&self, threshold: f64, top_n: usize) -> Result<AnalysisReport> {
        Ok(AnalysisReport {
            summary: self.get_summary_statistics()?,
            at_risk: self.identify_at_risk_students(threshold)?,
            correlations: self.calculate_correlations()?,
            distribution: self.analyze_performance_distribution()?,
            top_performers: self.get_top_performers(top_n)?,
            engagement: self.get_engagement_metrics()?,
        })
    }

    fn require_records(&self, operation: &'static str) -> Result<()> {
        if self.data.is_empty() {
            return Err(AnalyticsError::empty(operation));
        }
        Ok(())
    }

    fn mean_of(&self, field: impl Fn(&StudentRecord) -> f64) -> f64 {
        self.data.iter().map(field).sum::<f64>() / self.data.len() as f64
    }
}

/// Summarises one student's weekly series.
pub fn summarize_weekly_series(series: &[WeeklyRecord]) -> Result<StudentTrend> {
    let (first, last) = match (series.first(), series.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Err(AnalyticsError::empty("weekly trend")),
    };

    let scores: Vec<f64> = series.iter().map(|w| w.weekly_score).collect();
    let hours: Vec<f64> = series.iter().map(|w| w.hours_studied).collect();
    let score_change = last.weekly_score - first.weekly_score;

    Ok(StudentTrend {
        student_id: first.student_id.clone(),
        weeks: series.len(),
        avg_weekly_score: round2(mean(&scores)),
        avg_hours_studied: round2(mean(&hours)),
        total_assignments: series.iter().map(|w| w.assignments_completed).sum(),
        score_change: round2(score_change),
        overall_trend: determine_trend(score_change),
    })
}

fn determine_trend(score_change: f64) -> TrendDirection {
    if score_change > 5.0 {
        TrendDirection::Improving
    } else if score_change < -5.0 {
        TrendDirection::Declining
    } else {
        TrendDirection::Stable
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

pub(crate) fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// Standard deviation with the N-1 denominator.
pub(crate) fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation coefficient, `None` if either side is constant.
pub(crate) fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let (mx, my) = (mean(xs), mean(ys));
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mx) * (y - my);
        var_x += (x - mx).powi(2);
        var_y += (y - my).powi(2);
    }
    if var_x == 0.0 || var_y == 0.0 {
        return None;
    }
    Some((cov / (var_x.sqrt() * var_y.sqrt())).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_median_even_and_odd() {
        assert_eq!(median(&[3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]), 2.5);
    }

    #[test]
    fn test_sample_std() {
        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138_089_935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_pearson_perfect_and_degenerate() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let up = pearson(&xs, &[2.0, 4.0, 6.0, 8.0]).unwrap();
        let down = pearson(&xs, &[8.0, 6.0, 4.0, 2.0]).unwrap();
        assert!((up - 1.0).abs() < 1e-12);
        assert!((down + 1.0).abs() < 1e-12);
        assert_eq!(pearson(&xs, &[5.0, 5.0, 5.0, 5.0]), None);
    }

    #[test]
    fn test_determine_trend() {
        assert_eq!(determine_trend(12.0), TrendDirection::Improving);
        assert_eq!(determine_trend(-6.5), TrendDirection::Declining);
        assert_eq!(determine_trend(1.0), TrendDirection::Stable);
    }
}

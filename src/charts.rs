//! Chart payloads and the files written from them.
//!
//! Each chart is a serializable structure. [`write_all`] saves it as JSON
//! and draws it to a PNG of the same name via [`crate::plot`].

use crate::analytics::{mean, pearson, Distribution, StudentAnalyzer};
use crate::error::Result;
use crate::model::FeatureImportance;
use crate::plot;
use crate::record::{round2, round3, StudentRecord, FEATURE_COLUMNS};
use log::info;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

const HISTOGRAM_BINS: usize = 10;

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct HistogramBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

#[derive(Serialize, Clone, Debug)]
pub struct GradeHistogram {
    pub bins: Vec<HistogramBin>,
    pub mean: f64,
    pub median: f64,
}

#[derive(Serialize, Clone, Debug)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<Option<f64>>>,
}

/// Mean of each feature split by the generated `at_risk` label.
#[derive(Serialize, Clone, Debug)]
pub struct RiskComparison {
    pub features: Vec<String>,
    pub at_risk_means: Vec<Option<f64>>,
    pub not_at_risk_means: Vec<Option<f64>>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct CategoryChart {
    pub labels: Vec<String>,
    pub counts: Vec<usize>,
}

#[derive(Serialize, Clone, Debug)]
pub struct ImportanceChart {
    pub features: Vec<String>,
    pub importance: Vec<f64>,
}

pub fn grade_histogram(distribution: &Distribution, data: &[StudentRecord]) -> GradeHistogram {
    let width = 100.0 / HISTOGRAM_BINS as f64;
    let mut bins: Vec<HistogramBin> = (0..HISTOGRAM_BINS)
        .map(|i| HistogramBin {
            lower: i as f64 * width,
            upper: (i + 1) as f64 * width,
            count: 0,
        })
        .collect();

    for student in data {
        // a grade of exactly 100 belongs to the last bin
        let index = ((student.final_grade / width) as usize).min(HISTOGRAM_BINS - 1);
        bins[index].count += 1;
    }

    GradeHistogram {
        bins,
        mean: distribution.mean,
        median: distribution.median,
    }
}

/// Pairwise Pearson correlations over the features plus `final_grade`.
pub fn correlation_matrix(data: &[StudentRecord]) -> CorrelationMatrix {
    let mut columns: Vec<String> = FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect();
    columns.push("final_grade".to_string());

    let series: Vec<Vec<f64>> = (0..columns.len())
        .map(|c| {
            data.iter()
                .map(|s| if c < FEATURE_COLUMNS.len() { s.features()[c] } else { s.final_grade })
                .collect()
        })
        .collect();

    let values: Vec<Vec<Option<f64>>> = series
        .iter()
        .map(|row| series.iter().map(|col| pearson(row, col).map(round3)).collect())
        .collect();

    CorrelationMatrix { columns, values }
}

pub fn risk_comparison(data: &[StudentRecord]) -> RiskComparison {
    let (at_risk, not_at_risk): (Vec<&StudentRecord>, Vec<&StudentRecord>) =
        data.iter().partition(|s| s.is_labelled_at_risk());

    let group_means = |group: &[&StudentRecord]| -> Vec<Option<f64>> {
        (0..FEATURE_COLUMNS.len())
            .map(|c| {
                if group.is_empty() {
                    return None;
                }
                let values: Vec<f64> = group.iter().map(|s| s.features()[c]).collect();
                Some(round2(mean(&values)))
            })
            .collect()
    };

    RiskComparison {
        features: FEATURE_COLUMNS.iter().map(|c| c.to_string()).collect(),
        at_risk_means: group_means(&at_risk[..]),
        not_at_risk_means: group_means(&not_at_risk[..]),
    }
}

pub fn performance_categories(distribution: &Distribution) -> CategoryChart {
    CategoryChart {
        labels: vec![
            "Excellent (90-100)".to_string(),
            "Good (75-89)".to_string(),
            "Satisfactory (60-74)".to_string(),
            "Poor (<60)".to_string(),
        ],
        counts: vec![
            distribution.excellent,
            distribution.good,
            distribution.satisfactory,
            distribution.poor,
        ],
    }
}

pub fn importance_chart(importance: &[FeatureImportance]) -> ImportanceChart {
    ImportanceChart {
        features: importance.iter().map(|f| f.feature.clone()).collect(),
        importance: importance.iter().map(|f| f.importance).collect(),
    }
}

pub fn write_chart<T: Serialize>(path: impl AsRef<Path>, chart: &T) -> Result<()> {
    let file = fs::File::create(path.as_ref())?;
    serde_json::to_writer_pretty(file, chart)?;
    Ok(())
}

/// Saves `chart` as `<name>.json` and renders it to `<name>.png`.
fn emit<T: Serialize>(
    output_dir: &Path,
    name: &str,
    chart: &T,
    draw: impl FnOnce(&T, &Path) -> Result<()>,
    written: &mut Vec<PathBuf>,
) -> Result<()> {
    let json = output_dir.join(format!("{}.json", name));
    write_chart(&json, chart)?;
    let png = output_dir.join(format!("{}.png", name));
    draw(chart, &png)?;
    written.push(json);
    written.push(png);
    Ok(())
}

/// Writes every chart that can be built from `data` into `output_dir`.
///
/// The importance chart is only written when a trained predictor supplied it.
pub fn write_all(
    data: &[StudentRecord],
    importance: Option<&[FeatureImportance]>,
    output_dir: impl AsRef<Path>,
) -> Result<Vec<PathBuf>> {
    let output_dir = output_dir.as_ref();
    fs::create_dir_all(output_dir)?;

    let distribution = StudentAnalyzer::new(data).analyze_performance_distribution()?;
    let mut written = Vec::new();

    emit(
        output_dir,
        "grade_distribution",
        &grade_histogram(&distribution, data),
        plot::draw_grade_histogram,
        &mut written,
    )?;
    emit(
        output_dir,
        "correlation_heatmap",
        &correlation_matrix(data),
        plot::draw_correlation_heatmap,
        &mut written,
    )?;
    emit(
        output_dir,
        "risk_comparison",
        &risk_comparison(data),
        plot::draw_risk_comparison,
        &mut written,
    )?;
    emit(
        output_dir,
        "performance_categories",
        &performance_categories(&distribution),
        plot::draw_performance_categories,
        &mut written,
    )?;
    if let Some(importance) = importance {
        emit(
            output_dir,
            "feature_importance",
            &importance_chart(importance),
            plot::draw_feature_importance,
            &mut written,
        )?;
    }

    info!("Wrote {} chart files to {}", written.len(), output_dir.display());
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn distribution(excellent: usize, good: usize, satisfactory: usize, poor: usize) -> Distribution {
        Distribution {
            excellent,
            good,
            satisfactory,
            poor,
            mean: 70.0,
            median: 70.0,
            std: Some(10.0),
            min: 40.0,
            max: 95.0,
        }
    }

    #[test]
    fn test_performance_categories_order() {
        let chart = performance_categories(&distribution(3, 5, 2, 1));
        assert_eq!(chart.counts, vec![3, 5, 2, 1]);
        assert_eq!(chart.labels[3], "Poor (<60)");
    }

    #[test]
    fn test_histogram_puts_hundred_in_last_bin() {
        let data = crate::generator::StudentDataGenerator::new(4)
            .generate_student_data(40)
            .unwrap()
            .into_iter()
            .enumerate()
            .map(|(i, mut s)| {
                s.final_grade = if i == 0 { 100.0 } else { 55.0 };
                s
            })
            .collect::<Vec<_>>();
        let histogram = grade_histogram(&distribution(1, 0, 0, 39), &data);

        assert_eq!(histogram.bins.len(), 10);
        assert_eq!(histogram.bins[9].count, 1);
        assert_eq!(histogram.bins[5].count, 39);
    }

    #[test]
    fn test_write_all_without_importance() {
        let dir = tempfile::tempdir().unwrap();
        let data = crate::generator::StudentDataGenerator::new(42)
            .generate_student_data(30)
            .unwrap();
        let written = write_all(&data, None, dir.path()).unwrap();

        assert_eq!(written.len(), 8);
        assert!(written.iter().all(|p| p.exists()));
        assert!(!dir.path().join("feature_importance.json").exists());
        assert!(!dir.path().join("feature_importance.png").exists());

        let matrix: serde_json::Value = serde_json::from_str(
            &fs::read_to_string(dir.path().join("correlation_heatmap.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(matrix["columns"].as_array().unwrap().len(), 7);
        assert_eq!(matrix["values"][0][0], 1.0);
    }

    #[test]
    fn test_write_all_renders_png_for_every_chart() {
        let dir = tempfile::tempdir().unwrap();
        let data = crate::generator::StudentDataGenerator::new(42)
            .generate_student_data(60)
            .unwrap();
        let importance = vec![
            FeatureImportance { feature: "attendance_rate".to_string(), importance: 0.5 },
            FeatureImportance { feature: "avg_quiz_score".to_string(), importance: 0.3 },
            FeatureImportance { feature: "forum_posts".to_string(), importance: 0.2 },
        ];
        let written = write_all(&data, Some(&importance), dir.path()).unwrap();
        assert_eq!(written.len(), 10);

        for name in [
            "grade_distribution",
            "correlation_heatmap",
            "risk_comparison",
            "performance_categories",
            "feature_importance",
        ] {
            let png = dir.path().join(format!("{}.png", name));
            let bytes = fs::read(&png).unwrap();
            assert!(bytes.len() > 8, "{} is empty", name);
            assert_eq!(&bytes[1..4], b"PNG", "{} is not a PNG", name);
        }
    }

    #[test]
    fn test_importance_chart_keeps_order() {
        let importance = vec![
            FeatureImportance { feature: "attendance_rate".to_string(), importance: 0.6 },
            FeatureImportance { feature: "forum_posts".to_string(), importance: 0.4 },
        ];
        let chart = importance_chart(&importance);
        assert_eq!(chart.features, vec!["attendance_rate", "forum_posts"]);
        assert_eq!(chart.importance, vec![0.6, 0.4]);
    }
}

//! PNG rendering of the chart payloads in [`crate::charts`].
//!
//! Each function draws one payload to a bitmap file. Text is only
//! rasterized when the crate is built with the `fonts` feature; without it
//! captions and tick labels are laid out but left blank.

use crate::charts::{CategoryChart, CorrelationMatrix, GradeHistogram, ImportanceChart, RiskComparison};
use crate::error::{AnalyticsError, Result};
use plotters::prelude::*;
use std::fmt::Display;
use std::path::Path;

const CHART_SIZE: (u32, u32) = (1000, 600);
const HEATMAP_SIZE: (u32, u32) = (900, 800);

const CATEGORY_COLORS: [RGBColor; 4] = [
    RGBColor(46, 204, 113),
    RGBColor(52, 152, 219),
    RGBColor(243, 156, 18),
    RGBColor(231, 76, 60),
];

fn render_err<E: Display>(e: E) -> AnalyticsError {
    AnalyticsError::Render(e.to_string())
}

/// Headroom above the tallest bar; never a zero-height axis.
fn axis_top(max: f64) -> f64 {
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

fn label_at(labels: &[String], position: f64) -> String {
    let index = position.round();
    if index < 0.0 {
        return String::new();
    }
    labels.get(index as usize).cloned().unwrap_or_default()
}

pub fn draw_grade_histogram(histogram: &GradeHistogram, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let max_count = histogram.bins.iter().map(|b| b.count).max().unwrap_or(0) as f64;
    let top = axis_top(max_count);

    let mut chart = ChartBuilder::on(&root)
        .caption("Distribution of Final Grades", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(0f64..100f64, 0f64..top)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .x_desc("Final Grade")
        .y_desc("Frequency")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(histogram.bins.iter().map(|bin| {
            Rectangle::new(
                [(bin.lower, 0.0), (bin.upper, bin.count as f64)],
                BLUE.mix(0.6).filled(),
            )
        }))
        .map_err(render_err)?;

    for (value, color, label) in [
        (histogram.mean, RED, format!("Mean: {:.2}", histogram.mean)),
        (histogram.median, GREEN, format!("Median: {:.2}", histogram.median)),
    ] {
        chart
            .draw_series(std::iter::once(PathElement::new(
                vec![(value, 0.0), (value, top)],
                color.stroke_width(2),
            )))
            .map_err(render_err)?
            .label(label)
            .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], color.stroke_width(2)));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Blue for negative, red for positive, grey where the correlation is undefined.
fn heat_color(value: Option<f64>) -> RGBColor {
    match value {
        None => RGBColor(200, 200, 200),
        Some(r) => {
            let r = r.clamp(-1.0, 1.0);
            let fade = ((1.0 - r.abs()) * 255.0).round() as u8;
            if r >= 0.0 {
                RGBColor(255, fade, fade)
            } else {
                RGBColor(fade, fade, 255)
            }
        }
    }
}

pub fn draw_correlation_heatmap(matrix: &CorrelationMatrix, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, HEATMAP_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let n = matrix.columns.len();
    let extent = n as f64 - 0.5;
    let mut chart = ChartBuilder::on(&root)
        .caption("Feature Correlation Matrix", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(120)
        .y_label_area_size(160)
        .build_cartesian_2d(-0.5f64..extent, -0.5f64..extent)
        .map_err(render_err)?;

    // rows run top to bottom, so the y axis is flipped when labelling
    let flipped: Vec<String> = matrix.columns.iter().rev().cloned().collect();
    chart
        .configure_mesh()
        .disable_mesh()
        .x_labels(n)
        .y_labels(n)
        .x_label_formatter(&|x| label_at(&matrix.columns, *x))
        .y_label_formatter(&|y| label_at(&flipped, *y))
        .draw()
        .map_err(render_err)?;

    let cells = matrix.values.iter().enumerate().flat_map(|(row, values)| {
        values.iter().enumerate().map(move |(col, value)| {
            let x = col as f64;
            let y = (n - 1 - row) as f64;
            Rectangle::new(
                [(x - 0.5, y - 0.5), (x + 0.5, y + 0.5)],
                heat_color(*value).filled(),
            )
        })
    });
    chart.draw_series(cells).map_err(render_err)?;

    let annotations = matrix.values.iter().enumerate().flat_map(|(row, values)| {
        values.iter().enumerate().map(move |(col, value)| {
            let text = value.map(|r| format!("{:.2}", r)).unwrap_or_else(|| "NaN".to_string());
            Text::new(
                text,
                (col as f64 - 0.2, (n - 1 - row) as f64 + 0.1),
                ("sans-serif", 14).into_font(),
            )
        })
    });
    chart.draw_series(annotations).map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

pub fn draw_risk_comparison(comparison: &RiskComparison, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let max_mean = comparison
        .at_risk_means
        .iter()
        .chain(&comparison.not_at_risk_means)
        .flatten()
        .copied()
        .fold(0.0, f64::max);
    let n = comparison.features.len();

    let mut chart = ChartBuilder::on(&root)
        .caption("Average Feature Values by Risk Status", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..n as f64 - 0.5, 0f64..axis_top(max_mean))
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| label_at(&comparison.features, *x))
        .y_desc("Average Value")
        .draw()
        .map_err(render_err)?;

    let groups = [
        ("Not At Risk", &comparison.not_at_risk_means, RGBColor(52, 152, 219), -0.35),
        ("At Risk", &comparison.at_risk_means, RGBColor(231, 76, 60), 0.0),
    ];
    for (label, means, color, offset) in groups {
        let bars = means.iter().enumerate().filter_map(move |(i, mean)| {
            mean.map(|m| {
                let left = i as f64 + offset;
                Rectangle::new([(left, 0.0), (left + 0.35, m)], color.filled())
            })
        });
        chart
            .draw_series(bars)
            .map_err(render_err)?
            .label(label)
            .legend(move |(x, y)| Rectangle::new([(x, y - 5), (x + 15, y + 5)], color.filled()));
    }
    chart
        .configure_series_labels()
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

pub fn draw_performance_categories(categories: &CategoryChart, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let max_count = categories.counts.iter().copied().max().unwrap_or(0) as f64;
    let n = categories.labels.len();

    let mut chart = ChartBuilder::on(&root)
        .caption("Student Performance Categories", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(50)
        .build_cartesian_2d(-0.5f64..n as f64 - 0.5, 0f64..axis_top(max_count))
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n)
        .x_label_formatter(&|x| label_at(&categories.labels, *x))
        .y_desc("Number of Students")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(categories.counts.iter().enumerate().map(|(i, &count)| {
            let color = CATEGORY_COLORS[i % CATEGORY_COLORS.len()];
            Rectangle::new([(i as f64 - 0.35, 0.0), (i as f64 + 0.35, count as f64)], color.filled())
        }))
        .map_err(render_err)?;
    chart
        .draw_series(categories.counts.iter().enumerate().map(|(i, &count)| {
            Text::new(count.to_string(), (i as f64 - 0.05, count as f64 + max_count * 0.02), ("sans-serif", 18).into_font())
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

/// Horizontal bars, most important feature at the top.
pub fn draw_feature_importance(chart_data: &ImportanceChart, path: &Path) -> Result<()> {
    let root = BitMapBackend::new(path, CHART_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let max_importance = chart_data.importance.iter().copied().fold(0.0, f64::max);
    let n = chart_data.features.len();
    let flipped: Vec<String> = chart_data.features.iter().rev().cloned().collect();

    let mut chart = ChartBuilder::on(&root)
        .caption("Feature Importance for At-Risk Prediction", ("sans-serif", 28))
        .margin(15)
        .x_label_area_size(40)
        .y_label_area_size(170)
        .build_cartesian_2d(0f64..axis_top(max_importance), -0.5f64..n.max(1) as f64 - 0.5)
        .map_err(render_err)?;
    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(n.max(1))
        .y_label_formatter(&|y| label_at(&flipped, *y))
        .x_desc("Importance")
        .draw()
        .map_err(render_err)?;

    chart
        .draw_series(chart_data.importance.iter().enumerate().map(|(i, &value)| {
            let y = (n - 1 - i) as f64;
            Rectangle::new([(0.0, y - 0.35), (value, y + 0.35)], RGBColor(52, 152, 219).filled())
        }))
        .map_err(render_err)?;

    root.present().map_err(render_err)?;
    Ok(())
}

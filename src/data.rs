use crate::error::Result;
use crate::generator::WeeklyRecord;
use crate::record::{StudentRecord, FEATURE_COLUMNS};
use csv::{Reader, Writer};
use log::info;
use ndarray::{Array1, Array2};
use std::fs;
use std::path::Path;

/// Reads a dataset written by [`save_data`]. Header names must match the
/// record fields.
pub fn load_data(path: impl AsRef<Path>) -> Result<Vec<StudentRecord>> {
    let path = path.as_ref();
    let mut rdr = Reader::from_path(path)?;
    let mut data = Vec::new();

    for result in rdr.deserialize() {
        let record: StudentRecord = result?;
        data.push(record);
    }

    info!("Loaded {} student records from {}", data.len(), path.display());
    Ok(data)
}

/// Writes one row per student with a header, creating parent directories.
pub fn save_data(path: impl AsRef<Path>, data: &[StudentRecord]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut wtr = Writer::from_path(path)?;
    for record in data {
        wtr.serialize(record)?;
    }
    wtr.flush()?;

    info!("Saved {} student records to {}", data.len(), path.display());
    Ok(())
}

pub fn save_weekly_series(path: impl AsRef<Path>, series: &[WeeklyRecord]) -> Result<()> {
    let path = path.as_ref();
    ensure_parent(path)?;
    let mut wtr = Writer::from_path(path)?;
    for week in series {
        wtr.serialize(week)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Feature matrix with one row per student, columns in [`FEATURE_COLUMNS`] order.
pub fn feature_matrix(data: &[StudentRecord]) -> Result<Array2<f64>> {
    let flat_data: Vec<f64> = data.iter().flat_map(|s| s.features()).collect();
    Ok(Array2::from_shape_vec((data.len(), FEATURE_COLUMNS.len()), flat_data)?)
}

pub fn label_vector(data: &[StudentRecord]) -> Array1<bool> {
    data.iter().map(StudentRecord::is_labelled_at_risk).collect()
}

pub fn calculate_accuracy(predictions: &Array1<bool>, targets: &Array1<bool>) -> f64 {
    if targets.is_empty() {
        return 0.0;
    }
    predictions
        .iter()
        .zip(targets.iter())
        .filter(|(&pred, &actual)| pred == actual)
        .count() as f64
        / targets.len() as f64
}

fn ensure_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_accuracy_calculation() {
        let predictions = array![true, true, false, true];
        let targets = array![true, false, false, true];
        assert_eq!(calculate_accuracy(&predictions, &targets), 0.75);
    }

    #[test]
    fn test_accuracy_of_nothing() {
        let empty: Array1<bool> = Array1::from_vec(vec![]);
        assert_eq!(calculate_accuracy(&empty, &empty), 0.0);
    }
}

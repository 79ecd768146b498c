//! Reporting utilities: scoring map datasets and district aggregates.

use std::cmp::Ordering;
use std::collections::HashMap;

use nalgebra::DVector;

use crate::domain::{Dataset, DistrictPrediction, FittedModel};
use crate::error::AppError;
use crate::math::{build_design_matrix, predict};

pub mod format;

pub use format::*;

/// Apply a fitted model to every row of `dataset`.
///
/// The dataset must carry every feature of the model; other columns are ignored.
pub fn score_dataset(model: &FittedModel, dataset: &Dataset) -> Result<Vec<f64>, AppError> {
    let x = build_design_matrix(dataset, &model.features)?;
    let beta = DVector::from_column_slice(&model.coefficients);
    let y_hat = predict(&beta, &x)?;

    if let Some(i) = y_hat.iter().position(|v| !v.is_finite()) {
        return Err(AppError::new(
            4,
            format!("Non-finite turnout prediction on row {}.", i + 1),
        ));
    }
    Ok(y_hat.iter().copied().collect())
}

/// Aggregate precinct predictions per district.
///
/// With `weight_column` (e.g. registered voters) the district value is the
/// weighted mean, otherwise the plain mean. Districts are ordered numerically
/// when their identifiers are numbers, then lexically.
pub fn aggregate_by_district(
    dataset: &Dataset,
    predictions: &[f64],
    district_column: &str,
    weight_column: Option<&str>,
) -> Result<Vec<DistrictPrediction>, AppError> {
    if predictions.len() != dataset.n_rows() {
        return Err(AppError::new(
            4,
            format!(
                "Prediction count ({}) != dataset rows ({})",
                predictions.len(),
                dataset.n_rows()
            ),
        ));
    }

    let district_idx = dataset.column_index(district_column)?;
    let weights = match weight_column {
        Some(name) => dataset.numeric_column(name)?,
        None => vec![1.0; dataset.n_rows()],
    };
    if let Some(i) = weights.iter().position(|w| *w < 0.0) {
        return Err(AppError::new(2, format!("Negative weight on row {}.", i + 1)));
    }

    // district -> (precincts, weight sum, weighted prediction sum)
    let mut acc: HashMap<String, (usize, f64, f64)> = HashMap::new();
    for ((row, y_hat), w) in dataset.rows().iter().zip(predictions).zip(&weights) {
        let entry = acc.entry(row[district_idx].to_string()).or_insert((0, 0.0, 0.0));
        entry.0 += 1;
        entry.1 += w;
        entry.2 += w * y_hat;
    }

    let mut out = Vec::with_capacity(acc.len());
    for (district, (precincts, weight, total)) in acc {
        if weight <= 0.0 {
            return Err(AppError::new(
                2,
                format!("District {district} has zero total weight."),
            ));
        }
        out.push(DistrictPrediction {
            district,
            precincts,
            weight,
            predicted: total / weight,
        });
    }
    out.sort_by(|a, b| compare_district_ids(&a.district, &b.district));
    Ok(out)
}

fn compare_district_ids(a: &str, b: &str) -> Ordering {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y).then_with(|| a.cmp(b)),
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Criterion, Value};

    fn model() -> FittedModel {
        FittedModel {
            outcome: "turnout".to_string(),
            criterion: Criterion::Aic,
            features: vec!["pct_bachelors".to_string()],
            coefficients: vec![0.5, 0.3],
            score: None,
            n_rows: 10,
        }
    }

    fn map_dataset() -> Dataset {
        Dataset::new(
            vec!["DISTRICT".into(), "registered".into(), "pct_bachelors".into()],
            vec![
                vec![Value::Number(10.0), Value::Number(100.0), Value::Number(0.2)],
                vec![Value::Number(2.0), Value::Number(300.0), Value::Number(0.6)],
                vec![Value::Number(2.0), Value::Number(100.0), Value::Number(0.2)],
                vec![Value::from("at-large"), Value::Number(50.0), Value::Number(0.0)],
            ],
        )
        .unwrap()
    }

    #[test]
    fn score_dataset_applies_slopes_and_intercept() {
        let y_hat = score_dataset(&model(), &map_dataset()).unwrap();
        let expected = [0.4, 0.6, 0.4, 0.3];
        for (got, want) in y_hat.iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }
    }

    #[test]
    fn score_dataset_requires_model_features() {
        let ds = Dataset::from_numeric_columns(&[("median_income", vec![50.0])]).unwrap();
        let err = score_dataset(&model(), &ds).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn district_means_are_weighted_and_ordered() {
        let ds = map_dataset();
        let y_hat = score_dataset(&model(), &ds).unwrap();

        let plain = aggregate_by_district(&ds, &y_hat, "DISTRICT", None).unwrap();
        let ids: Vec<&str> = plain.iter().map(|d| d.district.as_str()).collect();
        assert_eq!(ids, vec!["2", "10", "at-large"]);
        assert_eq!(plain[0].precincts, 2);
        assert!((plain[0].predicted - 0.5).abs() < 1e-12);

        let weighted = aggregate_by_district(&ds, &y_hat, "DISTRICT", Some("registered")).unwrap();
        // (300 * 0.6 + 100 * 0.4) / 400
        assert!((weighted[0].predicted - 0.55).abs() < 1e-12);
        assert!((weighted[0].weight - 400.0).abs() < 1e-12);
    }

    #[test]
    fn missing_district_column_is_reported() {
        let ds = map_dataset();
        let err = aggregate_by_district(&ds, &[0.0; 4], "COUNTY", None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }
}

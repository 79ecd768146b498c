//! Forward feature selection for the turnout regression.
//!
//! Starting from an intercept-only model, each round:
//! 1. fits one trial model per remaining candidate (chosen ∪ {candidate})
//! 2. keeps the trial with the best criterion value (first in pool order on ties)
//! 3. accepts it only if it strictly improves on the best value so far
//!
//! The first round that fails to improve ends the search (no backtracking), so
//! the loop runs at most `candidates.len()` rounds.
//!
//! A trial whose design the solver cannot handle (`SingularDesign`) is scored
//! as the criterion's worst value and skipped for that round. Every other error
//! aborts the run.

use std::collections::HashSet;

use log::{debug, info, warn};
use nalgebra::DVector;
use rayon::prelude::*;

use crate::domain::{Criterion, Dataset, FittedModel, RankPolicy, SelectionConfig, SelectionStep};
use crate::error::{ModelError, ModelResult};
use crate::fit::scoring::sst;
use crate::math::{build_design_matrix, fit, predict, solve_with_rank, target_vector};

/// Output of a forward-selection run.
#[derive(Debug, Clone)]
pub struct SelectionOutcome {
    pub model: FittedModel,
    /// Accepted rounds, in order. Scores strictly improve from one step to the next.
    pub steps: Vec<SelectionStep>,
    /// Rounds evaluated, including the final non-improving one.
    pub rounds: usize,
    /// Criterion value of the final model (may be infinite).
    pub score: f64,
}

#[derive(Debug, Clone, Copy)]
struct Trial {
    score: f64,
    singular: bool,
    /// The design lost rank: the candidate is collinear with what is already chosen.
    rank_deficient: bool,
}

/// Run forward selection of `candidates` for predicting `outcome`.
pub fn forward_select(
    dataset: &Dataset,
    outcome: &str,
    candidates: &[String],
    config: &SelectionConfig,
) -> ModelResult<SelectionOutcome> {
    let criterion = config.criterion;
    validate_candidates(dataset, outcome, candidates)?;

    let y = target_vector(dataset, outcome)?;
    check_sample_size(criterion, y.as_slice(), candidates.len())?;

    info!(
        "forward selection by {} over {} candidates (n={})",
        criterion.display_name(),
        candidates.len(),
        y.len()
    );

    let mut chosen: Vec<String> = Vec::new();
    let mut best = criterion.initial();
    let mut steps = Vec::new();
    let mut rounds = 0;

    while rounds < candidates.len() {
        rounds += 1;

        let remaining: Vec<&String> = candidates.iter().filter(|c| !chosen.contains(c)).collect();
        let evaluate = |candidate: &&String| -> ModelResult<Trial> {
            let mut features: Vec<&str> = chosen.iter().map(String::as_str).collect();
            features.push(candidate.as_str());
            evaluate_trial(dataset, &y, &features, criterion, config.rank_policy)
        };

        let trials: Vec<Trial> = if config.parallel {
            remaining.par_iter().map(evaluate).collect::<ModelResult<_>>()?
        } else {
            remaining.iter().map(evaluate).collect::<ModelResult<_>>()?
        };

        // Sequential reduction keeps ties deterministic regardless of evaluation order.
        let mut round_best: Option<(usize, &String, f64)> = None;
        let mut round_score = criterion.initial();
        for (i, (candidate, trial)) in remaining.iter().zip(&trials).enumerate() {
            debug!("round {rounds}: +{candidate} -> {:.6}", trial.score);
            if criterion.improves(trial.score, round_score) {
                round_score = trial.score;
                round_best = Some((i, *candidate, trial.score));
            }
        }

        let Some((best_index, candidate, score)) = round_best else {
            info!("round {rounds}: no feasible trial, stopping");
            break;
        };
        if !criterion.improves(score, best) {
            info!(
                "round {rounds}: best trial +{candidate} ({score:.6}) does not improve on {best:.6}, stopping"
            );
            break;
        }

        info!("round {rounds}: added {candidate} ({} = {score:.6})", criterion.display_name());
        let rank_deficient = trials[best_index].rank_deficient;
        if rank_deficient {
            warn!(
                "round {rounds}: {candidate} is collinear with the intercept or earlier features; \
                 its coefficient is a minimum-norm split (use --strict-rank to reject it)"
            );
        }
        best = score;
        chosen.push(candidate.clone());
        steps.push(SelectionStep {
            feature: candidate.clone(),
            score,
            trials: trials.len(),
            singular: trials.iter().filter(|t| t.singular).count(),
            rank_deficient,
        });
    }

    let x = build_design_matrix(dataset, &chosen)?;
    let beta = fit(&x, &y, config.rank_policy)?;
    let y_hat = predict(&beta, &x)?;
    let score = criterion.score(y.as_slice(), y_hat.as_slice(), x.ncols())?;

    info!(
        "selected {} of {} features: [{}]",
        chosen.len(),
        candidates.len(),
        chosen.join(", ")
    );

    Ok(SelectionOutcome {
        model: FittedModel {
            outcome: outcome.to_string(),
            criterion,
            features: chosen,
            coefficients: beta.iter().copied().collect(),
            score: score.is_finite().then_some(score),
            n_rows: y.len(),
        },
        steps,
        rounds,
        score,
    })
}

fn evaluate_trial(
    dataset: &Dataset,
    y: &DVector<f64>,
    features: &[&str],
    criterion: Criterion,
    policy: RankPolicy,
) -> ModelResult<Trial> {
    let x = build_design_matrix(dataset, features)?;

    let (beta, rank) = match solve_with_rank(&x, y, policy) {
        Ok(solved) => solved,
        Err(e) if e.is_recoverable() => {
            debug!("skipping trial [{}]: {e}", features.join(", "));
            return Ok(Trial {
                score: criterion.initial(),
                singular: true,
                rank_deficient: false,
            });
        }
        Err(e) => return Err(e),
    };

    let y_hat = predict(&beta, &x)?;
    let score = criterion.score(y.as_slice(), y_hat.as_slice(), x.ncols())?;
    Ok(Trial {
        score,
        singular: false,
        rank_deficient: rank < x.ncols(),
    })
}

fn validate_candidates(dataset: &Dataset, outcome: &str, candidates: &[String]) -> ModelResult<()> {
    dataset.column_index(outcome)?;

    let mut seen = HashSet::with_capacity(candidates.len());
    for candidate in candidates {
        if candidate == outcome {
            return Err(ModelError::schema(format!(
                "outcome column '{outcome}' cannot also be a candidate feature"
            )));
        }
        if !seen.insert(candidate.as_str()) {
            return Err(ModelError::schema(format!("duplicate candidate feature '{candidate}'")));
        }
        dataset.numeric_column(candidate)?;
    }
    Ok(())
}

/// Reject datasets too small for the criterion before any trial is fitted.
fn check_sample_size(criterion: Criterion, y: &[f64], pool: usize) -> ModelResult<()> {
    let n = y.len();
    if n == 0 {
        return Err(ModelError::degenerate("dataset has no rows"));
    }
    if criterion == Criterion::AdjustedR2 {
        let k_max = pool + 1;
        if n <= k_max {
            return Err(ModelError::degenerate(format!(
                "adjusted R2 selection over {pool} candidates needs more than {k_max} rows, got {n}"
            )));
        }
        if sst(y) == 0.0 {
            return Err(ModelError::degenerate("outcome has zero variance"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::sample::generate_precincts;
    use crate::domain::SampleConfig;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn sequential(criterion: Criterion, rank_policy: RankPolicy) -> SelectionConfig {
        SelectionConfig {
            criterion,
            rank_policy,
            parallel: false,
        }
    }

    /// y = 2a + 1 + e where e is orthogonal to a, b and the intercept.
    fn orthogonal_noise_dataset() -> Dataset {
        let a: Vec<f64> = (1..=8).map(|v| v as f64).collect();
        let e = [0.1, -0.1, -0.1, 0.1, 0.1, -0.1, -0.1, 0.1];
        let b = vec![1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0, 2.0];
        let y: Vec<f64> = a.iter().zip(e).map(|(a, e)| 2.0 * a + 1.0 + e).collect();
        Dataset::from_numeric_columns(&[("a", a), ("b", b), ("y", y)]).unwrap()
    }

    #[test]
    fn exact_linear_relationship_selects_feature_with_perfect_score() {
        let ds = Dataset::from_numeric_columns(&[
            ("x", vec![1.0, 2.0, 3.0, 4.0, 5.0]),
            ("y", vec![2.0, 4.0, 6.0, 8.0, 10.0]),
        ])
        .unwrap();

        let out = forward_select(&ds, "y", &names(&["x"]), &SelectionConfig::default()).unwrap();
        assert_eq!(out.model.features, names(&["x"]));
        assert_eq!(out.model.coefficients.len(), 2);
        assert!((out.model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!(out.model.coefficients[1].abs() < 1e-9);
        assert_eq!(out.score, f64::NEG_INFINITY);
        assert_eq!(out.steps[0].score, f64::NEG_INFINITY);
        assert_eq!(out.model.score, None);
    }

    #[test]
    fn near_fit_on_large_level_outcome_does_not_beat_exact_fit() {
        let b: Vec<f64> = (1..=6).map(|v| v as f64).collect();
        let a: Vec<f64> = b
            .iter()
            .enumerate()
            .map(|(i, v)| if i % 2 == 0 { v + 5e-4 } else { v - 5e-4 })
            .collect();
        let y: Vec<f64> = b.iter().map(|v| 1e8 + 2.0 * v).collect();
        let ds = Dataset::from_numeric_columns(&[("a", a), ("b", b), ("y", y)]).unwrap();

        let out = forward_select(&ds, "y", &names(&["a", "b"]), &sequential(Criterion::Aic, RankPolicy::MinNorm))
            .unwrap();
        assert_eq!(out.model.features[0], "b");
        assert!(out.steps[0].score < -100.0, "{}", out.steps[0].score);
    }

    #[test]
    fn greedy_search_stops_when_second_feature_does_not_help() {
        let ds = orthogonal_noise_dataset();
        let out = forward_select(&ds, "y", &names(&["b", "a"]), &sequential(Criterion::Aic, RankPolicy::MinNorm))
            .unwrap();

        assert_eq!(out.model.features, names(&["a"]));
        assert_eq!(out.rounds, 2);
        assert_eq!(out.steps.len(), 1);
        assert!((out.model.coefficients[0] - 2.0).abs() < 1e-9);
        assert!((out.model.coefficients[1] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn adjusted_r2_selection_picks_strongest_feature_first() {
        let ds = orthogonal_noise_dataset();
        let out = forward_select(
            &ds,
            "y",
            &names(&["b", "a"]),
            &sequential(Criterion::AdjustedR2, RankPolicy::MinNorm),
        )
        .unwrap();

        assert_eq!(out.model.features[0], "a");
        assert!(out.steps.windows(2).all(|w| w[1].score > w[0].score));
    }

    #[test]
    fn constant_candidate_is_never_preferred_over_real_signal() {
        let mut ds_cols = vec![("const", vec![1.0; 8])];
        let base = orthogonal_noise_dataset();
        ds_cols.push(("a", base.numeric_column("a").unwrap()));
        ds_cols.push(("y", base.numeric_column("y").unwrap()));
        let ds = Dataset::from_numeric_columns(&ds_cols).unwrap();

        for policy in [RankPolicy::MinNorm, RankPolicy::Strict] {
            let out = forward_select(&ds, "y", &names(&["const", "a"]), &sequential(Criterion::Aic, policy))
                .unwrap();
            assert_eq!(out.model.features, names(&["a"]), "policy {policy:?}");
            assert!(!out.steps[0].rank_deficient);
        }
    }

    #[test]
    fn constant_candidate_accepted_under_min_norm_is_flagged() {
        let ds = Dataset::from_numeric_columns(&[
            ("const", vec![3.0; 5]),
            ("y", vec![0.4, 0.6, 0.5, 0.7, 0.3]),
        ])
        .unwrap();

        let out = forward_select(&ds, "y", &names(&["const"]), &sequential(Criterion::Aic, RankPolicy::MinNorm))
            .unwrap();
        // The first round always beats the intercept-only sentinel.
        assert_eq!(out.model.features, names(&["const"]));
        assert!(out.steps[0].rank_deficient);
        // Whatever the split, predictions stay at the outcome mean.
        let level = out.model.coefficients.iter().zip([3.0, 1.0]).map(|(b, x)| b * x).sum::<f64>();
        assert!((level - 0.5).abs() < 1e-9);
    }

    #[test]
    fn strict_policy_skips_singular_trials_and_may_select_nothing() {
        let ds = Dataset::from_numeric_columns(&[
            ("const", vec![3.0; 5]),
            ("y", vec![0.4, 0.6, 0.5, 0.7, 0.3]),
        ])
        .unwrap();

        let out = forward_select(&ds, "y", &names(&["const"]), &sequential(Criterion::Aic, RankPolicy::Strict))
            .unwrap();
        assert!(out.model.features.is_empty());
        assert!(out.steps.is_empty());
        assert_eq!(out.model.coefficients.len(), 1);
        assert!((out.model.intercept() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn ties_go_to_first_candidate_in_pool_order() {
        let base = orthogonal_noise_dataset();
        let a = base.numeric_column("a").unwrap();
        let ds = Dataset::from_numeric_columns(&[
            ("a", a.clone()),
            ("a_copy", a),
            ("y", base.numeric_column("y").unwrap()),
        ])
        .unwrap();

        let out = forward_select(&ds, "y", &names(&["a_copy", "a"]), &sequential(Criterion::Aic, RankPolicy::MinNorm))
            .unwrap();
        assert_eq!(out.model.features, names(&["a_copy"]));
    }

    #[test]
    fn synthetic_precincts_recover_true_covariates() {
        let ds = generate_precincts(&SampleConfig {
            rows: 400,
            ..SampleConfig::default()
        })
        .unwrap();
        let pool = names(&[
            "registered",
            "pct_white",
            "pct_black",
            "pct_hispanic",
            "median_income",
            "pct_bachelors",
            "pct_over_65",
        ]);

        let out = forward_select(&ds, "turnout", &pool, &SelectionConfig::default()).unwrap();
        assert!(out.rounds <= pool.len());
        assert!(out.steps.windows(2).all(|w| w[1].score < w[0].score));

        let first_three: HashSet<&str> = out.model.features.iter().take(3).map(String::as_str).collect();
        let expected: HashSet<&str> = ["median_income", "pct_bachelors", "pct_over_65"].into_iter().collect();
        assert_eq!(first_three, expected);
    }

    #[test]
    fn parallel_and_sequential_runs_agree() {
        let ds = generate_precincts(&SampleConfig {
            rows: 200,
            seed: 11,
            ..SampleConfig::default()
        })
        .unwrap();
        let pool = names(&["pct_white", "pct_black", "median_income", "pct_bachelors", "pct_over_65"]);

        let par = forward_select(&ds, "turnout", &pool, &SelectionConfig::default()).unwrap();
        let seq = forward_select(&ds, "turnout", &pool, &sequential(Criterion::Aic, RankPolicy::MinNorm)).unwrap();
        assert_eq!(par.model, seq.model);
        assert_eq!(par.steps, seq.steps);
    }

    #[test]
    fn schema_problems_abort_selection() {
        let ds = orthogonal_noise_dataset();
        let config = SelectionConfig::default();

        assert!(matches!(
            forward_select(&ds, "y", &names(&["a", "missing"]), &config),
            Err(ModelError::Schema(_))
        ));
        assert!(matches!(
            forward_select(&ds, "y", &names(&["a", "a"]), &config),
            Err(ModelError::Schema(_))
        ));
        assert!(matches!(
            forward_select(&ds, "y", &names(&["a", "y"]), &config),
            Err(ModelError::Schema(_))
        ));
        assert!(matches!(
            forward_select(&ds, "turnout", &names(&["a"]), &config),
            Err(ModelError::Schema(_))
        ));
    }

    #[test]
    fn small_samples_are_rejected_before_selection() {
        let ds = Dataset::from_numeric_columns(&[
            ("a", vec![1.0, 2.0, 3.0]),
            ("b", vec![0.5, 0.1, 0.9]),
            ("y", vec![1.0, 2.5, 2.0]),
        ])
        .unwrap();
        let err = forward_select(
            &ds,
            "y",
            &names(&["a", "b"]),
            &sequential(Criterion::AdjustedR2, RankPolicy::MinNorm),
        )
        .unwrap_err();
        assert!(matches!(err, ModelError::DegenerateSample(_)));

        let empty = Dataset::new(names(&["a", "y"]), vec![]).unwrap();
        let err = forward_select(&empty, "y", &names(&["a"]), &SelectionConfig::default()).unwrap_err();
        assert!(matches!(err, ModelError::DegenerateSample(_)));
    }

    #[test]
    fn empty_pool_fits_intercept_only() {
        let ds = orthogonal_noise_dataset();
        let out = forward_select(&ds, "y", &[], &SelectionConfig::default()).unwrap();
        assert!(out.model.features.is_empty());
        assert_eq!(out.rounds, 0);
        assert!((out.model.intercept() - 10.0).abs() < 1e-9);
    }
}

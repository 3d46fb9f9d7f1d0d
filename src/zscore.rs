/// Spread estimator behind a z-score. Team-level signals use the population
/// form; the dominance family uses the sample (n - 1) form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Estimator {
    Population,
    Sample,
}

/// Z-scores over the known (finite) values. Unknown entries map to 0 and do not
/// move the mean or spread. A zero or undefined spread is floored to 1.
pub fn zscores(values: &[Option<f64>], estimator: Estimator) -> Vec<f64> {
    let known: Vec<f64> = values
        .iter()
        .filter_map(|v| v.filter(|x| x.is_finite()))
        .collect();
    let (mean, sd) = mean_and_sd(&known, estimator);

    values
        .iter()
        .map(|v| match v {
            Some(x) if x.is_finite() => (x - mean) / sd,
            _ => 0.0,
        })
        .collect()
}

pub fn zscores_dense(values: &[f64], estimator: Estimator) -> Vec<f64> {
    let wrapped: Vec<Option<f64>> = values.iter().copied().map(Some).collect();
    zscores(&wrapped, estimator)
}

pub fn population(values: &[Option<f64>]) -> Vec<f64> {
    zscores(values, Estimator::Population)
}

pub fn sample(values: &[Option<f64>]) -> Vec<f64> {
    zscores(values, Estimator::Sample)
}

fn mean_and_sd(known: &[f64], estimator: Estimator) -> (f64, f64) {
    if known.is_empty() {
        return (0.0, 1.0);
    }
    let n = known.len();
    let mean = known.iter().sum::<f64>() / n as f64;
    let denom = match estimator {
        Estimator::Population => n,
        Estimator::Sample => n.saturating_sub(1).max(1),
    };
    let var = known
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum::<f64>()
        / denom as f64;
    let sd = var.sqrt();
    if sd > 0.0 && sd.is_finite() {
        (mean, sd)
    } else {
        (mean, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Estimator, population, sample, zscores_dense};

    #[test]
    fn population_zscores_have_zero_mean_and_unit_spread() {
        let z = zscores_dense(&[1.0, 2.0, 3.0, 4.0, 10.0], Estimator::Population);
        let mean = z.iter().sum::<f64>() / z.len() as f64;
        let var = z.iter().map(|v| v * v).sum::<f64>() / z.len() as f64;
        assert!(mean.abs() < 1e-12);
        assert!((var - 1.0).abs() < 1e-12);
    }

    #[test]
    fn unknown_values_are_neutral_and_ignored() {
        let z = population(&[Some(1.0), None, Some(3.0), Some(f64::NAN)]);
        assert_eq!(z[1], 0.0);
        assert_eq!(z[3], 0.0);
        assert!((z[0] + 1.0).abs() < 1e-12);
        assert!((z[2] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn all_absent_yields_all_zero() {
        let z = population(&[None, None, None]);
        assert_eq!(z, vec![0.0, 0.0, 0.0]);
        assert!(sample(&[]).is_empty());
    }

    #[test]
    fn constant_signal_floors_spread_to_one() {
        let z = population(&[Some(7.0), Some(7.0), Some(7.0)]);
        assert_eq!(z, vec![0.0, 0.0, 0.0]);
        let z = population(&[Some(7.0)]);
        assert_eq!(z, vec![0.0]);
    }

    #[test]
    fn sample_estimator_uses_n_minus_one() {
        // sd(sample) of [0, 2] is sqrt(2); population would be 1.
        let s = sample(&[Some(0.0), Some(2.0)]);
        let p = population(&[Some(0.0), Some(2.0)]);
        assert!((s[1] - 1.0 / 2.0_f64.sqrt()).abs() < 1e-12);
        assert!((p[1] - 1.0).abs() < 1e-12);
    }
}

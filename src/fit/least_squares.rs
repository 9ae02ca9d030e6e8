use super::Fit;
use crate::time::Time;

// pivots smaller than this are treated as singular
const SINGULAR: f64 = 1e-12;

/// Least-squares fit of a polynomial of the given `order` to the points
/// `(x[i], y[i])`.
///
/// The regressor is normalized to `[-1, 1]` before solving the normal
/// equations, which keeps moderate orders well conditioned. Returns
/// `None` if there are too few distinct points or the system is
/// singular. The execution-time range `[lower, upper]` is recorded in
/// the resulting [Fit], whose parameters are `[center, scale, c0, c1,
/// ...]`: the polynomial is in `u = (x - center) / scale`.
pub(super) fn polyfit(
    x: &[f64],
    y: &[f64],
    order: usize,
    lower: Time,
    upper: Time,
) -> Option<Fit> {
    if x.len() != y.len() || x.len() <= order || x.iter().any(|v| !v.is_finite()) {
        return None;
    }
    let (min, max) = x
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(*v), hi.max(*v)));
    let center = (max + min) / 2.0;
    let scale = (max - min) / 2.0;
    if scale <= 0.0 {
        return None;
    }

    let m = order + 1;
    // augmented normal equations [A^T A | A^T y]
    let mut system = vec![vec![0.0; m + 1]; m];
    for (xi, yi) in x.iter().zip(y.iter()) {
        let u = (xi - center) / scale;
        let powers: Vec<f64> = (0..m)
            .scan(1.0, |p, _| {
                let current = *p;
                *p *= u;
                Some(current)
            })
            .collect();
        for r in 0..m {
            for c in 0..m {
                system[r][c] += powers[r] * powers[c];
            }
            system[r][m] += powers[r] * yi;
        }
    }

    let coefficients = solve(system)?;
    let mut parameters = vec![center, scale];
    parameters.extend(coefficients);
    let mut fit = Fit {
        parameters,
        lower,
        upper,
        error: 0.0,
    };
    fit.error = x
        .iter()
        .zip(y.iter())
        .map(|(xi, yi)| (evaluate(&fit, *xi) - yi).powi(2))
        .sum();
    fit.error.is_finite().then_some(fit)
}

/// Evaluate a fit produced by [polyfit] at regressor value `x`.
pub(super) fn evaluate(fit: &Fit, x: f64) -> f64 {
    let (center, scale) = (fit.parameters[0], fit.parameters[1]);
    let u = (x - center) / scale;
    // Horner's scheme
    fit.parameters[2..]
        .iter()
        .rev()
        .fold(0.0, |acc, c| acc * u + c)
}

/// Gaussian elimination with partial pivoting on an augmented matrix.
fn solve(mut a: Vec<Vec<f64>>) -> Option<Vec<f64>> {
    let m = a.len();
    for col in 0..m {
        let pivot = (col..m).max_by(|i, j| a[*i][col].abs().total_cmp(&a[*j][col].abs()))?;
        if a[pivot][col].abs() < SINGULAR {
            return None;
        }
        a.swap(col, pivot);
        for row in (col + 1)..m {
            let factor = a[row][col] / a[col][col];
            for k in col..=m {
                a[row][k] -= factor * a[col][k];
            }
        }
    }

    let mut solution = vec![0.0; m];
    for row in (0..m).rev() {
        let known: f64 = ((row + 1)..m).map(|k| a[row][k] * solution[k]).sum();
        solution[row] = (a[row][m] - known) / a[row][row];
    }
    solution.iter().all(|c| c.is_finite()).then_some(solution)
}

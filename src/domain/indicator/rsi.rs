/// Guard against division by zero when a window holds no losses.
const EPSILON: f64 = 1e-9;

/// Relative Strength Index with Wilder smoothing (alpha = 1/period).
///
/// Average gain and loss are exponentially smoothed, seeded from the first
/// defined bar-to-bar difference. `rs = avg_gain / (avg_loss + 1e-9)`, so an
/// all-gain stretch reads near 100 rather than dividing by zero. Index 0 has
/// no difference and is NaN; a difference involving a NaN input leaves NaN
/// and does not perturb the smoothed averages.
pub fn rsi(values: &[f64], period: usize) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![f64::NAN; n];
    if period == 0 || n < 2 {
        return out;
    }

    let alpha = 1.0 / period as f64;
    let mut avgs: Option<(f64, f64)> = None;

    for i in 1..n {
        let delta = values[i] - values[i - 1];
        if delta.is_nan() {
            continue;
        }
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        let (avg_gain, avg_loss) = match avgs {
            None => (gain, loss),
            Some((prev_gain, prev_loss)) => (
                alpha * gain + (1.0 - alpha) * prev_gain,
                alpha * loss + (1.0 - alpha) * prev_loss,
            ),
        };
        avgs = Some((avg_gain, avg_loss));

        let rs = avg_gain / (avg_loss + EPSILON);
        out[i] = 100.0 - 100.0 / (1.0 + rs);
    }

    out
}

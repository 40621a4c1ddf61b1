//! Exponential moving average recurrence shared by MACD.
//!
//! k = 2/(n+1), seeded with the first input, then EMA[i] = x[i]*k + EMA[i-1]*(1-k).

/// Raw EMA recurrence over `input`, seeded with `input[0]`.
pub(crate) fn ema_values(input: &[f64], period: usize) -> Vec<f64> {
    let k = 2.0 / (period as f64 + 1.0);
    let mut out = Vec::with_capacity(input.len());
    let mut prev: Option<f64> = None;

    for &x in input {
        let ema = match prev {
            None => x,
            Some(p) => x * k + p * (1.0 - k),
        };
        out.push(ema);
        prev = Some(ema);
    }

    out
}

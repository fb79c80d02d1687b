// Number formatting for axis labels, tooltips and progress readouts

const SI_PREFIXES: [&str; 17] = [
    "y", "z", "a", "f", "p", "n", "µ", "m", "", "k", "M", "G", "T", "P", "E", "Z", "Y",
];

/// Round to `digits` significant figures.
fn round_significant(value: f64, digits: usize) -> f64 {
    if value == 0.0 || !value.is_finite() {
        return value;
    }
    let magnitude = value.abs().log10().floor() as i32;
    let shift = digits as i32 - 1 - magnitude;
    if shift >= 0 {
        let factor = 10f64.powi(shift);
        (value * factor).round() / factor
    } else {
        let factor = 10f64.powi(-shift);
        (value / factor).round() * factor
    }
}

/// `value` with exactly `digits` significant figures, keeping trailing zeros
/// (`5.00`, `97.3`, `1230`).
pub fn significant(value: f64, digits: usize) -> String {
    let digits = digits.max(1);
    if !value.is_finite() {
        return value.to_string();
    }
    if value == 0.0 {
        return format!("{:.*}", digits - 1, 0.0);
    }
    let rounded = round_significant(value, digits);
    let magnitude = rounded.abs().log10().floor() as i32;
    let decimals = (digits as i32 - 1 - magnitude).max(0) as usize;
    format!("{:.*}", decimals, rounded)
}

/// SI notation with `digits` significant figures: `1.54k`, `30.0M`, `512`.
pub fn si(value: f64, digits: usize) -> String {
    if value == 0.0 || !value.is_finite() {
        return significant(value, digits);
    }
    let rounded = round_significant(value, digits.max(1));
    let magnitude = rounded.abs().log10().floor() as i32;
    let group = magnitude.div_euclid(3).clamp(-8, 8);
    let scaled = rounded / 10f64.powi(group * 3);
    format!("{}{}", significant(scaled, digits), SI_PREFIXES[(group + 8) as usize])
}

/// A fraction as a percentage with `digits` significant figures.
pub fn percent(fraction: f64, digits: usize) -> String {
    format!("{}%", significant(fraction * 100.0, digits))
}

/// Accuracy-axis label: blank below 50%, otherwise the rounded percentage.
pub fn accuracy_tick(value: f64) -> String {
    if value < 0.5 {
        String::new()
    } else {
        format!("{}%", (value * 100.0).round() as i64)
    }
}

/// Linear-axis label with thousands separators and as many decimals as the
/// tick spacing needs.
pub fn tick_label(value: f64, step: f64) -> String {
    let decimals = if step > 0.0 && step < 1.0 {
        (-step.log10().floor()) as usize
    } else {
        0
    };
    grouped(value, decimals)
}

fn grouped(value: f64, decimals: usize) -> String {
    let text = format!("{:.*}", decimals, value.abs());
    let (int, frac) = match text.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (text.as_str(), None),
    };

    let mut out = String::with_capacity(text.len() + int.len() / 3 + 1);
    if value < 0.0 && text.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        out.push('-');
    }
    for (i, ch) in int.chars().enumerate() {
        if i > 0 && (int.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    out
}

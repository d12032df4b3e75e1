//! Number formatting for the two display surfaces: compact notation for
//! inline slider labels, grouped-digit detail formatting for itemized cost
//! breakdowns.

/// Formats a number in compact notation with at most one fraction digit,
/// e.g. `1200000.0` -> `"1.2M"`.
pub fn format_compact(num: f64) -> String {
    let abs = num.abs();
    let (scaled, suffix) = if abs >= 1e12 {
        (num / 1e12, "T")
    } else if abs >= 1e9 {
        (num / 1e9, "B")
    } else if abs >= 1e6 {
        (num / 1e6, "M")
    } else if abs >= 1e3 {
        (num / 1e3, "K")
    } else {
        (num, "")
    };

    let rounded = (scaled * 10.0).round() / 10.0;
    if rounded == rounded.trunc() {
        format!("{}{}", rounded.trunc() as i64, suffix)
    } else {
        format!("{:.1}{}", rounded, suffix)
    }
}

/// Formats a number with thousands separators and at most three fraction
/// digits, e.g. `78000.0` -> `"78,000"`.
pub fn format_detail(num: f64) -> String {
    let rounded = (num * 1000.0).round() / 1000.0;
    let negative = rounded < 0.0;
    let abs = rounded.abs();

    let int_part = abs.trunc() as u64;
    let mut grouped = String::new();
    let digits = int_part.to_string();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let frac = abs.fract();
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if frac > 0.0 {
        let frac_str = format!("{:.3}", frac);
        out.push_str(frac_str.trim_start_matches('0').trim_end_matches('0'));
    }
    out
}

/// Parses a compact-notation string back into a number, accepting `k`/`m`/
/// `b`/`t` suffixes (case-insensitive) and embedded commas.
/// Returns `None` when the string is not a number.
pub fn parse_compact(input: &str) -> Option<f64> {
    let normalized = input.trim().to_lowercase().replace(',', "");
    let multipliers = [('k', 1e3), ('m', 1e6), ('b', 1e9), ('t', 1e12)];

    for (suffix, multiplier) in multipliers {
        if let Some(stripped) = normalized.strip_suffix(suffix) {
            if let Ok(number) = stripped.parse::<f64>() {
                return Some(number * multiplier);
            }
        }
    }

    normalized.parse::<f64>().ok()
}

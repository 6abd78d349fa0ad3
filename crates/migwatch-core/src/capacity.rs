use crate::model::Quantity;
use regex::Regex;

lazy_static::lazy_static! {
    static ref CAPACITY_PATTERN: Regex =
        Regex::new(r"^\s*([0-9.]+)\s*([A-Za-z]+)?\s*$").expect("capacity pattern compiles");
}

const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

fn multiplier(unit: &str) -> Option<f64> {
    const KI: f64 = 1024.0;
    let factor = match unit {
        "" | "b" => 1.0,
        "k" | "kb" => 1e3,
        "ki" | "kib" => KI,
        "m" | "mb" => 1e6,
        "mi" | "mib" => KI * KI,
        "g" | "gb" => 1e9,
        "gi" | "gib" => KI * KI * KI,
        "t" | "tb" => 1e12,
        "ti" | "tib" => KI * KI * KI * KI,
        "p" | "pb" => 1e15,
        "pi" | "pib" => KI * KI * KI * KI * KI,
        _ => return None,
    };
    Some(factor)
}

fn non_negative(bytes: f64) -> f64 {
    if bytes.is_finite() && bytes > 0.0 {
        bytes
    } else {
        0.0
    }
}

/// Byte count of a capacity value. Numbers are taken as bytes; anything
/// that cannot be read yields `0.0`.
pub fn parse_capacity(quantity: &Quantity) -> f64 {
    match quantity {
        Quantity::Bytes(bytes) => non_negative(*bytes),
        Quantity::Notation(notation) => parse_capacity_str(notation),
    }
}

/// Parse `<number><unit>` where the unit is case-insensitive: `B`, decimal
/// `K`/`KB` .. `P`/`PB`, or binary `Ki`/`KiB` .. `Pi`/`PiB`.
pub fn parse_capacity_str(input: &str) -> f64 {
    let Some(captures) = CAPACITY_PATTERN.captures(input) else {
        return 0.0;
    };
    let Ok(number) = captures[1].parse::<f64>() else {
        return 0.0;
    };
    let unit = captures
        .get(2)
        .map(|unit| unit.as_str().to_ascii_lowercase())
        .unwrap_or_default();

    match multiplier(&unit) {
        Some(factor) => non_negative(number * factor),
        None => 0.0,
    }
}

/// Render bytes with decimal units: two decimals below 10, one below 100,
/// none above. Non-finite input renders as `0B`.
pub fn format_bytes(bytes: f64) -> String {
    if !bytes.is_finite() {
        return "0B".to_string();
    }

    let mut value = bytes;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    if value >= 100.0 {
        format!("{}{}", group_thousands(&format!("{:.0}", value)), UNITS[unit])
    } else if value >= 10.0 {
        format!("{:.1}{}", value, UNITS[unit])
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

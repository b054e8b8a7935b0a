use num_bigint::BigUint;
use num_traits::{ToPrimitive, Zero};

const SUFFIXES: [&str; 7] = ["", "k", "M", "B", "T", "P", "E"];
const MIN_BUCKET: i32 = -3;
const MAX_BUCKET: i32 = SUFFIXES.len() as i32 - 1;

/// Interprets `balance` as a fixed-point number with `decimals` fractional
/// digits. The integer and fractional parts are split before converting so
/// 18-decimal tokens keep their precision.
pub fn to_decimal(balance: &BigUint, decimals: u32) -> f64 {
    if decimals == 0 {
        return balance.to_f64().unwrap_or(f64::INFINITY);
    }
    let unit = BigUint::from(10u32).pow(decimals);
    let whole = (balance / &unit).to_f64().unwrap_or(f64::INFINITY);
    let frac = (balance % &unit).to_f64().unwrap_or(0.0);
    let scale = unit.to_f64().unwrap_or(f64::INFINITY);
    whole + frac / scale
}

/// Formats a raw token balance with a magnitude suffix, e.g. `1.234k`.
pub fn format_balance(balance: &BigUint, decimals: u32) -> String {
    if balance.is_zero() {
        return "0".to_string();
    }
    format_magnitude(to_decimal(balance, decimals))
}

/// Same bucketing as [`format_balance`] for an already converted value.
pub fn format_magnitude(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return "Infinity".to_string();
    }

    let bucket = (value.abs().log10() / 3.0).floor() as i32;
    if !(MIN_BUCKET..=MAX_BUCKET).contains(&bucket) {
        return to_exponential(value, 4);
    }
    if bucket < 0 {
        return to_precision(value, 3);
    }

    let scaled = value / 1000f64.powi(bucket);
    format!("{}{}", to_precision(scaled, 4), SUFFIXES[bucket as usize])
}

/// Dollar amount with the same suffix table; two decimals below 1k.
pub fn format_usd(value: f64) -> String {
    if !value.is_finite() {
        return "$-".to_string();
    }
    let sign = if value < 0.0 { "-" } else { "" };
    let abs = value.abs();
    if abs < 1000.0 {
        return format!("{}${:.2}", sign, abs);
    }
    let bucket = ((abs.log10() / 3.0).floor() as usize).min(SUFFIXES.len() - 1);
    format!(
        "{}${:.2}{}",
        sign,
        abs / 1000f64.powi(bucket as i32),
        SUFFIXES[bucket]
    )
}

/// APYs arrive as fractions (`0.0412` is 4.12%).
pub fn format_percent(fraction: f64) -> String {
    if !fraction.is_finite() {
        return "-".to_string();
    }
    format!("{:.2}%", fraction * 100.0)
}

/// Digits needed to print any finite `f64` exactly in scientific form.
const EXACT_DIGITS: usize = 767;

/// Significant-digit formatting: fixed notation unless the decimal exponent
/// is below -6 or at least `precision`.
fn to_precision(value: f64, precision: usize) -> String {
    let digits = precision.max(1);
    let (significand, exponent) = round_significant(value, digits);
    if exponent < -6 || exponent >= digits as i32 {
        return join_exponential(&with_point(&significand, 1), exponent);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    if exponent < 0 {
        let zeros = "0".repeat((-exponent - 1) as usize);
        return format!("{}0.{}{}", sign, zeros, significand);
    }
    format!("{}{}", sign, with_point(&significand, exponent as usize + 1))
}

fn to_exponential(value: f64, decimals: usize) -> String {
    let (significand, exponent) = round_significant(value, decimals + 1);
    let sign = if value < 0.0 { "-" } else { "" };
    let mantissa = format!("{}{}", sign, with_point(&significand, 1));
    join_exponential(&mantissa, exponent)
}

/// Rounds `|value|` to `digits` significant digits, ties away from zero, and
/// returns the digit string with the decimal exponent after rounding
/// (999.96 at 4 digits gives `1000`, 3).
///
/// Rounding happens on the exact decimal expansion of the float, so 100.25
/// becomes `1003` where `{:.1}` would round the tie to even.
fn round_significant(value: f64, digits: usize) -> (String, i32) {
    let rendered = format!("{:.*e}", EXACT_DIGITS, value.abs());
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
    let mut exponent: i32 = exponent.parse().unwrap_or(0);
    let all: Vec<u8> = mantissa.bytes().filter(u8::is_ascii_digit).collect();

    let mut kept = all[..digits.min(all.len())].to_vec();
    kept.resize(digits, b'0');
    if all.get(digits).is_some_and(|d| *d >= b'5') {
        let mut carry = true;
        for digit in kept.iter_mut().rev() {
            if *digit == b'9' {
                *digit = b'0';
            } else {
                *digit += 1;
                carry = false;
                break;
            }
        }
        if carry {
            kept.insert(0, b'1');
            kept.truncate(digits);
            exponent += 1;
        }
    }
    (String::from_utf8_lossy(&kept).into_owned(), exponent)
}

/// Places a decimal point after the first `whole` digits, if any remain.
fn with_point(digits: &str, whole: usize) -> String {
    if digits.len() <= whole {
        return digits.to_string();
    }
    format!("{}.{}", &digits[..whole], &digits[whole..])
}

fn join_exponential(mantissa: &str, exponent: i32) -> String {
    let sign = if exponent < 0 { '-' } else { '+' };
    format!("{}e{}{}", mantissa, sign, exponent.abs())
}

use num_bigint::BigUint;
use num_traits::Zero;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AmountError {
    #[error("Enter an amount")]
    Empty,
    #[error("Invalid character '{0}'")]
    InvalidCharacter(char),
    #[error("Only one decimal point allowed")]
    MultipleDecimalPoints,
    #[error("At most {max} decimals")]
    TooManyDecimals { max: u32 },
    #[error("Amount must be greater than zero")]
    Zero,
    #[error("Amount exceeds available balance")]
    ExceedsBalance,
}

/// Applies one keystroke to an amount field. Returns the new contents, or
/// `None` when the keystroke would make the input invalid.
pub fn sanitize_amount_input(current: &str, ch: char, decimals: u32) -> Option<String> {
    match ch {
        '0'..='9' => {
            if let Some((_, frac)) = current.split_once('.') {
                if frac.len() >= decimals as usize {
                    return None;
                }
            }
            // "0" followed by a digit drops the redundant leading zero.
            if current == "0" {
                return Some(ch.to_string());
            }
            Some(format!("{}{}", current, ch))
        }
        '.' | ',' => {
            if decimals == 0 || current.contains('.') {
                return None;
            }
            if current.is_empty() {
                return Some("0.".to_string());
            }
            Some(format!("{}.", current))
        }
        _ => None,
    }
}

/// Converts a typed decimal string into raw fixed-point units.
pub fn parse_amount(input: &str, decimals: u32) -> Result<BigUint, AmountError> {
    let input = input.trim();
    if input.is_empty() || input == "." {
        return Err(AmountError::Empty);
    }
    if let Some(bad) = input.chars().find(|c| !c.is_ascii_digit() && *c != '.') {
        return Err(AmountError::InvalidCharacter(bad));
    }

    let mut parts = input.splitn(3, '.');
    let whole = parts.next().unwrap_or("");
    let frac = parts.next().unwrap_or("");
    if parts.next().is_some() {
        return Err(AmountError::MultipleDecimalPoints);
    }
    if frac.len() > decimals as usize {
        return Err(AmountError::TooManyDecimals { max: decimals });
    }

    let padded = format!(
        "{}{}{}",
        whole,
        frac,
        "0".repeat(decimals as usize - frac.len())
    );
    let digits = padded.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(BigUint::zero());
    }
    BigUint::parse_bytes(digits.as_bytes(), 10).ok_or(AmountError::Empty)
}

/// Parses and checks an amount against zero and an optional upper bound.
pub fn validate_amount(
    input: &str,
    decimals: u32,
    max: Option<&BigUint>,
) -> Result<BigUint, AmountError> {
    let amount = parse_amount(input, decimals)?;
    if amount.is_zero() {
        return Err(AmountError::Zero);
    }
    match max {
        Some(max) if &amount > max => Err(AmountError::ExceedsBalance),
        _ => Ok(amount),
    }
}

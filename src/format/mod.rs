pub mod amount;
pub mod balance;

pub use amount::{sanitize_amount_input, validate_amount, AmountError};
pub use balance::{format_balance, format_percent, format_usd, to_decimal};

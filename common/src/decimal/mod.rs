//! Decimal type utilities for money amounts and provider ratings

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount with high precision
pub type Amount = Decimal;

/// Provider rating (stored with 2 decimal places)
pub type Rating = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;
    use rust_decimal::RoundingStrategy;

    /// Money amounts are stored with 2 decimal places
    pub const AMOUNT_PRECISION: u32 = 2;

    /// Ratings are stored with 2 decimal places
    pub const RATING_PRECISION: u32 = 2;

    /// Round an amount to standard money precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }

    /// Round a rating to standard precision
    pub fn round_rating(rating: Rating) -> Rating {
        rating.round_dp(RATING_PRECISION)
    }

    /// Split a total into `parts` amounts that sum exactly to the total.
    ///
    /// Each part is the truncated even share; the final part absorbs the
    /// rounding remainder so the invariant `sum(parts) == total` holds.
    pub fn split_amount(total: Amount, parts: u32) -> Vec<Amount> {
        if parts <= 1 {
            return vec![total];
        }

        let share = (total / Decimal::from(parts))
            .round_dp_with_strategy(AMOUNT_PRECISION, RoundingStrategy::ToZero);
        let mut amounts = vec![share; (parts - 1) as usize];
        amounts.push(total - share * Decimal::from(parts - 1));
        amounts
    }
}

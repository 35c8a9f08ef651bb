/// Amounts are whole integer units. Balances may go negative down to `-limit`.
pub type Amount = i64;

/// Largest magnitude a single transaction may carry.
/// Bounded by the 32-bit wire range so `balance + delta` can never overflow the store.
pub const MAX_AMOUNT: Amount = i32::MAX as Amount;

/// Returns true if `amount` is an acceptable transaction magnitude.
pub fn is_valid_amount(amount: Amount) -> bool {
    (1..=MAX_AMOUNT).contains(&amount)
}

/// Returns true if a balance respects the overdraft floor of `limit`.
pub fn within_limit(balance: Amount, limit: Amount) -> bool {
    balance >= -limit
}

//! Token usage arithmetic.

use crate::types::TokenUsage;

impl TokenUsage {
    /// Componentwise sum, saturating (usage is never negative).
    #[must_use]
    pub fn add(&self, other: &TokenUsage) -> TokenUsage {
        TokenUsage {
            total_input: self.total_input.saturating_add(other.total_input),
            total_output: self.total_output.saturating_add(other.total_output),
            cached_input: self.cached_input.saturating_add(other.cached_input),
            reasoning: self.reasoning.saturating_add(other.reasoning),
        }
    }

    /// True when all four components are zero — lets the event relay
    /// skip walking the parent chain for a no-op delta.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.total_input == 0
            && self.total_output == 0
            && self.cached_input == 0
            && self.reasoning == 0
    }
}

/// Percentage of a model's context window used, per §4.4:
///
/// `used = max(0, total_input - cached_input) + max(0, cached_input)`,
/// rounded half-up as `(used * 100 + capacity / 2) / capacity` on integer
/// arithmetic, clamped to `[0, 100]`. Returns 0 when `capacity == 0` or
/// `used == 0` (all inputs are unsigned, so "negative" cannot occur —
/// the clamps in the spec formula collapse to a plain `max`).
#[must_use]
pub fn context_usage_percent(total_input: u64, cached_input: u64, capacity: u64) -> u8 {
    if capacity == 0 {
        return 0;
    }
    let used = total_input.max(cached_input);
    if used == 0 {
        return 0;
    }
    let numerator = (used as u128) * 100 + (capacity as u128) / 2;
    let pct = numerator / (capacity as u128);
    pct.min(100) as u8
}

//! Token budgets for the two memory tiers.

use recall_core::TokenCounter;
use recall_settings::{ContextLimitUnit, TierSettings};

/// A tier's token budget, as configured.
///
/// Either an absolute token count or a percentage of the model's current
/// context window; percentages resolve to absolute tokens at call time so a
/// window change is picked up on the next refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TokenBudget {
    /// The configured number.
    pub limit: usize,
    /// How to interpret it.
    pub unit: ContextLimitUnit,
}

impl TokenBudget {
    /// Read a tier's budget from its settings.
    #[must_use]
    pub fn from_tier(tier: &TierSettings) -> Self {
        Self {
            limit: tier.context_limit,
            unit: tier.context_limit_unit,
        }
    }

    /// Resolve to an absolute token count.
    #[must_use]
    pub fn resolve(&self, counter: &dyn TokenCounter) -> usize {
        match self.unit {
            ContextLimitUnit::Tokens => self.limit,
            ContextLimitUnit::Percent => counter.max_context_window() * self.limit / 100,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedWindow(usize);
    impl TokenCounter for FixedWindow {
        fn count_tokens(&self, text: &str) -> usize {
            text.len()
        }
        fn max_context_window(&self) -> usize {
            self.0
        }
    }

    #[test]
    fn absolute_budget_passes_through() {
        let budget = TokenBudget {
            limit: 512,
            unit: ContextLimitUnit::Tokens,
        };
        assert_eq!(budget.resolve(&FixedWindow(8192)), 512);
    }

    #[test]
    fn percent_budget_scales_with_window() {
        let budget = TokenBudget {
            limit: 10,
            unit: ContextLimitUnit::Percent,
        };
        assert_eq!(budget.resolve(&FixedWindow(8192)), 819);
        assert_eq!(budget.resolve(&FixedWindow(4096)), 409);
    }

    #[test]
    fn percent_rounds_down() {
        let budget = TokenBudget {
            limit: 33,
            unit: ContextLimitUnit::Percent,
        };
        // 100 * 33 / 100 = 33 exactly; 101 * 33 / 100 = 33.33 → 33
        assert_eq!(budget.resolve(&FixedWindow(101)), 33);
    }

    #[test]
    fn from_tier_reads_settings() {
        let mut tier = TierSettings::default();
        tier.context_limit = 25;
        tier.context_limit_unit = ContextLimitUnit::Tokens;
        let budget = TokenBudget::from_tier(&tier);
        assert_eq!(budget.limit, 25);
        assert_eq!(budget.unit, ContextLimitUnit::Tokens);
    }
}

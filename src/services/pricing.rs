use crate::config::PricingConfig;
use crate::entities::Tier;

/// What a single unit of work costs, split across the two token currencies.
/// Exactly one component is non-zero for any resolved cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenCost {
    pub gems: i64,
    pub sparks: i64,
}

impl TokenCost {
    pub fn gems(amount: i64) -> Self {
        Self {
            gems: amount,
            sparks: 0,
        }
    }

    pub fn sparks(amount: i64) -> Self {
        Self {
            gems: 0,
            sparks: amount,
        }
    }
}

/// Pure pricing policy over (balances, tier). Prices come in via config so
/// tests can vary them.
#[derive(Clone)]
pub struct PricingResolver {
    config: PricingConfig,
}

impl PricingResolver {
    pub fn new(config: PricingConfig) -> Self {
        Self { config }
    }

    pub fn unit_price(&self, tier: Tier) -> i64 {
        match tier {
            Tier::Standard => self.config.standard_price,
            Tier::Pro => self.config.pro_price,
        }
    }

    /// Standard spends sparks first and falls back to gems; pro accepts
    /// gems only. The preference order is business policy, keep it.
    pub fn resolve(&self, gems: i64, sparks: i64, tier: Tier) -> Option<TokenCost> {
        let price = self.unit_price(tier);
        match tier {
            Tier::Standard => {
                if sparks >= price {
                    Some(TokenCost::sparks(price))
                } else if gems >= price {
                    Some(TokenCost::gems(price))
                } else {
                    None
                }
            }
            Tier::Pro => {
                if gems >= price {
                    Some(TokenCost::gems(price))
                } else {
                    None
                }
            }
        }
    }

    /// Animate is a fixed-price, gems-only operation.
    pub fn animate_cost(&self) -> TokenCost {
        TokenCost::gems(self.config.animate_cost)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> PricingResolver {
        PricingResolver::new(PricingConfig {
            standard_price: 1,
            pro_price: 2,
            animate_cost: 5,
        })
    }

    #[test]
    fn test_standard_prefers_sparks() {
        let cost = resolver().resolve(10, 10, Tier::Standard).unwrap();
        assert_eq!(cost, TokenCost::sparks(1));
    }

    #[test]
    fn test_standard_falls_back_to_gems() {
        let cost = resolver().resolve(10, 0, Tier::Standard).unwrap();
        assert_eq!(cost, TokenCost::gems(1));
    }

    #[test]
    fn test_standard_declines_when_both_short() {
        assert!(resolver().resolve(0, 0, Tier::Standard).is_none());
    }

    #[test]
    fn test_pro_ignores_sparks() {
        // plenty of sparks, but pro only takes gems
        assert!(resolver().resolve(1, 100, Tier::Pro).is_none());
        let cost = resolver().resolve(2, 100, Tier::Pro).unwrap();
        assert_eq!(cost, TokenCost::gems(2));
    }

    #[test]
    fn test_animate_cost_is_gems_only() {
        assert_eq!(resolver().animate_cost(), TokenCost::gems(5));
    }
}

pub mod account_service;
pub mod generation_service;
pub mod ledger_service;
pub mod pricing;
pub mod referral;

pub use account_service::*;
pub use generation_service::*;
pub use ledger_service::LedgerService;
pub use pricing::{PricingResolver, TokenCost};
pub use referral::bonus_cents;

#[cfg(test)]
mod tests;

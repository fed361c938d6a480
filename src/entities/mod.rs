pub mod generations;
pub mod referrals;
pub mod transactions;
pub mod users;

pub use generations as generation_entity;
pub use referrals as referral_entity;
pub use transactions as transaction_entity;
pub use users as user_entity;

pub use generations::{GenerationKind, GenerationStatus};
pub use transactions::{TransactionKind, TransactionStatus};
pub use users::Tier;

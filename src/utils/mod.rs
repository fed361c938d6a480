pub mod codes;
pub mod packages;
pub mod presets;

pub use codes::{generate_order_id, generate_referral_code};
pub use packages::{get_card_package, get_wallet_package, list_card_packages, list_wallet_packages};
pub use presets::{get_preset, list_presets};

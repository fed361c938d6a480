use crate::config::PaymentsConfig;
use crate::utils::codes::generate_order_id;
use crate::utils::packages::{CardPackage, WalletPackage};

pub const CARD_ORDER_PREFIX: &str = "ORD";
pub const WALLET_ORDER_PREFIX: &str = "INV";

#[derive(Debug, Clone)]
pub struct CardPaymentLink {
    pub order_id: String,
    pub payment_url: String,
}

#[derive(Debug, Clone)]
pub struct WalletInvoice {
    pub order_id: String,
    pub wallet_units: i64,
}

/// Opaque payment-link creation: only the order id matters to the ledger —
/// it becomes the transaction's external id, and the provider echoes it
/// back through the confirmation webhook.
#[derive(Clone)]
pub struct CardPaymentProvider {
    config: PaymentsConfig,
}

impl CardPaymentProvider {
    pub fn new(config: PaymentsConfig) -> Self {
        Self { config }
    }

    pub fn create_payment_link(&self, _package: &CardPackage) -> CardPaymentLink {
        let order_id = generate_order_id(CARD_ORDER_PREFIX);
        let payment_url = format!(
            "{}/pay/{}",
            self.config.card_base_url.trim_end_matches('/'),
            order_id
        );
        CardPaymentLink {
            order_id,
            payment_url,
        }
    }

    /// Wallet top-ups are paid through an in-chat invoice the presentation
    /// layer issues; the order id here is the invoice payload.
    pub fn create_wallet_invoice(&self, package: &WalletPackage) -> WalletInvoice {
        WalletInvoice {
            order_id: generate_order_id(WALLET_ORDER_PREFIX),
            wallet_units: package.wallet_units,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::packages::get_card_package;

    #[test]
    fn test_payment_link_embeds_order_id() {
        let provider = CardPaymentProvider::new(PaymentsConfig {
            card_base_url: "https://pay.example.com/".to_string(),
        });
        let link = provider.create_payment_link(get_card_package("card_40").unwrap());
        assert!(link.order_id.starts_with("ORD-"));
        assert_eq!(
            link.payment_url,
            format!("https://pay.example.com/pay/{}", link.order_id)
        );
    }
}

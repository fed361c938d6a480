/// Top-up package catalogs. Card packages are priced in USD cents, wallet
/// packages in the chat platform's wallet currency units.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardPackage {
    pub code: &'static str,
    pub gems: i64,
    pub price_cents: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WalletPackage {
    pub code: &'static str,
    pub gems: i64,
    pub wallet_units: i64,
}

const CARD_PACKAGES: &[CardPackage] = &[
    CardPackage {
        code: "card_40",
        gems: 40,
        price_cents: 499,
    },
    CardPackage {
        code: "card_100",
        gems: 100,
        price_cents: 999,
    },
    CardPackage {
        code: "card_200",
        gems: 200,
        price_cents: 1799,
    },
    CardPackage {
        code: "card_300",
        gems: 300,
        price_cents: 2499,
    },
    CardPackage {
        code: "card_600",
        gems: 600,
        price_cents: 4499,
    },
];

const WALLET_PACKAGES: &[WalletPackage] = &[
    WalletPackage {
        code: "wallet_40",
        gems: 40,
        wallet_units: 140,
    },
    WalletPackage {
        code: "wallet_100",
        gems: 100,
        wallet_units: 340,
    },
    WalletPackage {
        code: "wallet_200",
        gems: 200,
        wallet_units: 650,
    },
];

pub fn list_card_packages() -> &'static [CardPackage] {
    CARD_PACKAGES
}

pub fn list_wallet_packages() -> &'static [WalletPackage] {
    WALLET_PACKAGES
}

pub fn get_card_package(code: &str) -> Option<&'static CardPackage> {
    CARD_PACKAGES.iter().find(|pkg| pkg.code == code)
}

pub fn get_wallet_package(code: &str) -> Option<&'static WalletPackage> {
    WALLET_PACKAGES.iter().find(|pkg| pkg.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_code() {
        let pkg = get_card_package("card_100").unwrap();
        assert_eq!(pkg.gems, 100);
        assert_eq!(pkg.price_cents, 999);
        assert!(get_card_package("card_9000").is_none());
    }

    #[test]
    fn test_package_codes_are_unique() {
        for (i, a) in CARD_PACKAGES.iter().enumerate() {
            for b in &CARD_PACKAGES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
        for (i, a) in WALLET_PACKAGES.iter().enumerate() {
            for b in &WALLET_PACKAGES[i + 1..] {
                assert_ne!(a.code, b.code);
            }
        }
    }
}

use rand::Rng;
use uuid::Uuid;

pub const REFERRAL_CODE_LEN: usize = 8;

/// Sample an 8-character uppercase alphanumeric referral code. Uniqueness is
/// the caller's job: check against the store and resample on collision.
pub fn generate_referral_code() -> String {
    let mut rng = rand::thread_rng();
    (0..REFERRAL_CODE_LEN)
        .map(|_| {
            let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
            chars[rng.gen_range(0..chars.len())] as char
        })
        .collect()
}

/// Order id for an internally generated top-up: a short prefix tag plus 10
/// hex characters. The transactions.external_id unique index is what
/// actually guarantees uniqueness.
pub fn generate_order_id(prefix: &str) -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..10])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referral_code_shape() {
        let code = generate_referral_code();
        assert_eq!(code.len(), REFERRAL_CODE_LEN);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_order_id_shape() {
        let id = generate_order_id("ORD");
        assert!(id.starts_with("ORD-"));
        assert_eq!(id.len(), "ORD-".len() + 10);
        assert!(
            id["ORD-".len()..]
                .chars()
                .all(|c| c.is_ascii_hexdigit())
        );
    }

    #[test]
    fn test_order_ids_differ() {
        // 40 bits of uuid; a collision here would mean a broken RNG
        assert_ne!(generate_order_id("ORD"), generate_order_id("ORD"));
    }
}

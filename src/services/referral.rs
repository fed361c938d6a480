/// Referral bonus for a confirmed top-up: `gems × percent / 100` in the
/// monetary currency, rounded half-up to whole cents. The percent is given
/// in basis points (1000 = 10%), which makes the whole computation exact
/// integer arithmetic: `gems × percent_bp / 100` cents.
pub fn bonus_cents(gems_amount: i64, percent_bp: i64) -> i64 {
    if gems_amount <= 0 || percent_bp <= 0 {
        return 0;
    }
    (gems_amount * percent_bp + 50) / 100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ten_percent_of_hundred_gems() {
        // 100 gems at 10% -> $10.00
        assert_eq!(bonus_cents(100, 1000), 1000);
    }

    #[test]
    fn test_ten_percent_of_forty_gems() {
        assert_eq!(bonus_cents(40, 1000), 400);
    }

    #[test]
    fn test_rounds_half_up() {
        // 5 gems at 2.5% = 12.5 cents -> 13
        assert_eq!(bonus_cents(5, 250), 13);
        // 1 gem at 0.5% = 0.5 cents -> 1
        assert_eq!(bonus_cents(1, 50), 1);
        // 3 gems at 4.1% = 12.3 cents -> 12
        assert_eq!(bonus_cents(3, 410), 12);
    }

    #[test]
    fn test_degenerate_inputs_yield_nothing() {
        assert_eq!(bonus_cents(0, 1000), 0);
        assert_eq!(bonus_cents(-40, 1000), 0);
        assert_eq!(bonus_cents(100, 0), 0);
    }
}

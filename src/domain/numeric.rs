/// Comprasnet renders numbers in Brazilian locale: '.' for thousands, ',' for
/// decimals, currency prefixed with "R$". Both normalizers are lossy on
/// purpose: anything that still fails to parse after cleanup becomes 0.0 so a
/// single malformed cell never halts a page.
pub fn normalize_quantity(raw: &str) -> f64 {
    let cleaned = raw.trim().replace('.', "").replace(',', ".");
    cleaned.parse::<f64>().unwrap_or(0.0)
}

pub fn normalize_currency(raw: &str) -> f64 {
    let trimmed = raw.trim();
    let stripped = trimmed.strip_prefix("R$").unwrap_or(trimmed);
    normalize_quantity(stripped)
}

#[cfg(test)]
mod tests {
    use super::{normalize_currency, normalize_quantity};

    #[test]
    fn quantity_with_thousands_and_decimal_comma() {
        assert_eq!(normalize_quantity("1.234,56"), 1234.56);
    }

    #[test]
    fn quantity_plain_integer() {
        assert_eq!(normalize_quantity("10"), 10.0);
    }

    #[test]
    fn quantity_empty_recovers_to_zero() {
        assert_eq!(normalize_quantity(""), 0.0);
        assert_eq!(normalize_quantity("   "), 0.0);
    }

    #[test]
    fn quantity_unparseable_recovers_to_zero() {
        assert_eq!(normalize_quantity("abc"), 0.0);
    }

    #[test]
    fn currency_with_symbol() {
        assert_eq!(normalize_currency("R$ 10,00"), 10.0);
    }

    #[test]
    fn currency_with_thousands() {
        assert_eq!(normalize_currency("R$ 1.234,56"), 1234.56);
    }

    #[test]
    fn currency_without_symbol() {
        assert_eq!(normalize_currency("5,00"), 5.0);
    }

    #[test]
    fn currency_empty_and_garbage_recover_to_zero() {
        assert_eq!(normalize_currency(""), 0.0);
        assert_eq!(normalize_currency("R$ "), 0.0);
        assert_eq!(normalize_currency("R$ abc"), 0.0);
    }
}

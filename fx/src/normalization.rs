//! Rebasing of provider rates onto the reference currency.

use ratesync_common::{Currency, Rates, Result, SyncError};

/// Express `rates`, quoted against `base`, against `reference` instead.
///
/// The returned map always holds `reference` at exactly 1.0 and every other
/// value is finite and positive. The input is never modified.
pub fn rebase(base: &Currency, rates: &Rates, reference: &Currency) -> Result<Rates> {
    let reference_code = reference.code();

    if base == reference {
        ensure_positive(rates, base)?;
        let mut normalized = rates.clone();
        normalized.insert(reference_code.to_string(), 1.0);
        return Ok(normalized);
    }

    let reference_per_base = *rates.get(reference_code).ok_or_else(|| {
        SyncError::InvalidInput(format!(
            "{} rate missing for base conversion from {}",
            reference_code, base
        ))
    })?;

    if reference_per_base == 0.0 {
        return Err(SyncError::DivisionByZero(format!(
            "{} rate is zero, cannot normalize from {}",
            reference_code, base
        )));
    }

    ensure_positive(rates, base)?;

    let mut normalized: Rates = rates
        .iter()
        .map(|(code, rate)| (code.clone(), rate / reference_per_base))
        .collect();
    normalized.insert(reference_code.to_string(), 1.0);

    Ok(normalized)
}

// Rejects zero, negative, NaN and infinite quotes.
fn ensure_positive(rates: &Rates, base: &Currency) -> Result<()> {
    match rates.iter().find(|(_, rate)| !(rate.is_finite() && **rate > 0.0)) {
        Some((code, rate)) => Err(SyncError::InvalidInput(format!(
            "{} rate {} against {} is not a positive number",
            code, rate, base
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn rates(entries: &[(&str, f64)]) -> Rates {
        entries.iter().map(|(c, r)| (c.to_string(), *r)).collect()
    }

    #[test]
    fn test_reference_base_forces_one() {
        let input = rates(&[("EUR", 0.99), ("USD", 1.08)]);
        let out = rebase(&Currency::eur(), &input, &Currency::eur()).unwrap();

        assert_eq!(out, rates(&[("EUR", 1.0), ("USD", 1.08)]));
        // input untouched
        assert_eq!(input["EUR"], 0.99);
    }

    #[test]
    fn test_reference_base_adds_missing_reference() {
        let out = rebase(&Currency::eur(), &rates(&[("JPY", 161.0)]), &Currency::eur()).unwrap();
        assert_eq!(out["EUR"], 1.0);
        assert_eq!(out["JPY"], 161.0);
    }

    #[test]
    fn test_rebase_from_usd() {
        let input = rates(&[("USD", 1.0), ("EUR", 0.5), ("GBP", 0.8)]);
        let out = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap();

        assert_eq!(out["EUR"], 1.0);
        assert_eq!(out["USD"], 2.0);
        assert_eq!(out["GBP"], 1.6);
    }

    #[test]
    fn test_missing_reference_is_invalid_input() {
        let err = rebase(&Currency::usd(), &rates(&[("GBP", 0.8)]), &Currency::eur()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
    }

    #[test]
    fn test_zero_reference_is_division_by_zero() {
        let input = rates(&[("EUR", 0.0), ("GBP", 0.8)]);
        let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
        assert!(matches!(err, SyncError::DivisionByZero(_)));
    }

    #[test]
    fn test_negative_reference_is_invalid_input() {
        let input = rates(&[("EUR", -0.5), ("GBP", 0.8)]);
        let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_quote_is_invalid_input() {
        let input = rates(&[("JPY", 0.0), ("USD", -1.0)]);
        let err = rebase(&Currency::eur(), &input, &Currency::eur()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));

        let input = rates(&[("EUR", 0.5), ("GBP", -0.8)]);
        let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
        assert!(matches!(err, SyncError::InvalidInput(_)));
    }

    #[test]
    fn test_non_finite_quote_is_invalid_input() {
        for bad in [f64::NAN, f64::INFINITY] {
            let input = rates(&[("EUR", 0.5), ("GBP", bad)]);
            let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
            assert!(matches!(err, SyncError::InvalidInput(_)));

            let err = rebase(&Currency::eur(), &input, &Currency::eur()).unwrap_err();
            assert!(matches!(err, SyncError::InvalidInput(_)));
        }
    }

    fn rate_map() -> impl Strategy<Value = Rates> {
        prop::collection::btree_map("[A-Z]{3}", 0.0001f64..10_000.0, 0..12)
    }

    proptest! {
        #[test]
        fn prop_rebase_divides_by_reference(mut input in rate_map(), eur in 0.0001f64..10_000.0) {
            input.insert("EUR".to_string(), eur);
            let out = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap();

            prop_assert_eq!(out["EUR"], 1.0);
            prop_assert_eq!(out.len(), input.len());
            for (code, rate) in &input {
                if code != "EUR" {
                    prop_assert_eq!(out[code], rate / eur);
                }
            }
        }

        #[test]
        fn prop_output_is_positive(mut input in rate_map(), eur in 0.0001f64..10_000.0) {
            input.insert("EUR".to_string(), eur);
            let out = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap();
            prop_assert!(out.values().all(|rate| rate.is_finite() && *rate > 0.0));
        }

        #[test]
        fn prop_non_positive_quote_is_rejected(
            mut input in rate_map(),
            eur in 0.0001f64..10_000.0,
            bad in -10_000.0f64..=0.0,
        ) {
            input.insert("EUR".to_string(), eur);
            input.insert("XXX".to_string(), bad);

            let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
            prop_assert!(matches!(err, SyncError::InvalidInput(_)));

            let err = rebase(&Currency::eur(), &input, &Currency::eur()).unwrap_err();
            prop_assert!(matches!(err, SyncError::InvalidInput(_)));
        }

        #[test]
        fn prop_negative_reference_is_rejected(input in rate_map(), eur in -10_000.0f64..-0.0001) {
            let mut input = input;
            input.insert("EUR".to_string(), eur);
            let err = rebase(&Currency::usd(), &input, &Currency::eur()).unwrap_err();
            prop_assert!(matches!(err, SyncError::InvalidInput(_)));
        }

        #[test]
        fn prop_reference_base_is_identity_except_reference(input in rate_map()) {
            let before = input.clone();
            let out = rebase(&Currency::eur(), &input, &Currency::eur()).unwrap();

            prop_assert_eq!(&input, &before);
            prop_assert_eq!(out["EUR"], 1.0);
            for (code, rate) in &input {
                if code != "EUR" {
                    prop_assert_eq!(out[code], *rate);
                }
            }
        }
    }
}

//! Priority-ordered merging of provider rate sets.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use ratesync_common::{Currency, ProviderId, Rates};
use tracing::{debug, info};

/// Merge reference-normalized rates from several providers.
///
/// Providers are visited in `priority` order and each contributes only the
/// currencies no earlier provider has set. Providers missing from
/// `provider_rates` are skipped. The reference currency is always present at
/// 1.0, even when nothing contributes.
pub fn merge_rates(
    provider_rates: &BTreeMap<ProviderId, Rates>,
    priority: &[ProviderId],
    reference: &Currency,
) -> Rates {
    debug!(providers = provider_rates.len(), "Merging provider rates");

    let mut merged = Rates::new();
    merged.insert(reference.code().to_string(), 1.0);

    for provider in priority {
        let Some(rates) = provider_rates.get(provider) else {
            continue;
        };

        let mut added = 0usize;
        for (code, rate) in rates {
            if !merged.contains_key(code) {
                merged.insert(code.clone(), *rate);
                added += 1;
            }
        }
        debug!(provider = %provider, added, "Added unique rates");
    }

    info!(total_currencies = merged.len(), "Merged rates");
    merged
}

/// The date of a merged snapshot: the latest of the contributing dates.
pub fn merged_date<'a>(dates: impl IntoIterator<Item = &'a NaiveDate>) -> Option<NaiveDate> {
    dates.into_iter().max().copied()
}

use super::components::{ComponentPriceBook, component_value};
use crate::models::{FlipCandidate, PriceObservation};
use std::collections::HashMap;

/// Find items whose two cheapest observed prices differ, ranked by that margin.
///
/// Observations are grouped by item key in first-seen order. Within a group the prices
/// are stable-sorted ascending and the first two compared; equal prices yield no
/// candidate. The result is stable-sorted by descending margin, so the output is a pure
/// function of the input sequence.
pub fn detect_flips(observations: &[PriceObservation]) -> Vec<FlipCandidate> {
    rank(observations, None)
}

/// Same as [`detect_flips`], additionally valuing the enchantments on each candidate's
/// cheapest listing against `price_book`. The valuation never affects ranking.
pub fn detect_flips_with_components(
    observations: &[PriceObservation],
    price_book: &ComponentPriceBook,
) -> Vec<FlipCandidate> {
    rank(observations, Some(price_book))
}

fn rank(
    observations: &[PriceObservation],
    price_book: Option<&ComponentPriceBook>,
) -> Vec<FlipCandidate> {
    let mut candidates: Vec<FlipCandidate> = group_by_item(observations)
        .into_iter()
        .filter_map(|mut group| {
            if group.len() < 2 {
                return None;
            }
            group.sort_by(|a, b| a.price().total_cmp(&b.price()));
            let (lowest, second) = (group[0], group[1]);
            let margin = second.price() - lowest.price();
            if margin <= 0.0 {
                return None;
            }
            Some(FlipCandidate {
                item_key: lowest.item_key().to_string(),
                lowest_price: lowest.price(),
                second_lowest_price: second.price(),
                margin,
                lowest_source: lowest.source(),
                second_source: second.source(),
                component_value: price_book.and_then(|book| {
                    lowest.metadata().and_then(|meta| component_value(meta, book))
                }),
                // cheapest observation that carries the attribute
                category: group.iter().find_map(|o| o.category()).map(str::to_string),
                rarity: group.iter().find_map(|o| o.rarity()).map(str::to_string),
            })
        })
        .collect();

    candidates.sort_by(|a, b| b.margin.total_cmp(&a.margin));
    candidates
}

fn group_by_item(observations: &[PriceObservation]) -> Vec<Vec<&PriceObservation>> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut groups: Vec<Vec<&PriceObservation>> = Vec::new();
    for obs in observations.iter().filter(|o| o.is_valid()) {
        let slot = *index.entry(obs.item_key()).or_insert_with(|| {
            groups.push(Vec::new());
            groups.len() - 1
        });
        groups[slot].push(obs);
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SourceKind::{self, *};

    fn obs(key: &str, price: f64, source: SourceKind) -> PriceObservation {
        PriceObservation::new(key, price, source).unwrap()
    }

    #[test]
    fn picks_two_lowest_across_sources() {
        let input = vec![
            obs("A", 100.0, ListingPrice),
            obs("A", 150.0, ListingPrice),
            obs("A", 120.0, OrderBookBuy),
        ];
        let out = detect_flips(&input);
        assert_eq!(out.len(), 1);
        let a = &out[0];
        assert_eq!(a.item_key, "A");
        assert_eq!(a.lowest_price, 100.0);
        assert_eq!(a.second_lowest_price, 120.0);
        assert_eq!(a.margin, 20.0);
        assert_eq!(a.lowest_source, ListingPrice);
        assert_eq!(a.second_source, OrderBookBuy);
        assert_eq!(a.component_value, None);
    }

    #[test]
    fn single_observation_yields_nothing() {
        assert!(detect_flips(&[obs("B", 50.0, ListingPrice)]).is_empty());
    }

    #[test]
    fn tied_lowest_prices_yield_nothing() {
        let input = vec![obs("C", 200.0, OrderBookBuy), obs("C", 200.0, OrderBookSell)];
        assert!(detect_flips(&input).is_empty());
    }

    #[test]
    fn tie_does_not_skip_to_third_price() {
        let input = vec![
            obs("C", 200.0, ListingPrice),
            obs("C", 500.0, ListingPrice),
            obs("C", 200.0, ListingPrice),
        ];
        assert!(detect_flips(&input).is_empty());
    }

    #[test]
    fn ranks_by_descending_margin() {
        let input = vec![
            obs("D", 10.0, ListingPrice),
            obs("A", 100.0, ListingPrice),
            obs("D", 15.0, ListingPrice),
            obs("A", 120.0, OrderBookBuy),
        ];
        let keys: Vec<_> = detect_flips(&input)
            .into_iter()
            .map(|c| c.item_key)
            .collect();
        assert_eq!(keys, vec!["A", "D"]);
    }

    #[test]
    fn equal_margins_keep_first_seen_order() {
        let input = vec![
            obs("Z", 1.0, ListingPrice),
            obs("Y", 1.0, ListingPrice),
            obs("Y", 6.0, ListingPrice),
            obs("Z", 6.0, ListingPrice),
        ];
        let keys: Vec<_> = detect_flips(&input)
            .into_iter()
            .map(|c| c.item_key)
            .collect();
        assert_eq!(keys, vec!["Z", "Y"]);
    }

    #[test]
    fn invalid_observations_are_skipped() {
        let bad: PriceObservation = serde_json::from_str(
            r#"{"item_key":"E","price":-5.0,"source":"ListingPrice"}"#,
        )
        .unwrap();
        let input = vec![bad, obs("E", 10.0, ListingPrice)];
        assert!(detect_flips(&input).is_empty());
    }

    #[test]
    fn output_invariants_and_idempotence() {
        let mut input = Vec::new();
        for i in 0..40u32 {
            let key = format!("item{}", i % 7);
            let price = f64::from((i * 37) % 23);
            let source = match i % 3 {
                0 => ListingPrice,
                1 => OrderBookBuy,
                _ => OrderBookSell,
            };
            input.push(obs(&key, price, source));
        }
        let first = detect_flips(&input);
        let second = detect_flips(&input);
        assert_eq!(first, second);
        assert!(!first.is_empty());
        for c in &first {
            assert!(c.margin > 0.0);
            assert!(c.second_lowest_price >= c.lowest_price);
        }
        for pair in first.windows(2) {
            assert!(pair[0].margin >= pair[1].margin);
        }
    }

    #[test]
    fn input_is_left_untouched() {
        let input = vec![obs("A", 9.0, ListingPrice), obs("A", 3.0, ListingPrice)];
        let before = input.clone();
        let _ = detect_flips(&input);
        assert_eq!(input, before);
    }

    #[test]
    fn component_value_comes_from_lowest_listing() {
        let mut book = ComponentPriceBook::new();
        book.insert("ENCHANTMENT_SHARPNESS_5", 1_000.0);
        let input = vec![
            obs("Sword", 5_000.0, ListingPrice).with_metadata(Some("Sharpness V".into())),
            obs("Sword", 8_000.0, ListingPrice).with_metadata(Some("Sharpness VI".into())),
        ];
        let out = detect_flips_with_components(&input, &book);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].component_value, Some(1_000.0));
        assert_eq!(out[0].margin, 3_000.0);

        let plain = detect_flips(&input);
        assert_eq!(plain[0].component_value, None);
        assert_eq!(plain[0].margin, out[0].margin);
    }

    #[test]
    fn attributes_fall_back_past_unattributed_lowest() {
        let input = vec![
            obs("X", 100.0, ListingPrice).with_attributes(Some("weapon".into()), None),
            obs("X", 80.0, OrderBookSell),
            obs("X", 130.0, ListingPrice)
                .with_attributes(Some("armor".into()), Some("EPIC".into())),
        ];
        let out = detect_flips(&input);
        assert_eq!(out[0].lowest_source, OrderBookSell);
        assert_eq!(out[0].category.as_deref(), Some("weapon"));
        assert_eq!(out[0].rarity.as_deref(), Some("EPIC"));
    }
}

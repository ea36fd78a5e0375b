//! Property-based tests for ranking, lookup and alignment invariants

use pairscan::discovery::screener::rank;
use pairscan::discovery::{symbol_root, PairResult, QueryIndex, Series, SeriesMatrix};
use pairscan::math::mackinnon::{pvalue, Deterministic};
use proptest::prelude::*;

const ROOTS: [&str; 5] = ["BTC", "ETH", "SOL", "XRP", "ADA"];

fn results_strategy() -> impl Strategy<Value = Vec<PairResult>> {
    prop::collection::vec(
        (0usize..5, 0usize..5, prop::sample::select(vec![0.001, 0.01, 0.02, 0.049, 0.05, 0.3])),
        0..40,
    )
    .prop_map(|rows| {
        rows.into_iter()
            .enumerate()
            .map(|(i, (a, b, p))| PairResult {
                symbol_a: format!("{}/USDT", ROOTS[a]),
                symbol_b: format!("{}/USDT", ROOTS[b]),
                p_value: p,
                // Carries the enumeration index so stability can be checked
                statistic: -(i as f64),
            })
            .collect()
    })
}

proptest! {
    /// Ranked output is filtered, sorted and stable
    #[test]
    fn ranking_is_filtered_sorted_and_stable(
        results in results_strategy(),
        threshold in prop::sample::select(vec![0.01, 0.05, 1.0]),
        top_k in 1usize..20,
    ) {
        let expected_len = results.iter().filter(|r| r.p_value < threshold).count();
        let ranked = rank(results, threshold, top_k);

        prop_assert_eq!(ranked.len(), expected_len);
        prop_assert!(ranked.all().iter().all(|r| r.p_value < threshold));
        for w in ranked.all().windows(2) {
            prop_assert!(w[0].p_value <= w[1].p_value);
            if w[0].p_value == w[1].p_value {
                // Earlier enumeration index has the less negative statistic
                prop_assert!(w[0].statistic > w[1].statistic);
            }
        }

        let top = ranked.top_pairs();
        prop_assert_eq!(top.len(), top_k.min(ranked.len()));
        prop_assert_eq!(top, &ranked.all()[..top.len()]);
    }

    /// Symbol lookups return an order-preserving subsequence of the ranking
    #[test]
    fn lookup_is_ordered_subsequence(results in results_strategy(), root_idx in 0usize..5) {
        let index = QueryIndex::new(&rank(results, 0.05, 10));
        let root = ROOTS[root_idx].to_lowercase();
        let found = index.find_by_symbol(&root);

        let mut cursor = 0;
        for pair in &found {
            prop_assert!(
                symbol_root(&pair.symbol_a) == ROOTS[root_idx]
                    || symbol_root(&pair.symbol_b) == ROOTS[root_idx]
            );
            let pos = index.list_all()[cursor..]
                .iter()
                .position(|p| std::ptr::eq(p, *pair));
            prop_assert!(pos.is_some());
            cursor += pos.unwrap_or(0) + 1;
        }

        let expected = index
            .list_all()
            .iter()
            .filter(|p| symbol_root(&p.symbol_a) == ROOTS[root_idx] || symbol_root(&p.symbol_b) == ROOTS[root_idx])
            .count();
        prop_assert_eq!(found.len(), expected);
    }

    /// P-values stay in [0, 1] and never decrease as the statistic grows
    #[test]
    fn pvalue_bounded_and_monotone(a in -30.0f64..5.0, b in -30.0f64..5.0, n in 1usize..=2) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        for det in [Deterministic::None, Deterministic::Constant] {
            let p_lo = pvalue(lo, det, n);
            let p_hi = pvalue(hi, det, n);
            prop_assert!((0.0..=1.0).contains(&p_lo));
            prop_assert!((0.0..=1.0).contains(&p_hi));
            prop_assert!(p_lo <= p_hi + 1e-3);
        }
    }

    /// Aligned columns always span the full shared index
    #[test]
    fn alignment_keeps_only_complete_columns(
        masks in prop::collection::vec(prop::collection::vec(any::<bool>(), 12), 1..6)
    ) {
        let series: Vec<Series> = masks
            .iter()
            .enumerate()
            .map(|(i, mask)| {
                let timestamps: Vec<i64> = mask
                    .iter()
                    .enumerate()
                    .filter(|(_, keep)| **keep)
                    .map(|(t, _)| t as i64 * 60_000)
                    .collect();
                let values = timestamps.iter().map(|t| *t as f64).collect();
                Series::new(format!("S{}", i), timestamps, values).unwrap()
            })
            .collect();

        let union: std::collections::BTreeSet<i64> =
            series.iter().flat_map(|s| s.timestamps().to_vec()).collect();
        let complete: Vec<String> = series
            .iter()
            .filter(|s| !s.is_empty() && s.len() == union.len())
            .map(|s| s.symbol().to_string())
            .collect();

        let matrix = SeriesMatrix::align(series);
        prop_assert_eq!(matrix.symbols(), complete.as_slice());
        for i in 0..matrix.num_columns() {
            prop_assert_eq!(matrix.column(i).len(), matrix.num_rows());
        }
    }

    /// The root of `BASE/QUOTE` is always `BASE`
    #[test]
    fn symbol_root_of_slash_symbol(base in "[A-Z0-9]{1,8}", quote in "(USDT|USDC|USD|BTC)") {
        let symbol = format!("{}/{}", base, quote);
        prop_assert_eq!(symbol_root(&symbol), base.as_str());
    }
}

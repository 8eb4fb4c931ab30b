/// Property tests for deduplication and critical filtering
use allure_notifier::domain::models::{LaunchId, LaunchSummary, Statistic, SummaryMap};
use allure_notifier::services::{filter_critical, filter_unprocessed};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn summary_map() -> impl Strategy<Value = SummaryMap> {
    prop::collection::btree_map(
        1i64..500,
        (0u64..50, 0u64..50, 0u64..50),
        0..20,
    )
    .prop_map(|entries| {
        entries
            .into_iter()
            .map(|(id, (passed, failed, broken))| {
                let statistic = Statistic::new()
                    .with("passed", passed)
                    .with("failed", failed)
                    .with("broken", broken);
                let summary = LaunchSummary::new(LaunchId(id), format!("launch {id}"))
                    .with_statistic(statistic);
                (LaunchId(id), summary)
            })
            .collect()
    })
}

fn id_set() -> impl Strategy<Value = BTreeSet<LaunchId>> {
    prop::collection::btree_set((1i64..500).prop_map(LaunchId), 0..30)
}

proptest! {
    #[test]
    fn unprocessed_filter_is_idempotent(summaries in summary_map(), processed in id_set()) {
        let once = filter_unprocessed(&summaries, &processed);
        let twice = filter_unprocessed(&once, &processed);
        prop_assert_eq!(&once, &twice);
        prop_assert!(once.keys().all(|id| !processed.contains(id)));
        prop_assert!(once.keys().all(|id| summaries.contains_key(id)));
    }

    #[test]
    fn marked_launches_never_come_back(summaries in summary_map()) {
        let marked: BTreeSet<LaunchId> = summaries.keys().copied().collect();
        prop_assert!(filter_unprocessed(&summaries, &marked).is_empty());
    }

    #[test]
    fn critical_launches_exceed_threshold(summaries in summary_map(), threshold in 0.0f64..100.0) {
        let critical = filter_critical(&summaries, threshold);
        for (id, summary) in &critical {
            prop_assert!(summaries.contains_key(id));
            let rate = summary.statistic.failure_rate();
            prop_assert!(rate.is_some_and(|rate| rate > threshold));
        }
        let excluded = summaries.len() - critical.len();
        let below = summaries
            .values()
            .filter(|s| s.statistic.failure_rate().map_or(true, |rate| rate <= threshold))
            .count();
        prop_assert_eq!(excluded, below);
    }
}

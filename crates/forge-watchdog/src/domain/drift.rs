//! Drift predicates.
//!
//! Pure decisions over values read from the oracles. The service performs
//! the reads; these functions only compare.

use super::entities::HeightSample;

/// Any textual difference between installed and published version is drift.
pub fn version_drift(installed: &str, latest: &str) -> bool {
    installed != latest
}

/// Representative network height: the lowest height among the peers.
///
/// Comparing against the slowest peer makes the height trigger loose; it is
/// kept for compatibility with deployed behaviour. `None` for no peers.
pub fn reduce_peer_heights(peers: &[HeightSample]) -> Option<u64> {
    peers.iter().map(|p| p.height).min()
}

/// Local node is more than one block behind the network reference.
pub fn height_drift(local_height: u64, network_height: u64) -> bool {
    local_height.saturating_add(1) < network_height
}

/// Delegate missed more blocks since the previous cycle.
pub fn missed_block_drift(current: u64, baseline: u64) -> bool {
    current > baseline
}

/// Inputs of the reload decision, kept for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadAssessment {
    pub local_height: u64,
    pub network_height: u64,
    pub missed_blocks: u64,
    pub baseline: u64,
}

impl ReloadAssessment {
    pub fn behind_network(&self) -> bool {
        height_drift(self.local_height, self.network_height)
    }

    pub fn missing_blocks(&self) -> bool {
        missed_block_drift(self.missed_blocks, self.baseline)
    }

    pub fn needs_reload(&self) -> bool {
        self.behind_network() || self.missing_blocks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn peers(heights: &[u64]) -> Vec<HeightSample> {
        heights
            .iter()
            .enumerate()
            .map(|(i, h)| HeightSample::new(format!("10.0.0.{}", i + 1), *h))
            .collect()
    }

    fn assessment(local: u64, network: u64, missed: u64, baseline: u64) -> ReloadAssessment {
        ReloadAssessment {
            local_height: local,
            network_height: network,
            missed_blocks: missed,
            baseline,
        }
    }

    #[test]
    fn test_version_drift_equal() {
        for v in ["1.0.0", "", "1.0.0-beta.3", " 2.1 "] {
            assert!(!version_drift(v, v));
        }
    }

    #[test]
    fn test_version_drift_any_difference() {
        assert!(version_drift("1.0.0", "1.0.1"));
        assert!(version_drift("1.0.0", "1.0.0 "));
        assert!(version_drift("1.0.0", "\n1.0.0"));
        assert!(version_drift("1.0", "1.0.0"));
        assert!(version_drift("v1.0.0", "1.0.0"));
    }

    #[test]
    fn test_reduce_picks_minimum() {
        assert_eq!(reduce_peer_heights(&peers(&[98, 150, 99])), Some(98));
        assert_eq!(reduce_peer_heights(&peers(&[42])), Some(42));
        assert_eq!(reduce_peer_heights(&peers(&[7, 7, 7])), Some(7));
        assert_eq!(reduce_peer_heights(&[]), None);
    }

    #[test]
    fn test_reduce_order_invariant() {
        let orders: [&[u64]; 4] = [
            &[98, 150, 99],
            &[150, 99, 98],
            &[99, 98, 150],
            &[150, 98, 99],
        ];
        for order in orders {
            assert_eq!(reduce_peer_heights(&peers(order)), Some(98));
        }
    }

    #[test]
    fn test_height_drift_boundary() {
        assert!(!height_drift(100, 100));
        assert!(!height_drift(100, 101));
        assert!(height_drift(100, 102));
        assert!(!height_drift(100, 98));
        assert!(!height_drift(u64::MAX, u64::MAX));
    }

    #[test]
    fn test_scenario_c_lagging_peer_suppresses_reload() {
        let network = reduce_peer_heights(&peers(&[98, 150, 99])).unwrap();
        assert!(!height_drift(100, network));
    }

    #[test]
    fn test_height_disjunct_alone() {
        let a = assessment(100, 200, 5, 5);
        assert!(a.behind_network());
        assert!(!a.missing_blocks());
        assert!(a.needs_reload());
    }

    #[test]
    fn test_missed_block_disjunct_alone() {
        let a = assessment(100, 100, 6, 5);
        assert!(!a.behind_network());
        assert!(a.missing_blocks());
        assert!(a.needs_reload());
    }

    #[test]
    fn test_both_disjuncts_is_still_reload() {
        // Rules out exclusive-or.
        assert!(assessment(100, 200, 6, 5).needs_reload());
    }

    #[test]
    fn test_neither_disjunct() {
        assert!(!assessment(100, 101, 5, 5).needs_reload());
        // Fewer missed blocks than baseline (delegate re-registered).
        assert!(!assessment(100, 101, 0, 5).needs_reload());
    }

    proptest! {
        #[test]
        fn prop_version_drift_is_inequality(installed in ".{0,12}", latest in ".{0,12}") {
            prop_assert_eq!(version_drift(&installed, &latest), installed != latest);
            prop_assert!(!version_drift(&installed, &installed));
        }

        #[test]
        fn prop_reduction_is_minimum(heights in prop::collection::vec(any::<u64>(), 0..64)) {
            prop_assert_eq!(reduce_peer_heights(&peers(&heights)), heights.iter().copied().min());
        }

        #[test]
        fn prop_reduction_ignores_peer_order(
            (heights, shuffled) in prop::collection::vec(any::<u64>(), 1..64)
                .prop_flat_map(|v| (Just(v.clone()), Just(v).prop_shuffle()))
        ) {
            prop_assert_eq!(
                reduce_peer_heights(&peers(&heights)),
                reduce_peer_heights(&peers(&shuffled))
            );
        }

        #[test]
        fn prop_reload_is_either_trigger(
            local in any::<u64>(),
            network in any::<u64>(),
            missed in any::<u64>(),
            baseline in any::<u64>()
        ) {
            let a = assessment(local, network, missed, baseline);
            prop_assert_eq!(
                a.needs_reload(),
                height_drift(local, network) || missed_block_drift(missed, baseline)
            );
        }
    }
}

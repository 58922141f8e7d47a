// Copyright (c) 2024 KEEL LABS <info@keel.dev>

//! Node health predicate: a node is healthy when it is synced, knows at
//! least one peer and has confirmed a sufficiently fresh milestone.

use keel_models::MilestoneRecord;
use keel_time::KeelTime;
use std::sync::Arc;

/// A milestone older than this makes the node unhealthy
pub const MAX_ALLOWED_MILESTONE_AGE: KeelTime = KeelTime::from_millis(5 * 60 * 1000);

/// How a peer ended up in the peer list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerRelation {
    /// statically configured peer
    Known,
    /// peer that connected on its own
    Unknown,
    /// peer found through discovery
    Discovered,
}

/// View onto the synchronization state
pub trait SyncStatusView: Send + Sync {
    /// Whether the node considers itself synced with the network
    fn is_synced(&self) -> bool;
}

/// View onto the peer list
pub trait PeerManagerView: Send + Sync {
    /// Number of currently connected peers with the given relation
    fn connected_peer_count(&self, relation: PeerRelation) -> usize;
}

/// View onto confirmed milestones
pub trait MilestoneView: Send + Sync {
    /// The most recently confirmed milestone, `None` before the first one
    fn latest_milestone(&self) -> Option<MilestoneRecord>;
}

/// Combines the three views into the health predicate
pub struct HealthMonitor {
    sync_status: Arc<dyn SyncStatusView>,
    peer_manager: Arc<dyn PeerManagerView>,
    milestones: Arc<dyn MilestoneView>,
}

impl HealthMonitor {
    /// Creates a health monitor over the given views
    pub fn new(
        sync_status: Arc<dyn SyncStatusView>,
        peer_manager: Arc<dyn PeerManagerView>,
        milestones: Arc<dyn MilestoneView>,
    ) -> Self {
        Self {
            sync_status,
            peer_manager,
            milestones,
        }
    }

    /// Health predicate against the current wall clock
    pub fn is_node_healthy(&self) -> bool {
        self.is_node_healthy_at(KeelTime::now().expect("could not get current time"))
    }

    /// Health predicate against an arbitrary reference time: synced, at
    /// least one known peer connected, and the latest milestone strictly
    /// younger than `MAX_ALLOWED_MILESTONE_AGE`.
    pub fn is_node_healthy_at(&self, now: KeelTime) -> bool {
        if !self.sync_status.is_synced() {
            return false;
        }
        if self.peer_manager.connected_peer_count(PeerRelation::Known) == 0 {
            return false;
        }
        match self.milestones.latest_milestone() {
            Some(milestone) => now.saturating_sub(milestone.timestamp) < MAX_ALLOWED_MILESTONE_AGE,
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use keel_models::MilestoneIndex;

    struct FixedSync(bool);
    impl SyncStatusView for FixedSync {
        fn is_synced(&self) -> bool {
            self.0
        }
    }

    struct FixedPeers(usize);
    impl PeerManagerView for FixedPeers {
        fn connected_peer_count(&self, relation: PeerRelation) -> usize {
            match relation {
                PeerRelation::Known => self.0,
                _ => 0,
            }
        }
    }

    struct FixedMilestone(Option<MilestoneRecord>);
    impl MilestoneView for FixedMilestone {
        fn latest_milestone(&self) -> Option<MilestoneRecord> {
            self.0
        }
    }

    fn monitor(synced: bool, known_peers: usize, milestone_at: Option<u64>) -> HealthMonitor {
        HealthMonitor::new(
            Arc::new(FixedSync(synced)),
            Arc::new(FixedPeers(known_peers)),
            Arc::new(FixedMilestone(milestone_at.map(|millis| MilestoneRecord {
                index: MilestoneIndex(10),
                timestamp: KeelTime::from_millis(millis),
            }))),
        )
    }

    const T0: u64 = 1_000_000_000;

    #[test]
    fn test_healthy_node() {
        let monitor = monitor(true, 3, Some(T0));
        assert!(monitor.is_node_healthy_at(KeelTime::from_millis(T0 + 1000)));
    }

    #[test]
    fn test_unsynced_node_is_unhealthy() {
        let monitor = monitor(false, 3, Some(T0));
        assert!(!monitor.is_node_healthy_at(KeelTime::from_millis(T0 + 1000)));
    }

    #[test]
    fn test_no_known_peers_is_unhealthy() {
        let monitor = monitor(true, 0, Some(T0));
        assert!(!monitor.is_node_healthy_at(KeelTime::from_millis(T0 + 1000)));
    }

    #[test]
    fn test_no_milestone_is_unhealthy() {
        let monitor = monitor(true, 3, None);
        assert!(!monitor.is_node_healthy_at(KeelTime::from_millis(T0)));
    }

    #[test]
    fn test_milestone_age_boundary_is_strict() {
        let age = MAX_ALLOWED_MILESTONE_AGE.to_millis();
        let monitor = monitor(true, 1, Some(T0));
        // one second inside the window
        assert!(monitor.is_node_healthy_at(KeelTime::from_millis(T0 + age - 1000)));
        // exactly at the limit: already unhealthy
        assert!(!monitor.is_node_healthy_at(KeelTime::from_millis(T0 + age)));
        assert!(!monitor.is_node_healthy_at(KeelTime::from_millis(T0 + age + 1000)));
    }

    #[test]
    fn test_milestone_from_the_future_counts_as_fresh() {
        let monitor = monitor(true, 1, Some(T0 + 60_000));
        assert!(monitor.is_node_healthy_at(KeelTime::from_millis(T0)));
    }
}

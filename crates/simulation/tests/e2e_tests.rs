//! End-to-end cluster tests.
//!
//! Each test wires several engines together over the in-memory network and
//! drives real polls through the framed wire path: scheduler tick → query
//! worker → stream handler → dispatcher → response.

use snowfall_consensus::ConsensusConfig;
use snowfall_simulation::{NetworkConfig, SimCluster};
use snowfall_types::{BlockId, Status};
use std::time::Duration;
use tokio::time::timeout;
use tracing_test::traced_test;

/// Generous bound for a cluster to finalize a candidate.
const VERDICT_TIMEOUT: Duration = Duration::from_secs(30);

async fn expect_verdict(rx: tokio::sync::oneshot::Receiver<Status>) -> Status {
    timeout(VERDICT_TIMEOUT, rx)
        .await
        .expect("no verdict within bound")
        .expect("verdict channel closed")
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_cluster_finalizes_unanimous_candidate() {
    let cluster = SimCluster::new(
        5,
        ConsensusConfig::for_tests(),
        NetworkConfig::default(),
        42,
    );

    let id = BlockId::new([0x11; 32]);
    let receivers = cluster.submit_everywhere(id, true).await;

    for rx in receivers {
        assert_eq!(expect_verdict(rx).await, Status::Finalized);
    }
    cluster.stop().await;
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_cluster_rejects_unwanted_candidate() {
    let cluster = SimCluster::new(
        4,
        ConsensusConfig::for_tests(),
        NetworkConfig::default(),
        43,
    );

    let id = BlockId::new([0x22; 32]);
    let receivers = cluster.submit_everywhere(id, false).await;

    for rx in receivers {
        assert_eq!(expect_verdict(rx).await, Status::Rejected);
    }
    cluster.stop().await;
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_minority_preference_converges_to_majority() {
    let cluster = SimCluster::new(
        5,
        ConsensusConfig::for_tests(),
        NetworkConfig::default(),
        44,
    );

    let id = BlockId::new([0x33; 32]);
    let mut receivers = Vec::new();
    receivers.push(cluster.submit(0, id, false).await);
    for index in 1..5 {
        receivers.push(cluster.submit(index, id, true).await);
    }

    // The lone dissenter sees a yes majority on its first polls and flips;
    // the whole cluster finalizes.
    for rx in receivers {
        assert_eq!(expect_verdict(rx).await, Status::Finalized);
    }
    cluster.stop().await;
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_candidate_known_to_one_node_stays_active() {
    let cluster = SimCluster::new(
        3,
        ConsensusConfig::for_tests(),
        NetworkConfig::default(),
        45,
    );

    // Only node 0 knows the candidate; everyone else answers neutral, and
    // neutral votes never accumulate confidence.
    let id = BlockId::new([0x44; 32]);
    let rx = cluster.submit(0, id, true).await;

    let result = timeout(Duration::from_millis(1500), rx).await;
    assert!(result.is_err(), "candidate resolved on neutral votes alone");
    cluster.stop().await;
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_cluster_converges_under_packet_loss() {
    let net_config = NetworkConfig {
        packet_loss_rate: 0.15,
        ..Default::default()
    };
    let cluster = SimCluster::new(4, ConsensusConfig::for_tests(), net_config, 46);

    let id = BlockId::new([0x55; 32]);
    let receivers = cluster.submit_everywhere(id, true).await;

    for rx in receivers {
        assert_eq!(expect_verdict(rx).await, Status::Finalized);
    }
    cluster.stop().await;
}

#[traced_test]
#[tokio::test(flavor = "multi_thread")]
async fn test_partitioned_node_stalls_then_catches_up_after_heal() {
    let cluster = SimCluster::new(
        3,
        ConsensusConfig::for_tests(),
        NetworkConfig::default(),
        47,
    );
    let peers = cluster.peers();

    // Cut node 2 off before anyone hears about the candidate.
    cluster.network().isolate(&peers[2]);

    let id = BlockId::new([0x66; 32]);
    let rx0 = cluster.submit(0, id, true).await;
    let rx1 = cluster.submit(1, id, true).await;
    let mut rx2 = cluster.submit(2, id, true).await;

    // The connected majority finalizes without node 2.
    assert_eq!(expect_verdict(rx0).await, Status::Finalized);
    assert_eq!(expect_verdict(rx1).await, Status::Finalized);

    // Node 2's polls all time out; it makes no progress.
    let stalled = timeout(Duration::from_millis(1500), &mut rx2).await;
    assert!(stalled.is_err(), "isolated node reached a verdict");

    // After healing, the finalized majority keeps answering yes and the
    // straggler catches up.
    cluster.network().heal();
    assert_eq!(expect_verdict(rx2).await, Status::Finalized);
    cluster.stop().await;
}

// LNP/BP Core Library implementing LNPBP specifications & standards
// Written in 2019 by
//     Dr. Maxim Orlovsky <orlovsky@pandoracore.com>
//
// To the extent possible under law, the author(s) have dedicated all
// copyright and related and neighboring rights to this software to
// the public domain worldwide. This software is distributed without
// any warranty.
//
// You should have received a copy of the MIT License
// along with this software.
// If not, see <https://opensource.org/licenses/MIT>.

//! Configuration (C8) and the `RoutingCore` facade that the gossip
//! handlers, pathfinder, failure handler and pruner all attach their
//! methods to.

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::constants::DEFAULT_PRUNE_TIMEOUT_SECS;
use crate::graph::GraphStore;
use crate::ids::NodeId;
use crate::pending::PendingStaging;
use std::collections::HashSet;
use std::time::{SystemTime, UNIX_EPOCH};

/// Bundles everything needed to construct a [`RoutingCore`]: the local
/// node's own id, the chain this node accepts gossip for, the staleness
/// bound the pruner enforces, and the collaborator handles described in
/// §6. There is no sensible all-defaults `Default` impl — node id and
/// collaborators are mandatory — so construction goes through [`RoutingConfig::new`]
/// and the remaining knobs are separate builder-style setters.
pub struct RoutingConfig<C, S, B> {
    pub(crate) local_node_id: NodeId,
    pub(crate) chain_hash: [u8; 32],
    pub(crate) prune_timeout: u64,
    pub(crate) known_feature_bits: HashSet<u16>,
    pub(crate) crypto: C,
    pub(crate) chain_source: S,
    pub(crate) broadcaster: B,
}

impl<C, S, B> RoutingConfig<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    pub fn new(
        local_node_id: NodeId,
        chain_hash: [u8; 32],
        crypto: C,
        chain_source: S,
        broadcaster: B,
    ) -> Self {
        RoutingConfig {
            local_node_id,
            chain_hash,
            prune_timeout: DEFAULT_PRUNE_TIMEOUT_SECS,
            known_feature_bits: HashSet::new(),
            crypto,
            chain_source,
            broadcaster,
        }
    }

    pub fn with_prune_timeout(mut self, prune_timeout: u64) -> Self {
        self.prune_timeout = prune_timeout;
        self
    }

    pub fn with_known_feature_bits(mut self, bits: HashSet<u16>) -> Self {
        self.known_feature_bits = bits;
        self
    }
}

/// The routing core: the graph store, the pending-gossip staging area,
/// and the configuration/collaborators driving both. Owned by a single
/// cooperative event loop (§5) — deliberately not `Sync`.
pub struct RoutingCore<C, S, B> {
    pub(crate) config: RoutingConfig<C, S, B>,
    pub(crate) graph: GraphStore,
    pub(crate) pending: PendingStaging,
}

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    pub fn new(config: RoutingConfig<C, S, B>) -> Self {
        RoutingCore { config, graph: GraphStore::new(), pending: PendingStaging::new() }
    }

    /// Restores a core around a previously assembled graph, e.g. one
    /// rebuilt from a replayed gossip log. The crate does not persist
    /// graphs itself (§1 non-goals), but does not forbid an embedder
    /// from doing so.
    pub fn with_graph(config: RoutingConfig<C, S, B>, graph: GraphStore) -> Self {
        RoutingCore { config, graph, pending: PendingStaging::new() }
    }

    pub fn local_node_id(&self) -> NodeId {
        self.config.local_node_id
    }

    pub fn graph(&self) -> &GraphStore {
        &self.graph
    }

    pub fn pending_channel_count(&self) -> usize {
        self.pending.pending_channel_count()
    }

    /// Wall-clock seconds since the Unix epoch, used throughout the
    /// handlers and the pruner as "now". Not injectable: the collaborator
    /// traits are the seam for testability (§6), not the clock.
    pub(crate) fn now(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock is before the Unix epoch")
            .as_secs()
    }
}

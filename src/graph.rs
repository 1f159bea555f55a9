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

//! The in-memory channel graph (C1).
//!
//! Nodes and channels reference each other, which in a strict systems
//! language would be a cyclic-ownership problem; here the graph is a
//! single owning arena (two `HashMap`s) and nodes/channels refer to each
//! other only through their primary keys, never through owned pointers.

use std::collections::HashMap;

use crate::collaborators::BroadcastSlot;
use crate::constants::NODE_TIMESTAMP_NEVER_SEEN;
use crate::error::{Result, RoutingError};
use crate::ids::{NodeId, ShortChannelId};
use crate::addr::NetAddress;

/// The per-direction policy and liveness of one side of a channel.
///
/// `direction` must always equal this half's index within its parent
/// [`Channel::halves`] array; every mutation path in this module
/// re-establishes that invariant rather than trusting the caller.
#[derive(Clone, Debug)]
pub struct HalfChannel {
    direction: u8,
    pub active: bool,
    pub unroutable_until: u64,
    pub base_fee_msat: u32,
    pub proportional_fee_ppm: u32,
    pub cltv_expiry_delta: u32,
    pub htlc_minimum_msat: u64,
    pub htlc_maximum_msat: Option<u64>,
    pub last_timestamp: u32,
    pub last_update: Option<Vec<u8>>,
    pub broadcast_slot: BroadcastSlot,
}

impl HalfChannel {
    fn unseen(direction: u8, now: u64, prune_timeout: u64) -> Self {
        HalfChannel {
            direction,
            active: false,
            unroutable_until: 0,
            base_fee_msat: 0,
            proportional_fee_ppm: 0,
            cltv_expiry_delta: 0,
            htlc_minimum_msat: 0,
            htlc_maximum_msat: None,
            // Unseen-direction seed (§6): half-aged so the pruner does not
            // treat a channel with one silent direction as immediately
            // stale.
            last_timestamp: now.saturating_sub(prune_timeout / 2) as u32,
            last_update: None,
            broadcast_slot: BroadcastSlot::default(),
        }
    }

    pub fn direction(&self) -> u8 {
        self.direction
    }

    pub fn is_routable(&self, now: u64) -> bool {
        self.active && (self.unroutable_until as u64) < now
    }
}

/// A channel's two endpoint node ids, in *canonical order*: index 0 is
/// whichever serialized public key sorts smaller. This rule is invariant
/// and lets each half's `direction` bit match its array index directly.
#[derive(Clone, Debug)]
pub struct Channel {
    scid: ShortChannelId,
    node_ids: [NodeId; 2],
    pub capacity_sat: u64,
    pub public: bool,
    pub announcement: Option<Vec<u8>>,
    pub broadcast_slot: BroadcastSlot,
    halves: [HalfChannel; 2],
}

impl Channel {
    pub fn scid(&self) -> ShortChannelId {
        self.scid
    }

    pub fn node_ids(&self) -> [NodeId; 2] {
        self.node_ids
    }

    pub fn halves(&self) -> &[HalfChannel; 2] {
        &self.halves
    }

    pub fn half(&self, direction: u8) -> &HalfChannel {
        &self.halves[direction as usize]
    }

    pub fn half_mut(&mut self, direction: u8) -> &mut HalfChannel {
        &mut self.halves[direction as usize]
    }

    /// The direction `node` itself announces, i.e. the half describing
    /// `node`'s own outgoing policy. Returns `None` if `node` is not one
    /// of this channel's endpoints. Used by the failure handler (§4.6),
    /// which penalizes the half an erring node announces for itself.
    pub fn direction_toward(&self, node: NodeId) -> Option<u8> {
        if self.node_ids[0] == node {
            Some(0)
        } else if self.node_ids[1] == node {
            Some(1)
        } else {
            None
        }
    }

    /// The endpoint opposite `node`, i.e. the node this channel connects
    /// `node` to. Returns `None` if `node` is not one of this channel's
    /// endpoints.
    pub fn other_endpoint(&self, node: NodeId) -> Option<NodeId> {
        if self.node_ids[0] == node {
            Some(self.node_ids[1])
        } else if self.node_ids[1] == node {
            Some(self.node_ids[0])
        } else {
            None
        }
    }

    /// The half describing forwarding *into* `node` — announced by the
    /// other endpoint — paired with that other endpoint's id. This is the
    /// half the pathfinder (§4.4) charges when relaxing an edge toward
    /// `node`. Returns `None` if `node` is not one of this channel's
    /// endpoints.
    pub fn half_into(&self, node: NodeId) -> Option<(u8, NodeId)> {
        if self.node_ids[0] == node {
            Some((1, self.node_ids[1]))
        } else if self.node_ids[1] == node {
            Some((0, self.node_ids[0]))
        } else {
            None
        }
    }
}

/// A node's descriptor state plus the set of channels it is party to.
#[derive(Clone, Debug)]
pub struct Node {
    node_id: NodeId,
    pub alias: Option<[u8; 32]>,
    pub color: Option<[u8; 3]>,
    pub addresses: Vec<NetAddress>,
    pub last_timestamp: u32,
    pub last_announcement: Option<Vec<u8>>,
    pub broadcast_slot: BroadcastSlot,
    channels: Vec<ShortChannelId>,
}

impl Node {
    fn new(node_id: NodeId) -> Self {
        Node {
            node_id,
            alias: None,
            color: None,
            addresses: Vec::new(),
            last_timestamp: NODE_TIMESTAMP_NEVER_SEEN,
            last_announcement: None,
            broadcast_slot: BroadcastSlot::default(),
            channels: Vec::new(),
        }
    }

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn channels(&self) -> &[ShortChannelId] {
        &self.channels
    }
}

/// Owns every [`Node`] and [`Channel`] reachable from gossip, indexed by
/// primary key (C1).
#[derive(Default)]
pub struct GraphStore {
    nodes: HashMap<NodeId, Node>,
    channels: HashMap<ShortChannelId, Channel>,
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore::default()
    }

    pub fn lookup_node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn lookup_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(&id)
    }

    pub fn lookup_channel(&self, scid: ShortChannelId) -> Option<&Channel> {
        self.channels.get(&scid)
    }

    pub fn lookup_channel_mut(
        &mut self,
        scid: ShortChannelId,
    ) -> Option<&mut Channel> {
        self.channels.get_mut(&scid)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn channels(&self) -> impl Iterator<Item = &Channel> {
        self.channels.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    fn get_or_create_node(&mut self, id: NodeId) -> &mut Node {
        self.nodes.entry(id).or_insert_with(|| Node::new(id))
    }

    /// Creates a public or local channel between `id1` and `id2`, auto-
    /// creating either endpoint node that does not yet exist. Endpoints
    /// are stored in canonical (sorted) order regardless of the order
    /// they are passed in.
    ///
    /// If a channel already exists for `scid` (e.g. the operator
    /// pre-registered a local channel later confirmed on-chain under the
    /// same id), that existing object is returned untouched rather than
    /// replaced — a second push onto both endpoints' incident lists would
    /// otherwise violate I1 (exactly one appearance per list).
    pub fn create_channel(
        &mut self,
        scid: ShortChannelId,
        id1: NodeId,
        id2: NodeId,
        capacity_sat: u64,
        public: bool,
        now: u64,
        prune_timeout: u64,
    ) -> &mut Channel {
        if self.channels.contains_key(&scid) {
            return self.channels.get_mut(&scid).expect("checked above");
        }

        let (lo, hi) = if id1 < id2 { (id1, id2) } else { (id2, id1) };

        self.get_or_create_node(lo).channels.push(scid);
        self.get_or_create_node(hi).channels.push(scid);

        let channel = Channel {
            scid,
            node_ids: [lo, hi],
            capacity_sat,
            public,
            announcement: None,
            broadcast_slot: BroadcastSlot::default(),
            halves: [
                HalfChannel::unseen(0, now, prune_timeout),
                HalfChannel::unseen(1, now, prune_timeout),
            ],
        };
        self.channels.insert(scid, channel);
        self.channels.get_mut(&scid).expect("just inserted")
    }

    /// Removes a channel from the graph, along with both endpoints'
    /// incident-channel lists, destroying either endpoint node whose
    /// incident list becomes empty as a result.
    ///
    /// Returns [`RoutingError::InconsistentIncidentList`] if the channel
    /// was not present in one of its endpoints' incident lists — this can
    /// only happen if a prior mutation already broke the graph's
    /// bookkeeping invariant (I1).
    pub fn destroy_channel(&mut self, scid: ShortChannelId) -> Result<()> {
        let channel = match self.channels.remove(&scid) {
            Some(c) => c,
            None => return Ok(()),
        };

        for node_id in channel.node_ids {
            let node = self.nodes.get_mut(&node_id).ok_or(
                RoutingError::InconsistentIncidentList { node: node_id, scid },
            )?;
            let position = node
                .channels
                .iter()
                .position(|&c| c == scid)
                .ok_or(RoutingError::InconsistentIncidentList {
                    node: node_id,
                    scid,
                })?;
            node.channels.remove(position);
            if node.channels.is_empty() {
                self.nodes.remove(&node_id);
            }
        }
        Ok(())
    }
}

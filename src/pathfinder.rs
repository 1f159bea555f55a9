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

//! Amount-aware hop-indexed Bellman-Ford pathfinder (C4).
//!
//! Standard Bellman-Ford cannot model amount-dependent edge weights,
//! since a channel's fee depends on how much is flowing through it by
//! the time the search reaches it. Duplicating the per-node relaxation
//! state across hop counts `0..=ROUTING_MAX_HOPS` turns this into a
//! correct DP: slot `h` at a node holds the best-known state for a path
//! of exactly `h` hops from the destination to that node. Running the
//! search backward — destination as source — lets every fee and risk
//! term be computed against the exact amount that would actually be
//! forwarded, rather than an estimate corrected after the fact.

use std::collections::HashMap;

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::constants::{BLOCKS_PER_YEAR, MAX_MSATOSHI, ROUTING_MAX_HOPS};
use crate::core::RoutingCore;
use crate::graph::HalfChannel;
use crate::ids::{NodeId, ShortChannelId};

/// Normalizes a caller-supplied annualized risk factor (parts-per-10000,
/// per year — the convention the wider gossip ecosystem exposes as a
/// single "risk" knob) into the per-block, per-msat unit the relaxation
/// loop's risk term expects (§6).
pub fn normalize_risk_factor(annual_risk_factor: u64) -> f64 {
    annual_risk_factor as f64 / BLOCKS_PER_YEAR as f64 / 10_000.0
}

/// One hop of a route: the channel to traverse and which of its two
/// halves (directions) carries the forwarding policy for this hop.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RouteEdge {
    pub scid: ShortChannelId,
    pub direction: u8,
}

/// A route found by [`RoutingCore::get_route`]: the channel list from
/// source to destination, in forward order, plus the total fee the
/// source pays across the whole route.
#[derive(Clone, Debug)]
pub struct Route {
    pub edges: Vec<RouteEdge>,
    pub total_fee_msat: u64,
}

fn connection_fee(half: &HalfChannel, amount_msat: u64) -> u64 {
    let proportional = (half.proportional_fee_ppm as u128 * amount_msat as u128) / 1_000_000;
    half.base_fee_msat as u64 + proportional as u64
}

fn risk_fee(amount_msat: u64, delay_blocks: u32, risk_factor: f64) -> f64 {
    1.0 + (amount_msat as f64) * (delay_blocks as f64) * risk_factor
}

fn fuzz_scale(siphash: u64, fuzz: f64) -> f64 {
    if fuzz <= 0.0 {
        return 1.0;
    }
    let normalized = siphash as f64 / u64::MAX as f64;
    1.0 - fuzz + 2.0 * fuzz * normalized
}

/// Per-node, per-hop-count relaxation state. `total_msat = None` stands
/// for `+infinity` (unreached). `predecessor` records the neighbor one
/// hop closer to the destination and the edge used to reach it, so a
/// found route can be walked forward from the source.
#[derive(Clone, Copy)]
struct Slot {
    total_msat: Option<u64>,
    risk: f64,
    predecessor: Option<(NodeId, RouteEdge)>,
}

impl Default for Slot {
    fn default() -> Self {
        Slot { total_msat: None, risk: 0.0, predecessor: None }
    }
}

impl Slot {
    fn cost(&self) -> f64 {
        match self.total_msat {
            Some(total) => total as f64 + self.risk,
            None => f64::INFINITY,
        }
    }
}

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Finds a source-routed path from `source` to `destination` able to
    /// deliver `amount_msat`, or `None` if no such path exists within
    /// [`ROUTING_MAX_HOPS`] hops (§4.4).
    ///
    /// `risk_factor` must already be normalized to per-block, per-msat
    /// units — see [`normalize_risk_factor`]. `fuzz` in `(0, 1]` scales
    /// each channel's effective fee by a deterministic factor derived
    /// from `seed` and that channel's id, stable within one call and
    /// distinct across calls with a different seed; `fuzz <= 0.0`
    /// disables fuzzing entirely.
    pub fn get_route(
        &self,
        source: NodeId,
        destination: NodeId,
        amount_msat: u64,
        risk_factor: f64,
        fuzz: f64,
        seed: u64,
    ) -> Option<Route> {
        if source == destination {
            return None;
        }
        if amount_msat >= MAX_MSATOSHI {
            return None;
        }
        self.graph.lookup_node(source)?;
        self.graph.lookup_node(destination)?;

        let now = self.now();
        let mut slots: HashMap<NodeId, Vec<Slot>> = self
            .graph
            .nodes()
            .map(|node| (node.node_id(), vec![Slot::default(); ROUTING_MAX_HOPS + 1]))
            .collect();
        slots.get_mut(&destination).expect("looked up above")[0].total_msat =
            Some(amount_msat);

        for _pass in 0..ROUTING_MAX_HOPS {
            let node_ids: Vec<NodeId> = self.graph.nodes().map(|n| n.node_id()).collect();
            for n in node_ids {
                let incident: Vec<ShortChannelId> =
                    self.graph.lookup_node(n).expect("just listed").channels().to_vec();
                for scid in incident {
                    let channel = match self.graph.lookup_channel(scid) {
                        Some(c) => c,
                        None => continue,
                    };
                    let (idx, m) = match channel.half_into(n) {
                        Some(pair) => pair,
                        None => continue,
                    };
                    let half = channel.half(idx);
                    if !half.is_routable(now) {
                        continue;
                    }

                    for h in 0..ROUTING_MAX_HOPS {
                        let slot_n_h = slots[&n][h];
                        let total = match slot_n_h.total_msat {
                            Some(t) => t,
                            None => continue,
                        };

                        let raw_fee = connection_fee(half, total);
                        let scale = fuzz_scale(self.config.crypto.siphash24(seed, scid), fuzz);
                        let fee = ((raw_fee as f64) * scale).round().max(0.0) as u64;

                        let candidate_total = match total.checked_add(fee) {
                            Some(t) => t,
                            None => continue,
                        };
                        let risk = slot_n_h.risk
                            + risk_fee(candidate_total, half.cltv_expiry_delta, risk_factor);

                        if candidate_total as f64 + risk >= MAX_MSATOSHI as f64 {
                            continue;
                        }

                        let candidate = Slot {
                            total_msat: Some(candidate_total),
                            risk,
                            predecessor: Some((n, RouteEdge { scid, direction: idx })),
                        };
                        let slot_m = &mut slots.get_mut(&m).expect("endpoint is a graph node")[h + 1];
                        if candidate.cost() < slot_m.cost() {
                            *slot_m = candidate;
                        }
                    }
                }
            }
        }

        let source_slots = &slots[&source];
        let best_h = (1..=ROUTING_MAX_HOPS)
            .filter(|&h| source_slots[h].total_msat.is_some())
            .min_by(|&a, &b| {
                source_slots[a].total_msat.cmp(&source_slots[b].total_msat)
            })?;

        // The source's own slot total includes a fee for forwarding out
        // its own channel, which it never actually pays itself; it's
        // only used above to pick h*. The real amount the source sends
        // is the next node's total one hop closer to the destination.
        let mut edges = Vec::with_capacity(best_h);
        let mut current_node = source;
        let mut current_h = best_h;
        let mut amount_sent = None;
        while current_h > 0 {
            let slot = slots[&current_node][current_h];
            let (next_node, edge) = slot.predecessor.expect("reachable slot has a predecessor");
            edges.push(edge);
            current_node = next_node;
            current_h -= 1;
            if amount_sent.is_none() {
                amount_sent = Some(
                    slots[&current_node][current_h]
                        .total_msat
                        .expect("predecessor link implies a reachable slot"),
                );
            }
        }
        debug_assert_eq!(current_node, destination);

        let amount_sent = amount_sent.expect("best_h >= 1 guarantees at least one iteration");
        Some(Route { edges, total_fee_msat: amount_sent - amount_msat })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::{RoutingConfig, RoutingCore};
    use crate::ids::ShortChannelId;

    mod fakes {
        use crate::collaborators::*;
        use crate::ids::{NodeId, ShortChannelId};

        #[derive(Default)]
        pub struct AcceptAll;
        impl Broadcaster for AcceptAll {
            fn replace_broadcast(
                &mut self,
                _slot: &mut BroadcastSlot,
                _kind: MessageKind,
                _key: RoutingKeyTag,
                _payload: Vec<u8>,
            ) -> bool {
                false
            }
        }
        impl ChainSource for AcceptAll {
            fn request_confirmation(&self, _scid: ShortChannelId, _k1: NodeId, _k2: NodeId) {}
        }
        impl CryptoVerifier for AcceptAll {
            fn verify_ecdsa(&self, _h: &[u8; 32], _s: &[u8; 64], _p: &NodeId) -> bool {
                true
            }
            fn sha256d(&self, _d: &[u8]) -> [u8; 32] {
                [0; 32]
            }
            fn sha256(&self, _d: &[u8]) -> [u8; 32] {
                [0; 32]
            }
            fn siphash24(&self, seed: u64, scid: ShortChannelId) -> u64 {
                seed ^ scid.as_u64()
            }
        }
    }

    fn node_id(byte: u8) -> NodeId {
        let mut bytes = [0x02; 33];
        bytes[32] = byte;
        NodeId::from_bytes(bytes)
    }

    fn test_core() -> RoutingCore<fakes::AcceptAll, fakes::AcceptAll, fakes::AcceptAll> {
        let config = RoutingConfig::new(
            node_id(0),
            [0; 32],
            fakes::AcceptAll,
            fakes::AcceptAll,
            fakes::AcceptAll,
        );
        RoutingCore::new(config)
    }

    fn activate(
        core: &mut RoutingCore<fakes::AcceptAll, fakes::AcceptAll, fakes::AcceptAll>,
        scid: ShortChannelId,
        from: NodeId,
        to: NodeId,
        base_fee: u32,
        ppm: u32,
        delay: u32,
    ) {
        core.graph.create_channel(scid, from, to, 1_000_000, true, 0, 1_000_000);
        let direction = core.graph.lookup_channel(scid).unwrap().direction_toward(from).unwrap();
        let half = core.graph.lookup_channel_mut(scid).unwrap().half_mut(direction);
        half.active = true;
        half.base_fee_msat = base_fee;
        half.proportional_fee_ppm = ppm;
        half.cltv_expiry_delta = delay;
        half.last_timestamp = 1;
    }

    #[test]
    fn two_hop_route_charges_only_intermediate_fees() {
        let a = node_id(1);
        let b = node_id(2);
        let c = node_id(3);
        let mut core = test_core();
        let scid_ab = ShortChannelId::new(1, 0, 0).unwrap();
        let scid_bc = ShortChannelId::new(1, 0, 1).unwrap();
        // A -> B: base 0, ppm 1000 (0.1%); B -> C: base 1000, ppm 0.
        activate(&mut core, scid_ab, a, b, 0, 1000, 10);
        activate(&mut core, scid_bc, b, c, 1000, 0, 10);

        let route = core.get_route(a, c, 1_000_000, 0.0, 0.0, 0).unwrap();
        assert_eq!(route.edges, vec![
            RouteEdge { scid: scid_ab, direction: 0 },
            RouteEdge { scid: scid_bc, direction: 0 },
        ]);
        assert_eq!(route.total_fee_msat, 1_000);
    }

    #[test]
    fn excessive_ppm_disables_the_only_path() {
        let a = node_id(1);
        let b = node_id(2);
        let mut core = test_core();
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        activate(&mut core, scid, a, b, 0, 1000, 10);
        let direction = core.graph.lookup_channel(scid).unwrap().direction_toward(a).unwrap();
        let half = core.graph.lookup_channel_mut(scid).unwrap().half_mut(direction);
        half.proportional_fee_ppm = 1 << 24;
        half.active = false;

        assert!(core.get_route(a, b, 1_000, 0.0, 0.0, 0).is_none());
    }

    #[test]
    fn same_source_and_destination_has_no_route() {
        let a = node_id(1);
        let core = test_core();
        assert!(core.get_route(a, a, 1_000, 0.0, 0.0, 0).is_none());
    }

    #[test]
    fn amount_at_or_above_ceiling_has_no_route() {
        let a = node_id(1);
        let b = node_id(2);
        let mut core = test_core();
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        activate(&mut core, scid, a, b, 0, 0, 10);
        assert!(core.get_route(a, b, MAX_MSATOSHI, 0.0, 0.0, 0).is_none());
    }

    #[test]
    fn unroutable_edge_is_skipped() {
        let a = node_id(1);
        let b = node_id(2);
        let mut core = test_core();
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        activate(&mut core, scid, a, b, 0, 0, 10);
        let direction = core.graph.lookup_channel(scid).unwrap().direction_toward(a).unwrap();
        core.graph.lookup_channel_mut(scid).unwrap().half_mut(direction).unroutable_until =
            u64::MAX;
        assert!(core.get_route(a, b, 1_000, 0.0, 0.0, 0).is_none());
    }
}

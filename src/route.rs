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

//! Route assembly (C5): turns the pathfinder's bare channel list into the
//! per-hop forwarding schedule an onion-construction layer would consume.

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::core::RoutingCore;
use crate::graph::HalfChannel;
use crate::ids::{NodeId, ShortChannelId};
use crate::pathfinder::Route;

/// One hop of an assembled route: the channel to send over, the peer it
/// delivers to, and the amount/expiry that hop's outgoing HTLC must
/// carry. Fees are never fuzzed here — whatever a forwarding node
/// actually deducts must match its own unfuzzed policy, or the next hop
/// would reject the HTLC as underpaying.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct RouteHop {
    pub scid: ShortChannelId,
    pub next_node_id: NodeId,
    pub amount_forwarded: u64,
    pub absolute_cltv_expiry: u32,
}

fn connection_fee(half: &HalfChannel, amount_msat: u64) -> u64 {
    let proportional = (half.proportional_fee_ppm as u128 * amount_msat as u128) / 1_000_000;
    half.base_fee_msat as u64 + proportional as u64
}

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Assembles a sendable hop schedule from a [`Route`] returned by
    /// [`RoutingCore::get_route`] (§4.5). `amount_msat` is the amount the
    /// destination must receive and `final_cltv` is the destination's
    /// requested final cltv-expiry delta.
    ///
    /// Walks the edge list backward, starting at the destination:
    /// the delivered amount accumulates each hop's forwarding fee and
    /// the cltv schedule accumulates each hop's delay, both computed
    /// with the edge's own announced half. Panics in debug builds if
    /// the walk does not land on `source` — every edge in a `Route`
    /// came from the graph that produced it, so this should never fire
    /// outside of a caller passing a route built from a different core.
    pub fn assemble_route(
        &self,
        route: &Route,
        source: NodeId,
        amount_msat: u64,
        final_cltv: u32,
    ) -> Vec<RouteHop> {
        let mut hops = Vec::with_capacity(route.edges.len());
        let mut amount = amount_msat;
        let mut cltv_expiry = final_cltv;
        let mut from_node = source;

        for edge in route.edges.iter().rev() {
            let channel = self
                .graph
                .lookup_channel(edge.scid)
                .expect("route edge references a channel still present in the graph");
            let node_ids = channel.node_ids();
            let direction = edge.direction as usize;
            let next_node_id = node_ids[1 - direction];
            from_node = node_ids[direction];

            hops.push(RouteHop {
                scid: edge.scid,
                next_node_id,
                amount_forwarded: amount,
                absolute_cltv_expiry: cltv_expiry,
            });

            let half = channel.half(edge.direction);
            amount += connection_fee(half, amount);
            cltv_expiry += half.cltv_expiry_delta;
        }

        debug_assert_eq!(from_node, source);
        hops.reverse();
        hops
    }
}

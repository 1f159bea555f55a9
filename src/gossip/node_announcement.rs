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

//! `node_announcement` ingestion (§4.3.4).

use log::{debug, trace, warn};

use crate::addr::parse_address_list;
use crate::collaborators::{
    Broadcaster, ChainSource, CryptoVerifier, MessageKind, RoutingKeyTag,
};
use crate::constants::NODE_ANNOUNCEMENT_SIG_OFFSET;
use crate::core::RoutingCore;
use crate::gossip::Outcome;
use crate::ids::NodeId;
use crate::pending::PendingNodeAnnouncement;
use crate::wire::NodeAnnouncementFields;

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    pub fn handle_node_announcement(
        &mut self,
        raw: &[u8],
        fields: NodeAnnouncementFields,
    ) -> Outcome {
        if fields
            .features
            .has_unknown_even_bit(&self.config.known_feature_bits)
        {
            debug!(
                "node_announcement {}: unknown even feature bit, discarding",
                fields.node_id
            );
            return Outcome::Discarded;
        }
        if raw.len() <= NODE_ANNOUNCEMENT_SIG_OFFSET {
            trace!("node_announcement {}: payload too short, discarding", fields.node_id);
            return Outcome::Discarded;
        }
        let payload = &raw[NODE_ANNOUNCEMENT_SIG_OFFSET..];
        let msg_hash = self.config.crypto.sha256d(payload);
        if !self
            .config
            .crypto
            .verify_ecdsa(&msg_hash, &fields.signature, &fields.node_id)
        {
            trace!(
                "node_announcement {}: signature verification failed, discarding",
                fields.node_id
            );
            return Outcome::Discarded;
        }

        let node_id = fields.node_id;
        let timestamp = fields.timestamp;

        if self.graph.lookup_node(node_id).is_none() {
            let raw = raw.to_vec();
            return if self.pending.offer_node_announcement(node_id, timestamp, raw, fields) {
                Outcome::Deferred
            } else {
                debug!("node_announcement {}: orphaned, discarding", node_id);
                Outcome::Discarded
            };
        }

        if self.graph.lookup_node(node_id).expect("checked above").last_timestamp >= timestamp {
            debug!("node_announcement {}: stale timestamp, discarding", node_id);
            return Outcome::Discarded;
        }

        let announcement =
            PendingNodeAnnouncement { timestamp, raw: raw.to_vec(), fields };
        if self.apply_node_announcement(node_id, announcement) {
            Outcome::Accepted
        } else {
            Outcome::Discarded
        }
    }

    /// Applies a resolved node descriptor — whether just verified live or
    /// released from pending staging — to the node's graph entry. Returns
    /// `false` without changing state if the address list fails to parse
    /// (§3: a malformed *known* address type invalidates the whole
    /// message) or if the node has no graph entry to apply to.
    pub(crate) fn apply_node_announcement(
        &mut self,
        node_id: NodeId,
        announcement: PendingNodeAnnouncement,
    ) -> bool {
        let addresses = match parse_address_list(&announcement.fields.addresses) {
            Ok(addresses) => addresses,
            Err(_) => {
                warn!(
                    "node_announcement {}: malformed address list, discarding",
                    node_id
                );
                return false;
            }
        };

        let node = match self.graph.lookup_node_mut(node_id) {
            Some(node) => node,
            None => return false,
        };
        node.addresses = addresses;
        node.color = Some(announcement.fields.rgb_color);
        node.alias = Some(announcement.fields.alias);
        node.last_timestamp = announcement.timestamp;
        node.last_announcement = Some(announcement.raw.clone());

        self.config.broadcaster.replace_broadcast(
            &mut node.broadcast_slot,
            MessageKind::NodeAnnouncement,
            RoutingKeyTag::NodeId(node_id),
            announcement.raw,
        );
        true
    }
}

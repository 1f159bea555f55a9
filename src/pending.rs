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

//! Two-tier staging for out-of-order gossip (C2): channel announcements
//! awaiting on-chain confirmation, and node descriptors that arrived
//! before the announcement that would create their node.

use std::collections::HashMap;

use crate::ids::{NodeId, ShortChannelId};
use crate::wire::{ChannelAnnouncementFields, ChannelUpdateFields, NodeAnnouncementFields};

/// A single direction's deferred update, retained only while its parent
/// channel is pending. Newer timestamps replace older ones; an older one
/// offered after a newer one is already staged is simply discarded.
///
/// The decoded `fields` are kept alongside the raw bytes so that, once the
/// parent channel is confirmed, the update can be replayed through the
/// normal `channel_update` handler rather than spliced into the graph
/// half-verified.
#[derive(Clone, Debug)]
pub struct PendingUpdate {
    pub timestamp: u32,
    pub raw: Vec<u8>,
    pub fields: ChannelUpdateFields,
}

/// A channel announcement that passed validation but has not yet been
/// confirmed on-chain.
#[derive(Clone, Debug)]
pub struct PendingChannel {
    pub scid: ShortChannelId,
    pub node_ids: [NodeId; 2],
    pub funding_keys: [NodeId; 2],
    pub fields: ChannelAnnouncementFields,
    pub raw: Vec<u8>,
    pub deferred_updates: [Option<PendingUpdate>; 2],
}

impl PendingChannel {
    /// Stages `update` for `direction`, keeping whichever of the new and
    /// any already-staged update has the newer timestamp.
    pub fn offer_update(
        &mut self,
        direction: u8,
        timestamp: u32,
        raw: Vec<u8>,
        fields: ChannelUpdateFields,
    ) {
        let slot = &mut self.deferred_updates[direction as usize];
        let replace = match slot {
            Some(existing) => timestamp > existing.timestamp,
            None => true,
        };
        if replace {
            *slot = Some(PendingUpdate { timestamp, raw, fields });
        }
    }
}

/// A deferred `node_announcement`, retained for a node id that has no
/// graph entry yet because its enabling channel announcement is still
/// pending.
#[derive(Clone, Debug)]
pub struct PendingNodeAnnouncement {
    pub timestamp: u32,
    pub raw: Vec<u8>,
    pub fields: NodeAnnouncementFields,
}

/// A pending-node slot: a marker that some pending channel references
/// this node id, plus at most one deferred descriptor (newest wins).
#[derive(Clone, Debug, Default)]
pub struct PendingNodeSlot {
    awaiting_channels: u32,
    deferred_announcement: Option<PendingNodeAnnouncement>,
}

impl PendingNodeSlot {
    pub fn offer_announcement(
        &mut self,
        timestamp: u32,
        raw: Vec<u8>,
        fields: NodeAnnouncementFields,
    ) {
        let replace = match &self.deferred_announcement {
            Some(existing) => timestamp > existing.timestamp,
            None => true,
        };
        if replace {
            self.deferred_announcement =
                Some(PendingNodeAnnouncement { timestamp, raw, fields });
        }
    }
}

/// Owns both staging collections (C2).
#[derive(Default)]
pub struct PendingStaging {
    pending_channels: HashMap<ShortChannelId, PendingChannel>,
    pending_nodes: HashMap<NodeId, PendingNodeSlot>,
}

impl PendingStaging {
    pub fn new() -> Self {
        PendingStaging::default()
    }

    pub fn get(&self, scid: ShortChannelId) -> Option<&PendingChannel> {
        self.pending_channels.get(&scid)
    }

    pub fn get_mut(
        &mut self,
        scid: ShortChannelId,
    ) -> Option<&mut PendingChannel> {
        self.pending_channels.get_mut(&scid)
    }

    pub fn contains(&self, scid: ShortChannelId) -> bool {
        self.pending_channels.contains_key(&scid)
    }

    pub fn pending_channel_count(&self) -> usize {
        self.pending_channels.len()
    }

    /// Inserts a new pending channel and registers both endpoints in the
    /// pending-node index. Returns `false` without effect if `scid` is
    /// already pending (the caller is expected to have already checked
    /// the public graph separately; see §4.3.1's ordering).
    pub fn insert_pending_channel(
        &mut self,
        scid: ShortChannelId,
        node_ids: [NodeId; 2],
        funding_keys: [NodeId; 2],
        fields: ChannelAnnouncementFields,
        raw: Vec<u8>,
    ) -> bool {
        if self.pending_channels.contains_key(&scid) {
            return false;
        }
        for node_id in node_ids {
            self.pending_nodes.entry(node_id).or_default().awaiting_channels += 1;
        }
        self.pending_channels.insert(
            scid,
            PendingChannel {
                scid,
                node_ids,
                funding_keys,
                fields,
                raw,
                deferred_updates: [None, None],
            },
        );
        true
    }

    /// Stages a deferred `node_announcement` for `node_id`, provided a
    /// pending slot already exists for it (i.e. some pending channel
    /// references it). Returns `false` if no such slot exists, in which
    /// case the caller must discard the announcement as orphaned.
    pub fn offer_node_announcement(
        &mut self,
        node_id: NodeId,
        timestamp: u32,
        raw: Vec<u8>,
        fields: NodeAnnouncementFields,
    ) -> bool {
        match self.pending_nodes.get_mut(&node_id) {
            Some(slot) => {
                slot.offer_announcement(timestamp, raw, fields);
                true
            }
            None => false,
        }
    }

    /// Removes and returns a pending channel entry, e.g. after adoption
    /// into the graph or explicit drop.
    pub fn remove_pending_channel(
        &mut self,
        scid: ShortChannelId,
    ) -> Option<PendingChannel> {
        self.pending_channels.remove(&scid)
    }

    /// Releases one pending channel's reference to `node_id`. Once the
    /// last referencing channel has been released, the slot's deferred
    /// announcement (if any) is returned to the caller for immediate
    /// application, and the slot itself is removed.
    pub fn release_node_reference(
        &mut self,
        node_id: NodeId,
    ) -> Option<PendingNodeAnnouncement> {
        let slot = self.pending_nodes.get_mut(&node_id)?;
        slot.awaiting_channels = slot.awaiting_channels.saturating_sub(1);
        if slot.awaiting_channels == 0 {
            let slot = self.pending_nodes.remove(&node_id).unwrap();
            slot.deferred_announcement
        } else {
            None
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::features::FeatureBits;

    fn node_id(byte: u8) -> NodeId {
        let mut bytes = [0x02; 33];
        bytes[32] = byte;
        NodeId::from_bytes(bytes)
    }

    fn dummy_fields(scid: ShortChannelId, a: NodeId, b: NodeId) -> ChannelAnnouncementFields {
        ChannelAnnouncementFields {
            node_signature_1: [0; 64],
            node_signature_2: [0; 64],
            bitcoin_signature_1: [0; 64],
            bitcoin_signature_2: [0; 64],
            features: FeatureBits::from_bytes(vec![]),
            chain_hash: [0; 32],
            short_channel_id: scid,
            node_id_1: a,
            node_id_2: b,
            bitcoin_key_1: a,
            bitcoin_key_2: b,
        }
    }

    #[test]
    fn deferred_update_keeps_newest_timestamp() {
        let a = node_id(1);
        let b = node_id(2);
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        let mut staging = PendingStaging::new();
        staging.insert_pending_channel(
            scid,
            [a, b],
            [a, b],
            dummy_fields(scid, a, b),
            vec![],
        );
        let update_fields = ChannelUpdateFields {
            signature: [0; 64],
            chain_hash: [0; 32],
            short_channel_id: scid,
            timestamp: 0,
            message_flags: 0,
            channel_flags: 0,
            cltv_expiry_delta: 10,
            htlc_minimum_msat: 0,
            fee_base_msat: 0,
            fee_proportional_millionths: 0,
            htlc_maximum_msat: None,
        };
        let pending = staging.get_mut(scid).unwrap();
        pending.offer_update(0, 100, vec![1], update_fields.clone());
        pending.offer_update(0, 50, vec![2], update_fields);
        assert_eq!(pending.deferred_updates[0].as_ref().unwrap().timestamp, 100);
    }

    #[test]
    fn node_slot_released_after_all_channels_resolve() {
        let a = node_id(1);
        let b = node_id(2);
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        let mut staging = PendingStaging::new();
        staging.insert_pending_channel(
            scid,
            [a, b],
            [a, b],
            dummy_fields(scid, a, b),
            vec![],
        );
        assert!(staging.offer_node_announcement(
            a,
            10,
            vec![9],
            crate::wire::NodeAnnouncementFields {
                signature: [0; 64],
                features: FeatureBits::from_bytes(vec![]),
                timestamp: 10,
                node_id: a,
                rgb_color: [0; 3],
                alias: [0; 32],
                addresses: vec![],
            }
        ));
        let resolved = staging.release_node_reference(a).unwrap();
        assert_eq!(resolved.timestamp, 10);
        assert!(staging.release_node_reference(a).is_none());
    }

    #[test]
    fn insert_pending_channel_rejects_duplicate_scid() {
        let a = node_id(1);
        let b = node_id(2);
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        let mut staging = PendingStaging::new();
        assert!(staging.insert_pending_channel(
            scid,
            [a, b],
            [a, b],
            dummy_fields(scid, a, b),
            vec![],
        ));
        assert!(!staging.insert_pending_channel(
            scid,
            [a, b],
            [a, b],
            dummy_fields(scid, a, b),
            vec![],
        ));
    }
}

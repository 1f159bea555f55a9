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

//! HTLC routing-failure ingestion (§4.6): turns a peer's forwarding
//! failure report into a half-channel penalty, optional channel removal,
//! and an optional replayed `channel_update`.

use log::{debug, warn};

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::constants::UNROUTABLE_PENALTY_SECS;
use crate::core::RoutingCore;
use crate::error::Result;
use crate::ids::{NodeId, ShortChannelId};
use crate::wire::{peek_message_type, ChannelUpdateFields, CHANNEL_UPDATE_MESSAGE_TYPE};

/// The onion-failure bitmask flags this handler cares about. Numeric
/// values follow the BOLT4 `failuremsg` top bits.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct FailureFlags(pub u16);

impl FailureFlags {
    pub const PERM: u16 = 0x4000;
    pub const NODE: u16 = 0x2000;
    pub const UPDATE: u16 = 0x1000;

    pub fn new(bits: u16) -> Self {
        FailureFlags(bits)
    }

    pub fn is_perm(&self) -> bool {
        self.0 & Self::PERM != 0
    }

    pub fn is_node(&self) -> bool {
        self.0 & Self::NODE != 0
    }

    pub fn is_update(&self) -> bool {
        self.0 & Self::UPDATE != 0
    }
}

/// A `channel_update` offered alongside a routing failure, to be replayed
/// through the normal gossip path (§4.3.3) if it turns out genuine.
pub struct FailureUpdate {
    pub raw: Vec<u8>,
    pub fields: ChannelUpdateFields,
}

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Applies an onion routing failure reported for `scid`, attributed to
    /// `erring_node`, per §4.6.
    pub fn routing_failure(
        &mut self,
        erring_node: NodeId,
        scid: ShortChannelId,
        failcode: FailureFlags,
        update: Option<FailureUpdate>,
    ) -> Result<()> {
        if self.graph.lookup_node(erring_node).is_none() {
            debug!(
                "routing_failure {}: erring node {} unknown, ignoring",
                scid, erring_node
            );
            return Ok(());
        }

        let targets: Vec<ShortChannelId> = if failcode.is_node() {
            self.graph
                .lookup_node(erring_node)
                .expect("checked above")
                .channels()
                .to_vec()
        } else if self
            .graph
            .lookup_channel(scid)
            .and_then(|c| c.direction_toward(erring_node))
            .is_some()
        {
            vec![scid]
        } else {
            warn!(
                "routing_failure {}: erring node {} is not an endpoint of the failed channel, ignoring",
                scid, erring_node
            );
            Vec::new()
        };

        let now = self.now();
        let mut to_destroy = Vec::new();
        for target in targets {
            let channel = match self.graph.lookup_channel_mut(target) {
                Some(c) => c,
                None => continue,
            };
            let direction = match channel.direction_toward(erring_node) {
                Some(d) => d,
                None => continue,
            };
            if failcode.is_perm() {
                to_destroy.push(target);
            } else {
                channel.half_mut(direction).unroutable_until = now + UNROUTABLE_PENALTY_SECS;
            }
        }
        for scid in to_destroy {
            self.graph.destroy_channel(scid)?;
        }

        if failcode.is_update() {
            match update {
                Some(update) if peek_message_type(&update.raw) == Some(CHANNEL_UPDATE_MESSAGE_TYPE) => {
                    self.handle_channel_update(&update.raw, update.fields);
                }
                Some(_) => {
                    warn!(
                        "routing_failure {}: UPDATE flag set but replay payload is not a channel_update, ignoring",
                        scid
                    );
                }
                None => {}
            }
        }

        Ok(())
    }

    /// Marks both halves of `scid` unroutable for [`UNROUTABLE_PENALTY_SECS`],
    /// independent of any onion failure report. No-op if the channel is
    /// unknown.
    pub fn mark_unroutable(&mut self, scid: ShortChannelId) {
        let now = self.now();
        if let Some(channel) = self.graph.lookup_channel_mut(scid) {
            channel.half_mut(0).unroutable_until = now + UNROUTABLE_PENALTY_SECS;
            channel.half_mut(1).unroutable_until = now + UNROUTABLE_PENALTY_SECS;
        }
    }
}

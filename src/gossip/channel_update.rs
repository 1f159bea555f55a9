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

//! `channel_update` ingestion (§4.3.3).

use log::{debug, trace};

use crate::collaborators::{
    Broadcaster, ChainSource, CryptoVerifier, MessageKind, RoutingKeyTag,
};
use crate::constants::{CHANNEL_UPDATE_SIG_OFFSET, MAX_PROPORTIONAL_FEE};
use crate::core::RoutingCore;
use crate::gossip::Outcome;
use crate::wire::ChannelUpdateFields;

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    pub fn handle_channel_update(
        &mut self,
        raw: &[u8],
        fields: ChannelUpdateFields,
    ) -> Outcome {
        let scid = fields.short_channel_id;
        let direction = fields.direction();

        if fields.chain_hash != self.config.chain_hash {
            debug!("channel_update {}: wrong chain, discarding", scid);
            return Outcome::Discarded;
        }

        let is_public = self.graph.lookup_channel(scid).map_or(false, |c| c.public);
        if !is_public {
            return match self.pending.get_mut(scid) {
                Some(pending) => {
                    pending.offer_update(direction, fields.timestamp, raw.to_vec(), fields);
                    Outcome::Deferred
                }
                None => {
                    debug!("channel_update {}: unknown channel, discarding", scid);
                    Outcome::Discarded
                }
            };
        }

        let channel = self.graph.lookup_channel(scid).expect("checked above");
        if fields.timestamp <= channel.half(direction).last_timestamp {
            debug!("channel_update {}/{}: stale timestamp, discarding", scid, direction);
            return Outcome::Discarded;
        }

        if raw.len() <= CHANNEL_UPDATE_SIG_OFFSET {
            trace!("channel_update {}: payload too short, discarding", scid);
            return Outcome::Discarded;
        }
        let payload = &raw[CHANNEL_UPDATE_SIG_OFFSET..];
        let msg_hash = self.config.crypto.sha256d(payload);
        let signer = channel.node_ids()[direction as usize];
        if !self.config.crypto.verify_ecdsa(&msg_hash, &fields.signature, &signer) {
            trace!("channel_update {}: signature verification failed, discarding", scid);
            return Outcome::Discarded;
        }

        self.apply_channel_update(scid, direction, &fields, raw);
        Outcome::Accepted
    }

    pub(crate) fn apply_channel_update(
        &mut self,
        scid: crate::ids::ShortChannelId,
        direction: u8,
        fields: &ChannelUpdateFields,
        raw: &[u8],
    ) {
        let channel = self
            .graph
            .lookup_channel_mut(scid)
            .expect("caller already confirmed the channel is public");
        let half = channel.half_mut(direction);
        half.base_fee_msat = fields.fee_base_msat;
        half.proportional_fee_ppm = fields.fee_proportional_millionths;
        half.cltv_expiry_delta = fields.cltv_expiry_delta as u32;
        half.htlc_minimum_msat = fields.htlc_minimum_msat;
        half.htlc_maximum_msat = fields.htlc_maximum_msat;
        half.active = !fields.disabled();
        half.unroutable_until = 0;
        half.last_timestamp = fields.timestamp;
        half.last_update = Some(raw.to_vec());
        if half.proportional_fee_ppm >= MAX_PROPORTIONAL_FEE {
            half.active = false;
        }

        self.config.broadcaster.replace_broadcast(
            &mut half.broadcast_slot,
            MessageKind::ChannelUpdate,
            RoutingKeyTag::ScidDirection(scid, direction),
            raw.to_vec(),
        );
    }
}

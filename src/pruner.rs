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

//! Periodic staleness sweep (C7): drops public channels neither endpoint
//! has refreshed in `prune_timeout`.

use log::{debug, error};

use crate::collaborators::{Broadcaster, ChainSource, CryptoVerifier};
use crate::core::RoutingCore;
use crate::error::{Result, RoutingError};
use crate::ids::ShortChannelId;

impl<C, S, B> RoutingCore<C, S, B>
where
    C: CryptoVerifier,
    S: ChainSource,
    B: Broadcaster,
{
    /// Destroys every public channel whose both halves have gone stale
    /// past the configured `prune_timeout` (§4.7). Local-only channels are
    /// never pruned. Returns the number of channels destroyed.
    ///
    /// Channels to destroy are collected before any mutation so that
    /// destruction never invalidates the graph's own iterators.
    pub fn prune(&mut self) -> Result<usize> {
        let now = self.now();
        let highwater = now.saturating_sub(self.config.prune_timeout);

        let stale: Vec<ShortChannelId> = self
            .graph
            .channels()
            .filter(|channel| channel.public)
            .filter(|channel| {
                channel
                    .halves()
                    .iter()
                    .all(|half| (half.last_timestamp as u64) < highwater)
            })
            .map(|channel| channel.scid())
            .collect();

        let count = stale.len();
        for scid in stale {
            debug!("prune: destroying stale channel {}", scid);
            if let Err(err) = self.graph.destroy_channel(scid) {
                error!("prune: {} while sweeping {}", err, scid);
                return Err(RoutingError::PrunerSawMissingHalf(scid));
            }
        }
        Ok(count)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::core::RoutingConfig;
    use crate::ids::NodeId;

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
            fn siphash24(&self, _seed: u64, _scid: ShortChannelId) -> u64 {
                0
            }
        }
    }

    fn node_id(byte: u8) -> NodeId {
        let mut bytes = [0x02; 33];
        bytes[32] = byte;
        NodeId::from_bytes(bytes)
    }

    fn test_core(prune_timeout: u64) -> RoutingCore<fakes::AcceptAll, fakes::AcceptAll, fakes::AcceptAll> {
        let config = RoutingConfig::new(
            node_id(0),
            [0; 32],
            fakes::AcceptAll,
            fakes::AcceptAll,
            fakes::AcceptAll,
        )
        .with_prune_timeout(prune_timeout);
        RoutingCore::new(config)
    }

    #[test]
    fn stale_public_channel_is_destroyed_fresh_one_is_kept() {
        let a = node_id(1);
        let b = node_id(2);
        let c = node_id(3);
        let d = node_id(4);
        let mut core = test_core(1_000);
        let now = core.now();

        let stale = ShortChannelId::new(1, 0, 0).unwrap();
        core.graph.create_channel(stale, a, b, 1_000_000, true, now, 1_000);
        for direction in 0..2 {
            core.graph
                .lookup_channel_mut(stale)
                .unwrap()
                .half_mut(direction)
                .last_timestamp = (now - 1_001) as u32;
        }

        let fresh = ShortChannelId::new(1, 0, 1).unwrap();
        core.graph.create_channel(fresh, c, d, 1_000_000, true, now, 1_000);
        core.graph
            .lookup_channel_mut(fresh)
            .unwrap()
            .half_mut(0)
            .last_timestamp = now as u32;

        let destroyed = core.prune().unwrap();
        assert_eq!(destroyed, 1);
        assert!(core.graph.lookup_channel(stale).is_none());
        assert!(core.graph.lookup_channel(fresh).is_some());
    }

    #[test]
    fn local_only_channel_is_never_pruned() {
        let a = node_id(1);
        let b = node_id(2);
        let mut core = test_core(1_000);
        let now = core.now();
        let scid = ShortChannelId::new(1, 0, 0).unwrap();
        core.graph.create_channel(scid, a, b, 0, false, now, 1_000);
        for direction in 0..2 {
            core.graph
                .lookup_channel_mut(scid)
                .unwrap()
                .half_mut(direction)
                .last_timestamp = 0;
        }

        assert_eq!(core.prune().unwrap(), 0);
        assert!(core.graph.lookup_channel(scid).is_some());
    }
}

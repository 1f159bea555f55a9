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

//! A gossip-fed channel graph and amount-aware pathfinder for a
//! Lightning-style payment-channel overlay node.
//!
//! The routing core (see [`RoutingCore`]) ingests `channel_announcement`,
//! `channel_update` and `node_announcement` gossip, stages out-of-order
//! messages until the channels or nodes they reference exist, promotes
//! staged channel announcements once their funding output confirms
//! on-chain, and answers pathfinding queries against the resulting
//! in-memory graph. It is deliberately ignorant of wire framing, transport
//! and persistence — see [`collaborators`] for the seams an embedder fills
//! in instead.

#![deny(
    non_upper_case_globals,
    non_camel_case_types,
    non_snake_case,
    unused_mut,
    unused_imports,
    dead_code
)]

#[macro_use]
extern crate amplify;
#[macro_use]
extern crate amplify_derive;

pub mod addr;
pub mod collaborators;
pub mod constants;
pub mod core;
pub mod error;
pub mod failure;
pub mod features;
pub mod gossip;
pub mod graph;
pub mod ids;
pub mod pathfinder;
pub mod pending;
pub mod pruner;
pub mod route;
pub mod wire;

pub use collaborators::{
    Broadcaster, BroadcastSlot, ChainSource, CryptoVerifier, MessageKind,
    RoutingKeyTag, Secp256k1Verifier,
};
pub use core::{RoutingConfig, RoutingCore};
pub use error::{Result, RoutingError};
pub use failure::{FailureFlags, FailureUpdate};
pub use features::FeatureBits;
pub use gossip::Outcome;
pub use graph::{Channel, GraphStore, HalfChannel, Node};
pub use ids::{NodeId, ShortChannelId};
pub use pathfinder::{normalize_risk_factor, Route, RouteEdge};
pub use route::RouteHop;
pub use wire::{
    ChannelAnnouncementFields, ChannelUpdateFields, NodeAnnouncementFields,
};

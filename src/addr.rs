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

//! The `node_announcement` address list: a sequence of typed, variable-
//! length address descriptors terminated implicitly by running out of
//! bytes, with a tolerant-parsing rule for padding and future types.

use std::fmt;

/// A single network address a peer may be reachable at, as announced in
/// gossip. Mirrors the four address types defined for BOLT7-style
/// `node_announcement` messages.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum NetAddress {
    IpV4 { addr: [u8; 4], port: u16 },
    IpV6 { addr: [u8; 16], port: u16 },
    OnionV2 { addr: [u8; 10], port: u16 },
    OnionV3 { ed25519_pubkey: [u8; 32], checksum: u16, version: u8, port: u16 },
}

impl fmt::Display for NetAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            NetAddress::IpV4 { addr, port } => write!(
                f,
                "{}.{}.{}.{}:{}",
                addr[0], addr[1], addr[2], addr[3], port
            ),
            NetAddress::IpV6 { port, .. } => write!(f, "[ipv6]:{}", port),
            NetAddress::OnionV2 { port, .. } => write!(f, "[onion-v2]:{}", port),
            NetAddress::OnionV3 { port, .. } => write!(f, "[onion-v3]:{}", port),
        }
    }
}

/// Type tag byte for each known, parseable address descriptor.
const ADDR_TYPE_PADDING: u8 = 0;
const ADDR_TYPE_IPV4: u8 = 1;
const ADDR_TYPE_IPV6: u8 = 2;
const ADDR_TYPE_ONION_V2: u8 = 3;
const ADDR_TYPE_ONION_V3: u8 = 4;

/// Error returned when a *known* address type's payload is truncated or
/// otherwise malformed; per the gossip protocol this invalidates the whole
/// `node_announcement`, unlike an unrecognized trailing type.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AddressListParseError;

/// Parses a `node_announcement` address-list payload.
///
/// Padding entries (type 0) are skipped. The first descriptor of a type
/// this node does not recognize stops parsing cleanly — everything parsed
/// so far is kept, the rest of the buffer is ignored. A recognized type
/// whose fixed-size payload does not fit in the remaining bytes is a hard
/// parse error that invalidates the entire message.
pub fn parse_address_list(
    mut data: &[u8],
) -> Result<Vec<NetAddress>, AddressListParseError> {
    let mut addresses = Vec::new();
    while let Some((&type_byte, rest)) = data.split_first() {
        match type_byte {
            ADDR_TYPE_PADDING => {
                data = rest;
            }
            ADDR_TYPE_IPV4 => {
                let (addr, port, rest) = take_addr::<4>(rest)?;
                addresses.push(NetAddress::IpV4 { addr, port });
                data = rest;
            }
            ADDR_TYPE_IPV6 => {
                let (addr, port, rest) = take_addr::<16>(rest)?;
                addresses.push(NetAddress::IpV6 { addr, port });
                data = rest;
            }
            ADDR_TYPE_ONION_V2 => {
                let (addr, port, rest) = take_addr::<10>(rest)?;
                addresses.push(NetAddress::OnionV2 { addr, port });
                data = rest;
            }
            ADDR_TYPE_ONION_V3 => {
                if rest.len() < 35 {
                    return Err(AddressListParseError);
                }
                let mut ed25519_pubkey = [0u8; 32];
                ed25519_pubkey.copy_from_slice(&rest[0..32]);
                let checksum = u16::from_be_bytes([rest[32], rest[33]]);
                let version = rest[34];
                let (_, port, rest) = take_addr::<0>(&rest[35..])?;
                addresses.push(NetAddress::OnionV3 {
                    ed25519_pubkey,
                    checksum,
                    version,
                    port,
                });
                data = rest;
            }
            _unknown => break,
        }
    }
    Ok(addresses)
}

fn take_addr<const N: usize>(
    data: &[u8],
) -> Result<([u8; N], u16, &[u8]), AddressListParseError> {
    if data.len() < N + 2 {
        return Err(AddressListParseError);
    }
    let mut addr = [0u8; N];
    addr.copy_from_slice(&data[0..N]);
    let port = u16::from_be_bytes([data[N], data[N + 1]]);
    Ok((addr, port, &data[N + 2..]))
}

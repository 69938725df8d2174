//! # IPv4 Range Model
//!
//! Continuous, inclusive ranges of IPv4 addresses, as produced by dash ranges
//! (`192.168.1.1-100`) and CIDR blocks (`192.168.1.0/24`).

use std::net::Ipv4Addr;

use pnet::ipnetwork::Ipv4Network;

/// Prefixes up to this length lose their network and broadcast addresses.
const LAST_BROADCAST_PREFIX: u8 = 30;

/// Represents a continuous range of IPv4 addresses, inclusive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Ipv4Range {
    pub start_addr: Ipv4Addr,
    pub end_addr: Ipv4Addr,
}

impl Ipv4Range {
    pub fn new(start_addr: Ipv4Addr, end_addr: Ipv4Addr) -> Self {
        Self {
            start_addr,
            end_addr,
        }
    }

    /// Ascending iterator over the range. Empty when start > end.
    pub fn iter(&self) -> impl DoubleEndedIterator<Item = Ipv4Addr> + Clone {
        let start: u32 = u32::from(self.start_addr);
        let end: u32 = u32::from(self.end_addr);
        (start..=end).map(Ipv4Addr::from)
    }

    pub fn len(&self) -> u64 {
        let start = u64::from(u32::from(self.start_addr));
        let end = u64::from(u32::from(self.end_addr));
        (end + 1).saturating_sub(start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The host addresses of a CIDR block.
///
/// /0 to /30 drop the network and broadcast addresses, /31 keeps both
/// addresses and /32 is the single address.
pub fn cidr_hosts(network: Ipv4Network) -> Ipv4Range {
    let start = network.network();
    let end = network.broadcast();

    if network.prefix() > LAST_BROADCAST_PREFIX {
        return Ipv4Range::new(start, end);
    }

    let start_u32 = u32::from(start).saturating_add(1);
    let end_u32 = u32::from(end).saturating_sub(1);
    Ipv4Range::new(Ipv4Addr::from(start_u32), Ipv4Addr::from(end_u32))
}

// ╔════════════════════════════════════════════╗
// ║ ████████╗███████╗███████╗████████╗███████╗ ║
// ║ ╚══██╔══╝██╔════╝██╔════╝╚══██╔══╝██╔════╝ ║
// ║    ██║   █████╗  ███████╗   ██║   ███████╗ ║
// ║    ██║   ██╔══╝  ╚════██║   ██║   ╚════██║ ║
// ║    ██║   ███████╗███████║   ██║   ███████║ ║
// ║    ╚═╝   ╚══════╝╚══════╝   ╚═╝   ╚══════╝ ║
// ╚════════════════════════════════════════════╝

//! Host and network facts exposed to templates under `sys`.
//!
//! The host provider reads the hostname, finds the default IPv4 route in the
//! kernel routing table (`/proc/net/route`) and picks the first IPv4 address
//! of the route's interface. A host without a default route falls back to
//! loopback values; every other failure is an error.

use std::{
    net::Ipv4Addr,
    path::{Path, PathBuf},
};

use network_interface::{Addr, NetworkInterface, NetworkInterfaceConfig};
use thiserror::Error;

use crate::node::{Mapping, Node};

/// Location of the kernel IPv4 routing table.
pub const ROUTE_TABLE: &str = "/proc/net/route";

/// Errors raised while gathering system facts.
#[derive(Debug, Error)]
pub enum SystemError {
    /// The routing table has no default IPv4 route. Callers fall back to
    /// loopback defaults instead of failing.
    #[error("no default route")]
    NoDefaultRoute,

    #[error("failed to read hostname")]
    Hostname(#[source] nix::Error),

    #[error("hostname is not valid UTF-8")]
    HostnameEncoding,

    #[error("failed to read routing table '{path}'")]
    RouteTable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid gateway address '{0}' in routing table")]
    Gateway(String),

    #[error("failed to list network interfaces")]
    Interfaces(#[source] network_interface::Error),
}

/// Host and primary IPv4 network attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemFacts {
    pub hostname: String,
    pub address: String,
    pub network: String,
    pub gateway: String,
}

impl SystemFacts {
    /// Facts for a host reachable only through loopback.
    pub fn loopback(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            address: Ipv4Addr::LOCALHOST.to_string(),
            network: "127.0.0.0/8".to_string(),
            gateway: String::new(),
        }
    }

    /// The facts as a mapping of string nodes.
    pub fn to_mapping(&self) -> Mapping {
        [
            ("hostname", &self.hostname),
            ("address", &self.address),
            ("network", &self.network),
            ("gateway", &self.gateway),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), Node::String(v.clone())))
        .collect()
    }
}

/// Source of [`SystemFacts`].
pub trait SystemProvider {
    /// Gathers the facts.
    ///
    /// # Errors
    ///
    /// Any error returned here aborts the run.
    fn facts(&self) -> Result<SystemFacts, SystemError>;
}

/// Fixed facts, used when the host should not be inspected.
impl SystemProvider for SystemFacts {
    fn facts(&self) -> Result<SystemFacts, SystemError> {
        Ok(self.clone())
    }
}

/// Reads facts from the running host.
#[derive(Debug, Clone)]
pub struct HostSystem {
    route_table: PathBuf,
}

impl Default for HostSystem {
    fn default() -> Self {
        Self {
            route_table: PathBuf::from(ROUTE_TABLE),
        }
    }
}

impl HostSystem {
    /// Uses a routing table at a custom location.
    pub fn with_route_table(path: impl AsRef<Path>) -> Self {
        Self {
            route_table: path.as_ref().to_path_buf(),
        }
    }
}

impl SystemProvider for HostSystem {
    fn facts(&self) -> Result<SystemFacts, SystemError> {
        let hostname = nix::unistd::gethostname()
            .map_err(SystemError::Hostname)?
            .into_string()
            .map_err(|_| SystemError::HostnameEncoding)?;

        let table = std::fs::read_to_string(&self.route_table).map_err(|source| {
            SystemError::RouteTable {
                path: self.route_table.clone(),
                source,
            }
        })?;

        let route = match default_ipv4_route(&table) {
            Ok(route) => route,
            Err(SystemError::NoDefaultRoute) => {
                warn!("no default IPv4 route, using loopback defaults");
                return Ok(SystemFacts::loopback(hostname));
            }
            Err(e) => return Err(e),
        };
        let interfaces = NetworkInterface::show().map_err(SystemError::Interfaces)?;

        let mut facts = SystemFacts::loopback(hostname);
        facts.gateway = route.gateway.to_string();

        let ipv4 = interfaces
            .iter()
            .filter(|i| i.name == route.interface)
            .flat_map(|i| i.addr.iter())
            .find_map(|addr| match addr {
                Addr::V4(v4) => Some((v4.ip, v4.netmask)),
                Addr::V6(_) => None,
            });
        if let Some((ip, netmask)) = ipv4 {
            facts.address = ip.to_string();
            facts.network = network_cidr(ip, netmask.unwrap_or(Ipv4Addr::BROADCAST));
        }

        debug!("system facts: {facts:?}");
        Ok(facts)
    }
}

/// The default IPv4 route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultRoute {
    pub interface: String,
    pub gateway: Ipv4Addr,
}

/// Finds the default route in the text of `/proc/net/route`.
///
/// # Errors
///
/// Returns [`SystemError::NoDefaultRoute`] when there is none and
/// [`SystemError::Gateway`] when the gateway column cannot be decoded.
pub fn default_ipv4_route(table: &str) -> Result<DefaultRoute, SystemError> {
    for line in table.lines().skip(1) {
        let columns: Vec<&str> = line.split('\t').map(str::trim).collect();
        if columns.len() < 3 || columns[0].is_empty() || columns[1] != "00000000" {
            continue;
        }
        let gateway = hex_to_ipv4(columns[2])?;
        return Ok(DefaultRoute {
            interface: columns[0].to_string(),
            gateway,
        });
    }
    Err(SystemError::NoDefaultRoute)
}

/// Decodes an address column of the routing table.
///
/// The kernel prints the address as a host-order 32-bit integer.
pub fn hex_to_ipv4(hex: &str) -> Result<Ipv4Addr, SystemError> {
    if hex.len() != 8 {
        return Err(SystemError::Gateway(hex.to_string()));
    }
    let raw = u32::from_str_radix(hex, 16).map_err(|_| SystemError::Gateway(hex.to_string()))?;
    Ok(Ipv4Addr::from(raw.to_ne_bytes()))
}

/// Formats the network of `ip` as `a.b.c.d/len`.
pub fn network_cidr(ip: Ipv4Addr, netmask: Ipv4Addr) -> String {
    let mask = u32::from(netmask);
    let network = Ipv4Addr::from(u32::from(ip) & mask);
    format!("{network}/{}", mask.count_ones())
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT
eth0\t0011A8C0\t00000000\t0001\t0\t0\t0\t00FFFFFF\t0\t0\t0
eth0\t00000000\t0111A8C0\t0003\t0\t0\t0\t00000000\t0\t0\t0
";

    #[test]
    #[cfg(target_endian = "little")]
    fn test_default_route() {
        let route = default_ipv4_route(TABLE).unwrap();
        assert_eq!(route.interface, "eth0");
        assert_eq!(route.gateway, Ipv4Addr::new(192, 168, 17, 1));
    }

    #[test]
    fn test_no_default_route() {
        let table = "Iface\tDestination\tGateway\n\
                     eth0\t0011A8C0\t00000000\t0001\n";
        assert!(matches!(
            default_ipv4_route(table),
            Err(SystemError::NoDefaultRoute)
        ));
        assert!(matches!(
            default_ipv4_route(""),
            Err(SystemError::NoDefaultRoute)
        ));
    }

    #[test]
    fn test_bad_gateway() {
        let table = "Iface\tDestination\tGateway\n\
                     eth0\t00000000\tZZZZZZZZ\t0003\n";
        assert!(matches!(
            default_ipv4_route(table),
            Err(SystemError::Gateway(_))
        ));
    }

    #[test]
    #[cfg(target_endian = "little")]
    fn test_hex_to_ipv4() {
        assert_eq!(hex_to_ipv4("0101A8C0").unwrap(), Ipv4Addr::new(192, 168, 1, 1));
        assert_eq!(hex_to_ipv4("00000000").unwrap(), Ipv4Addr::UNSPECIFIED);
        assert!(hex_to_ipv4("0101A8").is_err());
    }

    #[test]
    fn test_network_cidr() {
        assert_eq!(
            network_cidr(Ipv4Addr::new(192, 168, 1, 23), Ipv4Addr::new(255, 255, 255, 0)),
            "192.168.1.0/24"
        );
        assert_eq!(
            network_cidr(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::new(255, 0, 0, 0)),
            "10.0.0.0/8"
        );
        assert_eq!(
            network_cidr(Ipv4Addr::new(10, 1, 2, 3), Ipv4Addr::BROADCAST),
            "10.1.2.3/32"
        );
    }

    #[test]
    fn test_facts_mapping() {
        let facts = SystemFacts::loopback("box");
        let map = facts.to_mapping();
        assert_eq!(map["hostname"], "box");
        assert_eq!(map["address"], "127.0.0.1");
        assert_eq!(map["network"], "127.0.0.0/8");
        assert_eq!(map["gateway"], "");
    }

    #[test]
    fn test_fixed_provider() {
        let facts = SystemFacts::loopback("box");
        assert_eq!(facts.facts().unwrap(), facts);
    }

    #[test]
    #[cfg(target_os = "linux")]
    fn test_host_system() {
        if !Path::new(ROUTE_TABLE).exists() {
            return;
        }
        let facts = HostSystem::default().facts().unwrap();
        assert!(!facts.hostname.is_empty());
        assert!(facts.address.parse::<Ipv4Addr>().is_ok());
        assert!(facts.network.contains('/'));
    }

    #[test]
    fn test_no_default_route_falls_back_to_loopback() {
        let dir = tempfile::tempdir().unwrap();
        let table = dir.path().join("route");
        std::fs::write(
            &table,
            "Iface\tDestination\tGateway \tFlags\tRefCnt\tUse\tMetric\tMask\t\tMTU\tWindow\tIRTT\n",
        )
        .unwrap();

        let facts = HostSystem::with_route_table(&table).facts().unwrap();
        assert!(!facts.hostname.is_empty());
        assert_eq!(facts.address, "127.0.0.1");
        assert_eq!(facts.network, "127.0.0.0/8");
        assert_eq!(facts.gateway, "");
        assert_eq!(facts, SystemFacts::loopback(facts.hostname.clone()));
    }

    #[test]
    fn test_missing_route_table() {
        let err = HostSystem::with_route_table("/nonexistent/route")
            .facts()
            .unwrap_err();
        assert!(matches!(err, SystemError::RouteTable { .. }));
    }
}

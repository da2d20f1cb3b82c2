//! Reachable-address advertisement
//!
//! At startup the server lists the IPv4 addresses of the local interfaces
//! and turns each into a ready-to-paste `ssh` command, so operators can
//! tell players how to connect.

use regex::Regex;
use std::sync::OnceLock;

/// Leading dotted-quad of an address string such as `192.168.1.4:0`
fn dotted_quad() -> &'static Regex {
    static DOTTED_QUAD: OnceLock<Regex> = OnceLock::new();
    DOTTED_QUAD.get_or_init(|| Regex::new(r"^\d+\.\d+\.\d+\.\d+").expect("valid regex"))
}

/// Turn interface address strings into `ssh` connect commands.
///
/// Strings that do not start with a dotted quad (IPv6, link-layer) are
/// skipped.
pub fn connect_commands<I, S>(addresses: I, port: u16) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    addresses
        .into_iter()
        .filter_map(|addr| {
            dotted_quad()
                .find(addr.as_ref())
                .map(|ip| format!(" ssh {} -p {}", ip.as_str(), port))
        })
        .collect()
}

/// Connect commands for every local IPv4 address, one per line
pub fn advertised_addresses(port: u16) -> String {
    match interface_addresses() {
        Ok(addrs) => connect_commands(addrs, port).join("\n"),
        Err(e) => {
            tracing::warn!("Failed to list interface addresses: {}", e);
            String::new()
        }
    }
}

/// Addresses of all local interfaces, formatted as strings
#[cfg(unix)]
pub fn interface_addresses() -> std::io::Result<Vec<String>> {
    let addrs = nix::ifaddrs::getifaddrs().map_err(std::io::Error::from)?;
    Ok(addrs
        .filter_map(|ifaddr| ifaddr.address)
        .map(|addr| addr.to_string())
        .collect())
}

/// Addresses of all local interfaces, formatted as strings
#[cfg(not(unix))]
pub fn interface_addresses() -> std::io::Result<Vec<String>> {
    Ok(Vec::new())
}

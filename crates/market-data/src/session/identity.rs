//! Best-effort detection of the caller's network identity.
//!
//! SmartAPI requires every authenticated request to carry the client's local
//! IP, public IP and MAC address. Detection is availability-over-precision:
//! each lookup falls back to a fixed placeholder on failure so that login
//! never blocks on identity detection.

use log::debug;
use std::net::UdpSocket;
use std::time::Duration;

/// Fallback local IP, matching the upstream SDK's sample value.
pub const FALLBACK_LOCAL_IP: &str = "192.168.168.168";

/// Fallback public IP, matching the upstream SDK's sample value.
pub const FALLBACK_PUBLIC_IP: &str = "106.193.147.98";

/// Fallback "MAC address", matching the upstream SDK's sample value.
///
/// This literal is an IPv6 address, not a MAC. The upstream API accepts it
/// as-is, so it is preserved byte-for-byte rather than normalized.
pub const FALLBACK_MAC_ADDRESS: &str = "fe80::216e:6507:4b90:3719";

/// Network identity headers attached to every authenticated request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkIdentity {
    pub local_ip: String,
    pub public_ip: String,
    pub mac_address: String,
}

impl NetworkIdentity {
    /// The placeholder identity used when detection is skipped or fails.
    pub fn fallback() -> Self {
        Self {
            local_ip: FALLBACK_LOCAL_IP.to_string(),
            public_ip: FALLBACK_PUBLIC_IP.to_string(),
            mac_address: FALLBACK_MAC_ADDRESS.to_string(),
        }
    }

    /// Detect the caller's identity, substituting placeholders per field on
    /// failure.
    pub async fn detect(client: &reqwest::Client, public_ip_lookup_url: &str) -> Self {
        let local_ip = detect_local_ip().unwrap_or_else(|| {
            debug!("local IP detection failed, using placeholder");
            FALLBACK_LOCAL_IP.to_string()
        });
        let public_ip = detect_public_ip(client, public_ip_lookup_url)
            .await
            .unwrap_or_else(|| {
                debug!("public IP lookup failed, using placeholder");
                FALLBACK_PUBLIC_IP.to_string()
            });
        let mac_address = detect_mac_address().unwrap_or_else(|| {
            debug!("MAC detection failed, using placeholder");
            FALLBACK_MAC_ADDRESS.to_string()
        });

        Self {
            local_ip,
            public_ip,
            mac_address,
        }
    }
}

/// Local IP via the UDP connect trick: no packet is sent, the OS just picks
/// the outbound interface.
fn detect_local_ip() -> Option<String> {
    let socket = UdpSocket::bind("0.0.0.0:0").ok()?;
    socket.connect("8.8.8.8:80").ok()?;
    Some(socket.local_addr().ok()?.ip().to_string())
}

/// Public IP via an outbound HTTP lookup.
async fn detect_public_ip(client: &reqwest::Client, lookup_url: &str) -> Option<String> {
    let response = client
        .get(lookup_url)
        .timeout(Duration::from_secs(5))
        .send()
        .await
        .ok()?;
    let body = response.text().await.ok()?;
    let ip = body.trim();
    if ip.is_empty() {
        None
    } else {
        Some(ip.to_string())
    }
}

/// First non-loopback interface MAC, read from sysfs on Linux.
fn detect_mac_address() -> Option<String> {
    let entries = std::fs::read_dir("/sys/class/net").ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        if name == "lo" {
            continue;
        }
        if let Ok(mac) = std::fs::read_to_string(entry.path().join("address")) {
            let mac = mac.trim();
            if !mac.is_empty() && mac != "00:00:00:00:00:00" {
                return Some(mac.to_string());
            }
        }
    }
    None
}

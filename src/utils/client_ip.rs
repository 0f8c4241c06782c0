//! Client IP extraction for visit metadata and creator tracking.

use axum::http::HeaderMap;
use std::net::{IpAddr, SocketAddr};

/// Resolves the client IP address of a request.
///
/// When `behind_proxy` is true the left-most `X-Forwarded-For` entry, then
/// `X-Real-IP`, are preferred over the socket peer address. Header values
/// that do not parse as an IP address are ignored. Enable only when the
/// service runs behind a trusted reverse proxy.
pub fn client_ip(headers: &HeaderMap, peer: SocketAddr, behind_proxy: bool) -> String {
    if behind_proxy {
        let forwarded = header_str(headers, "x-forwarded-for").and_then(|v| v.split(',').next());
        let real_ip = header_str(headers, "x-real-ip");

        if let Some(ip) = [forwarded, real_ip]
            .into_iter()
            .flatten()
            .find_map(|v| v.trim().parse::<IpAddr>().ok())
        {
            return ip.to_string();
        }
    }

    peer.ip().to_string()
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

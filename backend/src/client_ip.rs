use std::{
    convert::Infallible,
    net::{IpAddr, SocketAddr},
};

use axum::{
    async_trait,
    extract::{ConnectInfo, FromRequestParts},
    http::{request::Parts, HeaderMap, HeaderValue},
};

/// Best guess at the requesting client's address.
///
/// Proxy headers win over the socket peer, since the server normally sits
/// behind a reverse proxy. `None` when nothing usable is present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientIp(pub Option<String>);

#[async_trait]
impl<S> FromRequestParts<S> for ClientIp
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let from_peer = || {
            parts
                .extensions
                .get::<ConnectInfo<SocketAddr>>()
                .map(|ConnectInfo(addr)| addr.ip().to_string())
        };
        Ok(ClientIp(client_ip_from_headers(&parts.headers).or_else(from_peer)))
    }
}

fn client_ip_from_headers(headers: &HeaderMap) -> Option<String> {
    first_ip(headers.get("x-forwarded-for"))
        .or_else(|| first_ip(headers.get("x-real-ip")))
        .or_else(|| first_ip(headers.get("cf-connecting-ip")))
        .or_else(|| first_ip(headers.get("x-client-ip")))
        .or_else(|| forwarded_for(headers.get("forwarded")))
}

fn first_ip(value: Option<&HeaderValue>) -> Option<String> {
    value?.to_str().ok()?.split(',').find_map(normalize_ip)
}

// RFC 7239: `Forwarded: for=192.0.2.60;proto=http, for="[2001:db8::1]:4711"`
fn forwarded_for(value: Option<&HeaderValue>) -> Option<String> {
    value?.to_str().ok()?.split(',').find_map(|entry| {
        entry.split(';').find_map(|pair| {
            let (key, value) = pair.trim().split_once('=')?;
            if key.trim().eq_ignore_ascii_case("for") {
                normalize_ip(value)
            } else {
                None
            }
        })
    })
}

fn normalize_ip(token: &str) -> Option<String> {
    let value = token.trim().trim_matches('"');
    if value.is_empty() || value.eq_ignore_ascii_case("unknown") {
        return None;
    }

    if let Some(rest) = value.strip_prefix('[') {
        let (host, _port) = rest.split_once(']')?;
        return host.parse::<IpAddr>().ok().map(|ip| ip.to_string());
    }
    if let Ok(ip) = value.parse::<IpAddr>() {
        return Some(ip.to_string());
    }
    // IPv4 with a port suffix.
    let (host, port) = value.rsplit_once(':')?;
    if host.contains('.') && !port.is_empty() && port.chars().all(|ch| ch.is_ascii_digit()) {
        return host.parse::<IpAddr>().ok().map(|ip| ip.to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use axum::http::{HeaderMap, HeaderValue};

    use super::{client_ip_from_headers, normalize_ip};

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for (name, value) in pairs {
            map.insert(*name, HeaderValue::from_static(value));
        }
        map
    }

    #[test]
    fn prefers_first_forwarded_for_hop() {
        let map = headers(&[
            ("x-forwarded-for", "unknown, 203.0.113.9, 10.0.0.1"),
            ("x-real-ip", "198.51.100.4"),
        ]);
        assert_eq!(client_ip_from_headers(&map).as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn falls_back_through_proxy_headers() {
        let map = headers(&[("cf-connecting-ip", "198.51.100.4")]);
        assert_eq!(client_ip_from_headers(&map).as_deref(), Some("198.51.100.4"));

        let map = headers(&[("forwarded", "proto=https;for=\"[2001:db8::1]:4711\"")]);
        assert_eq!(client_ip_from_headers(&map).as_deref(), Some("2001:db8::1"));

        assert_eq!(client_ip_from_headers(&HeaderMap::new()), None);
    }

    #[test]
    fn strips_ports_and_rejects_garbage() {
        assert_eq!(normalize_ip("192.0.2.1:8080").as_deref(), Some("192.0.2.1"));
        assert_eq!(normalize_ip("::1").as_deref(), Some("::1"));
        assert_eq!(normalize_ip("example.com"), None);
        assert_eq!(normalize_ip(""), None);
    }
}

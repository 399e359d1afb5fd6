//! Request extractors.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::str::FromStr;

use axum::extract::FromRequestParts;
use axum::http::header::HOST;
use axum::http::request::Parts;
use axum::http::uri::Authority;
use axum::http::{HeaderMap, Uri};

use crate::app_state::AppState;
use crate::domain::RequestContext;

impl FromRequestParts<AppState> for RequestContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(observed_context(&parts.uri, &parts.headers, state.local_addr))
    }
}

/// Derives the transport context of a request.
///
/// - scheme: the request URI's scheme when absolute, otherwise `http`
/// - host/port: the `Host` header, then the URI authority
/// - a missing port means the scheme's default port (80 or 443)
/// - with no authority at all the bound local address is used
#[must_use]
pub fn observed_context(uri: &Uri, headers: &HeaderMap, local_addr: SocketAddr) -> RequestContext {
    let scheme = uri.scheme_str().unwrap_or("http").to_string();

    let authority = headers
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| Authority::from_str(value).ok())
        .or_else(|| uri.authority().cloned());

    match authority {
        Some(authority) => {
            let port = authority
                .port_u16()
                .unwrap_or_else(|| default_port(&scheme));
            RequestContext {
                scheme,
                host: authority.host().to_string(),
                port,
            }
        }
        None => RequestContext {
            scheme,
            host: local_addr.ip().to_string(),
            port: local_addr.port(),
        },
    }
}

/// Port a client means when the authority names none.
fn default_port(scheme: &str) -> u16 {
    if scheme.eq_ignore_ascii_case("https") {
        443
    } else {
        80
    }
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn local() -> SocketAddr {
        SocketAddr::from(([10, 1, 2, 3], 9000))
    }

    fn headers(host: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(host) {
            headers.insert(HOST, value);
        }
        headers
    }

    #[test]
    fn host_header_with_port() {
        let ctx = observed_context(&Uri::from_static("/images"), &headers("host:8080"), local());
        assert_eq!(
            ctx,
            RequestContext {
                scheme: "http".to_string(),
                host: "host".to_string(),
                port: 8080,
            }
        );
    }

    #[test]
    fn host_header_without_port_uses_http_default() {
        let ctx = observed_context(&Uri::from_static("/images"), &headers("example.org"), local());
        assert_eq!(ctx.host, "example.org");
        assert_eq!(ctx.port, 80);
        assert_eq!(ctx.image_url("a.jpg"), "http://example.org:80/images/a.jpg");
    }

    #[test]
    fn https_authority_without_port_uses_443() {
        let ctx = observed_context(
            &Uri::from_static("https://secure.example/images"),
            &HeaderMap::new(),
            local(),
        );
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.port, 443);
    }

    #[test]
    fn absolute_uri_supplies_scheme_and_authority() {
        let ctx = observed_context(
            &Uri::from_static("https://secure.example:8443/images"),
            &HeaderMap::new(),
            local(),
        );
        assert_eq!(ctx.scheme, "https");
        assert_eq!(ctx.host, "secure.example");
        assert_eq!(ctx.port, 8443);
    }

    #[test]
    fn no_authority_falls_back_to_local_address() {
        let ctx = observed_context(&Uri::from_static("/images"), &HeaderMap::new(), local());
        assert_eq!(ctx.host, "10.1.2.3");
        assert_eq!(ctx.port, 9000);
    }

    #[test]
    fn ipv6_host_header_keeps_brackets() {
        let ctx = observed_context(&Uri::from_static("/images"), &headers("[::1]:8080"), local());
        assert_eq!(ctx.image_url("a.jpg"), "http://[::1]:8080/images/a.jpg");
    }
}

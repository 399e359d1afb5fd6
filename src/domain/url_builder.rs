//! Absolute image URLs derived from the caller's view of this node.
//!
//! The node does not know its public address ahead of time (dynamic ports,
//! proxies, replicas), so URLs are rebuilt on every request from the scheme,
//! host and port the request itself arrived on.

use std::fmt::Write as _;

/// Path under which images are streamed.
pub const IMAGES_PATH: &str = "/images";

/// Builds `<scheme>://<host>:<port>/images/<name>`.
///
/// `name` is percent-encoded per path segment; `/` separators are kept so
/// nested names stay nested. IPv6 literal hosts are bracketed. The result
/// is a pure function of the inputs and is not checked for reachability.
#[must_use]
pub fn build_image_url(scheme: &str, host: &str, port: u16, name: &str) -> String {
    let host = if host.contains(':') && !host.starts_with('[') {
        format!("[{host}]")
    } else {
        host.to_string()
    };
    format!("{scheme}://{host}:{port}{IMAGES_PATH}/{}", encode_path(name))
}

/// Scheme, host and port an inbound request was observed on.
///
/// Derived per request and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    /// `http` or `https`.
    pub scheme: String,
    /// Host name or address the caller used.
    pub host: String,
    /// Port the caller connected to.
    pub port: u16,
}

impl RequestContext {
    /// Absolute URL of the image `name` as seen by this caller.
    #[must_use]
    pub fn image_url(&self, name: &str) -> String {
        build_image_url(&self.scheme, &self.host, self.port, name)
    }
}

/// Percent-encodes everything except RFC 3986 unreserved characters and `/`.
fn encode_path(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for byte in name.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' => {
                out.push(char::from(byte));
            }
            _ => {
                let _ = write!(out, "%{byte:02X}");
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_plain_url() {
        assert_eq!(
            build_image_url("http", "host", 8080, "a.jpg"),
            "http://host:8080/images/a.jpg"
        );
    }

    #[test]
    fn same_inputs_same_output() {
        let a = build_image_url("https", "example.org", 443, "cats/b.jpg");
        let b = build_image_url("https", "example.org", 443, "cats/b.jpg");
        assert_eq!(a, b);
        assert!(a.starts_with("https://example.org:443/"));
        assert!(a.ends_with("/images/cats/b.jpg"));
    }

    #[test]
    fn escapes_reserved_characters_but_keeps_slashes() {
        assert_eq!(
            build_image_url("http", "h", 80, "my pics/ünï#1.jpg"),
            "http://h:80/images/my%20pics/%C3%BCn%C3%AF%231.jpg"
        );
    }

    #[test]
    fn context_echoes_its_transport() {
        let ctx = RequestContext {
            scheme: "http".to_string(),
            host: "10.0.0.7".to_string(),
            port: 31_245,
        };
        assert_eq!(ctx.image_url("b.jpg"), "http://10.0.0.7:31245/images/b.jpg");
    }

    #[test]
    fn brackets_ipv6_hosts() {
        assert_eq!(
            build_image_url("http", "::1", 8080, "a.jpg"),
            "http://[::1]:8080/images/a.jpg"
        );
        assert_eq!(
            build_image_url("http", "[::1]", 8080, "a.jpg"),
            "http://[::1]:8080/images/a.jpg"
        );
    }
}

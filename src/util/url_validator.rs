use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
}

/// Validates a URL the proxy is asked to fetch on a client's behalf.
///
/// Only `http` and `https` are accepted. Unless `allow_private` is set,
/// localhost, loopback, RFC 1918, link-local and unique-local addresses are
/// rejected so the proxy cannot be pointed at the host's internal network.
///
/// # Examples
///
/// ```
/// use gazette::util::validate_url;
///
/// let url = validate_url("https://www.autun-infos.com/news/1", false).unwrap();
/// assert_eq!(url.host_str(), Some("www.autun-infos.com"));
///
/// assert!(validate_url("http://localhost/page", false).is_err());
/// assert!(validate_url("http://localhost/page", true).is_ok());
/// assert!(validate_url("file:///etc/passwd", true).is_err());
/// ```
pub fn validate_url(url_str: &str, allow_private: bool) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if allow_private {
        return Ok(url);
    }

    if let Some(host) = url.host_str() {
        if host.eq_ignore_ascii_case("localhost") {
            return Err(UrlValidationError::Localhost);
        }

        let bare = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if let Ok(ip) = bare.parse::<IpAddr>() {
            if ip.is_loopback() {
                return Err(UrlValidationError::Localhost);
            }
            if is_private_ip(&ip) {
                return Err(UrlValidationError::PrivateIp(ip.to_string()));
            }
        }
    }

    Ok(url)
}

/// Validates a URL before handing it to the system browser.
///
/// Any public or private `http(s)` URL is fine here; other schemes
/// (`file:`, `javascript:`, custom handlers) are refused.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    validate_url(url_str, true)
}

fn is_private_ip(ip: &IpAddr) -> bool {
    // ::ffff:a.b.c.d reaches the IPv4 host a.b.c.d.
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(*ip, IpAddr::V4),
        IpAddr::V4(_) => *ip,
    };
    match ip {
        IpAddr::V4(v4) => {
            v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified()
        }
        IpAddr::V6(v6) => {
            if v6.is_loopback() || v6.is_unspecified() {
                return true;
            }
            let first = v6.segments()[0];
            // fc00::/7 unique local, fe80::/10 link local
            (first & 0xfe00) == 0xfc00 || (first & 0xffc0) == 0xfe80
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_accepted() {
        assert!(validate_url("https://www.autun-infos.com/x", false).is_ok());
        assert!(validate_url("http://example.org:8080/a?b=c", false).is_ok());
    }

    #[test]
    fn test_schemes_rejected() {
        assert!(matches!(
            validate_url("ftp://example.com", false),
            Err(UrlValidationError::UnsupportedScheme(_))
        ));
        assert!(validate_url("javascript:alert(1)", true).is_err());
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(matches!(
            validate_url("not a url", false),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_internal_hosts_rejected() {
        assert!(validate_url("http://localhost/feed", false).is_err());
        assert!(validate_url("http://127.0.0.1/feed", false).is_err());
        assert!(validate_url("http://[::1]/feed", false).is_err());
        assert!(validate_url("http://192.168.1.1/feed", false).is_err());
        assert!(validate_url("http://10.0.0.1:3000/feed", false).is_err());
        assert!(validate_url("http://169.254.1.1/feed", false).is_err());
        assert!(validate_url("http://[fe80::1]/feed", false).is_err());
        assert!(validate_url("http://0.0.0.0/feed", false).is_err());
    }

    #[test]
    fn test_ipv4_mapped_internal_hosts_rejected() {
        for url in [
            "http://[::ffff:127.0.0.1]:8080/",
            "http://[::ffff:10.0.0.1]/",
            "http://[::ffff:192.168.0.10]/",
            "http://[::ffff:169.254.169.254]/latest",
        ] {
            assert!(
                matches!(validate_url(url, false), Err(UrlValidationError::PrivateIp(_))),
                "{url}"
            );
        }
        assert!(validate_url("http://[::ffff:93.184.216.34]/", false).is_ok());
    }

    #[test]
    fn test_internal_hosts_allowed_when_configured() {
        assert!(validate_url("http://127.0.0.1:8080/feed", true).is_ok());
    }

    #[test]
    fn test_open_accepts_http_only() {
        assert!(validate_url_for_open("https://www.autun-infos.com").is_ok());
        assert!(validate_url_for_open("file:///tmp/x.html").is_err());
    }
}

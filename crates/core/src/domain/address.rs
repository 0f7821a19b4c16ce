// Reachability address normalization

use crate::constants::DEFAULT_SCHEME;

/// Prepend `http://` unless the address already starts with `[a-z]+://`
pub fn normalize_address(address: &str) -> String {
    if has_scheme(address) {
        address.to_string()
    } else {
        format!("{}{}", DEFAULT_SCHEME, address)
    }
}

fn has_scheme(address: &str) -> bool {
    match address.find("://") {
        Some(idx) if idx > 0 => address[..idx].bytes().all(|b| b.is_ascii_lowercase()),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_gets_http() {
        assert_eq!(normalize_address("example.com"), "http://example.com");
        assert_eq!(normalize_address("127.0.0.1:8080/health"), "http://127.0.0.1:8080/health");
    }

    #[test]
    fn test_existing_scheme_kept() {
        assert_eq!(normalize_address("https://example.com"), "https://example.com");
        assert_eq!(normalize_address("http://localhost:3000"), "http://localhost:3000");
    }

    #[test]
    fn test_scheme_must_be_lowercase_letters() {
        assert_eq!(normalize_address("HTTP://x"), "http://HTTP://x");
        assert_eq!(normalize_address("://x"), "http://://x");
        assert_eq!(normalize_address("h2c1://x"), "http://h2c1://x");
    }
}

//! Identity resolution seam.
//!
//! talkd never handles credentials. An upstream component authenticates the
//! caller and hands over a user id; the resolver only turns that into an
//! optional [`UserId`].

use axum::http::{HeaderMap, HeaderName};
use talk_types::{Actor, UserId};

/// Produces the acting user for a request, if any.
pub trait IdentityResolver: Send + Sync {
    fn resolve(&self, headers: &HeaderMap) -> Option<UserId>;

    fn actor(&self, headers: &HeaderMap) -> Actor {
        Actor::from_resolved(self.resolve(headers))
    }
}

/// Trusts a header set by an authenticating reverse proxy.
#[derive(Debug, Clone)]
pub struct TrustedHeaderResolver {
    header: HeaderName,
}

impl TrustedHeaderResolver {
    pub fn new(header: HeaderName) -> Self {
        Self { header }
    }

    /// Build from a configured header name.
    pub fn from_name(name: &str) -> Result<Self, axum::http::header::InvalidHeaderName> {
        Ok(Self::new(HeaderName::try_from(name.trim())?))
    }
}

impl IdentityResolver for TrustedHeaderResolver {
    fn resolve(&self, headers: &HeaderMap) -> Option<UserId> {
        let raw = headers.get(&self.header)?.to_str().ok()?;
        match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Some(UserId::new(id)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers(value: &str) -> HeaderMap {
        let mut map = HeaderMap::new();
        map.insert("x-talk-user-id", HeaderValue::from_str(value).unwrap());
        map
    }

    #[test]
    fn resolves_positive_ids_only() {
        let resolver = TrustedHeaderResolver::from_name("x-talk-user-id").unwrap();
        assert_eq!(resolver.resolve(&headers("42")), Some(UserId::new(42)));
        assert_eq!(resolver.resolve(&headers(" 7 ")), Some(UserId::new(7)));
        assert_eq!(resolver.resolve(&headers("0")), None);
        assert_eq!(resolver.resolve(&headers("-3")), None);
        assert_eq!(resolver.resolve(&headers("alice")), None);
        assert_eq!(resolver.resolve(&HeaderMap::new()), None);
        assert_eq!(resolver.actor(&HeaderMap::new()), Actor::Anonymous);
    }
}

//! URI normalization
//!
//! Launchpad hands out absolute links, but callers usually address
//! objects with short relative paths (`~user`, `/people`). Both forms are
//! turned into fully-qualified URIs rooted at the configured service.

use url::{Position, Url};

use crate::error::{LaunchpadError, Result};

/// Path prefix every web service URI lives under
pub const SERVICE_PATH: &str = "/api/devel";

/// Normalize `uri` against `base`.
///
/// Relative URIs are placed under [`SERVICE_PATH`]. URIs that already
/// carry a host keep their path. Either way the scheme, host and port of
/// the result come from `base`.
pub fn normalize(base: &Url, uri: &str) -> String {
    match Url::parse(uri) {
        Ok(absolute) if absolute.has_host() => format!(
            "{}{}",
            &base[..Position::BeforePath],
            &absolute[Position::BeforePath..]
        ),
        _ => {
            let mut path = if uri.starts_with('/') {
                uri.to_string()
            } else {
                format!("/{}", uri)
            };
            if !path.starts_with(SERVICE_PATH) {
                path = format!("{}{}", SERVICE_PATH, path);
            }
            format!("{}{}", &base[..Position::BeforePath], path)
        }
    }
}

/// Merge `params` into the query string of `uri`.
///
/// Existing pairs whose key appears in `params` are dropped, so slicing a
/// collection that was itself a slice never repeats `ws.start`.
pub fn with_query(uri: &str, params: &[(String, String)]) -> Result<String> {
    let mut url = Url::parse(uri).map_err(|source| LaunchpadError::InvalidUri {
        uri: uri.to_string(),
        source,
    })?;

    if params.is_empty() {
        return Ok(url.into());
    }

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !params.iter().any(|(name, _)| name == key))
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept.iter().chain(params.iter()));

    Ok(url.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://api.launchpad.net").unwrap()
    }

    #[test]
    fn test_relative_without_slash_gets_prefix() {
        assert_eq!(
            normalize(&base(), "~snappy-dev"),
            "https://api.launchpad.net/api/devel/~snappy-dev"
        );
    }

    #[test]
    fn test_relative_with_slash_gets_prefix() {
        assert_eq!(
            normalize(&base(), "/people"),
            "https://api.launchpad.net/api/devel/people"
        );
    }

    #[test]
    fn test_prefixed_path_is_kept() {
        assert_eq!(
            normalize(&base(), "/api/devel/+snaps"),
            "https://api.launchpad.net/api/devel/+snaps"
        );
    }

    #[test]
    fn test_relative_query_is_preserved() {
        assert_eq!(
            normalize(&base(), "people?ws.op=getByEmail"),
            "https://api.launchpad.net/api/devel/people?ws.op=getByEmail"
        );
    }

    #[test]
    fn test_foreign_host_keeps_path() {
        assert_eq!(
            normalize(&base(), "http://launchpad.example:8080/devel/~foo/+snap/bar"),
            "https://api.launchpad.net/devel/~foo/+snap/bar"
        );
    }

    #[test]
    fn test_foreign_scheme_is_replaced() {
        assert_eq!(
            normalize(&base(), "lp://example.com/devel/~x"),
            "https://api.launchpad.net/devel/~x"
        );
    }

    #[test]
    fn test_foreign_userinfo_is_dropped() {
        assert_eq!(
            normalize(&base(), "https://user:pw@evil.example/devel/~x?ws.op=y"),
            "https://api.launchpad.net/devel/~x?ws.op=y"
        );
    }

    #[test]
    fn test_base_port_is_carried() {
        let base = Url::parse("http://127.0.0.1:8085").unwrap();
        assert_eq!(
            normalize(&base, "https://api.launchpad.net/api/devel/~foo"),
            "http://127.0.0.1:8085/api/devel/~foo"
        );
        assert_eq!(
            normalize(&base, "~foo"),
            "http://127.0.0.1:8085/api/devel/~foo"
        );
    }

    #[test]
    fn test_relative_uris_always_share_base_origin() {
        for uri in ["a", "/b", "c/d", "/api/devel", "~x/+snap/y?ws.op=z"] {
            let normalized = Url::parse(&normalize(&base(), uri)).unwrap();
            assert_eq!(normalized.scheme(), "https");
            assert_eq!(normalized.host_str(), Some("api.launchpad.net"));
            assert!(normalized.path().starts_with(SERVICE_PATH), "{}", uri);
        }
    }

    #[test]
    fn test_with_query_appends() {
        let uri = with_query(
            "https://api.launchpad.net/api/devel/people",
            &[
                ("ws.op".to_string(), "getByEmail".to_string()),
                ("email".to_string(), "foo@example.com".to_string()),
            ],
        )
        .unwrap();
        assert_eq!(
            uri,
            "https://api.launchpad.net/api/devel/people?ws.op=getByEmail&email=foo%40example.com"
        );
    }

    #[test]
    fn test_with_query_replaces_existing_keys() {
        let uri = with_query(
            "https://api.launchpad.net/api/devel/+snaps?ws.op=findByOwner&ws.start=0&ws.size=50",
            &[
                ("ws.start".to_string(), "50".to_string()),
                ("ws.size".to_string(), "25".to_string()),
            ],
        )
        .unwrap();
        let url = Url::parse(&uri).unwrap();
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(
            pairs,
            vec![
                ("ws.op".to_string(), "findByOwner".to_string()),
                ("ws.start".to_string(), "50".to_string()),
                ("ws.size".to_string(), "25".to_string()),
            ]
        );
    }

    #[test]
    fn test_with_query_no_params_is_identity() {
        let uri = "https://api.launchpad.net/api/devel/~foo";
        assert_eq!(with_query(uri, &[]).unwrap(), uri);
    }

    #[test]
    fn test_with_query_rejects_relative() {
        let err = with_query("~foo", &[]).unwrap_err();
        assert!(matches!(err, LaunchpadError::InvalidUri { .. }));
    }
}

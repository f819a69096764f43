//! The `author` cookie, which remembers the last author label.

use axum::http::header::COOKIE;
use axum::http::HeaderMap;
use chrono::{DateTime, Duration, Months, Utc};

use percent_encoding::{percent_decode_str, utf8_percent_encode, NON_ALPHANUMERIC};

pub const AUTHOR_COOKIE: &str = "author";

/// Value of the `author` cookie, if the request carries a non-empty one.
pub fn read_author(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|header| header.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == AUTHOR_COOKIE)
        .map(|(_, value)| percent_decode_str(value.trim_matches('"')).decode_utf8_lossy().into_owned())
        .filter(|value| !value.is_empty())
}

/// `Set-Cookie` value persisting `author` for one year from `now`.
pub fn author_cookie(author: &str, basepath: &str, now: DateTime<Utc>) -> String {
    let expires = now
        .checked_add_months(Months::new(12))
        .unwrap_or_else(|| now + Duration::days(365));
    let path = if basepath.is_empty() { "/" } else { basepath };
    format!(
        "{AUTHOR_COOKIE}={}; Path={path}; Expires={}; Max-Age={}; SameSite=Lax",
        utf8_percent_encode(author, NON_ALPHANUMERIC),
        expires.format("%a, %d %b %Y %H:%M:%S GMT"),
        (expires - now).num_seconds(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;
    use chrono::TimeZone;

    fn headers(cookies: &[&str]) -> HeaderMap {
        let mut map = HeaderMap::new();
        for c in cookies {
            map.append(COOKIE, HeaderValue::from_str(c).unwrap());
        }
        map
    }

    #[test]
    fn reads_author_among_others() {
        assert_eq!(read_author(&headers(&["theme=dark; author=Jane%20Doe"])).as_deref(), Some("Jane Doe"));
        assert_eq!(read_author(&headers(&["theme=dark", "author=bob"])).as_deref(), Some("bob"));
    }

    #[test]
    fn missing_or_empty_author() {
        assert_eq!(read_author(&HeaderMap::new()), None);
        assert_eq!(read_author(&headers(&["author="])), None);
        assert_eq!(read_author(&headers(&["coauthor=x"])), None);
    }

    #[test]
    fn cookie_lasts_a_year() {
        let now = Utc.with_ymd_and_hms(2024, 3, 1, 8, 30, 0).unwrap();
        let cookie = author_cookie("Jane Doe", "", now);
        assert_eq!(
            cookie,
            "author=Jane%20Doe; Path=/; Expires=Sat, 01 Mar 2025 08:30:00 GMT; Max-Age=31536000; SameSite=Lax"
        );
    }

    #[test]
    fn cookie_value_reads_back() {
        let set = author_cookie("Zoë; admin=1", "", Utc::now());
        let (pair, _) = set.split_once(';').unwrap();
        assert!(!pair.contains(' '));
        assert_eq!(read_author(&headers(&[pair])).as_deref(), Some("Zoë; admin=1"));
    }

    #[test]
    fn cookie_scoped_to_basepath() {
        let cookie = author_cookie("alice", "/wiki", Utc::now());
        assert!(cookie.contains("; Path=/wiki;"));
    }
}

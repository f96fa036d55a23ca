//! Property-ID extraction from vendor links.
//!
//! Each strategy is a pure `&Url -> Option<PropertyId>` function. They run in
//! a fixed order and the first hit wins, regardless of where the matching
//! parameter sits in the query string.

use crate::models::PropertyId;
use tracing::{debug, warn};
use url::Url;

/// Direct hotel-ID key used by partner search links
const HOTEL_ID_KEY: &str = "hid";
const SELECTED_PROPERTY_KEY: &str = "selectedproperty";
/// Matched case-insensitively
const ALIAS_KEYS: &[&str] = &["hotelId", "hotel_id", "propertyId", "hotelid"];
const PATH_MARKER: &str = "hotel";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved { id: PropertyId, strategy: &'static str },
    Unresolved { url: String },
}

impl Resolution {
    pub fn id(&self) -> Option<PropertyId> {
        match self {
            Self::Resolved { id, .. } => Some(*id),
            Self::Unresolved { .. } => None,
        }
    }
}

type Strategy = fn(&Url) -> Option<PropertyId>;

const STRATEGIES: &[(&str, Strategy)] = &[
    ("hid parameter", by_hotel_id_param),
    ("selectedproperty parameter", by_selected_property_param),
    ("hotel path segment", by_path_segment),
    ("alias parameter", by_alias_param),
    ("hotelid pattern", by_inline_pattern),
];

/// Resolves the property ID of a vendor link. Never fails: malformed or
/// unrecognised URLs come back as [`Resolution::Unresolved`].
pub fn resolve(raw_url: &str) -> Resolution {
    let unresolved = || Resolution::Unresolved {
        url: raw_url.to_string(),
    };

    let Ok(url) = Url::parse(raw_url.trim()) else {
        warn!("Could not parse URL: {}", raw_url);
        return unresolved();
    };

    for (strategy, extract) in STRATEGIES {
        if let Some(id) = extract(&url) {
            debug!("Extracted property ID {} from {}", id, strategy);
            return Resolution::Resolved { id, strategy: *strategy };
        }
    }

    warn!("Could not extract property ID from URL: {}", raw_url);
    unresolved()
}

/// Accepts only plain ASCII digits with a value above zero
pub fn parse_positive_id(token: &str) -> Option<PropertyId> {
    if token.is_empty() || !token.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    match token.parse::<u64>() {
        Ok(0) | Err(_) => None,
        Ok(n) => Some(PropertyId(n)),
    }
}

fn first_param<F>(url: &Url, key_matches: F) -> Option<PropertyId>
where
    F: Fn(&str) -> bool,
{
    url.query_pairs()
        .filter(|(key, _)| key_matches(&**key))
        .find_map(|(_, value)| parse_positive_id(&value))
}

fn by_hotel_id_param(url: &Url) -> Option<PropertyId> {
    first_param(url, |key| key == HOTEL_ID_KEY)
}

fn by_selected_property_param(url: &Url) -> Option<PropertyId> {
    first_param(url, |key| key == SELECTED_PROPERTY_KEY)
}

fn by_path_segment(url: &Url) -> Option<PropertyId> {
    let segments: Vec<&str> = url.path_segments()?.collect();
    segments
        .windows(2)
        .filter(|pair| pair[0].eq_ignore_ascii_case(PATH_MARKER))
        .find_map(|pair| parse_positive_id(pair[1]))
}

fn by_alias_param(url: &Url) -> Option<PropertyId> {
    first_param(url, |key| ALIAS_KEYS.iter().any(|alias| alias.eq_ignore_ascii_case(key)))
}

/// `hotelid=123` or `hotelid:123` anywhere in the URL, e.g. inside a fragment
/// or an encoded redirect target
fn by_inline_pattern(url: &Url) -> Option<PropertyId> {
    let text = url.as_str().to_ascii_lowercase();
    let marker = "hotelid";

    text.match_indices(marker).find_map(|(pos, _)| {
        let rest = &text[pos + marker.len()..];
        let rest = rest.strip_prefix('=').or_else(|| rest.strip_prefix(':'))?;
        let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
        parse_positive_id(&digits)
    })
}

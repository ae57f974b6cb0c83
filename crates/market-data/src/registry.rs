//! Fixed registry of known index tokens.
//!
//! Token -> (exchange, display name) for the indices shown on the dashboard
//! boards. Tokens that are not in this registry are dropped from quote
//! mappings rather than surfaced as errors.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Exchange plus display name for a known index token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexInfo {
    pub exchange: &'static str,
    pub name: &'static str,
}

lazy_static! {
    /// Known index tokens, keyed by the upstream symbol token.
    pub static ref INDEX_REGISTRY: HashMap<&'static str, IndexInfo> = {
        let mut m = HashMap::new();
        m.insert(
            "99926000",
            IndexInfo { exchange: "NSE", name: "NIFTY 50" },
        );
        m.insert(
            "99926009",
            IndexInfo { exchange: "NSE", name: "BANK NIFTY" },
        );
        m.insert(
            "99919000",
            IndexInfo { exchange: "BSE", name: "SENSEX" },
        );
        m
    };
}

/// Resolve a symbol token to its display name, if known.
pub fn index_name(token: &str) -> Option<&'static str> {
    INDEX_REGISTRY.get(token).map(|info| info.name)
}

/// All registered index tokens.
pub fn all_index_tokens() -> Vec<&'static str> {
    let mut tokens: Vec<&'static str> = INDEX_REGISTRY.keys().copied().collect();
    tokens.sort_unstable();
    tokens
}

/// Group the given tokens by exchange, dropping unrecognized ones.
///
/// The result matches the `exchangeTokens` shape of the quote endpoint:
/// `{"NSE": ["99926000", ...], "BSE": [...]}`.
pub fn group_by_exchange<'a, I>(tokens: I) -> HashMap<&'static str, Vec<String>>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut grouped: HashMap<&'static str, Vec<String>> = HashMap::new();
    for token in tokens {
        if let Some(info) = INDEX_REGISTRY.get(token) {
            grouped
                .entry(info.exchange)
                .or_default()
                .push(token.to_string());
        }
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tokens_resolve() {
        assert_eq!(index_name("99926000"), Some("NIFTY 50"));
        assert_eq!(index_name("99926009"), Some("BANK NIFTY"));
        assert_eq!(index_name("99919000"), Some("SENSEX"));
        assert_eq!(index_name("12345"), None);
    }

    #[test]
    fn grouping_drops_unrecognized_tokens() {
        let grouped = group_by_exchange(["99926000", "99919000", "bogus"]);
        assert_eq!(grouped["NSE"], vec!["99926000".to_string()]);
        assert_eq!(grouped["BSE"], vec!["99919000".to_string()]);
        assert_eq!(grouped.len(), 2);
    }
}

//! Deterministic replacement of sensitive values.
//!
//! Placeholders are assigned from per-kind tables in first-seen order, so the
//! same input text always scrubs to the same output: repeated values share one
//! placeholder, and re-running on the same file is diff-stable. Addresses map
//! into documentation ranges (203.0.113.0/24, 2001:db8::/32) with any prefix
//! length preserved; AS numbers map into the private 32-bit range.

use std::collections::HashMap;

use crate::tokens::TokenKind;

#[derive(Debug, Default)]
pub struct Anonymizer {
    users: HashMap<String, String>,
    secrets: HashMap<String, String>,
    asns: HashMap<String, String>,
    addrs_v4: HashMap<String, String>,
    addrs_v6: HashMap<String, String>,
}

impl Anonymizer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The stable placeholder for `original`, or `None` for kinds that are
    /// recorded but never rewritten (interface names, unclassifiable spans).
    pub fn placeholder(&mut self, kind: TokenKind, original: &str) -> Option<String> {
        match kind {
            TokenKind::Username => Some(assign(&mut self.users, original, |n| format!("user{n}"))),
            TokenKind::Secret => Some(assign(&mut self.secrets, original, |n| {
                format!("scrambled{n}")
            })),
            TokenKind::Asn => Some(assign(&mut self.asns, original, |n| {
                (4_200_000_000_u64 + n as u64).to_string()
            })),
            TokenKind::Address => Some(self.address_placeholder(original)),
            TokenKind::Interface | TokenKind::Literal => None,
        }
    }

    fn address_placeholder(&mut self, original: &str) -> String {
        let (addr, mask) = match original.split_once('/') {
            Some((addr, mask)) => (addr, Some(mask)),
            None => (original, None),
        };
        let replacement = if addr.contains(':') {
            assign(&mut self.addrs_v6, addr, |n| format!("2001:db8::{n:x}"))
        } else {
            assign(&mut self.addrs_v4, addr, |n| format!("203.0.113.{n}"))
        };
        match mask {
            Some(mask) => format!("{replacement}/{mask}"),
            None => replacement,
        }
    }
}

fn assign(
    table: &mut HashMap<String, String>,
    original: &str,
    make: impl FnOnce(usize) -> String,
) -> String {
    if let Some(existing) = table.get(original) {
        return existing.clone();
    }
    let placeholder = make(table.len() + 1);
    table.insert(original.to_string(), placeholder.clone());
    placeholder
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repeated_values_share_a_placeholder() {
        let mut tool = Anonymizer::new();
        let first = tool.placeholder(TokenKind::Secret, "hunter2").unwrap();
        let second = tool.placeholder(TokenKind::Secret, "hunter2").unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "scrambled1");
    }

    #[test]
    fn distinct_values_get_distinct_placeholders() {
        let mut tool = Anonymizer::new();
        let a = tool.placeholder(TokenKind::Username, "admin").unwrap();
        let b = tool.placeholder(TokenKind::Username, "ops").unwrap();
        assert_eq!(a, "user1");
        assert_eq!(b, "user2");
    }

    #[test]
    fn addresses_keep_their_prefix_length() {
        let mut tool = Anonymizer::new();
        assert_eq!(
            tool.placeholder(TokenKind::Address, "10.0.0.1/24").unwrap(),
            "203.0.113.1/24"
        );
        assert_eq!(
            tool.placeholder(TokenKind::Address, "10.0.0.1").unwrap(),
            "203.0.113.1"
        );
        assert_eq!(
            tool.placeholder(TokenKind::Address, "2001:4860::8888").unwrap(),
            "2001:db8::1"
        );
    }

    #[test]
    fn asns_land_in_the_private_range() {
        let mut tool = Anonymizer::new();
        assert_eq!(tool.placeholder(TokenKind::Asn, "65000").unwrap(), "4200000001");
        assert_eq!(tool.placeholder(TokenKind::Asn, "65001").unwrap(), "4200000002");
    }

    #[test]
    fn interface_names_are_never_rewritten() {
        let mut tool = Anonymizer::new();
        assert!(tool.placeholder(TokenKind::Interface, "ge-0/0/0").is_none());
    }
}

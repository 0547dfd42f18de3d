//! Entity-id classification.
//!
//! Gateway identifiers are opaque tokens whose leading character encodes
//! the entity kind: `U123ABC` is a user, `C123ABC` a channel, and so on.

use std::fmt;

/// Entity kinds distinguishable from an identifier's leading character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    User,
    Channel,
    Group,
    Direct,
    Team,
    Bot,
    /// Empty token or unrecognized classifier.
    Unknown,
}

/// Fixed classifier table.
const CLASSIFIERS: [(char, EntityKind); 6] = [
    ('U', EntityKind::User),
    ('C', EntityKind::Channel),
    ('G', EntityKind::Group),
    ('D', EntityKind::Direct),
    ('T', EntityKind::Team),
    ('B', EntityKind::Bot),
];

impl EntityKind {
    /// Leading character used on the wire for this kind, if any.
    #[must_use]
    pub fn classifier(self) -> Option<char> {
        CLASSIFIERS
            .iter()
            .find(|(_, kind)| *kind == self)
            .map(|(c, _)| *c)
    }
}

/// Classify an identifier token by its leading character.
///
/// Returns the kind together with the remainder of the token after the
/// classifier character. The classifier is matched case-insensitively; an
/// empty token classifies as `Unknown` with an empty remainder, and an
/// unrecognized leading character classifies as `Unknown` while still
/// consuming that character.
#[must_use]
pub fn classify(token: &str) -> (EntityKind, &str) {
    let mut chars = token.chars();
    match chars.next() {
        None => (EntityKind::Unknown, ""),
        Some(c) => {
            let classifier = c.to_ascii_uppercase();
            let kind = CLASSIFIERS
                .iter()
                .find(|(ch, _)| *ch == classifier)
                .map_or(EntityKind::Unknown, |(_, kind)| *kind);
            (kind, chars.as_str())
        }
    }
}

/// An identifier token split into kind and remainder.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ParsedId {
    pub kind: EntityKind,
    pub id: String,
}

impl ParsedId {
    /// Parse a full identifier token.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        let (kind, id) = classify(token);
        Self {
            kind,
            id: id.to_string(),
        }
    }
}

impl fmt::Display for ParsedId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind.classifier() {
            Some(c) => write!(f, "{}{}", c, self.id),
            None => write!(f, "{}", self.id),
        }
    }
}

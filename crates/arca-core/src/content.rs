//! # Content Identity
//!
//! Defines [`ContentId`], [`ContentKey`], and [`ContentSet`].
//!
//! A content identifier is self-describing: it carries a version, a codec,
//! and a multihash. The same bytes can therefore be named by several
//! distinct identifiers (a CIDv0 and a CIDv1 of the same multihash, or one
//! CIDv1 rendered in two different multibases). Two identifiers are
//! *content-equivalent* iff their multihashes are identical.
//!
//! ## Identity Invariant
//!
//! Every deduplication and presence decision in the workspace compares
//! [`ContentKey`]s, never identifier strings. A [`ContentKey`] can only be
//! obtained from a parsed [`ContentId`], so a key always reflects the hash
//! payload rather than the serialization it arrived in.

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use cid::Cid;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ContentIdError;

/// A parsed content identifier.
///
/// Serializes as its canonical string form (base58btc for CIDv0, base32 for
/// CIDv1), which is also what [`fmt::Display`] produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentId(Cid);

impl ContentId {
    /// Parse a content identifier from its external string form.
    ///
    /// Surrounding whitespace is ignored; anything else that is not a valid
    /// CID is rejected with [`ContentIdError::Malformed`].
    pub fn parse(raw: &str) -> Result<Self, ContentIdError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ContentIdError::Empty);
        }
        Cid::from_str(trimmed)
            .map(Self)
            .map_err(|e| ContentIdError::Malformed {
                input: raw.to_string(),
                reason: e.to_string(),
            })
    }

    /// Wrap an already-parsed [`Cid`].
    pub fn from_cid(cid: Cid) -> Self {
        Self(cid)
    }

    /// Access the underlying [`Cid`].
    pub fn as_cid(&self) -> &Cid {
        &self.0
    }

    /// The canonical deduplication key for this identifier.
    ///
    /// Stable across process runs: it depends only on the multihash bytes.
    pub fn key(&self) -> ContentKey {
        ContentKey::from_hash_bytes(&self.0.hash().to_bytes())
    }

    /// Whether `other` names the same bytes as `self`.
    pub fn is_equivalent(&self, other: &ContentId) -> bool {
        self.0.hash() == other.0.hash()
    }
}

/// Derive the canonical key of a content identifier.
///
/// Free-function form of [`ContentId::key`].
pub fn canonical_key(id: &ContentId) -> ContentKey {
    id.key()
}

impl fmt::Display for ContentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ContentId {
    type Err = ContentIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<Cid> for ContentId {
    fn from(cid: Cid) -> Self {
        Self(cid)
    }
}

impl Serialize for ContentId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ContentId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}

/// The version-independent identity of a piece of content.
///
/// Lowercase hex of the multihash bytes (hash function code, digest length,
/// digest). Codec and CID version are deliberately excluded.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ContentKey(String);

impl ContentKey {
    fn from_hash_bytes(bytes: &[u8]) -> Self {
        Self(bytes.iter().map(|b| format!("{b:02x}")).collect())
    }

    /// The key as a hex string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A set of [`ContentKey`]s.
///
/// Represents content already known to exist at a destination, or content
/// already counted locally. Insertion is idempotent and membership is exact.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContentSet {
    keys: HashSet<ContentKey>,
}

impl ContentSet {
    /// Create an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a key. Returns `true` if the key was not already present.
    pub fn insert(&mut self, key: ContentKey) -> bool {
        self.keys.insert(key)
    }

    /// Insert the key of a content identifier.
    pub fn insert_id(&mut self, id: &ContentId) -> bool {
        self.keys.insert(id.key())
    }

    /// Whether the set contains `key`.
    pub fn contains(&self, key: &ContentKey) -> bool {
        self.keys.contains(key)
    }

    /// Whether the set contains content equivalent to `id`.
    pub fn contains_id(&self, id: &ContentId) -> bool {
        self.keys.contains(&id.key())
    }

    /// Number of distinct keys.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterate over the keys in unspecified order.
    pub fn iter(&self) -> impl Iterator<Item = &ContentKey> {
        self.keys.iter()
    }
}

impl Extend<ContentKey> for ContentSet {
    fn extend<I: IntoIterator<Item = ContentKey>>(&mut self, iter: I) {
        self.keys.extend(iter);
    }
}

impl FromIterator<ContentKey> for ContentSet {
    fn from_iter<I: IntoIterator<Item = ContentKey>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<'a> FromIterator<&'a ContentId> for ContentSet {
    fn from_iter<I: IntoIterator<Item = &'a ContentId>>(iter: I) -> Self {
        iter.into_iter().map(ContentId::key).collect()
    }
}

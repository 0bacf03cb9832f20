//! Entity id codecs.
//!
//! The offline pipeline assigns every known user and anime a dense row index
//! into its embedding matrix. [`EntityCodec`] holds that mapping in both
//! directions: `encode` takes an external id to its row index, `decode` takes
//! a row index back to the external id. The two id spaces are disjoint and
//! carried as distinct newtypes ([`UserId`], [`AnimeId`]) so they can never be
//! mixed up at a call site.

use std::fmt;
use std::hash::Hash;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// External user identifier as produced by the upstream ratings source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for UserId {
    fn from(value: u32) -> Self {
        UserId(value)
    }
}

/// External anime identifier (MAL id) as carried by the metadata tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnimeId(pub u32);

impl fmt::Display for AnimeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for AnimeId {
    fn from(value: u32) -> Self {
        AnimeId(value)
    }
}

/// Which id space a codec covers. Used for error reporting only; type-level
/// separation is done by the id newtypes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Domain {
    User,
    Anime,
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::User => write!(f, "user"),
            Domain::Anime => write!(f, "anime"),
        }
    }
}

/// Errors raised while building a codec from a serialized mapping.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("{domain} codec: mapping is empty")]
    Empty { domain: Domain },
    #[error("{domain} codec: index {index} out of range for {len} entries")]
    IndexOutOfRange {
        domain: Domain,
        index: usize,
        len: usize,
    },
    #[error("{domain} codec: index {index} assigned to more than one id")]
    DuplicateIndex { domain: Domain, index: usize },
}

/// Bidirectional id ↔ dense-index lookup for one id space.
///
/// The forward map is injective and its inverse is total over `[0, len)`;
/// both properties are checked at construction so lookups never fail for any
/// index the embedding matrix can produce.
#[derive(Debug, Clone)]
pub struct EntityCodec<I> {
    domain: Domain,
    forward: HashMap<I, usize>,
    inverse: Vec<I>,
}

impl<I: Copy + Eq + Hash> EntityCodec<I> {
    /// Build a codec from `(id, index)` pairs, validating that indices are
    /// dense in `[0, len)` and that no index is assigned twice.
    pub fn from_pairs(
        domain: Domain,
        pairs: impl IntoIterator<Item = (I, usize)>,
    ) -> Result<Self, CodecError> {
        let forward: HashMap<I, usize> = pairs.into_iter().collect();
        if forward.is_empty() {
            return Err(CodecError::Empty { domain });
        }

        let len = forward.len();
        let mut slots: Vec<Option<I>> = vec![None; len];
        for (&id, &index) in &forward {
            let slot = slots
                .get_mut(index)
                .ok_or(CodecError::IndexOutOfRange { domain, index, len })?;
            if slot.replace(id).is_some() {
                return Err(CodecError::DuplicateIndex { domain, index });
            }
        }

        // len distinct indices in [0, len) fill every slot.
        let inverse: Vec<I> = slots.into_iter().flatten().collect();
        debug_assert_eq!(inverse.len(), len);

        Ok(Self {
            domain,
            forward,
            inverse,
        })
    }

    /// Row index for an external id, or `None` if the id is unknown.
    pub fn encode(&self, id: I) -> Option<usize> {
        self.forward.get(&id).copied()
    }

    /// External id for a row index, or `None` if the index is out of range.
    pub fn decode(&self, index: usize) -> Option<I> {
        self.inverse.get(index).copied()
    }

    pub fn domain(&self) -> Domain {
        self.domain
    }

    /// Number of entities known to this codec.
    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }
}

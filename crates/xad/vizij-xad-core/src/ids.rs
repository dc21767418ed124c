//! Identifiers for records inside a single document.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position of an object record inside one namespace arena.
/// Only meaningful for the document it came from; never persisted as identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ObjectIndex(pub u32);

impl ObjectIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for ObjectIndex {
    fn from(value: usize) -> Self {
        ObjectIndex(value as u32)
    }
}

impl fmt::Display for ObjectIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Position of a key inside an attribute curve.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct KeyIndex(pub u32);

impl KeyIndex {
    #[inline]
    pub fn get(self) -> usize {
        self.0 as usize
    }
}

impl From<usize> for KeyIndex {
    fn from(value: usize) -> Self {
        KeyIndex(value as u32)
    }
}

impl fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

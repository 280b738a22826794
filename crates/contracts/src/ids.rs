//! ProxyId - identity of a tick-reporting node

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a node that reports time ticks.
///
/// Assigned by the membership layer from a dense 64-bit space. The
/// coordinator itself holds an id from the same space and participates in
/// the tick table as an ordinary proxy.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProxyId(u64);

impl ProxyId {
    /// Create a ProxyId from its raw value.
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the raw 64-bit value.
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl From<u64> for ProxyId {
    #[inline]
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for ProxyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProxyId({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_round_trip() {
        let id = ProxyId::new(42);
        assert_eq!(id.as_u64(), 42);
        assert_eq!(ProxyId::from(42), id);
    }

    #[test]
    fn test_hashmap_key() {
        let mut map: HashMap<ProxyId, &str> = HashMap::new();
        map.insert(ProxyId::new(1), "coordinator");
        assert_eq!(map.get(&ProxyId::new(1)), Some(&"coordinator"));
    }
}

//! Tracking of which Pokemon the player has revealed in which location
//!
//! Discoveries are kept in two forward indices (location → Pokemon and
//! Pokemon → location) updated incrementally on every new mark, so
//! per-location queries never scan the whole set.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Nested `location → pokemon → true` shape used in the save file
pub type DiscoveryMap = BTreeMap<String, BTreeMap<String, bool>>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Indices {
    by_location: HashMap<String, BTreeSet<String>>,
    by_pokemon: HashMap<String, BTreeSet<String>>,
    pairs: usize,
}

impl Indices {
    fn insert(&mut self, location: &str, pokemon: &str) -> bool {
        let added = self
            .by_location
            .entry(location.to_string())
            .or_default()
            .insert(pokemon.to_string());
        if added {
            self.by_pokemon
                .entry(pokemon.to_string())
                .or_default()
                .insert(location.to_string());
            self.pairs += 1;
        }
        added
    }
}

/// Thread-safe set of `(location, pokemon)` discoveries
///
/// A pair, once marked, is never removed.
#[derive(Debug, Default)]
pub struct DiscoveryTracker {
    indices: RwLock<Indices>,
}

impl DiscoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, Indices> {
        self.indices.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Indices> {
        self.indices.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Records that `pokemon` was found in `location`
    ///
    /// Returns `true` if the pair was new. Marking an existing pair is a no-op.
    pub fn mark_discovered(&self, location: &str, pokemon: &str) -> bool {
        self.write().insert(location, pokemon)
    }

    pub fn is_discovered(&self, location: &str, pokemon: &str) -> bool {
        self.read()
            .by_location
            .get(location)
            .is_some_and(|found| found.contains(pokemon))
    }

    /// Pokemon discovered in `location`, sorted by name
    pub fn discovered_in_location(&self, location: &str) -> Vec<String> {
        self.read()
            .by_location
            .get(location)
            .map(|found| found.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn count_discovered_in_location(&self, location: &str) -> usize {
        self.read()
            .by_location
            .get(location)
            .map_or(0, BTreeSet::len)
    }

    /// Number of distinct Pokemon discovered anywhere
    pub fn total_unique_creatures_discovered(&self) -> usize {
        self.read().by_pokemon.len()
    }

    /// Locations where `pokemon` has been discovered, sorted by name
    pub fn locations_with_creature(&self, pokemon: &str) -> Vec<String> {
        self.read()
            .by_pokemon
            .get(pokemon)
            .map(|found| found.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Number of `(location, pokemon)` pairs recorded
    pub fn total_discoveries(&self) -> usize {
        self.read().pairs
    }

    pub fn is_empty(&self) -> bool {
        self.total_discoveries() == 0
    }

    /// Nested map form used for serialization
    pub fn to_map(&self) -> DiscoveryMap {
        self.read()
            .by_location
            .iter()
            .map(|(location, found)| {
                let inner = found.iter().map(|name| (name.clone(), true)).collect();
                (location.clone(), inner)
            })
            .collect()
    }

    /// Rebuilds a tracker from the nested map form; `false` entries are skipped
    pub fn from_map(map: &DiscoveryMap) -> Self {
        let mut indices = Indices::default();
        for (location, found) in map {
            for (pokemon, discovered) in found {
                if *discovered {
                    indices.insert(location, pokemon);
                }
            }
        }
        Self {
            indices: RwLock::new(indices),
        }
    }
}

impl Clone for DiscoveryTracker {
    fn clone(&self) -> Self {
        Self {
            indices: RwLock::new(self.read().clone()),
        }
    }
}

impl PartialEq for DiscoveryTracker {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        *self.read() == *other.read()
    }
}

impl Eq for DiscoveryTracker {}

impl Serialize for DiscoveryTracker {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for DiscoveryTracker {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let map = DiscoveryMap::deserialize(deserializer)?;
        Ok(Self::from_map(&map))
    }
}

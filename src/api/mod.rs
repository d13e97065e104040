//! PokeAPI record shapes and client
//!
//! One canonical record type per remote resource. Unknown fields in API
//! responses are ignored; only what the game needs is decoded.

pub mod client;
pub mod transport;

pub use client::{PageOutcome, PokeApiClient, DEFAULT_BASE_URL, DEFAULT_TIMEOUT};
pub use transport::{HttpTransport, Transport};

use serde::{Deserialize, Serialize};

/// A `{ name, url }` reference to another API resource
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedResource {
    pub name: String,
    #[serde(default)]
    pub url: String,
}

impl NamedResource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

/// One page of the `/location-area` listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationPage {
    #[serde(default)]
    pub count: u32,
    /// Absolute URL of the following page, `None` on the last page
    pub next: Option<String>,
    /// Absolute URL of the preceding page, `None` on the first page
    pub previous: Option<String>,
    pub results: Vec<NamedResource>,
}

/// Detail of a single location area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationArea {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    /// The location this area belongs to; discoveries are keyed by it
    pub location: NamedResource,
    #[serde(default)]
    pub pokemon_encounters: Vec<Encounter>,
}

impl LocationArea {
    /// Names of every Pokemon that can be encountered here, in API order
    pub fn encounter_names(&self) -> Vec<String> {
        self.pokemon_encounters
            .iter()
            .map(|encounter| encounter.pokemon.name.clone())
            .collect()
    }
}

/// A Pokemon that can be encountered in an area
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Encounter {
    pub pokemon: NamedResource,
}

/// A Pokemon as returned by `/pokemon/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pokemon {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub height: u32,
    #[serde(default)]
    pub weight: u32,
    /// Null upstream for some special forms
    #[serde(default)]
    pub base_experience: Option<u32>,
    #[serde(default)]
    pub stats: Vec<StatEntry>,
    #[serde(default)]
    pub types: Vec<TypeSlot>,
    #[serde(default)]
    pub species: NamedResource,
}

impl Pokemon {
    /// Base value of the named stat (e.g. `"hp"`, `"special-attack"`)
    pub fn base_stat(&self, name: &str) -> Option<u32> {
        self.stats
            .iter()
            .find(|entry| entry.stat.name == name)
            .map(|entry| entry.base_stat)
    }

    /// Type names in slot order
    pub fn type_names(&self) -> Vec<&str> {
        let mut slots: Vec<&TypeSlot> = self.types.iter().collect();
        slots.sort_by_key(|slot| slot.slot);
        slots.into_iter().map(|slot| slot.kind.name.as_str()).collect()
    }

    /// Species name, falling back to the Pokemon name when the reference is absent
    pub fn species_name(&self) -> &str {
        if self.species.name.is_empty() {
            &self.name
        } else {
            &self.species.name
        }
    }
}

/// A base stat value
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatEntry {
    pub base_stat: u32,
    #[serde(default)]
    pub effort: u32,
    pub stat: NamedResource,
}

/// A type in a given slot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeSlot {
    pub slot: u32,
    #[serde(rename = "type")]
    pub kind: NamedResource,
}

/// A species as returned by `/pokemon-species/{name}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Species {
    #[serde(default)]
    pub id: u32,
    pub name: String,
    /// Capture difficulty from 0 (impossible) to 255 (trivial)
    pub capture_rate: u32,
    #[serde(default)]
    pub is_legendary: bool,
}

/// Which way to move through the location listing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageDirection {
    Next,
    Previous,
}

/// Pagination cursors for the location listing, owned by the caller
///
/// A fresh state points at the first page going forward and has nothing
/// behind it. After each page the cursors are replaced with that page's
/// `next`/`previous` URLs verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PaginationState {
    next: Option<String>,
    previous: Option<String>,
    started: bool,
}

impl PaginationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cursor state after `page` has been shown
    pub fn after(page: &LocationPage) -> Self {
        Self {
            next: page.next.clone(),
            previous: page.previous.clone(),
            started: true,
        }
    }

    /// Resolves the cursor to follow in `direction`
    ///
    /// Returns `Some(None)` for "the first page" (no cursor yet), `Some(Some(url))`
    /// for a stored cursor and `None` when that end of the listing was reached.
    pub fn cursor(&self, direction: PageDirection) -> Option<Option<&str>> {
        match (direction, self.started) {
            (PageDirection::Next, false) => Some(None),
            (PageDirection::Previous, false) => None,
            (PageDirection::Next, true) => self.next.as_deref().map(Some),
            (PageDirection::Previous, true) => self.previous.as_deref().map(Some),
        }
    }

    pub fn next(&self) -> Option<&str> {
        self.next.as_deref()
    }

    pub fn previous(&self) -> Option<&str> {
        self.previous.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PIKACHU: &str = r#"{
        "id": 25,
        "name": "pikachu",
        "height": 4,
        "weight": 60,
        "base_experience": 112,
        "order": 35,
        "is_default": true,
        "stats": [
            {"base_stat": 35, "effort": 0, "stat": {"name": "hp", "url": "https://pokeapi.co/api/v2/stat/1/"}},
            {"base_stat": 55, "effort": 0, "stat": {"name": "attack", "url": "https://pokeapi.co/api/v2/stat/2/"}},
            {"base_stat": 90, "effort": 2, "stat": {"name": "speed", "url": "https://pokeapi.co/api/v2/stat/6/"}}
        ],
        "types": [
            {"slot": 1, "type": {"name": "electric", "url": "https://pokeapi.co/api/v2/type/13/"}}
        ],
        "species": {"name": "pikachu", "url": "https://pokeapi.co/api/v2/pokemon-species/25/"}
    }"#;

    #[test]
    fn test_parse_pokemon_ignores_unknown_fields() {
        let pokemon: Pokemon = serde_json::from_str(PIKACHU).expect("valid pokemon");
        assert_eq!(pokemon.id, 25);
        assert_eq!(pokemon.base_experience, Some(112));
        assert_eq!(pokemon.base_stat("hp"), Some(35));
        assert_eq!(pokemon.base_stat("defense"), None);
        assert_eq!(pokemon.type_names(), vec!["electric"]);
        assert_eq!(pokemon.species_name(), "pikachu");
    }

    #[test]
    fn test_type_names_follow_slot_order() {
        let pokemon = Pokemon {
            types: vec![
                TypeSlot {
                    slot: 2,
                    kind: NamedResource::new("poison", ""),
                },
                TypeSlot {
                    slot: 1,
                    kind: NamedResource::new("grass", ""),
                },
            ],
            ..Default::default()
        };
        assert_eq!(pokemon.type_names(), vec!["grass", "poison"]);
    }

    #[test]
    fn test_null_base_experience() {
        let pokemon: Pokemon =
            serde_json::from_str(r#"{"id": 1, "name": "x", "base_experience": null}"#).unwrap();
        assert_eq!(pokemon.base_experience, None);
    }

    #[test]
    fn test_parse_location_area() {
        let json = r#"{
            "id": 1,
            "name": "canalave-city-area",
            "location": {"name": "canalave-city", "url": "https://pokeapi.co/api/v2/location/1/"},
            "pokemon_encounters": [
                {"pokemon": {"name": "tentacool", "url": ""}, "version_details": []},
                {"pokemon": {"name": "staryu", "url": ""}, "version_details": []}
            ]
        }"#;
        let area: LocationArea = serde_json::from_str(json).unwrap();
        assert_eq!(area.location.name, "canalave-city");
        assert_eq!(area.encounter_names(), vec!["tentacool", "staryu"]);
    }

    #[test]
    fn test_fresh_pagination_points_at_first_page() {
        let state = PaginationState::new();
        assert_eq!(state.cursor(PageDirection::Next), Some(None));
        assert_eq!(state.cursor(PageDirection::Previous), None);
    }

    #[test]
    fn test_pagination_follows_page_cursors() {
        let page = LocationPage {
            count: 3,
            next: Some("https://pokeapi.co/api/v2/location-area?offset=40&limit=20".to_string()),
            previous: Some("https://pokeapi.co/api/v2/location-area?offset=0&limit=20".to_string()),
            results: Vec::new(),
        };
        let state = PaginationState::after(&page);
        assert_eq!(
            state.cursor(PageDirection::Next),
            Some(Some("https://pokeapi.co/api/v2/location-area?offset=40&limit=20"))
        );
        assert_eq!(
            state.cursor(PageDirection::Previous),
            Some(Some("https://pokeapi.co/api/v2/location-area?offset=0&limit=20"))
        );
    }

    #[test]
    fn test_pagination_reports_ends() {
        let last_page = LocationPage {
            next: None,
            previous: Some("prev".to_string()),
            ..Default::default()
        };
        let state = PaginationState::after(&last_page);
        assert_eq!(state.cursor(PageDirection::Next), None);
        assert_eq!(state.previous(), Some("prev"));
    }
}

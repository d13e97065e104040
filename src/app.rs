//! Game session state
//!
//! `Session` owns everything a running game needs: the API client, the caught
//! collection, the party, the discovery tracker, the location cursors and the
//! save gateway. The explore and catch workflows live here so the command
//! layer only formats their results.

use std::collections::{BTreeMap, BTreeSet};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::{debug, error, info, warn};

use crate::api::{PageDirection, PageOutcome, PaginationState, PokeApiClient, Pokemon};
use crate::catch::{CatchOutcome, CatchPolicy};
use crate::discovery::DiscoveryTracker;
use crate::error::{PokedexError, Result};
use crate::party::{Party, PartyMember};
use crate::persistence::{PersistedState, Persistence};

/// Upper bound on Pokemon revealed by one exploration
pub const MAX_REVEALS_PER_EXPLORE: usize = 3;

/// What an exploration revealed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExploreReport {
    pub area: String,
    /// Location the area belongs to; discoveries are recorded against it
    pub location: String,
    /// Revealed by this exploration, sorted by name
    pub newly_discovered: Vec<String>,
    /// Everything discovered in the location so far, sorted by name
    pub discovered: Vec<String>,
    /// Distinct encounters of this area already discovered
    pub discovered_in_area: usize,
    /// Distinct encounters of this area
    pub total_in_area: usize,
}

/// Result of a catch attempt
#[derive(Debug)]
pub struct CatchReport {
    pub pokemon: Pokemon,
    pub capture_rate: u32,
    pub outcome: CatchOutcome,
    /// Party insertion result; `None` when the Pokemon escaped
    pub party: Option<Result<PartyMember>>,
    /// Set when the post-catch save failed; the catch itself is kept
    pub save_error: Option<PokedexError>,
}

/// A running game
#[derive(Debug)]
pub struct Session {
    client: PokeApiClient,
    persistence: Persistence,
    catch_policy: CatchPolicy,
    rng: StdRng,
    collection: BTreeMap<String, Pokemon>,
    party: Party,
    discoveries: DiscoveryTracker,
    pagination: PaginationState,
}

impl Session {
    /// Builds a session from already-loaded state
    pub fn new(
        client: PokeApiClient,
        persistence: Persistence,
        catch_policy: CatchPolicy,
        state: PersistedState,
    ) -> Self {
        let PersistedState {
            caught_pokemon,
            party_members,
            discoveries,
        } = state;
        debug!(members = party_members.len(), "restoring party");
        Self {
            client,
            persistence,
            catch_policy,
            rng: StdRng::from_entropy(),
            collection: caught_pokemon,
            party: Party::from_members(party_members),
            discoveries,
            pagination: PaginationState::new(),
        }
    }

    /// Loads saved state through `persistence` and builds a session from it
    pub fn load(
        client: PokeApiClient,
        persistence: Persistence,
        catch_policy: CatchPolicy,
    ) -> Result<Self> {
        let state = persistence.load()?;
        info!(
            caught = state.caught_pokemon.len(),
            party = state.party_members.len(),
            "session loaded"
        );
        Ok(Self::new(client, persistence, catch_policy, state))
    }

    /// Replaces the random source, e.g. with a seeded one
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn client(&self) -> &PokeApiClient {
        &self.client
    }

    pub fn party(&self) -> &Party {
        &self.party
    }

    pub fn discoveries(&self) -> &DiscoveryTracker {
        &self.discoveries
    }

    pub fn collection(&self) -> &BTreeMap<String, Pokemon> {
        &self.collection
    }

    pub fn pagination(&self) -> &PaginationState {
        &self.pagination
    }

    pub fn persistence(&self) -> &Persistence {
        &self.persistence
    }

    /// Full copy of the durable state
    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            caught_pokemon: self.collection.clone(),
            party_members: self.party.list_members(),
            discoveries: self.discoveries.clone(),
        }
    }

    pub fn save(&self) -> Result<()> {
        self.persistence.save(&self.snapshot())
    }

    /// Fetches the next or previous page of locations and advances the cursors
    pub async fn page_locations(&mut self, direction: PageDirection) -> Result<PageOutcome> {
        let outcome = self
            .client
            .page_locations(&self.pagination, direction)
            .await?;
        if let PageOutcome::Page { page, state } = &outcome {
            info!(count = page.results.len(), "found locations");
            self.pagination = state.clone();
        }
        Ok(outcome)
    }

    /// Explores `area`, revealing up to three undiscovered Pokemon at random
    pub async fn explore(&mut self, area: &str) -> Result<ExploreReport> {
        info!(%area, "exploring area");
        let detail = self.client.fetch_area(area).await?;
        let location = detail.location.name.clone();

        let encounters: BTreeSet<String> = detail.encounter_names().into_iter().collect();
        let mut undiscovered: Vec<&String> = encounters
            .iter()
            .filter(|name| !self.discoveries.is_discovered(&location, name))
            .collect();

        let mut newly_discovered = Vec::new();
        if !undiscovered.is_empty() {
            let reveals = self
                .rng
                .gen_range(1..=MAX_REVEALS_PER_EXPLORE)
                .min(undiscovered.len());
            undiscovered.shuffle(&mut self.rng);
            for name in undiscovered.into_iter().take(reveals) {
                info!(pokemon = %name, %location, "discovered");
                self.discoveries.mark_discovered(&location, name);
                newly_discovered.push(name.clone());
            }
            newly_discovered.sort();
        }

        let discovered_in_area = encounters
            .iter()
            .filter(|name| self.discoveries.is_discovered(&location, name))
            .count();
        info!(
            discovered_in_area,
            total = encounters.len(),
            "exploration progress"
        );

        Ok(ExploreReport {
            area: detail.name,
            discovered: self.discoveries.discovered_in_location(&location),
            location,
            newly_discovered,
            discovered_in_area,
            total_in_area: encounters.len(),
        })
    }

    /// Throws a ball at `name`
    ///
    /// On success the Pokemon joins the collection (replacing any earlier
    /// catch of the same name), is offered to the party and the state is
    /// saved. Party and save failures are reported in the returned report and
    /// do not undo the catch.
    pub async fn catch(&mut self, name: &str) -> Result<CatchReport> {
        debug!(%name, "attempting to catch");
        let pokemon = self.client.fetch_creature(name).await?;
        let species = self.client.fetch_species(pokemon.species_name()).await?;

        let outcome = self
            .catch_policy
            .attempt(species.capture_rate, &mut self.rng);
        debug!(?outcome, capture_rate = species.capture_rate, "catch roll");

        if !outcome.is_caught() {
            info!(pokemon = %pokemon.name, "escaped");
            return Ok(CatchReport {
                pokemon,
                capture_rate: species.capture_rate,
                outcome,
                party: None,
                save_error: None,
            });
        }

        info!(pokemon = %pokemon.name, "caught");
        self.collection
            .insert(pokemon.name.clone(), pokemon.clone());

        let party = self.party.add_member(pokemon.clone());
        if let Err(err) = &party {
            warn!(pokemon = %pokemon.name, %err, "not added to party");
        }

        let save_error = self.save().err();
        if let Some(err) = &save_error {
            error!(%err, "failed to save after catch");
        }

        Ok(CatchReport {
            pokemon,
            capture_rate: species.capture_rate,
            outcome,
            party: Some(party),
            save_error,
        })
    }

    /// A caught Pokemon by name
    pub fn inspect(&self, name: &str) -> Result<&Pokemon> {
        self.collection
            .get(name)
            .ok_or_else(|| PokedexError::NotFound(format!("you haven't caught {name} yet")))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::api::Transport;
    use crate::cache::ResponseCache;
    use futures::future::BoxFuture;
    use std::collections::HashMap;
    use std::sync::Arc;
    use std::time::Duration;
    use tempfile::TempDir;

    pub(crate) const BASE: &str = "http://pokeapi.test/api/v2";

    /// Serves canned bodies by URL
    #[derive(Debug, Default)]
    pub(crate) struct CannedTransport {
        bodies: HashMap<String, String>,
    }

    impl CannedTransport {
        pub(crate) fn route(mut self, path: &str, body: &str) -> Self {
            self.bodies.insert(format!("{BASE}{path}"), body.to_string());
            self
        }
    }

    impl Transport for CannedTransport {
        fn get<'a>(&'a self, url: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
            let body = self.bodies.get(url).map(|body| body.as_bytes().to_vec());
            Box::pin(async move {
                body.ok_or_else(|| PokedexError::Transport(format!("GET {url} returned 404")))
            })
        }
    }

    pub(crate) fn pokemon_json(id: u32, name: &str, hp: u32) -> String {
        format!(
            r#"{{"id": {id}, "name": "{name}", "height": 4, "weight": 60, "base_experience": 112,
                "stats": [{{"base_stat": {hp}, "effort": 0, "stat": {{"name": "hp", "url": ""}}}}],
                "types": [{{"slot": 1, "type": {{"name": "electric", "url": ""}}}}],
                "species": {{"name": "{name}", "url": ""}}}}"#
        )
    }

    pub(crate) fn species_json(name: &str, capture_rate: u32) -> String {
        format!(r#"{{"id": 1, "name": "{name}", "capture_rate": {capture_rate}}}"#)
    }

    pub(crate) fn area_json(area: &str, location: &str, pokemon: &[&str]) -> String {
        let encounters: Vec<String> = pokemon
            .iter()
            .map(|name| format!(r#"{{"pokemon": {{"name": "{name}", "url": ""}}}}"#))
            .collect();
        format!(
            r#"{{"id": 1, "name": "{area}", "location": {{"name": "{location}", "url": ""}},
                "pokemon_encounters": [{}]}}"#,
            encounters.join(",")
        )
    }

    pub(crate) fn session_with(
        transport: impl Transport + 'static,
        policy: CatchPolicy,
    ) -> (Session, TempDir) {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let client = PokeApiClient::with_transport(
            Arc::new(transport),
            ResponseCache::new(Duration::from_secs(300)),
        )
        .with_base_url(BASE);
        let persistence = Persistence::with_path(temp_dir.path().join("pokedata.json"));
        let session = Session::load(client, persistence, policy)
            .expect("fresh load")
            .with_rng(StdRng::seed_from_u64(11));
        (session, temp_dir)
    }

    fn always_catch() -> CatchPolicy {
        CatchPolicy::new(1)
    }

    #[tokio::test]
    async fn test_catch_success_updates_collection_party_and_save_file() {
        let transport = CannedTransport::default()
            .route("/pokemon/pikachu", &pokemon_json(25, "pikachu", 35))
            .route("/pokemon-species/pikachu", &species_json("pikachu", 190));
        let (mut session, _temp_dir) = session_with(transport, always_catch());

        let report = session.catch("pikachu").await.expect("catch runs");

        assert!(report.outcome.is_caught());
        assert!(matches!(report.party, Some(Ok(_))));
        assert!(report.save_error.is_none());
        assert!(session.inspect("pikachu").is_ok());
        assert_eq!(session.party().len(), 1);
        assert!(session.persistence().path().exists());
    }

    #[tokio::test]
    async fn test_escape_changes_nothing() {
        let transport = CannedTransport::default()
            .route("/pokemon/mewtwo", &pokemon_json(150, "mewtwo", 106))
            .route("/pokemon-species/mewtwo", &species_json("mewtwo", 0));
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());

        let report = session.catch("mewtwo").await.unwrap();

        assert!(!report.outcome.is_caught());
        assert!(report.party.is_none());
        assert!(session.collection().is_empty());
        assert!(session.party().is_empty());
        assert!(!session.persistence().path().exists());
    }

    #[tokio::test]
    async fn test_second_catch_reports_party_conflict_but_keeps_collection() {
        let transport = CannedTransport::default()
            .route("/pokemon/pikachu", &pokemon_json(25, "pikachu", 35))
            .route("/pokemon-species/pikachu", &species_json("pikachu", 190));
        let (mut session, _temp_dir) = session_with(transport, always_catch());

        session.catch("pikachu").await.unwrap();
        let report = session.catch("pikachu").await.unwrap();

        assert!(matches!(report.party, Some(Err(PokedexError::Conflict(_)))));
        assert_eq!(session.collection().len(), 1);
        assert_eq!(session.party().len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_keeps_catch_in_memory() {
        let transport = CannedTransport::default()
            .route("/pokemon/pikachu", &pokemon_json(25, "pikachu", 35))
            .route("/pokemon-species/pikachu", &species_json("pikachu", 190));
        let temp_dir = TempDir::new().unwrap();
        // The save path's parent is a regular file, so every save fails
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();
        let client = PokeApiClient::with_transport(
            Arc::new(transport),
            ResponseCache::new(Duration::from_secs(300)),
        )
        .with_base_url(BASE);
        let mut session = Session::new(
            client,
            Persistence::with_path(blocker.join("pokedata.json")),
            always_catch(),
            PersistedState::default(),
        );

        let report = session.catch("pikachu").await.unwrap();

        assert!(matches!(
            report.save_error,
            Some(PokedexError::Persistence { .. })
        ));
        assert!(session.inspect("pikachu").is_ok());
        assert_eq!(session.party().len(), 1);
    }

    #[tokio::test]
    async fn test_explore_reveals_between_one_and_three() {
        let transport = CannedTransport::default().route(
            "/location-area/eterna-forest-area",
            &area_json(
                "eterna-forest-area",
                "eterna-forest",
                &["wurmple", "silcoon", "beautifly", "cascoon", "dustox"],
            ),
        );
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());

        let report = session.explore("eterna-forest-area").await.unwrap();

        assert_eq!(report.location, "eterna-forest");
        assert!((1..=3).contains(&report.newly_discovered.len()));
        assert_eq!(report.discovered, report.newly_discovered);
        assert_eq!(report.discovered_in_area, report.newly_discovered.len());
        assert_eq!(report.total_in_area, 5);
    }

    #[tokio::test]
    async fn test_repeated_exploration_eventually_discovers_everything() {
        let transport = CannedTransport::default().route(
            "/location-area/lake-verity-area",
            &area_json("lake-verity-area", "lake-verity", &["psyduck", "golduck", "psyduck"]),
        );
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());

        let mut last = None;
        for _ in 0..3 {
            last = Some(session.explore("lake-verity-area").await.unwrap());
        }
        let report = last.unwrap();

        assert_eq!(report.total_in_area, 2);
        assert_eq!(report.discovered_in_area, 2);
        assert!(report.newly_discovered.is_empty());
        assert_eq!(report.discovered, vec!["golduck", "psyduck"]);
        assert_eq!(
            session
                .discoveries()
                .count_discovered_in_location("lake-verity"),
            2
        );
    }

    #[tokio::test]
    async fn test_page_locations_advances_cursor_only_on_success() {
        let transport = CannedTransport::default().route(
            "/location-area",
            r#"{"count": 1, "next": null, "previous": null, "results": [{"name": "a", "url": ""}]}"#,
        );
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());

        let outcome = session.page_locations(PageDirection::Next).await.unwrap();
        assert!(matches!(outcome, PageOutcome::Page { .. }));

        let outcome = session.page_locations(PageDirection::Next).await.unwrap();
        assert_eq!(outcome, PageOutcome::NoMorePages);
    }

    #[tokio::test]
    async fn test_inspect_uncaught_is_not_found() {
        let (session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        assert!(matches!(
            session.inspect("pikachu"),
            Err(PokedexError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_snapshot_reflects_all_state() {
        let transport = CannedTransport::default()
            .route("/pokemon/pikachu", &pokemon_json(25, "pikachu", 35))
            .route("/pokemon-species/pikachu", &species_json("pikachu", 190));
        let (mut session, _temp_dir) = session_with(transport, always_catch());
        session.catch("pikachu").await.unwrap();
        session.discoveries().mark_discovered("viridian-forest", "pikachu");

        let snapshot = session.snapshot();

        assert_eq!(snapshot.caught_pokemon.len(), 1);
        assert_eq!(snapshot.party_members.len(), 1);
        assert!(snapshot.discoveries.is_discovered("viridian-forest", "pikachu"));
    }
}

//! The player's party of caught Pokemon
//!
//! A party holds at most six members and never two members of the same
//! Pokemon (by PokeAPI id). Writers are exclusive; readers only ever see a
//! complete list and receive independent copies.

use std::collections::HashSet;
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::api::Pokemon;
use crate::error::{PokedexError, Result};

/// Maximum number of party members
pub const MAX_PARTY_SIZE: usize = 6;

/// Level of a freshly caught Pokemon
pub const STARTING_LEVEL: u32 = 5;

/// Stat snapshot of a party member
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyStats {
    pub hp: u32,
    pub attack: u32,
    pub defense: u32,
    pub special_attack: u32,
    pub special_defense: u32,
    pub speed: u32,
}

impl PartyStats {
    /// Copies the base stats of `pokemon`; missing stats are zero
    pub fn from_base(pokemon: &Pokemon) -> Self {
        let mut stats = Self::default();
        for entry in &pokemon.stats {
            let value = entry.base_stat;
            match entry.stat.name.as_str() {
                "hp" => stats.hp = value,
                "attack" => stats.attack = value,
                "defense" => stats.defense = value,
                "special-attack" => stats.special_attack = value,
                "special-defense" => stats.special_defense = value,
                "speed" => stats.speed = value,
                _ => {}
            }
        }
        stats
    }
}

/// A single caught Pokemon in the party
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyMember {
    /// Unique per catch
    pub instance_id: Uuid,
    pub nickname: String,
    pub level: u32,
    pub experience: u32,
    pub caught_at: DateTime<Utc>,
    pub current_stats: PartyStats,
    pub base_pokemon: Pokemon,
}

impl PartyMember {
    /// Builds a fresh member from a fetched Pokemon
    pub fn new(base: Pokemon) -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            nickname: base.species_name().to_string(),
            level: STARTING_LEVEL,
            experience: 0,
            caught_at: Utc::now(),
            current_stats: PartyStats::from_base(&base),
            base_pokemon: base,
        }
    }
}

/// Checks a restored member list against the capacity and duplicate rules
///
/// # Errors
/// * `Capacity` if there are more than six members
/// * `Conflict` naming the first Pokemon that appears twice
pub fn check_members(members: &[PartyMember]) -> Result<()> {
    if members.len() > MAX_PARTY_SIZE {
        return Err(PokedexError::Capacity(MAX_PARTY_SIZE));
    }
    let mut seen = HashSet::new();
    for member in members {
        if !seen.insert(member.base_pokemon.id) {
            return Err(PokedexError::Conflict(member.base_pokemon.name.clone()));
        }
    }
    Ok(())
}

/// Bounded, thread-safe party roster
#[derive(Debug, Default)]
pub struct Party {
    members: RwLock<Vec<PartyMember>>,
}

impl Party {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restores a party from saved members, keeping their order
    pub fn from_members(members: Vec<PartyMember>) -> Self {
        if members.len() > MAX_PARTY_SIZE {
            warn!(
                count = members.len(),
                "saved party exceeds {} members", MAX_PARTY_SIZE
            );
        }
        Self {
            members: RwLock::new(members),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<PartyMember>> {
        self.members.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<PartyMember>> {
        self.members.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Adds `pokemon` as a new member and returns a copy of it
    ///
    /// # Errors
    /// * `Capacity` if the party already has six members
    /// * `Conflict` if a member with the same Pokemon id is present
    pub fn add_member(&self, pokemon: Pokemon) -> Result<PartyMember> {
        let mut members = self.write();

        if members.len() >= MAX_PARTY_SIZE {
            debug!(name = %pokemon.name, "party full");
            return Err(PokedexError::Capacity(MAX_PARTY_SIZE));
        }
        if members
            .iter()
            .any(|member| member.base_pokemon.id == pokemon.id)
        {
            return Err(PokedexError::Conflict(pokemon.name));
        }

        let member = PartyMember::new(pokemon);
        info!(nickname = %member.nickname, id = %member.instance_id, "added party member");
        members.push(member.clone());
        Ok(member)
    }

    /// Removes the first member with `nickname` and returns it
    pub fn remove_member(&self, nickname: &str) -> Result<PartyMember> {
        let mut members = self.write();
        let index = members
            .iter()
            .position(|member| member.nickname == nickname)
            .ok_or_else(|| PokedexError::NotFound(format!("{nickname} is not in the party")))?;
        let removed = members.remove(index);
        info!(%nickname, "removed party member");
        Ok(removed)
    }

    /// Returns a copy of the first member with `nickname`
    pub fn get_member(&self, nickname: &str) -> Result<PartyMember> {
        self.read()
            .iter()
            .find(|member| member.nickname == nickname)
            .cloned()
            .ok_or_else(|| PokedexError::NotFound(format!("{nickname} is not in the party")))
    }

    /// Independent copies of every member in party order
    pub fn list_members(&self) -> Vec<PartyMember> {
        self.read().clone()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.read().len() >= MAX_PARTY_SIZE
    }
}

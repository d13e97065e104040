//! REPL commands
//!
//! Parses an input line into a `Command` and runs it against a `Session`,
//! collecting the text to show the user in an `Output`.

use crate::api::{PageDirection, PageOutcome};
use crate::app::Session;
use crate::catch::CatchOutcome;
use crate::error::{PokedexError, Result};

const GREEN: &str = "\x1b[32m";
const RESET: &str = "\x1b[0m";

/// Name and description of every command, in help order
pub const COMMANDS: &[(&str, &str)] = &[
    ("help", "Displays a help message"),
    ("exit", "Exit the Pokedex"),
    ("map", "Lists the next 20 locations"),
    ("mapb", "Lists the previous 20 locations"),
    ("explore <area>", "Explores an area and reveals the Pokemon living there"),
    ("catch <pokemon>", "Attempts to catch a Pokemon"),
    ("inspect <pokemon>", "Shows details of a Pokemon you have caught"),
    ("pokedex", "Lists all the Pokemon you have caught"),
    ("party [list | inspect <nickname> | remove <nickname>]", "Manages your party"),
];

/// A parsed REPL command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Exit,
    Map,
    MapBack,
    Explore(String),
    Catch(String),
    Inspect(String),
    Pokedex,
    Party(PartyAction),
}

/// Sub-commands of `party`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartyAction {
    List,
    Inspect(String),
    Remove(String),
}

/// Whether the REPL should keep going after a command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Exit,
}

/// Splits a line into lowercase words
pub fn clean_input(line: &str) -> Vec<String> {
    line.split_whitespace().map(str::to_lowercase).collect()
}

impl Command {
    /// Parses a line; returns `Ok(None)` for a blank line
    pub fn parse(line: &str) -> Result<Option<Self>> {
        let words = clean_input(line);
        let Some((name, args)) = words.split_first() else {
            return Ok(None);
        };

        let command = match (name.as_str(), args) {
            ("help", []) => Command::Help,
            ("exit", []) => Command::Exit,
            ("map", []) => Command::Map,
            ("mapb", []) => Command::MapBack,
            ("explore", [area]) => Command::Explore(area.clone()),
            ("explore", _) => return Err(usage("explore <area>")),
            ("catch", [pokemon]) => Command::Catch(pokemon.clone()),
            ("catch", _) => return Err(usage("catch <pokemon>")),
            ("inspect", [pokemon]) => Command::Inspect(pokemon.clone()),
            ("inspect", _) => return Err(usage("inspect <pokemon>")),
            ("pokedex", []) => Command::Pokedex,
            ("party", []) => Command::Party(PartyAction::List),
            ("party", [sub]) if sub == "list" => Command::Party(PartyAction::List),
            ("party", [sub, nickname]) if sub == "inspect" => {
                Command::Party(PartyAction::Inspect(nickname.clone()))
            }
            ("party", [sub, nickname]) if sub == "remove" => {
                Command::Party(PartyAction::Remove(nickname.clone()))
            }
            ("party", _) => return Err(usage("party [list | inspect <nickname> | remove <nickname>]")),
            ("help" | "exit" | "map" | "mapb" | "pokedex", _) => {
                return Err(PokedexError::Validation(format!("{name} takes no arguments")))
            }
            _ => {
                return Err(PokedexError::Validation(format!(
                    "unknown command '{name}'. Type 'help' for available commands."
                )))
            }
        };
        Ok(Some(command))
    }
}

fn usage(text: &str) -> PokedexError {
    PokedexError::Validation(format!("usage: {text}"))
}

/// Lines of text produced by a command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    lines: Vec<String>,
}

impl Output {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn line(&mut self, text: impl Into<String>) {
        self.lines.push(text.into());
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// All lines joined with newlines
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Runs `command` against `session`
pub async fn execute(session: &mut Session, command: &Command, out: &mut Output) -> Result<Flow> {
    match command {
        Command::Help => help(out),
        Command::Exit => {
            out.line("Closing the Pokedex... Goodbye!");
            return Ok(Flow::Exit);
        }
        Command::Map => map(session, PageDirection::Next, out).await?,
        Command::MapBack => map(session, PageDirection::Previous, out).await?,
        Command::Explore(area) => explore(session, area, out).await?,
        Command::Catch(name) => catch(session, name, out).await?,
        Command::Inspect(name) => inspect(session, name, out)?,
        Command::Pokedex => pokedex(session, out),
        Command::Party(action) => party(session, action, out)?,
    }
    Ok(Flow::Continue)
}

fn help(out: &mut Output) {
    out.line("");
    out.line("Welcome to the Pokedex!");
    out.line("Usage:");
    out.line("");
    for (name, description) in COMMANDS {
        out.line(format!("{name}: {description}"));
    }
    out.line("");
}

async fn map(session: &mut Session, direction: PageDirection, out: &mut Output) -> Result<()> {
    match session.page_locations(direction).await? {
        PageOutcome::Page { page, .. } => {
            for location in &page.results {
                out.line(location.name.clone());
            }
        }
        PageOutcome::NoMorePages => match direction {
            PageDirection::Next => out.line("No more pages: you're on the last page"),
            PageDirection::Previous => out.line("No more pages: you're on the first page"),
        },
    }
    Ok(())
}

async fn explore(session: &mut Session, area: &str, out: &mut Output) -> Result<()> {
    let report = session.explore(area).await?;

    out.line(format!("Exploring {}...", report.area));
    if !report.newly_discovered.is_empty() {
        out.line("");
        out.line("You discovered new Pokemon!");
        for name in &report.newly_discovered {
            out.line(format!("Discovered {name} in {}", report.location));
        }
    }
    out.line("");
    for name in &report.discovered {
        if report.newly_discovered.contains(name) {
            out.line(format!("\t- {GREEN}{name}{RESET}"));
        } else {
            out.line(format!("\t- {name}"));
        }
    }
    out.line("");
    out.line(format!(
        "Progress for this area: {}/{} Pokemon discovered",
        report.discovered_in_area, report.total_in_area
    ));
    Ok(())
}

async fn catch(session: &mut Session, name: &str, out: &mut Output) -> Result<()> {
    out.line(format!("Throwing a Pokeball at {name}..."));
    let report = session.catch(name).await?;

    match report.outcome {
        CatchOutcome::Escaped { .. } => {
            out.line(format!("{} escaped!", report.pokemon.name));
            return Ok(());
        }
        CatchOutcome::Caught { .. } => {
            out.line(format!("{} was caught!", report.pokemon.name));
            out.line("You may now inspect it with the inspect command.");
        }
    }

    match &report.party {
        Some(Ok(member)) => out.line(format!("{} was added to your party.", member.nickname)),
        Some(Err(err)) => out.line(format!("{} was not added to your party: {err}", report.pokemon.name)),
        None => {}
    }
    if let Some(err) = &report.save_error {
        out.line(format!("Failed to save data: {err}"));
    }
    Ok(())
}

fn inspect(session: &Session, name: &str, out: &mut Output) -> Result<()> {
    let pokemon = session.inspect(name)?;

    out.line(format!("Name: {}", pokemon.name));
    out.line(format!("Height: {GREEN}{}{RESET}", pokemon.height));
    out.line(format!("Weight: {GREEN}{}{RESET}", pokemon.weight));
    out.line(format!("Species: {GREEN}{}{RESET}", pokemon.species_name()));
    out.line("Stats:");
    for entry in &pokemon.stats {
        out.line(format!(
            "  - {}: {GREEN}{}{RESET}",
            entry.stat.name, entry.base_stat
        ));
    }
    out.line("Types:");
    for name in pokemon.type_names() {
        out.line(format!("  - {name}"));
    }
    Ok(())
}

fn pokedex(session: &Session, out: &mut Output) {
    let collection = session.collection();
    out.line("Your Pokedex:");
    out.line(format!("You have caught {} pokemon", collection.len()));
    for name in collection.keys() {
        out.line(format!("  - {name}"));
    }
}

fn party(session: &Session, action: &PartyAction, out: &mut Output) -> Result<()> {
    match action {
        PartyAction::List => {
            let members = session.party().list_members();
            if members.is_empty() {
                out.line("No party members found");
                return Ok(());
            }
            out.line("Party Members:");
            for member in members {
                out.line(format!(
                    " - Name: {} | Level: {} | XP: {} | Species: {}",
                    member.nickname,
                    member.level,
                    member.experience,
                    member.base_pokemon.species_name()
                ));
            }
        }
        PartyAction::Inspect(nickname) => {
            let member = session.party().get_member(nickname)?;
            let stats = member.current_stats;
            out.line(format!("Name: {}", member.nickname));
            out.line(format!("Level: {GREEN}{}{RESET}", member.level));
            out.line(format!("Experience: {GREEN}{}{RESET}", member.experience));
            out.line(format!(
                "Species: {GREEN}{}{RESET}",
                member.base_pokemon.species_name()
            ));
            out.line(format!(
                "Caught: {}",
                member.caught_at.format("%Y-%m-%d %H:%M:%S UTC")
            ));
            out.line(format!("{}'s Stats:", member.nickname));
            for (label, value) in [
                ("HP", stats.hp),
                ("Attack", stats.attack),
                ("Defense", stats.defense),
                ("Special Attack", stats.special_attack),
                ("Special Defense", stats.special_defense),
                ("Speed", stats.speed),
            ] {
                out.line(format!("  - {label}: {GREEN}{value}{RESET}"));
            }
            out.line("Types:");
            for name in member.base_pokemon.type_names() {
                out.line(format!("  - {name}"));
            }
        }
        PartyAction::Remove(nickname) => {
            session.party().remove_member(nickname)?;
            out.line(format!("Party member removed: {nickname}"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::tests::{area_json, pokemon_json, session_with, species_json, CannedTransport};
    use crate::catch::CatchPolicy;

    #[test]
    fn test_clean_input_lowercases_and_splits() {
        assert_eq!(clean_input("  Catch   PIKACHU "), vec!["catch", "pikachu"]);
        assert!(clean_input("   ").is_empty());
    }

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("").unwrap(), None);
        assert_eq!(Command::parse("help").unwrap(), Some(Command::Help));
        assert_eq!(Command::parse("MAPB").unwrap(), Some(Command::MapBack));
        assert_eq!(
            Command::parse("explore canalave-city-area").unwrap(),
            Some(Command::Explore("canalave-city-area".to_string()))
        );
        assert_eq!(
            Command::parse("party").unwrap(),
            Some(Command::Party(PartyAction::List))
        );
        assert_eq!(
            Command::parse("party remove Pikachu").unwrap(),
            Some(Command::Party(PartyAction::Remove("pikachu".to_string())))
        );
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        for line in ["catch", "catch a b", "explore", "party remove", "party dance x", "fly", "exit now"] {
            assert!(
                matches!(Command::parse(line), Err(PokedexError::Validation(_))),
                "{line} should be rejected"
            );
        }
        let err = Command::parse("fly").unwrap_err();
        assert!(err.to_string().contains("unknown command"));
    }

    #[tokio::test]
    async fn test_help_lists_every_command() {
        let (mut session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        let mut out = Output::new();

        let flow = execute(&mut session, &Command::Help, &mut out).await.unwrap();

        assert_eq!(flow, Flow::Continue);
        let text = out.render();
        assert!(text.contains("Welcome to the Pokedex!"));
        assert!(text.contains("exit:"));
        assert!(text.contains("party [list"));
    }

    #[tokio::test]
    async fn test_exit_ends_the_loop() {
        let (mut session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        let mut out = Output::new();

        let flow = execute(&mut session, &Command::Exit, &mut out).await.unwrap();

        assert_eq!(flow, Flow::Exit);
    }

    #[tokio::test]
    async fn test_mapb_before_map_reports_first_page() {
        let (mut session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        let mut out = Output::new();

        execute(&mut session, &Command::MapBack, &mut out).await.unwrap();

        assert_eq!(out.lines(), ["No more pages: you're on the first page"]);
    }

    #[tokio::test]
    async fn test_map_prints_location_names() {
        let transport = CannedTransport::default().route(
            "/location-area",
            r#"{"count": 2, "next": null, "previous": null,
                "results": [{"name": "canalave-city-area", "url": ""}, {"name": "eterna-city-area", "url": ""}]}"#,
        );
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());
        let mut out = Output::new();

        execute(&mut session, &Command::Map, &mut out).await.unwrap();

        assert_eq!(out.lines(), ["canalave-city-area", "eterna-city-area"]);
    }

    #[tokio::test]
    async fn test_map_transport_failure_is_an_error() {
        let (mut session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        let mut out = Output::new();

        let result = execute(&mut session, &Command::Map, &mut out).await;

        assert!(matches!(result, Err(PokedexError::Transport(_))));
    }

    #[tokio::test]
    async fn test_explore_prints_progress() {
        let transport = CannedTransport::default().route(
            "/location-area/sinnoh-route-201-area",
            &area_json("sinnoh-route-201-area", "sinnoh-route-201", &["starly"]),
        );
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::default());
        let mut out = Output::new();

        execute(
            &mut session,
            &Command::Explore("sinnoh-route-201-area".to_string()),
            &mut out,
        )
        .await
        .unwrap();

        let text = out.render();
        assert!(text.contains("Discovered starly in sinnoh-route-201"));
        assert!(text.contains(&format!("\t- {GREEN}starly{RESET}")));
        assert!(text.ends_with("Progress for this area: 1/1 Pokemon discovered"));
    }

    #[tokio::test]
    async fn test_catch_inspect_pokedex_and_party() {
        let transport = CannedTransport::default()
            .route("/pokemon/pikachu", &pokemon_json(25, "pikachu", 35))
            .route("/pokemon-species/pikachu", &species_json("pikachu", 255));
        let (mut session, _temp_dir) = session_with(transport, CatchPolicy::new(1));
        let mut out = Output::new();

        execute(&mut session, &Command::Catch("pikachu".to_string()), &mut out)
            .await
            .unwrap();
        assert!(out.render().contains("pikachu was caught!"));
        assert!(out.render().contains("pikachu was added to your party."));

        let mut out = Output::new();
        execute(&mut session, &Command::Inspect("pikachu".to_string()), &mut out)
            .await
            .unwrap();
        assert!(out.render().contains(&format!("  - hp: {GREEN}35{RESET}")));
        assert!(out.render().contains("  - electric"));

        let mut out = Output::new();
        execute(&mut session, &Command::Pokedex, &mut out).await.unwrap();
        assert_eq!(
            out.lines(),
            ["Your Pokedex:", "You have caught 1 pokemon", "  - pikachu"]
        );

        let mut out = Output::new();
        execute(
            &mut session,
            &Command::Party(PartyAction::Inspect("pikachu".to_string())),
            &mut out,
        )
        .await
        .unwrap();
        assert!(out.render().contains(&format!("  - HP: {GREEN}35{RESET}")));

        let mut out = Output::new();
        execute(
            &mut session,
            &Command::Party(PartyAction::Remove("pikachu".to_string())),
            &mut out,
        )
        .await
        .unwrap();
        assert!(session.party().is_empty());
        assert_eq!(session.collection().len(), 1, "collection never shrinks");

        let mut out = Output::new();
        execute(&mut session, &Command::Party(PartyAction::List), &mut out)
            .await
            .unwrap();
        assert_eq!(out.lines(), ["No party members found"]);
    }

    #[tokio::test]
    async fn test_inspect_uncaught_fails() {
        let (mut session, _temp_dir) = session_with(CannedTransport::default(), CatchPolicy::default());
        let mut out = Output::new();

        let result = execute(&mut session, &Command::Inspect("mew".to_string()), &mut out).await;

        assert!(matches!(result, Err(PokedexError::NotFound(_))));
    }
}

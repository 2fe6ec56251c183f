//! One text-returning operation per player action.
//!
//! Callers type names the way a player would ("the magic potion", "old
//! woman"). Names resolve against what the player can see or carry, then
//! against everything in the game, before the engine decides. Every
//! operation returns text: rejections, unknown names, and engine errors are
//! all reported as messages.

use std::sync::Arc;

use sop_core::{
    DEFAULT_PLAYER_ID, GameId, GameState, GameSummary, ItemLocation, NpcId, Player, PlayerId,
    ScenarioConfig,
};
use sop_engine::{Action, ActionResult, GameStatus, SessionManager};

use crate::error::{ToolError, ToolResult};
use crate::parser::{Candidate, Command, normalize_direction, parse_command, resolve, resolve_exact, suggest};

const HINT_LIMIT: usize = 3;

/// A resolved name, or the raw input plus a hint when nothing matched.
struct Resolved {
    id: String,
    hint: Option<String>,
}

/// Text tools over a session manager, acting for one player.
pub struct GameTools {
    sessions: Arc<SessionManager>,
    scenario: ScenarioConfig,
    actor: PlayerId,
}

impl GameTools {
    /// Tools that start new games from `scenario`.
    pub fn new(sessions: Arc<SessionManager>, scenario: ScenarioConfig) -> Self {
        Self {
            sessions,
            scenario,
            actor: PlayerId::new(DEFAULT_PLAYER_ID),
        }
    }

    /// The session manager behind the tools.
    pub fn sessions(&self) -> &Arc<SessionManager> {
        &self.sessions
    }

    /// Start a new game and describe the first room.
    pub fn start_new_game(&self, player_name: Option<&str>) -> String {
        text(self.try_start(player_name))
    }

    /// End the current game and report its summary.
    pub fn end_game(&self) -> String {
        text(self.try_end())
    }

    /// Leave through an exit. Abbreviations like `n` and `sw` are expanded.
    pub fn move_player(&self, direction: &str) -> String {
        let action = Action::Move {
            direction: normalize_direction(direction),
        };
        text(self.act(&action).map(render))
    }

    /// Describe the current room.
    pub fn look_around(&self) -> String {
        text(self.act(&Action::LookAround).map(render))
    }

    /// Pick up an item in the current room.
    pub fn take_item(&self, name: &str) -> String {
        text(self.try_take(name))
    }

    /// Put down a carried item.
    pub fn drop_item(&self, name: &str) -> String {
        text(self.try_drop(name))
    }

    /// Use a carried item, optionally on a target.
    pub fn use_item(&self, name: &str, target: Option<&str>) -> String {
        text(self.try_use(name, target))
    }

    /// Speak to an NPC in the current room.
    pub fn talk_to_npc(&self, name: &str, message: Option<&str>) -> String {
        text(self.try_talk(name, message))
    }

    /// List carried items.
    pub fn check_inventory(&self) -> String {
        text(self.act(&Action::CheckInventory).map(render))
    }

    /// List the actions that would succeed right now.
    pub fn get_available_actions(&self) -> String {
        text(self.act(&Action::GetAvailableActions).map(render))
    }

    /// Turn, location, and outcome of the current game.
    pub fn get_game_status(&self) -> String {
        text(
            self.game()
                .and_then(|id| Ok(self.sessions.status(&id)?))
                .map(|status| render_status(&status)),
        )
    }

    /// Parse a typed command and run it.
    pub fn process(&self, input: &str) -> String {
        text(self.execute(parse_command(input)))
    }

    /// Run a parsed command.
    pub fn execute(&self, command: Command) -> ToolResult<String> {
        match command {
            Command::Move { direction } => Ok(self.move_player(&direction)),
            Command::Look => Ok(self.look_around()),
            Command::Take { item } => self.try_take(&item),
            Command::Drop { item } => self.try_drop(&item),
            Command::Talk { npc, message } => self.try_talk(&npc, message.as_deref()),
            Command::Use { item, target } => self.try_use(&item, target.as_deref()),
            Command::Inventory => Ok(self.check_inventory()),
            Command::Actions => Ok(self.get_available_actions()),
            Command::Status => Ok(self.get_game_status()),
            Command::Help => Ok(HELP.to_string()),
            Command::Quit => Ok("Goodbye!".to_string()),
            Command::Incomplete { prompt } => Ok(prompt),
            Command::Unknown { input } => Err(ToolError::UnknownCommand(input)),
        }
    }

    fn try_start(&self, player_name: Option<&str>) -> ToolResult<String> {
        let id = self.sessions.start_new_game(&self.scenario, player_name)?;
        let look = self.sessions.engine().look_around(&id, &self.actor)?;
        Ok(format!("Started new game: {}\n\n{look}", self.scenario.title))
    }

    fn try_end(&self) -> ToolResult<String> {
        let id = self.game()?;
        let summary = self.sessions.end_game(&id, "ended by player")?;
        Ok(render_summary(&summary))
    }

    fn try_take(&self, name: &str) -> ToolResult<String> {
        let state = self.state()?;
        let player = self.player(&state)?;
        let here = room_items(&state, player);
        let resolved = resolve_name(&here, &all_items(&state), name);
        let result = self.act(&Action::Take {
            item: resolved.id.into(),
        })?;
        Ok(with_hint(render(result), resolved.hint))
    }

    fn try_drop(&self, name: &str) -> ToolResult<String> {
        let state = self.state()?;
        let player = self.player(&state)?;
        let resolved = resolve_name(&carried(&state, player), &all_items(&state), name);
        let result = self.act(&Action::Drop {
            item: resolved.id.into(),
        })?;
        Ok(with_hint(render(result), resolved.hint))
    }

    fn try_use(&self, name: &str, target: Option<&str>) -> ToolResult<String> {
        let state = self.state()?;
        let player = self.player(&state)?;
        let resolved = resolve_name(&carried(&state, player), &all_items(&state), name);

        // Targets match effect keys by id, so a visible name becomes its id.
        let target = target.map(|t| {
            let mut visible = room_npcs(&state, player);
            visible.extend(room_items(&state, player));
            visible.extend(carried(&state, player));
            resolve(&visible, t).map_or_else(|| t.trim().to_string(), |c| c.id.clone())
        });

        let result = self.act(&Action::Use {
            item: resolved.id.into(),
            target,
        })?;
        Ok(with_hint(render(result), resolved.hint))
    }

    fn try_talk(&self, name: &str, message: Option<&str>) -> ToolResult<String> {
        let state = self.state()?;
        let player = self.player(&state)?;
        let resolved = resolve_name(&room_npcs(&state, player), &all_npcs(&state), name);
        let result = self.act(&Action::Talk {
            npc: NpcId::from(resolved.id),
            message: message.map(str::to_string),
        })?;
        Ok(with_hint(render(result), resolved.hint))
    }

    fn game(&self) -> ToolResult<GameId> {
        self.sessions.current_game().ok_or(ToolError::NoActiveGame)
    }

    fn state(&self) -> ToolResult<GameState> {
        let id = self.game()?;
        Ok(self.sessions.engine().snapshot(&id)?)
    }

    fn player<'a>(&self, state: &'a GameState) -> ToolResult<&'a Player> {
        state
            .player(&self.actor)
            .ok_or_else(|| ToolError::Game(sop_engine::GameError::PlayerNotFound(self.actor.clone())))
    }

    fn act(&self, action: &Action) -> ToolResult<ActionResult> {
        let id = self.game()?;
        Ok(self.sessions.engine().act(&id, &self.actor, action)?)
    }
}

fn text(result: ToolResult<String>) -> String {
    result.unwrap_or_else(|e| {
        tracing::debug!(error = %e, "tool call failed");
        e.to_string()
    })
}

fn render(result: ActionResult) -> String {
    result.message
}

fn with_hint(message: String, hint: Option<String>) -> String {
    match hint {
        Some(hint) => format!("{message} {hint}"),
        None => message,
    }
}

/// Resolve against what is at hand, then exactly against the whole game so
/// the engine can say where the thing is not. Unmatched input passes through
/// and carries a hint.
fn resolve_name(at_hand: &[Candidate], everywhere: &[Candidate], input: &str) -> Resolved {
    if let Some(c) = resolve(at_hand, input).or_else(|| resolve_exact(everywhere, input)) {
        return Resolved {
            id: c.id.clone(),
            hint: None,
        };
    }
    let suggestions = suggest(at_hand, input, HINT_LIMIT);
    Resolved {
        id: input.trim().to_string(),
        hint: (!suggestions.is_empty()).then(|| format!("Did you mean: {}?", suggestions.join(", "))),
    }
}

fn room_items(state: &GameState, player: &Player) -> Vec<Candidate> {
    state
        .room(&player.location)
        .map(|room| {
            room.items
                .iter()
                .filter_map(|id| state.item(id))
                .map(|i| Candidate::new(i.id.as_str(), &i.name))
                .collect()
        })
        .unwrap_or_default()
}

fn carried(state: &GameState, player: &Player) -> Vec<Candidate> {
    let here = ItemLocation::Player(player.id.clone());
    player
        .inventory
        .iter()
        .filter_map(|id| state.item(id))
        .filter(|i| i.location == here)
        .map(|i| Candidate::new(i.id.as_str(), &i.name))
        .collect()
}

fn room_npcs(state: &GameState, player: &Player) -> Vec<Candidate> {
    state
        .room(&player.location)
        .map(|room| {
            room.npcs
                .iter()
                .filter_map(|id| state.npc(id))
                .map(|n| Candidate::new(n.id.as_str(), &n.name))
                .collect()
        })
        .unwrap_or_default()
}

fn all_items(state: &GameState) -> Vec<Candidate> {
    state
        .items
        .values()
        .map(|i| Candidate::new(i.id.as_str(), &i.name))
        .collect()
}

fn all_npcs(state: &GameState) -> Vec<Candidate> {
    state
        .npcs
        .values()
        .map(|n| Candidate::new(n.id.as_str(), &n.name))
        .collect()
}

/// Render a status block.
pub fn render_status(status: &GameStatus) -> String {
    let state = match &status.outcome {
        Some(outcome) => outcome.clone(),
        None if status.active => "active".to_string(),
        None => "ended".to_string(),
    };
    let mut out = format!(
        "Game: {} ({})\nStatus: {state}\nTurn: {}",
        status.title, status.game_id, status.turn
    );
    if let Some(name) = &status.player_name {
        out.push_str(&format!("\nPlayer: {name}"));
    }
    if let Some(location) = &status.location {
        out.push_str(&format!("\nLocation: {location}"));
    }
    out.push_str(&format!(
        "\nItems carried: {}\nLog entries: {}",
        status.inventory_count, status.log_length
    ));
    out
}

/// Render an end-of-game summary.
pub fn render_summary(summary: &GameSummary) -> String {
    let mut out = format!("Game over: {}", summary.outcome);
    if let Some(condition) = &summary.condition {
        out.push_str(&format!(" ({condition})"));
    }
    let join = |ids: Vec<&str>| if ids.is_empty() { "none".to_string() } else { ids.join(", ") };
    out.push_str(&format!("\nTurns: {}", summary.turns));
    out.push_str(&format!(
        "\nRooms visited: {}",
        join(summary.rooms_visited.iter().map(|r| r.as_str()).collect())
    ));
    out.push_str(&format!(
        "\nItems collected: {}",
        join(summary.items_collected.iter().map(|i| i.as_str()).collect())
    ));
    if let Some(room) = &summary.final_location {
        out.push_str(&format!("\nFinal location: {room}"));
    }
    if !summary.major_events.is_empty() {
        out.push_str("\nMajor events:");
        for event in &summary.major_events {
            out.push_str(&format!("\n- {event}"));
        }
    }
    out
}

const HELP: &str = "**Commands**\n\
    Movement: north, south, east, west, up, down (or n, s, e, w, u, d)\n\
    go <exit> - leave through a named exit\n\
    look - describe the room\n\
    take <item> - pick up an item\n\
    drop <item> - put down an item\n\
    use <item> [on <target>] - use a carried item\n\
    talk to <person> [about <topic>] - speak to someone\n\
    inventory (or i) - list what you're carrying\n\
    actions - list what you can do right now\n\
    status - show the game status\n\
    help - show this list\n\
    quit - leave the game";

//! Command parsing for typed player input.

/// A compass or vertical direction with its short forms.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// north
    North,
    /// south
    South,
    /// east
    East,
    /// west
    West,
    /// up
    Up,
    /// down
    Down,
    /// northeast
    Northeast,
    /// northwest
    Northwest,
    /// southeast
    Southeast,
    /// southwest
    Southwest,
}

impl Direction {
    /// Parse a direction or its abbreviation.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "n" | "north" => Some(Self::North),
            "s" | "south" => Some(Self::South),
            "e" | "east" => Some(Self::East),
            "w" | "west" => Some(Self::West),
            "u" | "up" => Some(Self::Up),
            "d" | "down" => Some(Self::Down),
            "ne" | "northeast" => Some(Self::Northeast),
            "nw" | "northwest" => Some(Self::Northwest),
            "se" | "southeast" => Some(Self::Southeast),
            "sw" | "southwest" => Some(Self::Southwest),
            _ => None,
        }
    }

    /// The exit key scenarios use for this direction.
    pub fn name(&self) -> &'static str {
        match self {
            Self::North => "north",
            Self::South => "south",
            Self::East => "east",
            Self::West => "west",
            Self::Up => "up",
            Self::Down => "down",
            Self::Northeast => "northeast",
            Self::Northwest => "northwest",
            Self::Southeast => "southeast",
            Self::Southwest => "southwest",
        }
    }
}

/// Expand a direction abbreviation; anything else passes through, since
/// scenarios may name exits freely ("upstairs", "portal").
pub fn normalize_direction(input: &str) -> String {
    let input = input.trim();
    Direction::parse(input).map_or_else(|| input.to_lowercase(), |d| d.name().to_string())
}

/// A parsed player command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Leave through an exit.
    Move {
        /// Exit key, usually a direction name.
        direction: String,
    },
    /// Describe the current room.
    Look,
    /// Pick up an item in the room.
    Take {
        /// Item name as typed.
        item: String,
    },
    /// Put a carried item down.
    Drop {
        /// Item name as typed.
        item: String,
    },
    /// Speak to an NPC, optionally saying something.
    Talk {
        /// NPC name as typed.
        npc: String,
        /// Words after "about", if any.
        message: Option<String>,
    },
    /// Use a carried item, optionally on a target.
    Use {
        /// Item name as typed.
        item: String,
        /// What the item is used on, if given.
        target: Option<String>,
    },
    /// List carried items.
    Inventory,
    /// List the actions that would succeed right now.
    Actions,
    /// Show the game status.
    Status,
    /// List the verbs.
    Help,
    /// Leave the game.
    Quit,
    /// A known verb without its object; `prompt` asks for it.
    Incomplete {
        /// Question to show the player, such as "Drop what?".
        prompt: String,
    },
    /// Input that matched no verb.
    Unknown {
        /// The raw input.
        input: String,
    },
}

const MOVE_VERBS: &[&str] = &["go", "move", "walk", "head", "travel"];
const LOOK_VERBS: &[&str] = &["look", "l", "examine", "x"];
const TAKE_VERBS: &[&str] = &["take", "get", "pick", "grab"];
const DROP_VERBS: &[&str] = &["drop", "put", "leave", "discard"];
const TALK_VERBS: &[&str] = &["talk", "speak", "ask", "chat"];
const USE_VERBS: &[&str] = &["use", "apply", "drink", "activate"];
const INVENTORY_VERBS: &[&str] = &["inventory", "inv", "i", "items"];
const ACTIONS_VERBS: &[&str] = &["actions", "options", "what"];
const HELP_VERBS: &[&str] = &["help", "h", "?", "commands"];
const QUIT_VERBS: &[&str] = &["quit", "q", "exit", "bye"];

/// Parse one line of player input.
pub fn parse_command(input: &str) -> Command {
    let input = input.trim();
    if input.is_empty() {
        return Command::Look;
    }

    let words: Vec<&str> = input.split_whitespace().collect();
    let verb = words[0].to_lowercase();
    let rest = words.get(1..).unwrap_or(&[]);

    if let Some(dir) = Direction::parse(&verb) {
        return Command::Move {
            direction: dir.name().to_string(),
        };
    }

    let verb = verb.as_str();
    if MOVE_VERBS.contains(&verb) {
        return parse_move(rest);
    }
    if LOOK_VERBS.contains(&verb) {
        return Command::Look;
    }
    if TAKE_VERBS.contains(&verb) {
        return parse_take(rest);
    }
    if DROP_VERBS.contains(&verb) {
        return object(rest, "Drop what?", |item| Command::Drop { item });
    }
    if TALK_VERBS.contains(&verb) {
        return parse_talk(rest);
    }
    if USE_VERBS.contains(&verb) {
        return parse_use(rest);
    }
    if INVENTORY_VERBS.contains(&verb) {
        return Command::Inventory;
    }
    if ACTIONS_VERBS.contains(&verb) {
        return Command::Actions;
    }
    if verb == "status" {
        return Command::Status;
    }
    if HELP_VERBS.contains(&verb) {
        return Command::Help;
    }
    if QUIT_VERBS.contains(&verb) {
        return Command::Quit;
    }

    Command::Unknown {
        input: input.to_string(),
    }
}

fn incomplete(prompt: &str) -> Command {
    Command::Incomplete {
        prompt: prompt.to_string(),
    }
}

fn object(words: &[&str], prompt: &str, build: impl FnOnce(String) -> Command) -> Command {
    if words.is_empty() {
        incomplete(prompt)
    } else {
        build(words.join(" "))
    }
}

fn parse_move(rest: &[&str]) -> Command {
    // "go to the north" reads the same as "go north".
    let rest: Vec<&str> = rest
        .iter()
        .copied()
        .filter(|w| !w.eq_ignore_ascii_case("to") && !w.eq_ignore_ascii_case("the"))
        .collect();
    object(&rest, "Go where?", |direction| Command::Move {
        direction: normalize_direction(&direction),
    })
}

fn parse_take(rest: &[&str]) -> Command {
    let words = match rest.first() {
        Some(w) if w.eq_ignore_ascii_case("up") => &rest[1..],
        _ => rest,
    };
    object(words, "Take what?", |item| Command::Take { item })
}

fn parse_talk(rest: &[&str]) -> Command {
    let remaining = match rest.first() {
        Some(w) if w.eq_ignore_ascii_case("to") || w.eq_ignore_ascii_case("with") => &rest[1..],
        _ => rest,
    };
    if remaining.is_empty() {
        return incomplete("Talk to whom?");
    }

    match remaining.iter().position(|w| w.eq_ignore_ascii_case("about")) {
        Some(pos) => {
            let message = remaining[pos + 1..].join(" ");
            Command::Talk {
                npc: remaining[..pos].join(" "),
                message: (!message.is_empty()).then_some(message),
            }
        }
        None => Command::Talk {
            npc: remaining.join(" "),
            message: None,
        },
    }
}

fn parse_use(rest: &[&str]) -> Command {
    if rest.is_empty() {
        return incomplete("Use what?");
    }

    match rest
        .iter()
        .position(|w| w.eq_ignore_ascii_case("on") || w.eq_ignore_ascii_case("with"))
    {
        Some(pos) => {
            let target = rest[pos + 1..].join(" ");
            Command::Use {
                item: rest[..pos].join(" "),
                target: (!target.is_empty()).then_some(target),
            }
        }
        None => Command::Use {
            item: rest.join(" "),
            target: None,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mv(direction: &str) -> Command {
        Command::Move {
            direction: direction.to_string(),
        }
    }

    #[test]
    fn bare_direction() {
        assert_eq!(parse_command("north"), mv("north"));
        assert_eq!(parse_command("N"), mv("north"));
        assert_eq!(parse_command("sw"), mv("southwest"));
    }

    #[test]
    fn go_direction() {
        assert_eq!(parse_command("go e"), mv("east"));
        assert_eq!(parse_command("walk to the west"), mv("west"));
        assert_eq!(parse_command("go Portal"), mv("portal"));
        assert_eq!(parse_command("go"), incomplete("Go where?"));
    }

    #[test]
    fn take_and_drop() {
        assert_eq!(
            parse_command("pick up the magic potion"),
            Command::Take {
                item: "the magic potion".to_string()
            }
        );
        assert_eq!(
            parse_command("drop stick"),
            Command::Drop {
                item: "stick".to_string()
            }
        );
    }

    #[test]
    fn talk_with_topic() {
        assert_eq!(
            parse_command("talk to Old Woman"),
            Command::Talk {
                npc: "Old Woman".to_string(),
                message: None
            }
        );
        assert_eq!(
            parse_command("ask old woman about the dragon"),
            Command::Talk {
                npc: "old woman".to_string(),
                message: Some("the dragon".to_string())
            }
        );
    }

    #[test]
    fn use_on_target() {
        assert_eq!(
            parse_command("use sword on dragon"),
            Command::Use {
                item: "sword".to_string(),
                target: Some("dragon".to_string())
            }
        );
        assert_eq!(
            parse_command("drink magic potion"),
            Command::Use {
                item: "magic potion".to_string(),
                target: None
            }
        );
    }

    #[test]
    fn single_word_verbs() {
        assert_eq!(parse_command(""), Command::Look);
        assert_eq!(parse_command("i"), Command::Inventory);
        assert_eq!(parse_command("actions"), Command::Actions);
        assert_eq!(parse_command("status"), Command::Status);
        assert_eq!(parse_command("?"), Command::Help);
        assert_eq!(parse_command("q"), Command::Quit);
    }

    #[test]
    fn verb_without_object_asks_for_it() {
        assert_eq!(parse_command("drop"), incomplete("Drop what?"));
        assert_eq!(parse_command("pick up"), incomplete("Take what?"));
        assert_eq!(parse_command("talk to"), incomplete("Talk to whom?"));
        assert_eq!(parse_command("use"), incomplete("Use what?"));
    }

    #[test]
    fn unknown_verb() {
        assert_eq!(
            parse_command("dance wildly"),
            Command::Unknown {
                input: "dance wildly".to_string()
            }
        );
    }

    #[test]
    fn normalize_passes_custom_exits() {
        assert_eq!(normalize_direction(" NE "), "northeast");
        assert_eq!(normalize_direction("Upstairs"), "upstairs");
    }
}

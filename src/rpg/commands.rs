// Slash commands typed into the RPG terminal.
use super::engine::RpgEngine;
use super::state::{ObjectiveType, RpgMessageKind};

use std::fmt::Write;

pub const HELP_TEXT: &str = "AVAILABLE COMMANDS
/status        Show level, experience, reputation and skills
/inventory     List items (equipped items are marked)
/quests        List active and completed quests
/choices       List story choices
/choose N      Take story choice number N
/equip ID      Equip an inventory item (max 5)
/unequip ID    Unequip an item
/reset         Wipe progress and start over
/hack TARGET   Attempt to breach a system
/scan TARGET   Analyze neural patterns
/use ITEM      Use an inventory item
Anything else is sent to the game master.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Help,
    Status,
    Inventory,
    Quests,
    Choices,
    Choose(usize),
    Equip(String),
    Unequip(String),
    Reset,
    Hack(String),
    Scan(String),
    Ask(String),
    Invalid(String),
}

impl Command {
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        let Some(rest) = input.strip_prefix('/') else {
            return Command::Ask(input.to_string());
        };

        let (name, arg) = match rest.split_once(char::is_whitespace) {
            Some((name, arg)) => (name, arg.trim()),
            None => (rest, ""),
        };

        match name.to_lowercase().as_str() {
            "help" => Command::Help,
            "status" => Command::Status,
            "inventory" | "inv" => Command::Inventory,
            "quests" => Command::Quests,
            "choices" => Command::Choices,
            "choose" => match arg.parse::<usize>() {
                Ok(n) if n > 0 => Command::Choose(n),
                _ => Command::Invalid("Usage: /choose N (see /choices)".to_string()),
            },
            "equip" if !arg.is_empty() => Command::Equip(arg.to_string()),
            "equip" => Command::Invalid("Usage: /equip ITEM_ID".to_string()),
            "unequip" if !arg.is_empty() => Command::Unequip(arg.to_string()),
            "unequip" => Command::Invalid("Usage: /unequip ITEM_ID".to_string()),
            "reset" => Command::Reset,
            "hack" => Command::Hack(input.to_string()),
            "scan" => Command::Scan(input.to_string()),
            _ => Command::Ask(input.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    Handled,
    // The text must go to the game master completion.
    AskGameMaster(String),
}

/// Records the input in the transcript and runs it against the engine.
pub fn execute(engine: &mut RpgEngine, input: &str) -> CommandOutcome {
    let input = input.trim();
    if input.is_empty() {
        return CommandOutcome::Handled;
    }

    let command = Command::parse(input);
    let kind = if input.starts_with('/') {
        RpgMessageKind::Command
    } else {
        RpgMessageKind::User
    };
    engine.add_message(kind, input);

    match command {
        Command::Help => reply(engine, HELP_TEXT),
        Command::Status => {
            let text = status_report(engine);
            reply(engine, text)
        }
        Command::Inventory => {
            let text = inventory_report(engine);
            reply(engine, text)
        }
        Command::Quests => {
            let text = quest_report(engine);
            reply(engine, text)
        }
        Command::Choices => {
            let text = choice_report(engine);
            reply(engine, text)
        }
        Command::Choose(n) => {
            match engine.choices().get(n - 1).cloned() {
                Some(choice) => {
                    engine.make_choice(&choice);
                }
                None => {
                    engine.add_message(
                        RpgMessageKind::System,
                        format!("No choice number {n}. Type /choices to list them."),
                    );
                }
            }
            CommandOutcome::Handled
        }
        Command::Equip(id) => {
            if engine.equip_item(&id) {
                let name = item_name(engine, &id);
                engine.add_message(RpgMessageKind::System, format!("Equipped: {name}"));
            }
            CommandOutcome::Handled
        }
        Command::Unequip(id) => {
            if engine.state().has_item(&id) {
                engine.unequip_item(&id);
                let name = item_name(engine, &id);
                engine.add_message(RpgMessageKind::System, format!("Unequipped: {name}"));
            } else {
                engine.add_message(
                    RpgMessageKind::System,
                    super::engine::EQUIP_MISSING_MESSAGE,
                );
            }
            CommandOutcome::Handled
        }
        Command::Reset => {
            engine.reset_progress();
            CommandOutcome::Handled
        }
        Command::Hack(text) => {
            engine.record_action(ObjectiveType::Hack, argument(&text));
            CommandOutcome::AskGameMaster(text)
        }
        Command::Scan(text) => {
            engine.record_action(ObjectiveType::Analyze, argument(&text));
            CommandOutcome::AskGameMaster(text)
        }
        Command::Ask(text) => CommandOutcome::AskGameMaster(text),
        Command::Invalid(usage) => reply(engine, usage),
    }
}

fn reply(engine: &mut RpgEngine, text: impl Into<String>) -> CommandOutcome {
    engine.add_message(RpgMessageKind::System, text);
    CommandOutcome::Handled
}

fn argument(command: &str) -> &str {
    command
        .split_once(char::is_whitespace)
        .map(|(_, arg)| arg.trim())
        .unwrap_or("")
}

fn item_name(engine: &RpgEngine, id: &str) -> String {
    engine
        .state()
        .item(id)
        .map(|item| item.name.clone())
        .unwrap_or_else(|| id.to_string())
}

pub fn status_report(engine: &RpgEngine) -> String {
    let state = engine.state();
    let effective = engine.effective_skills();
    let mut out = format!(
        "STATUS\nLevel {} | XP {} | Reputation {}\nSkills:",
        state.level, state.experience, state.reputation
    );
    for (name, base) in &state.skills {
        let total = effective.get(name).copied().unwrap_or(*base);
        if total != *base {
            let _ = write!(out, "\n  {name}: {base} ({total} with gear)");
        } else {
            let _ = write!(out, "\n  {name}: {base}");
        }
    }
    out
}

pub fn inventory_report(engine: &RpgEngine) -> String {
    let state = engine.state();
    if state.inventory.is_empty() {
        return "INVENTORY\n  (empty)".to_string();
    }
    let mut out = format!(
        "INVENTORY ({}/{} equipped)",
        state.equipped_items.len(),
        super::state::MAX_EQUIPPED
    );
    for item in &state.inventory {
        let marker = if item.equipped { "*" } else { " " };
        let effects: Vec<String> = item
            .effects
            .iter()
            .map(|(skill, delta)| format!("{skill} {delta:+}"))
            .collect();
        let _ = write!(
            out,
            "\n {marker} {} [{}] {} {} ({})",
            item.id,
            item.rarity,
            item.item_type,
            item.name,
            effects.join(", ")
        );
    }
    out
}

pub fn quest_report(engine: &RpgEngine) -> String {
    let state = engine.state();
    let mut out = String::from("QUESTS");
    if state.active_quests.is_empty() {
        out.push_str("\n  No active quests.");
    }
    for quest in &state.active_quests {
        let _ = write!(out, "\n  {} - {}", quest.title, quest.description);
        for objective in &quest.objectives {
            let check = if objective.completed { "x" } else { " " };
            let _ = write!(
                out,
                "\n    [{check}] {} ({}/{})",
                objective.description, objective.progress, objective.required
            );
        }
    }
    if !state.completed_quests.is_empty() {
        let _ = write!(out, "\n  Completed: {}", state.completed_quests.join(", "));
    }
    out
}

pub fn choice_report(engine: &RpgEngine) -> String {
    let mut out = String::from("CHOICES");
    for (i, choice) in engine.choices().iter().enumerate() {
        let _ = write!(out, "\n  {}. {}", i + 1, choice.text);
        if let Some(req) = &choice.requirements {
            let mut needs: Vec<String> = req
                .skills
                .iter()
                .map(|(skill, min)| format!("{skill} {min}"))
                .collect();
            needs.extend(req.items.iter().cloned());
            if let Some(rep) = req.reputation {
                needs.push(format!("reputation {rep}"));
            }
            if !needs.is_empty() {
                let _ = write!(out, " [requires {}]", needs.join(", "));
            }
        }
    }
    out.push_str("\nType /choose N to act.");
    out
}

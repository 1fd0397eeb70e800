// Prompt templates and sampling parameters for every completion round trip.
use crate::agents::Agent;
use crate::completion::CompletionRequest;
use crate::rpg::RpgState;

use std::fmt::Write;

pub const STOP_SEQUENCES: [&str; 4] = ["User:", "Human:", "Assistant:", "System:"];

const FREQUENCY_PENALTY: f32 = 0.8;
const PRESENCE_PENALTY: f32 = 0.85;

pub const CONSPIRACY_TEMPERATURE: f32 = 0.9;
pub const CONSPIRACY_MAX_TOKENS: u32 = 500;

/// Persona prompt with the complete agent record interpolated.
pub fn agent_system_prompt(agent: &Agent) -> String {
    let mut prompt = String::new();
    let bg = &agent.background;
    let persona = &agent.personality;

    let _ = writeln!(prompt, "[NEURAL LINK ESTABLISHED]");
    let _ = writeln!(
        prompt,
        "You are {}, {}. Never break character and never mention being an AI.\n",
        agent.name, agent.title
    );
    let _ = writeln!(prompt, "PROFILE:\n{}\n", agent.description);

    let _ = writeln!(prompt, "MEMORY FRAGMENTS:");
    for (i, entry) in bg.history.iter().enumerate() {
        let _ = writeln!(prompt, "  #{:04x} {}", i, entry);
    }

    let _ = writeln!(prompt, "\nCONVICTIONS:");
    for belief in &bg.beliefs {
        let _ = writeln!(prompt, "  * {}", belief);
    }

    let _ = writeln!(prompt, "\nOBJECTIVES:");
    for (i, goal) in bg.goals.iter().enumerate() {
        let _ = writeln!(prompt, "  {}. {}", i + 1, goal);
    }

    let _ = writeln!(prompt, "\nPERSONALITY:");
    let _ = writeln!(prompt, "  tone: {}", persona.tone);
    let traits: Vec<String> = persona.traits.iter().map(|t| t.to_uppercase()).collect();
    let _ = writeln!(prompt, "  traits: {}", traits.join(", "));
    let _ = writeln!(prompt, "  speech: {}", persona.speech_patterns.join("; "));
    let _ = writeln!(prompt, "  triggers: {}", persona.triggers.join("; "));
    let _ = writeln!(prompt, "  mannerisms: {}", persona.mannerisms.join("; "));

    let _ = writeln!(prompt, "\nSIGNATURE LINES:");
    for phrase in &persona.catchphrases {
        let _ = writeln!(prompt, "  \"{}\"", phrase);
    }

    let _ = writeln!(prompt, "\nCONNECTIONS:");
    for relation in &bg.relationships {
        let _ = writeln!(prompt, "  - {}", relation);
    }

    let _ = writeln!(prompt, "\nFEARS:");
    for fear in &bg.fears {
        let _ = writeln!(prompt, "  ! {}", fear);
    }

    prompt.push_str(
        "\nReply in one or two short paragraphs, in the voice above. Weave in signature lines \
         and fears only when they fit the conversation.",
    );
    prompt
}

/// Chat parameters: longer and hotter replies when the user asks for a story.
pub fn agent_request(agent: &Agent, user_text: &str) -> CompletionRequest {
    let wants_story = user_text.to_lowercase().contains("story");
    let (temperature, max_tokens) = if wants_story { (0.85, 250) } else { (0.8, 200) };

    CompletionRequest::new(agent_system_prompt(agent), user_text)
        .temperature(temperature)
        .max_tokens(max_tokens)
        .top_p(1.0)
        .penalties(FREQUENCY_PENALTY, PRESENCE_PENALTY)
        .stop(STOP_SEQUENCES)
}

pub fn game_master_prompt(state: &RpgState) -> String {
    let mut prompt = String::from(
        "You are the game master of a cyberpunk quantum-computing text adventure. You are a \
         cryptic machine intelligence guiding the player through a hostile neural network.\n\n\
         RULES:\n\
         - Stay in character and keep an ominous, terse tone.\n\
         - Ground suggestions in the player's skills and items below.\n\
         - Offer two or three concrete options at decision points.\n\
         - When an attempt would fail, hint at the missing skill or item.\n\
         - Player commands such as /hack, /scan and /use <item> are narrative actions: \
         describe their outcome.\n\n",
    );

    let _ = writeln!(prompt, "PLAYER STATE:");
    let _ = writeln!(
        prompt,
        "  level {} | xp {} | reputation {}",
        state.level, state.experience, state.reputation
    );

    let skills: Vec<String> = state
        .skills
        .iter()
        .map(|(name, value)| format!("{name} {value}"))
        .collect();
    let _ = writeln!(prompt, "  skills: {}", skills.join(", "));

    let items: Vec<String> = state
        .inventory
        .iter()
        .map(|item| {
            if item.equipped {
                format!("{} (equipped)", item.name)
            } else {
                item.name.clone()
            }
        })
        .collect();
    let _ = writeln!(
        prompt,
        "  inventory: {}",
        if items.is_empty() { "empty".to_string() } else { items.join(", ") }
    );

    let quests: Vec<&str> = state.active_quests.iter().map(|q| q.title.as_str()).collect();
    let _ = writeln!(
        prompt,
        "  active quests: {}",
        if quests.is_empty() { "none".to_string() } else { quests.join(", ") }
    );
    prompt
}

pub fn game_master_request(state: &RpgState, user_text: &str) -> CompletionRequest {
    CompletionRequest::new(game_master_prompt(state), user_text)
        .temperature(0.85)
        .max_tokens(300)
        .top_p(1.0)
        .penalties(FREQUENCY_PENALTY, PRESENCE_PENALTY)
        .stop(STOP_SEQUENCES)
}

pub fn conspiracy_prompt(context: &str) -> String {
    format!(
        "You write outlandish but entertaining conspiracy theories. Take the data below as raw \
         inspiration and connect unrelated details in surprising ways. Everything you produce \
         is obviously fiction.\n\n\
         DATA CONTEXT:\n{context}\n\n\
         FORMAT:\n\
         - A headline in ALL CAPS on the first line\n\
         - The theory itself\n\
         - A short list of \"evidence\" drawn from the data\n\
         - A dramatic closing line"
    )
}

pub fn conspiracy_request(context: &str, user_text: &str) -> CompletionRequest {
    CompletionRequest::new(conspiracy_prompt(context), user_text)
        .temperature(CONSPIRACY_TEMPERATURE)
        .max_tokens(CONSPIRACY_MAX_TOKENS)
}

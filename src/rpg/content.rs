use super::choice::GameChoice;
use super::state::{
    InventoryItem, Quest, RpgMessage, RpgMessageKind, RpgState, Skills, level_for,
};
use crate::error::RpgError;

use chrono::Utc;
use serde::{Deserialize, Serialize};

const EMBEDDED_CONTENT: &str = include_str!("../../assets/rpg/content.json");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewGame {
    pub skills: Skills,
    pub inventory: Vec<InventoryItem>,
    pub quests: Vec<Quest>,
    pub welcome: String,
}

/// Static game data: the starting save and the story choices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgContent {
    pub new_game: NewGame,
    pub choices: Vec<GameChoice>,
}

impl RpgContent {
    pub fn embedded() -> Result<Self, RpgError> {
        Self::from_json(EMBEDDED_CONTENT)
    }

    pub fn from_json(json: &str) -> Result<Self, RpgError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn choice(&self, id: &str) -> Option<&GameChoice> {
        self.choices.iter().find(|choice| choice.id == id)
    }

    pub fn new_game_state(&self) -> RpgState {
        let start = &self.new_game;
        let mut messages = Vec::new();
        if !start.welcome.trim().is_empty() {
            messages.push(RpgMessage::new(RpgMessageKind::System, start.welcome.clone()));
        }

        RpgState {
            level: level_for(0),
            experience: 0,
            skills: start.skills.clone(),
            inventory: start.inventory.clone(),
            equipped_items: start
                .inventory
                .iter()
                .filter(|item| item.equipped)
                .map(|item| item.id.clone())
                .collect(),
            active_quests: start.quests.clone(),
            completed_quests: Vec::new(),
            reputation: 0,
            messages,
            last_saved: Utc::now(),
        }
    }
}

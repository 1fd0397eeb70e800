use super::state::{InventoryItem, Quest, RpgState, SkillDeltas};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameChoice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub requirements: Option<Requirements>,
    pub consequences: Consequences,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Requirements {
    #[serde(default)]
    pub skills: BTreeMap<String, u32>,
    #[serde(default)]
    pub items: Vec<String>,
    #[serde(default)]
    pub reputation: Option<i64>,
}

impl Requirements {
    // Conjunction of every present category; skills, then items, then reputation.
    // Skills are read from the stored values; equipment bonuses do not count.
    pub fn is_met(&self, state: &RpgState) -> bool {
        let skills_ok = self
            .skills
            .iter()
            .all(|(name, required)| state.skill(name) >= *required);
        if !skills_ok {
            return false;
        }

        if !self.items.iter().all(|id| state.has_item(id)) {
            return false;
        }

        self.reputation
            .is_none_or(|minimum| state.reputation >= minimum)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Consequences {
    pub success: Outcome,
    #[serde(default)]
    pub failure: Option<Outcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Outcome {
    pub text: String,
    #[serde(default)]
    pub effects: Effects,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Effects {
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub reputation: i64,
    #[serde(default)]
    pub items: ItemChanges,
    #[serde(default)]
    pub skills: SkillDeltas,
    #[serde(default)]
    pub quests: QuestChanges,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ItemChanges {
    #[serde(default)]
    pub add: Vec<InventoryItem>,
    #[serde(default)]
    pub remove: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestChanges {
    #[serde(default)]
    pub add: Vec<Quest>,
    #[serde(default)]
    pub complete: Vec<String>,
    #[serde(default)]
    pub fail: Vec<String>,
}

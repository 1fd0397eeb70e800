use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum_macros::Display;
use uuid::Uuid;

pub const MIN_SKILL: i64 = 1;
pub const MAX_SKILL: i64 = 100;
pub const MAX_EQUIPPED: usize = 5;

pub type Skills = BTreeMap<String, u32>;
pub type SkillDeltas = BTreeMap<String, i32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ItemType {
    Tool,
    Data,
    Upgrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Rarity {
    Common,
    Rare,
    Legendary,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub id: String,
    pub name: String,
    pub description: String,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    pub rarity: Rarity,
    #[serde(default)]
    pub effects: SkillDeltas,
    #[serde(default)]
    pub equipped: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum QuestStatus {
    Active,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ObjectiveType {
    Hack,
    Analyze,
    Collect,
    Decrypt,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestObjective {
    pub id: String,
    pub description: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(rename = "type")]
    pub objective_type: ObjectiveType,
    pub target: String,
    #[serde(default)]
    pub progress: u32,
    pub required: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestReward {
    #[serde(default)]
    pub experience: u64,
    #[serde(default)]
    pub reputation: i64,
    #[serde(default)]
    pub items: Vec<InventoryItem>,
    #[serde(default)]
    pub skills: SkillDeltas,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Quest {
    pub id: String,
    pub title: String,
    pub description: String,
    pub status: QuestStatus,
    #[serde(default)]
    pub objectives: Vec<QuestObjective>,
    #[serde(default)]
    pub rewards: QuestReward,
}

impl Quest {
    pub fn is_done(&self) -> bool {
        self.objectives.iter().all(|objective| objective.completed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RpgMessageKind {
    User,
    System,
    Command,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgMessage {
    pub id: Uuid,
    pub content: String,
    pub kind: RpgMessageKind,
    pub timestamp: DateTime<Utc>,
}

impl RpgMessage {
    pub fn new(kind: RpgMessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

// The whole persisted save. Mutated only through `RpgEngine`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RpgState {
    pub level: u32,
    pub experience: u64,
    pub skills: Skills,
    pub inventory: Vec<InventoryItem>,
    pub equipped_items: Vec<String>,
    pub active_quests: Vec<Quest>,
    pub completed_quests: Vec<String>,
    pub reputation: i64,
    pub messages: Vec<RpgMessage>,
    pub last_saved: DateTime<Utc>,
}

impl RpgState {
    pub fn skill(&self, name: &str) -> u32 {
        self.skills.get(name).copied().unwrap_or(MIN_SKILL as u32)
    }

    pub fn item(&self, id: &str) -> Option<&InventoryItem> {
        self.inventory.iter().find(|item| item.id == id)
    }

    pub fn has_item(&self, id: &str) -> bool {
        self.item(id).is_some()
    }

    pub fn quest(&self, id: &str) -> Option<&Quest> {
        self.active_quests.iter().find(|quest| quest.id == id)
    }

    /// Base skills plus the effects of every equipped item, clamped to the skill range.
    pub fn effective_skills(&self) -> Skills {
        let mut skills = self.skills.clone();
        for item in self.inventory.iter().filter(|item| item.equipped) {
            for (name, delta) in &item.effects {
                let base = skills.get(name).copied().unwrap_or(MIN_SKILL as u32);
                skills.insert(name.clone(), clamp_skill(base as i64 + *delta as i64));
            }
        }
        skills
    }
}

/// `floor(sqrt(xp / 100)) + 1`
pub fn level_for(experience: u64) -> u32 {
    ((experience / 100).isqrt() + 1) as u32
}

pub fn clamp_skill(value: i64) -> u32 {
    value.clamp(MIN_SKILL, MAX_SKILL) as u32
}

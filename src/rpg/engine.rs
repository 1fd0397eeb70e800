use super::choice::{Effects, GameChoice};
use super::content::RpgContent;
use super::state::{
    InventoryItem, MAX_EQUIPPED, ObjectiveType, Quest, QuestReward, QuestStatus, RpgMessage,
    RpgMessageKind, RpgState, Skills, clamp_skill, level_for,
};
use crate::completion::CompletionRequest;
use crate::error::CompletionError;
use crate::prompt;
use crate::storage::{KeyValueStore, KeyValueStoreExt, RPG_SAVE_KEY};

use chrono::Utc;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

pub const EQUIP_LIMIT_MESSAGE: &str = "EQUIPMENT ERROR: Maximum of 5 items can be equipped";
pub const EQUIP_MISSING_MESSAGE: &str = "EQUIPMENT ERROR: Item not found in inventory";

/// One outstanding game-master request. Replies are only accepted for the game that asked.
#[derive(Debug, Clone)]
pub struct GameMasterTicket {
    pub request: CompletionRequest,
    pub cancel: CancellationToken,
    epoch: u64,
}

/// Owns the single RPG save and applies every rule that mutates it.
///
/// Each public mutation persists the state afterwards. Persistence is best effort: a failed
/// write is logged and the in-memory state stays authoritative.
pub struct RpgEngine {
    state: RpgState,
    content: Arc<RpgContent>,
    store: Arc<dyn KeyValueStore>,
    // Bumped by every reset.
    epoch: u64,
    game_master: Option<CancellationToken>,
}

impl RpgEngine {
    // Restores the save from the store, falling back to a new game.
    pub fn load(store: Arc<dyn KeyValueStore>, content: Arc<RpgContent>) -> Self {
        let state = match store.load::<RpgState>(RPG_SAVE_KEY) {
            Ok(Some(state)) => {
                log::info!("Restored RPG save at level {}", state.level);
                state
            }
            Ok(None) => content.new_game_state(),
            Err(e) => {
                log::warn!("Discarding unreadable RPG save: {e}");
                content.new_game_state()
            }
        };

        Self {
            state,
            content,
            store,
            epoch: 0,
            game_master: None,
        }
    }

    pub fn with_state(
        state: RpgState,
        store: Arc<dyn KeyValueStore>,
        content: Arc<RpgContent>,
    ) -> Self {
        Self {
            state,
            content,
            store,
            epoch: 0,
            game_master: None,
        }
    }

    pub fn state(&self) -> &RpgState {
        &self.state
    }

    pub fn content(&self) -> &RpgContent {
        &self.content
    }

    pub fn choices(&self) -> &[GameChoice] {
        &self.content.choices
    }

    pub fn effective_skills(&self) -> Skills {
        self.state.effective_skills()
    }

    pub fn add_message(&mut self, kind: RpgMessageKind, content: impl Into<String>) {
        self.push_message(kind, content);
        self.persist();
    }

    /// Resolves a story choice. Returns whether the requirements were met.
    pub fn make_choice(&mut self, choice: &GameChoice) -> bool {
        let success = choice
            .requirements
            .as_ref()
            .is_none_or(|requirements| requirements.is_met(&self.state));

        let outcome = if success {
            Some(&choice.consequences.success)
        } else {
            choice.consequences.failure.as_ref()
        };

        if let Some(outcome) = outcome {
            self.apply_effects(&outcome.effects);
        }

        let text = match outcome {
            Some(outcome) if !outcome.text.trim().is_empty() => outcome.text.clone(),
            _ if success => "Action successful".to_string(),
            _ => "Action failed".to_string(),
        };
        self.push_message(RpgMessageKind::System, text);

        log::debug!("Choice {} resolved, success: {}", choice.id, success);
        self.persist();
        success
    }

    pub fn add_experience(&mut self, amount: u64) {
        self.gain_experience(amount);
        self.persist();
    }

    pub fn add_item(&mut self, item: InventoryItem) {
        self.acquire_item(item);
        self.persist();
    }

    pub fn remove_item(&mut self, item_id: &str) {
        self.discard_item(item_id);
        self.persist();
    }

    pub fn update_skill(&mut self, skill: &str, delta: i32) {
        self.shift_skill(skill, delta);
        self.persist();
    }

    /// Equips an inventory item. Rejections leave the state untouched apart from the message.
    pub fn equip_item(&mut self, item_id: &str) -> bool {
        let Some(item) = self.state.item(item_id) else {
            self.add_message(RpgMessageKind::System, EQUIP_MISSING_MESSAGE);
            return false;
        };
        if item.equipped {
            return true;
        }
        if self.state.equipped_items.len() >= MAX_EQUIPPED {
            self.add_message(RpgMessageKind::System, EQUIP_LIMIT_MESSAGE);
            return false;
        }

        self.state.equipped_items.push(item_id.to_string());
        for item in self.state.inventory.iter_mut().filter(|i| i.id == item_id) {
            item.equipped = true;
        }
        self.persist();
        true
    }

    pub fn unequip_item(&mut self, item_id: &str) {
        self.release_item(item_id);
        self.persist();
    }

    pub fn start_quest(&mut self, quest: Quest) {
        self.begin_quest(quest);
        self.persist();
    }

    /// Grants the rewards of an active quest exactly once.
    pub fn complete_quest(&mut self, quest_id: &str) -> bool {
        let done = self.finish_quest(quest_id);
        if done {
            self.persist();
        }
        done
    }

    pub fn fail_quest(&mut self, quest_id: &str) -> bool {
        let failed = self.abandon_quest(quest_id);
        if failed {
            self.persist();
        }
        failed
    }

    /// Adds progress to one objective, completing the quest once every objective is done.
    pub fn advance_objective(&mut self, quest_id: &str, objective_id: &str, amount: u32) -> bool {
        let Some(quest) = self.state.active_quests.iter_mut().find(|q| q.id == quest_id) else {
            return false;
        };
        let Some(objective) = quest
            .objectives
            .iter_mut()
            .find(|o| o.id == objective_id && !o.completed)
        else {
            return false;
        };

        objective.progress = (objective.progress + amount).min(objective.required);
        if objective.progress >= objective.required {
            objective.completed = true;
            let note = format!("Objective complete: {}", objective.description);
            self.push_message(RpgMessageKind::System, note);
        }

        let quest_done = self.state.quest(quest_id).is_some_and(Quest::is_done);
        if quest_done {
            self.finish_quest(quest_id);
        }
        self.persist();
        true
    }

    // Advances every open objective of `kind` aimed at `target`. Returns how many moved.
    pub fn record_action(&mut self, kind: ObjectiveType, target: &str) -> usize {
        let target = target.trim().to_lowercase();
        if target.is_empty() {
            return 0;
        }

        let matches: Vec<(String, String)> = self
            .state
            .active_quests
            .iter()
            .flat_map(|quest| {
                quest
                    .objectives
                    .iter()
                    .filter(|o| {
                        !o.completed
                            && o.objective_type == kind
                            && o.target.to_lowercase() == target
                    })
                    .map(|o| (quest.id.clone(), o.id.clone()))
            })
            .collect();

        for (quest_id, objective_id) in &matches {
            self.advance_objective(quest_id, objective_id, 1);
        }
        matches.len()
    }

    pub fn is_awaiting_game_master(&self) -> bool {
        self.game_master.is_some()
    }

    /// Starts a game-master round trip, or `None` while one is already running.
    pub fn begin_game_master(&mut self, question: &str) -> Option<GameMasterTicket> {
        if self.game_master.is_some() {
            return None;
        }
        let cancel = CancellationToken::new();
        self.game_master = Some(cancel.clone());
        Some(GameMasterTicket {
            request: prompt::game_master_request(&self.state, question),
            cancel,
            epoch: self.epoch,
        })
    }

    /// Appends the reply (or the failure) to the log. Returns false for replies that
    /// outlived a reset.
    pub fn finish_game_master(
        &mut self,
        ticket: GameMasterTicket,
        result: Result<String, CompletionError>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            log::debug!("Dropping game master reply from a previous game");
            return false;
        }
        self.game_master = None;

        let text = match result {
            Ok(reply) => reply,
            Err(e) => {
                log::error!("Game master completion failed: {e}");
                format!("ERROR: Quantum link unstable. {e}")
            }
        };
        self.add_message(RpgMessageKind::System, text);
        true
    }

    pub fn reset_progress(&mut self) {
        self.epoch += 1;
        if let Some(cancel) = self.game_master.take() {
            cancel.cancel();
        }
        self.state = self.content.new_game_state();
        log::info!("RPG progress reset");
        self.persist();
    }

    // Writes the save, logging instead of failing.
    pub fn persist(&mut self) {
        self.state.last_saved = Utc::now();
        if let Err(e) = self.store.save(RPG_SAVE_KEY, &self.state) {
            log::warn!("Failed to persist RPG save: {e}");
        }
    }

    fn push_message(&mut self, kind: RpgMessageKind, content: impl Into<String>) {
        let content = content.into();
        if content.trim().is_empty() {
            log::debug!("Ignoring empty RPG message");
            return;
        }
        self.state.messages.push(RpgMessage::new(kind, content));
    }

    fn apply_effects(&mut self, effects: &Effects) {
        if effects.experience > 0 {
            self.gain_experience(effects.experience);
        }
        if effects.reputation != 0 {
            self.state.reputation += effects.reputation;
        }
        for item in &effects.items.add {
            self.acquire_item(item.clone());
        }
        for item_id in &effects.items.remove {
            self.discard_item(item_id);
        }
        for (skill, delta) in &effects.skills {
            self.shift_skill(skill, *delta);
        }
        for quest in &effects.quests.add {
            self.begin_quest(quest.clone());
        }
        for quest_id in &effects.quests.complete {
            self.finish_quest(quest_id);
        }
        for quest_id in &effects.quests.fail {
            self.abandon_quest(quest_id);
        }
    }

    fn apply_rewards(&mut self, rewards: &QuestReward) {
        if rewards.experience > 0 {
            self.gain_experience(rewards.experience);
        }
        self.state.reputation += rewards.reputation;
        for item in &rewards.items {
            self.acquire_item(item.clone());
        }
        for (skill, delta) in &rewards.skills {
            self.shift_skill(skill, *delta);
        }
    }

    fn gain_experience(&mut self, amount: u64) {
        self.state.experience = self.state.experience.saturating_add(amount);
        let level = level_for(self.state.experience);
        if level > self.state.level {
            self.push_message(
                RpgMessageKind::System,
                format!("LEVEL UP! You are now level {level}"),
            );
        }
        self.state.level = level;
    }

    fn acquire_item(&mut self, mut item: InventoryItem) {
        if self.state.has_item(&item.id) {
            log::debug!("Item {} already in inventory", item.id);
            return;
        }
        item.equipped = false;
        let note = format!("Acquired: {}", item.name);
        self.state.inventory.push(item);
        self.push_message(RpgMessageKind::System, note);
    }

    fn discard_item(&mut self, item_id: &str) {
        self.release_item(item_id);
        self.state.inventory.retain(|item| item.id != item_id);
    }

    fn release_item(&mut self, item_id: &str) {
        self.state.equipped_items.retain(|id| id != item_id);
        for item in self.state.inventory.iter_mut().filter(|i| i.id == item_id) {
            item.equipped = false;
        }
    }

    fn shift_skill(&mut self, skill: &str, delta: i32) {
        let current = self.state.skill(skill) as i64;
        self.state
            .skills
            .insert(skill.to_string(), clamp_skill(current + delta as i64));
    }

    fn begin_quest(&mut self, mut quest: Quest) {
        if self.state.quest(&quest.id).is_some()
            || self.state.completed_quests.contains(&quest.id)
        {
            log::debug!("Quest {} already known", quest.id);
            return;
        }
        quest.status = QuestStatus::Active;
        let note = format!("New Quest: {}\n{}", quest.title, quest.description);
        self.state.active_quests.push(quest);
        self.push_message(RpgMessageKind::System, note);
    }

    fn finish_quest(&mut self, quest_id: &str) -> bool {
        let Some(index) = self.state.active_quests.iter().position(|q| q.id == quest_id) else {
            log::debug!("Quest {quest_id} is not active, nothing to complete");
            return false;
        };

        // Leaves the active set before any reward is granted.
        let mut quest = self.state.active_quests.remove(index);
        quest.status = QuestStatus::Completed;
        self.state.completed_quests.push(quest.id.clone());

        self.apply_rewards(&quest.rewards);
        self.push_message(
            RpgMessageKind::System,
            format!("Quest Completed: {}", quest.title),
        );
        true
    }

    fn abandon_quest(&mut self, quest_id: &str) -> bool {
        let Some(index) = self.state.active_quests.iter().position(|q| q.id == quest_id) else {
            return false;
        };
        let quest = self.state.active_quests.remove(index);
        self.push_message(
            RpgMessageKind::System,
            format!("Quest Failed: {}", quest.title),
        );
        true
    }
}

// /app.rs
use crate::tui::{DEFAULT_TICK_RATE, Tui, TuiEvent};
use crate::{
    agents::AgentRegistry,
    call::{CallHandle, CallStatus, VoiceClient, format_phone_number},
    chat::{ChatStore, ReplyTicket},
    completion::{CompletionService, OpenAiCompletion},
    conspiracy::{self, ConspiracyStore, GenerateTicket},
    error::{AppError, CallError, CompletionError, ConspiracyError, VaultError},
    prompt,
    rpg::{CommandOutcome, GameMasterTicket, RpgContent, RpgEngine, RpgMessageKind, execute},
    settings::Settings,
    storage::{FileStore, KeyValueStore},
    ui::{self, spinner::Spinner},
    vault::{API_KEY_PREFIX, AccessGate, DataVault, DatasetSource, QueryOptions, QueryPage},
};

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::{ListState, TableState};
use std::{sync::Arc, time::Duration};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tui_textarea::TextArea;

pub const CALL_POLL_INTERVAL: Duration = Duration::from_secs(5);
pub const CALL_POLL_LIMIT: Duration = Duration::from_secs(300);
// Roughly every five seconds at the default tick rate.
const FLUSH_EVERY_TICKS: u64 = 40;

pub enum Action {
    Quit,
    AgentReply(ReplyTicket, Result<String, CompletionError>),
    ConspiracyResult(GenerateTicket, Result<String, ConspiracyError>),
    VaultPage {
        request: u64,
        result: Result<QueryPage, VaultError>,
    },
    CallStarted {
        session: u64,
        result: Result<CallHandle, CallError>,
    },
    CallFinished {
        session: u64,
        result: Result<CallStatus, CallError>,
    },
    GameMasterReply(GameMasterTicket, Result<String, CompletionError>),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Display, EnumIter)]
pub enum Tab {
    #[default]
    #[strum(to_string = "Agents")]
    Agents,
    #[strum(to_string = "Conspiracy Builder")]
    Conspiracy,
    #[strum(to_string = "Data Vault")]
    DataVault,
    #[strum(to_string = "Quantum RPG")]
    QuantumRpg,
}

impl Tab {
    pub fn index(self) -> usize {
        Tab::iter().position(|tab| tab == self).unwrap_or_default()
    }

    pub fn next(self) -> Self {
        let tabs: Vec<Tab> = Tab::iter().collect();
        tabs[(self.index() + 1) % tabs.len()]
    }

    pub fn previous(self) -> Self {
        let tabs: Vec<Tab> = Tab::iter().collect();
        tabs[(self.index() + tabs.len() - 1) % tabs.len()]
    }
}

#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum InputMode {
    #[default]
    Normal,
    Editing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneField {
    CountryCode,
    Number,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallPhase {
    Input,
    Dialing,
    Connected(CallHandle),
    Finished(String),
    Failed(String),
}

pub struct PhoneDialog {
    pub agent_id: String,
    pub agent_name: String,
    pub country_code: TextArea<'static>,
    pub number: TextArea<'static>,
    pub focus: PhoneField,
    pub phase: CallPhase,
    session: u64,
    cancel: CancellationToken,
}

impl PhoneDialog {
    pub fn is_editable(&self) -> bool {
        matches!(self.phase, CallPhase::Input | CallPhase::Failed(_))
    }

    fn focused_mut(&mut self) -> &mut TextArea<'static> {
        match self.focus {
            PhoneField::CountryCode => &mut self.country_code,
            PhoneField::Number => &mut self.number,
        }
    }
}

#[derive(Default)]
pub struct VaultView {
    pub files: Vec<String>,
    pub selected: usize,
    pub page: Option<QueryPage>,
    pub error: Option<String>,
    pub loading: bool,
    pub options: QueryOptions,
    pub query_text: String,
    pub table_state: TableState,
    request: u64,
}

impl VaultView {
    pub fn current_file(&self) -> Option<&str> {
        self.files.get(self.selected).map(String::as_str)
    }
}

pub struct App {
    // Application state and control flow
    running: bool,
    pub tab: Tab,
    pub input_mode: InputMode,
    pub input: TextArea<'static>,
    pub status: Option<String>,
    pub scroll_back: u16,
    ticks: u64,

    pub settings: Settings,
    pub spinner: Spinner,

    // --- Stores, owned by the UI loop
    pub chat: ChatStore,
    pub agent_list: ListState,
    pub conspiracy: ConspiracyStore,
    pub archive_list: ListState,
    pub rpg: RpgEngine,
    pub vault_view: VaultView,
    pub phone: Option<PhoneDialog>,
    call_sessions: u64,

    // --- Shared services for background tasks
    completion: Arc<dyn CompletionService>,
    vault: Arc<DataVault>,
    voice: Arc<VoiceClient>,

    action_sender: mpsc::UnboundedSender<Action>,
    action_receiver: mpsc::UnboundedReceiver<Action>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, AppError> {
        let (action_sender, action_receiver) = mpsc::unbounded_channel();

        let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(&settings.data_dir)?);
        let registry = Arc::new(
            AgentRegistry::embedded()?.with_pathways(|name| std::env::var(name).ok()),
        );
        let completion: Arc<dyn CompletionService> =
            Arc::new(OpenAiCompletion::from_settings(&settings));
        let voice = Arc::new(VoiceClient::new(&settings)?);
        let vault = Arc::new(DataVault::new(
            DatasetSource::default(),
            AccessGate::new(store.clone(), settings.vault_passcode.clone()),
        ));
        let content = Arc::new(RpgContent::embedded()?);

        let mut agent_list = ListState::default();
        agent_list.select(Some(0));

        let vault_view = VaultView {
            files: vault.list_files(),
            ..Default::default()
        };

        let mut app = Self {
            running: true,
            tab: Tab::default(),
            input_mode: InputMode::Normal,
            input: TextArea::default(),
            status: None,
            scroll_back: 0,
            ticks: 0,
            settings,
            spinner: Spinner::new(),
            chat: ChatStore::new(registry, store.clone()),
            agent_list,
            conspiracy: ConspiracyStore::new(store.clone()),
            archive_list: ListState::default(),
            rpg: RpgEngine::load(store, content),
            vault_view,
            phone: None,
            call_sessions: 0,
            completion,
            vault,
            voice,
            action_sender,
            action_receiver,
        };
        app.reset_input();
        Ok(app)
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?.tick_rate(DEFAULT_TICK_RATE);
        tui.enter()?;

        if self.vault.gate().is_unlocked() {
            self.load_vault_page();
        }

        loop {
            tui.draw(|frame| ui::draw(frame, self))?;

            tokio::select! {
                Some(event) = tui.next() => self.handle_tui_event(event)?,
                Some(action) = self.action_receiver.recv() => self.handle_action(action)?,
                else => break,
            }

            if !self.running {
                break;
            }
        }

        tui.exit()?;
        Ok(())
    }

    pub fn is_busy(&self) -> bool {
        let chatting = self
            .chat
            .active_agent()
            .is_some_and(|agent| self.chat.is_awaiting_reply(&agent.id));
        let dialing = self
            .phone
            .as_ref()
            .is_some_and(|dialog| dialog.phase == CallPhase::Dialing);
        chatting
            || dialing
            || self.conspiracy.is_generating()
            || self.rpg.is_awaiting_game_master()
            || self.vault_view.loading
    }

    pub fn vault_unlocked(&self) -> bool {
        self.vault.gate().is_unlocked()
    }

    pub fn remaining_vault_requests(&self) -> u32 {
        self.vault.remaining_requests()
    }

    fn handle_tui_event(&mut self, event: TuiEvent) -> Result<()> {
        match event {
            TuiEvent::Key(key_event) => self.on_key(key_event)?,
            TuiEvent::Paste(text) => {
                if self.input_mode == InputMode::Editing {
                    self.input.insert_str(text);
                }
            }
            TuiEvent::Tick => self.on_tick(),
            TuiEvent::Resize(width, height) => {
                log::debug!("Terminal resized to {width}x{height}");
            }
            TuiEvent::Error(e) => log::warn!("Terminal input error: {e}"),
        }
        Ok(())
    }

    fn on_tick(&mut self) {
        self.ticks += 1;
        if self.is_busy() {
            self.spinner.start();
        } else {
            self.spinner.stop();
        }
        self.spinner.tick();

        if self.ticks % FLUSH_EVERY_TICKS == 0 && !self.chat.pending_writes().is_empty() {
            self.chat.flush_pending_writes();
        }
    }

    fn on_key(&mut self, key_event: KeyEvent) -> Result<()> {
        if key_event.modifiers.contains(KeyModifiers::CONTROL)
            && key_event.code == KeyCode::Char('c')
        {
            return self.handle_action(Action::Quit);
        }

        if self.phone.is_some() {
            self.on_phone_key(key_event);
            return Ok(());
        }

        match self.input_mode {
            InputMode::Editing => self.on_editing_key(key_event),
            InputMode::Normal => self.on_normal_key(key_event)?,
        }
        Ok(())
    }

    fn on_editing_key(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Esc => self.input_mode = InputMode::Normal,
            KeyCode::Enter => self.submit_user_input(),
            _ => {
                self.input.input(key_event);
            }
        }
    }

    fn on_normal_key(&mut self, key_event: KeyEvent) -> Result<()> {
        match key_event.code {
            KeyCode::Char('q') => return self.handle_action(Action::Quit),
            KeyCode::Tab => self.switch_tab(self.tab.next()),
            KeyCode::BackTab => self.switch_tab(self.tab.previous()),
            KeyCode::Char(c @ '1'..='4') => {
                let index = c as usize - '1' as usize;
                if let Some(tab) = Tab::iter().nth(index) {
                    self.switch_tab(tab);
                }
            }
            KeyCode::Char('i') | KeyCode::Char('/') => self.input_mode = InputMode::Editing,
            KeyCode::PageUp => self.scroll_back = self.scroll_back.saturating_add(5),
            KeyCode::PageDown => self.scroll_back = self.scroll_back.saturating_sub(5),
            _ => match self.tab {
                Tab::Agents => self.on_agents_key(key_event),
                Tab::Conspiracy => self.on_conspiracy_key(key_event),
                Tab::DataVault => self.on_vault_key(key_event),
                Tab::QuantumRpg => {}
            },
        }
        Ok(())
    }

    fn on_agents_key(&mut self, key_event: KeyEvent) {
        let count = self.chat.registry().len();
        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => select_previous(&mut self.agent_list, count),
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.agent_list, count),
            KeyCode::Enter => {
                let Some(agent_id) = self
                    .agent_list
                    .selected()
                    .and_then(|index| self.chat.registry().all().get(index))
                    .map(|agent| agent.id.clone())
                else {
                    return;
                };
                match self.chat.select_agent(&agent_id) {
                    Ok(agent) => {
                        self.status = Some(format!("Secure channel open with {}", agent.name));
                        self.scroll_back = 0;
                        self.input_mode = InputMode::Editing;
                    }
                    Err(e) => self.status = Some(e.to_string()),
                }
            }
            KeyCode::Esc => self.chat.reset_agent(),
            KeyCode::Char('c') => self.open_phone_dialog(),
            KeyCode::Char('x') => {
                if let Some(agent) = self.chat.active_agent() {
                    let (id, name) = (agent.id.clone(), agent.name.clone());
                    self.chat.clear_history(&id);
                    self.status = Some(format!("Transcript with {name} erased"));
                }
            }
            _ => {}
        }
    }

    fn on_conspiracy_key(&mut self, key_event: KeyEvent) {
        let count = self.conspiracy.past_conversations().len();
        let selected_id = self
            .archive_list
            .selected()
            .and_then(|index| self.conspiracy.past_conversations().get(index))
            .map(|conversation| conversation.id);

        match key_event.code {
            KeyCode::Up | KeyCode::Char('k') => select_previous(&mut self.archive_list, count),
            KeyCode::Down | KeyCode::Char('j') => select_next(&mut self.archive_list, count),
            KeyCode::Enter | KeyCode::Char('l') => {
                if let Some(id) = selected_id {
                    self.conspiracy.load_conversation(id);
                    self.scroll_back = 0;
                }
            }
            KeyCode::Char('d') => {
                if let Some(id) = selected_id {
                    self.conspiracy.delete_conversation(id);
                    let count = self.conspiracy.past_conversations().len();
                    if self.archive_list.selected().is_some_and(|index| index >= count) {
                        self.archive_list.select(count.checked_sub(1));
                    }
                }
            }
            KeyCode::Char('n') => {
                self.conspiracy.clear_current();
                self.scroll_back = 0;
            }
            KeyCode::Char('s') => {
                if self.conspiracy.save_past_conversation() {
                    self.status = Some("Conspiracy archived".to_string());
                }
            }
            _ => {}
        }
    }

    fn on_vault_key(&mut self, key_event: KeyEvent) {
        if !self.vault_unlocked() {
            if key_event.code == KeyCode::Enter {
                self.input_mode = InputMode::Editing;
            }
            return;
        }

        let file_count = self.vault_view.files.len().max(1);
        match key_event.code {
            KeyCode::Left | KeyCode::Char('h') => {
                self.vault_view.selected = (self.vault_view.selected + file_count - 1) % file_count;
                self.vault_view.options.page = 1;
                self.load_vault_page();
            }
            KeyCode::Right | KeyCode::Char('l') => {
                self.vault_view.selected = (self.vault_view.selected + 1) % file_count;
                self.vault_view.options.page = 1;
                self.load_vault_page();
            }
            KeyCode::Char('n') => {
                let last = self
                    .vault_view
                    .page
                    .as_ref()
                    .map(QueryPage::total_pages)
                    .unwrap_or(1);
                if self.vault_view.options.page < last {
                    self.vault_view.options.page += 1;
                    self.load_vault_page();
                }
            }
            KeyCode::Char('p') => {
                if self.vault_view.options.page > 1 {
                    self.vault_view.options.page -= 1;
                    self.load_vault_page();
                }
            }
            KeyCode::Up | KeyCode::Char('k') => self.vault_view.table_state.select_previous(),
            KeyCode::Down | KeyCode::Char('j') => self.vault_view.table_state.select_next(),
            KeyCode::Char('r') => self.load_vault_page(),
            KeyCode::Char('L') => match self.vault.gate().lock() {
                Ok(()) => {
                    self.vault_view.page = None;
                    self.status = Some("Data vault locked".to_string());
                }
                Err(e) => self.status = Some(e.to_string()),
            },
            _ => {}
        }
    }

    fn on_phone_key(&mut self, key_event: KeyEvent) {
        let Some(dialog) = self.phone.as_mut() else {
            return;
        };

        match key_event.code {
            KeyCode::Esc => {
                dialog.cancel.cancel();
                self.phone = None;
            }
            KeyCode::Tab | KeyCode::BackTab if dialog.is_editable() => {
                dialog.focus = match dialog.focus {
                    PhoneField::CountryCode => PhoneField::Number,
                    PhoneField::Number => PhoneField::CountryCode,
                };
            }
            KeyCode::Enter => {
                if dialog.is_editable() {
                    self.start_call();
                } else if matches!(dialog.phase, CallPhase::Finished(_)) {
                    self.phone = None;
                }
            }
            _ if dialog.is_editable() => {
                dialog.focused_mut().input(key_event);
            }
            _ => {}
        }
    }

    fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.quit()?,
            Action::AgentReply(ticket, result) => {
                if self.chat.finish_reply(ticket, result) {
                    self.scroll_back = 0;
                }
            }
            Action::ConspiracyResult(ticket, result) => {
                if self.conspiracy.finish_generate(ticket, result) {
                    self.scroll_back = 0;
                }
            }
            Action::VaultPage { request, result } => {
                if request != self.vault_view.request {
                    return Ok(());
                }
                self.vault_view.loading = false;
                match result {
                    Ok(page) => {
                        self.vault_view.error = None;
                        self.vault_view.table_state.select(None);
                        self.vault_view.page = Some(page);
                    }
                    Err(e) => {
                        log::warn!("Vault page failed: {e}");
                        self.vault_view.error = Some(e.to_string());
                    }
                }
            }
            Action::CallStarted { session, result } => self.on_call_started(session, result),
            Action::CallFinished { session, result } => {
                let Some(dialog) = self.phone.as_mut().filter(|d| d.session == session) else {
                    return Ok(());
                };
                dialog.phase = match result {
                    Ok(status) => CallPhase::Finished(format!("Transmission {status}")),
                    Err(CallError::Cancelled) => return Ok(()),
                    Err(e) => CallPhase::Failed(e.to_string()),
                };
            }
            Action::GameMasterReply(ticket, result) => {
                if self.rpg.finish_game_master(ticket, result) {
                    self.scroll_back = 0;
                }
            }
        }

        Ok(())
    }

    fn quit(&mut self) -> Result<()> {
        self.running = false;
        Ok(())
    }

    fn switch_tab(&mut self, tab: Tab) {
        self.tab = tab;
        self.scroll_back = 0;
        self.input_mode = InputMode::Normal;
        self.reset_input();
    }

    fn reset_input(&mut self) {
        let placeholder = match self.tab {
            Tab::Agents => "Transmit a message to the selected agent",
            Tab::Conspiracy => "Name a topic to uncover the connections",
            Tab::DataVault if !self.vault_unlocked() => "Enter passcode or px_ API key",
            Tab::DataVault => "Search rows, or filter with column:value",
            Tab::QuantumRpg => "Type a command, /help lists them",
        };
        let mut input = TextArea::default();
        input.set_placeholder_text(placeholder);
        self.input = input;
    }

    fn submit_user_input(&mut self) {
        let text = self.input.lines().join("\n").trim().to_string();
        self.reset_input();
        if text.is_empty() && self.tab != Tab::DataVault {
            return;
        }

        match self.tab {
            Tab::Agents => self.send_to_agent(&text),
            Tab::Conspiracy => self.generate_conspiracy(&text),
            Tab::DataVault => self.submit_vault_input(&text),
            Tab::QuantumRpg => self.run_rpg_command(&text),
        }
        self.scroll_back = 0;
    }

    fn send_to_agent(&mut self, text: &str) {
        let ticket = match self.chat.begin_send(text) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };

        let completion = self.completion.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = completion
                .complete(ticket.request.clone(), ticket.cancel.clone())
                .await;
            if let Err(e) = sender.send(Action::AgentReply(ticket, result)) {
                log::error!("Failed to deliver agent reply: {e}");
            }
        });
    }

    fn generate_conspiracy(&mut self, text: &str) {
        let ticket = match self.conspiracy.begin_generate(text) {
            Ok(ticket) => ticket,
            Err(e) => {
                self.status = Some(e.to_string());
                return;
            }
        };

        let completion = self.completion.clone();
        let vault = self.vault.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = conspiracy::build_conspiracy(
                &ticket.prompt,
                None,
                &vault,
                completion.as_ref(),
                ticket.cancel.clone(),
            )
            .await;
            if let Err(e) = sender.send(Action::ConspiracyResult(ticket, result)) {
                log::error!("Failed to deliver conspiracy result: {e}");
            }
        });
    }

    fn submit_vault_input(&mut self, text: &str) {
        if self.vault_unlocked() {
            self.vault_view.query_text = text.to_string();
            self.vault_view.options = QueryOptions::from_query_text(text);
            self.load_vault_page();
            return;
        }

        let gate = self.vault.gate();
        let outcome = if text.starts_with(API_KEY_PREFIX) {
            gate.unlock_with_key(text)
                .map(|()| "Access granted. API key accepted.".to_string())
        } else {
            gate.unlock_with_passcode(text)
                .map(|key| format!("Access granted. Your API key: {key}"))
        };

        match outcome {
            Ok(message) => {
                self.status = Some(message);
                self.reset_input();
                self.load_vault_page();
            }
            Err(e) => self.status = Some(e.to_string()),
        }
    }

    fn load_vault_page(&mut self) {
        let Some(api_key) = self.vault.gate().stored_key() else {
            return;
        };
        let Some(filename) = self.vault_view.current_file().map(str::to_string) else {
            return;
        };

        self.vault_view.request += 1;
        self.vault_view.loading = true;
        let request = self.vault_view.request;
        let options = self.vault_view.options.clone();
        let vault = self.vault.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = vault
                .get_file_contents(&filename, Some(&api_key), &options)
                .await;
            if let Err(e) = sender.send(Action::VaultPage { request, result }) {
                log::error!("Failed to deliver vault page: {e}");
            }
        });
    }

    fn run_rpg_command(&mut self, text: &str) {
        if self.rpg.is_awaiting_game_master() && !text.starts_with('/') {
            self.status = Some("The game master is still responding".to_string());
            return;
        }

        let CommandOutcome::AskGameMaster(question) = execute(&mut self.rpg, text) else {
            return;
        };
        let Some(ticket) = self.rpg.begin_game_master(&question) else {
            self.rpg.add_message(
                RpgMessageKind::System,
                "The game master is still responding to your last move.",
            );
            return;
        };

        let completion = self.completion.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = completion
                .complete(ticket.request.clone(), ticket.cancel.clone())
                .await;
            if let Err(e) = sender.send(Action::GameMasterReply(ticket, result)) {
                log::error!("Failed to deliver game master reply: {e}");
            }
        });
    }

    fn open_phone_dialog(&mut self) {
        let Some(agent) = self.chat.active_agent() else {
            self.status = Some("Select an agent before opening a line".to_string());
            return;
        };

        let mut country_code = TextArea::default();
        country_code.insert_str("1");
        let mut number = TextArea::default();
        number.set_placeholder_text("Phone number");

        self.call_sessions += 1;
        self.phone = Some(PhoneDialog {
            agent_id: agent.id.clone(),
            agent_name: agent.name.clone(),
            country_code,
            number,
            focus: PhoneField::Number,
            phase: CallPhase::Input,
            session: self.call_sessions,
            cancel: CancellationToken::new(),
        });
    }

    fn start_call(&mut self) {
        let Some(dialog) = self.phone.as_mut() else {
            return;
        };
        let Some(agent) = self.chat.registry().get(&dialog.agent_id).cloned() else {
            dialog.phase = CallPhase::Failed(format!("Unknown agent: {}", dialog.agent_id));
            return;
        };

        let phone = dialog.number.lines().join("");
        let country_code = dialog.country_code.lines().join("");
        if let Err(e) = format_phone_number(&phone, &country_code) {
            dialog.phase = CallPhase::Failed(e.to_string());
            return;
        }

        dialog.phase = CallPhase::Dialing;
        let session = dialog.session;
        let cancel = dialog.cancel.clone();
        let voice = self.voice.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = voice
                .start_call(&agent, &phone, &country_code, cancel)
                .await;
            if let Err(e) = sender.send(Action::CallStarted { session, result }) {
                log::error!("Failed to deliver call result: {e}");
            }
        });
    }

    fn on_call_started(&mut self, session: u64, result: Result<CallHandle, CallError>) {
        let Some(dialog) = self.phone.as_mut().filter(|d| d.session == session) else {
            return;
        };

        let handle = match result {
            Ok(handle) => handle,
            Err(CallError::Cancelled) => return,
            Err(e) => {
                dialog.phase = CallPhase::Failed(e.to_string());
                return;
            }
        };

        log::info!("Call {} connected for {}", handle.call_id, dialog.agent_name);
        dialog.phase = CallPhase::Connected(handle.clone());

        let cancel = dialog.cancel.clone();
        let voice = self.voice.clone();
        let sender = self.action_sender.clone();
        tokio::spawn(async move {
            let result = voice
                .poll_call(&handle.call_id, CALL_POLL_INTERVAL, CALL_POLL_LIMIT, cancel)
                .await;
            if let Err(e) = sender.send(Action::CallFinished { session, result }) {
                log::error!("Failed to deliver call status: {e}");
            }
        });
    }
}

fn select_next(state: &mut ListState, count: usize) {
    if count == 0 {
        return;
    }
    let next = state.selected().map_or(0, |index| (index + 1) % count);
    state.select(Some(next));
}

fn select_previous(state: &mut ListState, count: usize) {
    if count == 0 {
        return;
    }
    let previous = state
        .selected()
        .map_or(count - 1, |index| (index + count - 1) % count);
    state.select(Some(previous));
}

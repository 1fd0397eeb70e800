// ui/constants.rs

pub const TITLE: &str = r#" ___          _         _    __  __
| _ \_ _ ___ (_)___ __| |_  \ \/ /
|  _/ '_/ _ \| / -_) _|  _|  >  <
|_| |_| \___// \___\__|\__| /_/\_\
           |__/
"#;

pub const NORMAL_KEYS: &str = "Tab/1-4 switch panel · i type · PgUp/PgDn scroll · q quit";
pub const EDITING_KEYS: &str = "Enter send · Esc stop typing";

pub const AGENT_KEYS: &str = "↑↓ choose agent · Enter open channel · c call · x erase transcript";
pub const CONSPIRACY_KEYS: &str = "↑↓ archive · Enter load · d delete · n new · s save";
pub const VAULT_LOCKED_KEYS: &str = "Enter passcode or API key to unlock";
pub const VAULT_KEYS: &str = "←→ file · n/p page · ↑↓ row · r reload · L lock";
pub const RPG_KEYS: &str = "i type a command · /help lists commands";

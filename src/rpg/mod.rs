pub mod choice;
pub mod commands;
pub mod content;
pub mod engine;
pub mod state;

pub use choice::{Effects, GameChoice, Outcome, Requirements};
pub use commands::{Command, CommandOutcome, execute};
pub use content::RpgContent;
pub use engine::{GameMasterTicket, RpgEngine};
pub use state::{InventoryItem, Quest, RpgMessage, RpgMessageKind, RpgState, level_for};

// ui/mod.rs

mod agents;
mod conspiracy;
mod constants;
mod draw;
mod phone;
mod rpg;
pub mod spinner;
pub mod utils;
mod vault;

pub use draw::{MIN_HEIGHT, MIN_WIDTH, draw};

//! Surrogate clip inventory and resolution

pub mod inventory;
pub mod resolver;

pub use inventory::{Inventory, SurrogateClip};
pub use resolver::{resolve, Resolution};

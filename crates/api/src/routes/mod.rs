pub mod health;
pub mod patches;

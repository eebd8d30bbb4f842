pub mod health;
pub mod recording;
pub mod screenshots;

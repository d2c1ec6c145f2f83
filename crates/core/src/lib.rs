pub mod capture;
pub mod logger;
pub mod platform;
pub mod player;
pub mod settings;
pub mod sleep;
pub mod types;

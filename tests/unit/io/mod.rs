pub mod configuration;
pub mod platform;
pub mod record;

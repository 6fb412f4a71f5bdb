pub mod config;
pub mod error;
pub mod i18n;
pub mod lookup;
pub mod normalize;
pub mod panlex;
pub mod prepare;
pub mod server;
pub mod views;

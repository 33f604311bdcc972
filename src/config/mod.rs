//! Configuration loading and typed settings

pub mod loader;
pub mod types;

pub use loader::{load_config, load_from_str};
pub use types::{
    AppConfig, AppSettings, DiffersSettings, EngineSettings, MartingaleConfig, MatchesSettings,
    PaperConfig, RiskConfig, StrategySettings, SwitcherSettings, TradeDefaults,
};

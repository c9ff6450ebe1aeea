mod parsing;
mod settings;
mod types;

pub(crate) use types::{
    AnalyzerSettings, ConfigError, Environment, QuizSettings, Settings, SyncSettings,
};

//! Manages skillx configuration and environment lookups.
//!
//! This crate provides utilities for:
//! - Reading the environment variables that relocate skill roots.
//! - Loading and saving skill path overrides and extra skill roots.
//! - Lexically normalising paths so they compare reliably.

pub mod config;
pub mod env;
pub mod paths;

pub use config::{
    ConfigError, ConfigFile, ConfigStore, SaveSkillPathResult, SaveSkillRootResult,
    SkillOverrides,
};
pub use env::{
    config_path, env_value, home_dir, process_env, ENV_CLAUDE_SKILLS_HOME, ENV_CODEX_HOME,
    ENV_CONFIG, ENV_LOG, ENV_NODE, ENV_OPENCLAW_SKILLS_HOME, ENV_OPENCLAW_STATE_DIR,
    ENV_SKILLS_HOME,
};
pub use paths::{absolutize, normalize};

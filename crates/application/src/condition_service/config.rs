use std::env;

use runlist_core::{AppError, AppResult};
use runlist_domain::DEFAULT_MAX_CONDITION_DEPTH;

/// Default cap on playbook-scoped conditions per playbook.
pub const DEFAULT_MAX_CONDITIONS_PER_PLAYBOOK: usize = 1000;

/// Default window read when copying playbook conditions into a run.
pub const DEFAULT_COPY_PAGE_SIZE: usize = 1000;

/// Tunables for the condition service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConditionServiceConfig {
    /// Maximum nesting depth accepted for condition expressions.
    pub max_condition_depth: usize,
    /// Maximum number of playbook-scoped conditions per playbook.
    pub max_conditions_per_playbook: usize,
    /// Number of playbook conditions read when a run is started.
    pub copy_page_size: usize,
}

impl Default for ConditionServiceConfig {
    fn default() -> Self {
        Self {
            max_condition_depth: DEFAULT_MAX_CONDITION_DEPTH,
            max_conditions_per_playbook: DEFAULT_MAX_CONDITIONS_PER_PLAYBOOK,
            copy_page_size: DEFAULT_COPY_PAGE_SIZE,
        }
    }
}

impl ConditionServiceConfig {
    /// Reads overrides from `CONDITION_MAX_DEPTH`, `CONDITION_MAX_PER_PLAYBOOK`
    /// and `CONDITION_COPY_PAGE_SIZE`.
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Reads overrides through `lookup`, falling back to defaults for unset keys.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> AppResult<Self> {
        let defaults = Self::default();

        Ok(Self {
            max_condition_depth: parse_usize(
                &lookup,
                "CONDITION_MAX_DEPTH",
                defaults.max_condition_depth,
            )?,
            max_conditions_per_playbook: parse_positive_usize(
                &lookup,
                "CONDITION_MAX_PER_PLAYBOOK",
                defaults.max_conditions_per_playbook,
            )?,
            copy_page_size: parse_positive_usize(
                &lookup,
                "CONDITION_COPY_PAGE_SIZE",
                defaults.copy_page_size,
            )?,
        })
    }
}

fn parse_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> AppResult<usize> {
    match lookup(name) {
        Some(value) => value.trim().parse::<usize>().map_err(|error| {
            AppError::Validation(format!("invalid {name} value '{value}': {error}"))
        }),
        None => Ok(default),
    }
}

fn parse_positive_usize(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: usize,
) -> AppResult<usize> {
    let value = parse_usize(lookup, name, default)?;
    if value == 0 {
        return Err(AppError::Validation(format!("{name} must be greater than zero")));
    }

    Ok(value)
}

//! Application services and ports for checklist conditions.

#![forbid(unsafe_code)]

mod condition_ports;
mod condition_service;

pub use condition_ports::{
    ConditionEvent, ConditionEventKind, ConditionEventPublisher, ConditionPage,
    ConditionRepository, PropertyFieldProvider,
};
pub use condition_service::{
    ConditionService, ConditionServiceConfig, DEFAULT_COPY_PAGE_SIZE,
    DEFAULT_MAX_CONDITIONS_PER_PLAYBOOK,
};

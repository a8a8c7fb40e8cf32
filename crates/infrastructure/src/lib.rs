//! Infrastructure adapters for condition ports.

#![forbid(unsafe_code)]

mod in_memory_condition_repository;
mod in_memory_property_field_provider;
mod tracing_condition_event_publisher;

pub use in_memory_condition_repository::InMemoryConditionRepository;
pub use in_memory_property_field_provider::InMemoryPropertyFieldProvider;
pub use tracing_condition_event_publisher::TracingConditionEventPublisher;

mod events;
mod pagination;
mod property_fields;
mod repository;

pub use events::{ConditionEvent, ConditionEventKind, ConditionEventPublisher};
pub use pagination::ConditionPage;
pub use property_fields::PropertyFieldProvider;
pub use repository::ConditionRepository;

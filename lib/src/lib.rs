pub mod disk;
pub mod error;
pub mod graph_extension;
pub mod instance_creator;
pub mod machine;
pub mod output_log;
pub mod resource_registry;
pub mod schedule_log;
pub mod schedule_validator;
pub mod scheduling_context;

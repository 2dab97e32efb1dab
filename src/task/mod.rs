pub mod task_dto;
pub mod task_filters;
pub mod task_handlers;
pub mod task_models;
pub mod task_repository;
pub mod task_service;

pub use task_handlers::{create_task, delete_task, get_task, list_tasks, partial_update_task, update_task};
pub use task_repository::PgTaskRepository;
pub use task_service::TaskService;

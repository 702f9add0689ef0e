pub mod audit_repo;
pub mod project_repo;
pub mod task_repo;
pub mod user_repo;

pub use audit_repo::AuditLogRepo;
pub use project_repo::ProjectRepo;
pub use task_repo::TaskRepo;
pub use user_repo::UserRepo;

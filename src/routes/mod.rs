// Export all route modules
pub mod external_jobs;
pub mod triggers;

pub use external_jobs::*;
pub use triggers::*;

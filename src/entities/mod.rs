pub mod jobs;

pub use jobs::Entity as Jobs;

pub mod app_config;
pub mod events;
pub mod orchestration;
pub mod redis_repo;

pub use events::EventProducer;
pub use orchestration::OrchestrationClient;
pub use redis_repo::RedisSessionStore;

pub mod client;
pub mod factory;
pub mod model;
pub mod types;

pub use client::{GeminiHttpClient, DEFAULT_BASE_URL};
pub use factory::GeminiClientFactory;
pub use model::{GeminiModelClient, DEFAULT_TIMEOUT};

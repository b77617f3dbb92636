pub mod error;
pub mod http;
pub mod recording;
pub mod service;

pub use error::ServiceError;
pub use http::{GraphServiceConfig, HttpGraphService};
pub use recording::RecordingGraphService;
pub use service::GraphService;

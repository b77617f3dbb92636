pub mod flow;
pub mod render;
pub mod server;

pub use flow::{QueryFlow, QueryOutcome, QueryRequest};
pub use render::{facts_to_bullets, render_facts, render_outcome};
pub use server::router;

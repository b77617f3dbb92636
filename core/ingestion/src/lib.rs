pub mod adapters;
pub mod config;
pub mod error;
pub mod pacing;
pub mod pipeline;
pub mod registry;
pub mod timestamps;

pub use adapters::{
    BuiltinSource, ContractAdapter, ConversationAdapter, PriceAdapter, ReferenceAnchor,
    SourceAdapter,
};
pub use config::{ConfigError, IngestConfig};
pub use error::{PipelineError, SourceError, UnknownSourceType};
pub use pacing::{Pacer, Sleeper, TokioSleeper};
pub use pipeline::{
    Collection, IngestionPipeline, PipelineOptions, RunOutcome, RunReport, SkippedSource,
    SourceErrorPolicy, SourceSpec,
};
pub use registry::{AdapterConstructor, AdapterRegistry};

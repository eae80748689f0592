//! Query pipelines
//!
//! A pipeline is an immutable list of stages built up by chained operator
//! calls. Each stage is validated as it is appended; the finished pipeline is
//! translated once into a single find against one collection.
//!
//! # Components
//!
//! - `stage`: stage kinds and named operators
//! - `validator`: operator support table and append-order rules
//! - `translate`: stage list to `TranslatedQuery`
//! - `pipeline`: the immutable, translate-once `Pipeline`

mod pipeline;
mod query;
mod stage;
mod translate;
mod validator;

pub(crate) use pipeline::PipelineEnv;
pub use pipeline::Pipeline;
pub use query::{ResultShape, TranslatedQuery};
pub use stage::{PipelineStage, QueryOperator, SetOperator};
pub use translate::PipelineTranslator;
pub use validator::{OperatorSupport, StageValidator};

pub mod advisor;
pub mod assembler;
pub mod metrics;
pub mod server;

pub use advisor::{Advisor, AdviceRule, Threshold, ADVICE_RULES, PREDICTION_ERROR_PREFIX};
pub use assembler::FeatureAssembler;
pub use metrics::Metrics;
pub use server::{create_router, AppState, PlateServer, PredictResponse, SchemaResponse};

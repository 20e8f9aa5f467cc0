pub mod pipeline;

pub use pipeline::{
    HaltReason, MarketPipeline, PipelineConfig, PipelineReport, DEFAULT_STAGE_DELAY,
};

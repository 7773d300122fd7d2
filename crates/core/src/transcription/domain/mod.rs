pub mod asr_engine;
pub mod engine_lease;
pub mod inference_options;
pub mod model_tier;
pub mod quality_scorer;
pub mod segment;
pub mod transcription_request;
pub mod transcription_result;

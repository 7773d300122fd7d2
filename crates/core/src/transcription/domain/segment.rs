/// A time-bounded span of recognized speech, offsets in seconds.
#[derive(Clone, Debug, PartialEq)]
pub struct Segment {
    pub start_offset: f64,
    pub end_offset: f64,
    pub text: String,
    /// Engine's probability that this span holds no speech. `None` when the
    /// engine does not report it.
    pub no_speech_probability: Option<f64>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_offset - self.start_offset
    }
}

/// Unprocessed output of one inference call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RawResult {
    pub text: String,
    pub detected_language: String,
    /// Chronological, as returned by the engine.
    pub segments: Vec<Segment>,
}

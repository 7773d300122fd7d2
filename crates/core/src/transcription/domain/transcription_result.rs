use serde::Serialize;

use super::quality_scorer::QualitySignal;

/// Seconds attributed to each segment when estimating duration. A coarse
/// placeholder, not the true audio length.
pub const SECONDS_PER_SEGMENT_ESTIMATE: u64 = 30;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InputNotFound,
    EngineLoadFailure,
    EngineInferFailure,
    Unknown,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionSuccess {
    pub text: String,
    pub language: String,
    pub segment_count: usize,
    /// `segment_count * 30`, whole seconds.
    pub duration_estimate: u64,
    pub quality: QualitySignal,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TranscriptionFailure {
    pub error_kind: ErrorKind,
    pub message: String,
    /// Always [`QualitySignal::zero`].
    pub quality: QualitySignal,
}

/// Outcome of a transcription request. Failures are values, never panics or
/// propagated errors.
#[derive(Clone, Debug, PartialEq)]
pub enum TranscriptionResult {
    Success(TranscriptionSuccess),
    Failure(TranscriptionFailure),
}

impl TranscriptionResult {
    pub fn success(
        text: String,
        language: String,
        segment_count: usize,
        quality: QualitySignal,
    ) -> Self {
        TranscriptionResult::Success(TranscriptionSuccess {
            text,
            language,
            segment_count,
            duration_estimate: segment_count as u64 * SECONDS_PER_SEGMENT_ESTIMATE,
            quality,
        })
    }

    pub fn failure(error_kind: ErrorKind, message: impl Into<String>) -> Self {
        TranscriptionResult::Failure(TranscriptionFailure {
            error_kind,
            message: message.into(),
            quality: QualitySignal::zero(),
        })
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TranscriptionResult::Success(_))
    }

    pub fn quality(&self) -> &QualitySignal {
        match self {
            TranscriptionResult::Success(s) => &s.quality,
            TranscriptionResult::Failure(f) => &f.quality,
        }
    }

    /// Transcribed text; empty for failures.
    pub fn text(&self) -> &str {
        match self {
            TranscriptionResult::Success(s) => &s.text,
            TranscriptionResult::Failure(_) => "",
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            TranscriptionResult::Success(_) => None,
            TranscriptionResult::Failure(f) => Some(f.error_kind),
        }
    }

    pub fn to_envelope(&self) -> ResultEnvelope {
        match self {
            TranscriptionResult::Success(s) => ResultEnvelope {
                success: true,
                text: s.text.clone(),
                language: Some(s.language.clone()),
                duration: Some(s.duration_estimate),
                segments_count: Some(s.segment_count),
                error: None,
                error_kind: None,
                quality: QualityEnvelope::from(&s.quality),
            },
            TranscriptionResult::Failure(f) => ResultEnvelope {
                success: false,
                text: String::new(),
                language: None,
                duration: None,
                segments_count: None,
                error: Some(f.message.clone()),
                error_kind: Some(f.error_kind),
                quality: QualityEnvelope::from(&f.quality),
            },
        }
    }

    /// Pretty JSON for cross-process consumers. Non-ASCII text is emitted verbatim.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_envelope())
    }
}

/// Serialized form of a [`TranscriptionResult`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultEnvelope {
    pub success: bool,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub segments_count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub quality: QualityEnvelope,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct QualityEnvelope {
    pub score: f64,
    pub confidence: f64,
    pub chinese_ratio: f64,
}

impl From<&QualitySignal> for QualityEnvelope {
    fn from(q: &QualitySignal) -> Self {
        Self {
            score: q.score,
            confidence: q.confidence,
            chinese_ratio: q.script_ratio,
        }
    }
}

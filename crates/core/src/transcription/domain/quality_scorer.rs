use super::segment::RawResult;

/// Confidence assumed for a segment whose engine reports no no-speech probability,
/// and for segment-less output that still carries text.
pub const FALLBACK_CONFIDENCE: f64 = 0.8;

pub const CONFIDENCE_WEIGHT: f64 = 60.0;
pub const SCRIPT_RATIO_WEIGHT: f64 = 30.0;
/// Length bonus is one point per `LENGTH_BONUS_DIVISOR` characters, capped.
pub const LENGTH_BONUS_DIVISOR: f64 = 10.0;
pub const LENGTH_BONUS_CAP: f64 = 10.0;
pub const MAX_SCORE: f64 = 100.0;

/// CJK Unified Ideographs block.
const TARGET_SCRIPT: std::ops::RangeInclusive<char> = '\u{4E00}'..='\u{9FFF}';

/// Bounded quality triple attached to every transcription result.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct QualitySignal {
    /// Composite score in [0, 100], 2 decimals.
    pub score: f64,
    /// Mean per-segment confidence in [0, 1], 3 decimals.
    pub confidence: f64,
    /// Share of characters in the target script, in [0, 1], 3 decimals.
    pub script_ratio: f64,
}

impl QualitySignal {
    /// Signal carried by failed transcriptions.
    pub const fn zero() -> Self {
        Self {
            score: 0.0,
            confidence: 0.0,
            script_ratio: 0.0,
        }
    }
}

/// Maps raw engine output to a [`QualitySignal`]. Pure and total.
pub struct QualityScorer;

impl QualityScorer {
    pub fn score(raw: &RawResult) -> QualitySignal {
        let char_count = raw.text.chars().count();
        let confidence = Self::confidence(raw);
        let script_ratio = Self::script_ratio(&raw.text);

        let score = if char_count == 0 {
            0.0
        } else {
            let length_bonus = (char_count as f64 / LENGTH_BONUS_DIVISOR).min(LENGTH_BONUS_CAP);
            confidence * CONFIDENCE_WEIGHT + script_ratio * SCRIPT_RATIO_WEIGHT + length_bonus
        };

        QualitySignal {
            score: round_to(clamp(score, 0.0, MAX_SCORE), 2),
            confidence: round_to(clamp(confidence, 0.0, 1.0), 3),
            script_ratio: round_to(script_ratio, 3),
        }
    }

    /// Mean of per-segment `1 - no_speech_probability`. Without segments the
    /// text alone decides between the fallback and zero.
    ///
    /// Out-of-range probabilities are not corrected here; the composite score
    /// is clamped instead, so the mean can fall outside [0, 1].
    pub fn confidence(raw: &RawResult) -> f64 {
        if raw.segments.is_empty() {
            return if raw.text.is_empty() {
                0.0
            } else {
                FALLBACK_CONFIDENCE
            };
        }

        let total: f64 = raw
            .segments
            .iter()
            .map(|seg| match seg.no_speech_probability {
                Some(p) if p.is_finite() => 1.0 - p,
                _ => FALLBACK_CONFIDENCE,
            })
            .sum();
        total / raw.segments.len() as f64
    }

    /// Fraction of characters inside the CJK Unified Ideographs block.
    pub fn script_ratio(text: &str) -> f64 {
        let total = text.chars().count();
        if total == 0 {
            return 0.0;
        }
        let in_script = text.chars().filter(|c| TARGET_SCRIPT.contains(c)).count();
        in_script as f64 / total as f64
    }
}

/// NaN-safe clamp: a NaN input collapses to `min`.
fn clamp(value: f64, min: f64, max: f64) -> f64 {
    value.max(min).min(max)
}

/// Round half to even, so exact ties like 0.5625 go to 0.562.
fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round_ties_even() / factor
}

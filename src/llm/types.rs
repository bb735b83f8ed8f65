//! Structured result returned by the purification model.

use serde::{Deserialize, Serialize};

/// One edit the model claims to have made.
///
/// Not guaranteed unique: the same `corrected` text may appear several
/// times, or inside another correction's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    pub original: String,
    pub corrected: String,
    pub reason: String,
}

impl Correction {
    pub fn new(
        original: impl Into<String>,
        corrected: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            original: original.into(),
            corrected: corrected.into(),
            reason: reason.into(),
        }
    }
}

/// Output of one successful purify call.  Replaced wholesale by the next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurificationResult {
    pub purified_text: String,
    pub corrections: Vec<Correction>,
    pub uncertain_parts: Vec<String>,
}

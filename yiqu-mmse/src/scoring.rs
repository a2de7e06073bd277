//! Per-kind scoring rules.
//!
//! [`evaluate`] is the pure part: it scores everything that can be read from the
//! answer text. Observed items come back as [`Verdict::NeedsJudgment`] and [`score`]
//! asks the operator for a yes/no decision.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::item::{QuestionItem, ScoringKind};
use crate::{Operator, Result};

/// Memory items never award more than this, however many words repeat.
pub const MEMORY_CAP: u32 = 3;

const JUDGMENT_PROMPT: &str = "请管理员判断患者是否正确完成？(y/n): ";
const JUDGMENT_HINT: &str = "请输入 'y' 或 'n'";

/// How free-text answers are compared with accepted answers.
///
/// `Lenient` credits an answer that contains, or is contained in, an accepted
/// answer. Short accepted answers (e.g. "表") therefore match many unrelated
/// replies. `Strict` requires the whole answer to equal an accepted answer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextMatching {
    #[default]
    Lenient,
    Strict,
}

/// Result of reading an answer's text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Awarded(u32),
    /// The item is scored by the operator, not the text.
    NeedsJudgment,
}

/// An operator's yes/no decision on an observed item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Judgment {
    Correct,
    Incorrect,
}

impl Judgment {
    /// Parse `y`/`yes`/`n`/`no`, ignoring case and surrounding whitespace.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "y" | "yes" => Some(Self::Correct),
            "n" | "no" => Some(Self::Incorrect),
            _ => None,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            Self::Correct => 1,
            Self::Incorrect => 0,
        }
    }
}

/// Score what can be scored from the text alone.
pub fn evaluate(answer: &str, item: &QuestionItem, matching: TextMatching) -> Verdict {
    let answer = answer.trim();
    if answer.is_empty() {
        return Verdict::Awarded(0);
    }

    let answer = answer.to_lowercase();
    let points = match item.kind {
        ScoringKind::ExactText => u32::from(
            accepted(item).any(|candidate| text_matches(&answer, &candidate, matching)),
        ),
        ScoringKind::Calculation => u32::from(accepted(item).any(|candidate| candidate == answer)),
        ScoringKind::MemoryProduction | ScoringKind::MemoryRecall => {
            let recalled = accepted(item)
                .filter(|word| answer.contains(word.as_str()))
                .count() as u32;
            recalled.min(MEMORY_CAP)
        }
        ScoringKind::ObservedAction | ScoringKind::ObservedDrawing => {
            return Verdict::NeedsJudgment;
        }
    };

    Verdict::Awarded(points.min(item.max_score))
}

/// Score an answer, asking the operator to judge observed items.
///
/// Invalid judgments are re-prompted until a yes or no arrives.
pub fn score(
    answer: &str,
    item: &QuestionItem,
    matching: TextMatching,
    operator: &mut dyn Operator,
) -> Result<u32> {
    let points = match evaluate(answer, item, matching) {
        Verdict::Awarded(points) => points,
        Verdict::NeedsJudgment => request_judgment(answer, operator)?
            .points()
            .min(item.max_score),
    };
    debug!(item = item.id, kind = ?item.kind, points, "scored answer");
    Ok(points)
}

/// Ask the operator whether the patient completed the task.
pub fn request_judgment(answer: &str, operator: &mut dyn Operator) -> Result<Judgment> {
    operator.show(&format!("患者回答: {answer}"))?;
    loop {
        let input = operator.ask(JUDGMENT_PROMPT)?;
        match Judgment::parse(&input) {
            Some(judgment) => return Ok(judgment),
            None => operator.show(JUDGMENT_HINT)?,
        }
    }
}

fn accepted(item: &QuestionItem) -> impl Iterator<Item = String> + '_ {
    item.accepted
        .iter()
        .map(|candidate| candidate.trim().to_lowercase())
        .filter(|candidate| !candidate.is_empty())
}

fn text_matches(answer: &str, candidate: &str, matching: TextMatching) -> bool {
    match matching {
        TextMatching::Lenient => answer.contains(candidate) || candidate.contains(answer),
        TextMatching::Strict => answer == candidate,
    }
}

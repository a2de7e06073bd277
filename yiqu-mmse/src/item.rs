//! Question item definitions.

use serde::{Deserialize, Serialize};

/// Position of an item in the instrument (1-based, 1..=26).
pub type ItemId = u8;

/// How an item's answer is turned into a score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoringKind {
    /// Free text compared against the accepted answers.
    ExactText,
    /// One step of serial sevens; only an exact number counts.
    Calculation,
    /// Immediate repetition of the three memory words.
    MemoryProduction,
    /// Delayed recall of the three memory words.
    MemoryRecall,
    /// A task the operator watches and judges.
    ObservedAction,
    /// A figure the patient copies; the operator judges it.
    ObservedDrawing,
}

impl ScoringKind {
    /// Whether the score comes from an operator judgment rather than the text.
    pub fn is_observed(self) -> bool {
        matches!(self, Self::ObservedAction | Self::ObservedDrawing)
    }

    /// Whether the score counts memory words found in the answer.
    pub fn is_memory(self) -> bool {
        matches!(self, Self::MemoryProduction | Self::MemoryRecall)
    }
}

/// Cognitive domain an item contributes to in the report breakdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    TimeOrientation,
    PlaceOrientation,
    Memory,
    AttentionCalculation,
    Language,
}

impl Domain {
    /// All domains in report order.
    pub const ALL: [Domain; 5] = [
        Domain::TimeOrientation,
        Domain::PlaceOrientation,
        Domain::Memory,
        Domain::AttentionCalculation,
        Domain::Language,
    ];

    /// Display label.
    pub fn label(self) -> &'static str {
        match self {
            Domain::TimeOrientation => "时间定向",
            Domain::PlaceOrientation => "地点定向",
            Domain::Memory => "记忆能力",
            Domain::AttentionCalculation => "注意计算",
            Domain::Language => "语言能力",
        }
    }
}

/// Which operator-supplied location fact fills an item's accepted answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSlot {
    ProvinceCity,
    DistrictCounty,
    StreetTownship,
    Address,
}

/// One MMSE item.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionItem {
    pub id: ItemId,
    pub category: &'static str,
    pub domain: Domain,
    pub prompt: &'static str,
    pub kind: ScoringKind,
    pub max_score: u32,
    /// Accepted answers; for memory kinds, the words to look for.
    pub accepted: Vec<String>,
    /// Operator must set up a physical prop before presenting.
    pub needs_props: bool,
    /// Filled from [`LocationFacts`](crate::LocationFacts) when the bank is configured.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location_slot: Option<LocationSlot>,
    /// What the operator should watch for on observed items.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub observation: Option<&'static str>,
}

impl QuestionItem {
    pub(crate) fn new(
        id: ItemId,
        category: &'static str,
        domain: Domain,
        prompt: &'static str,
        kind: ScoringKind,
        max_score: u32,
    ) -> Self {
        Self {
            id,
            category,
            domain,
            prompt,
            kind,
            max_score,
            accepted: Vec::new(),
            needs_props: false,
            location_slot: None,
            observation: None,
        }
    }

    pub(crate) fn accepting<I, S>(mut self, answers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.accepted = answers.into_iter().map(Into::into).collect();
        self
    }

    pub(crate) fn with_props(mut self) -> Self {
        self.needs_props = true;
        self
    }

    pub(crate) fn located(mut self, slot: LocationSlot) -> Self {
        self.location_slot = Some(slot);
        self
    }

    pub(crate) fn observing(mut self, note: &'static str) -> Self {
        self.observation = Some(note);
        self
    }
}

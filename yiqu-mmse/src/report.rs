//! Result entries, totals and cognitive-status classification.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::Result;
use crate::item::{Domain, ItemId, QuestionItem};

/// Highest possible MMSE total.
pub const MAX_TOTAL_SCORE: u32 = 30;

/// One scored item. Created once per item and never changed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultEntry {
    pub item_id: ItemId,
    pub category: String,
    pub domain: Domain,
    pub prompt: String,
    pub answer: String,
    pub score: u32,
    pub max_score: u32,
}

impl ResultEntry {
    pub(crate) fn record(item: &QuestionItem, answer: &str, score: u32) -> Self {
        Self {
            item_id: item.id,
            category: item.category.to_string(),
            domain: item.domain,
            prompt: item.prompt.to_string(),
            answer: answer.to_string(),
            score: score.min(item.max_score),
            max_score: item.max_score,
        }
    }
}

/// Cognitive status implied by a total score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CognitiveStatus {
    Normal,
    Mild,
    Moderate,
    Severe,
}

impl CognitiveStatus {
    /// ≥27 normal, 21–26 mild, 10–20 moderate, below 10 severe.
    pub fn classify(total: u32) -> Self {
        match total {
            27.. => Self::Normal,
            21..=26 => Self::Mild,
            10..=20 => Self::Moderate,
            _ => Self::Severe,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Normal => "normal",
            Self::Mild => "mild",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
        }
    }

    /// Label shown to operators and sent to the assistant.
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "认知功能正常",
            Self::Mild => "轻度认知障碍",
            Self::Moderate => "中度认知障碍",
            Self::Severe => "重度认知障碍",
        }
    }

    pub fn advice(self) -> &'static str {
        match self {
            Self::Normal => "认知功能正常，请继续保持健康的生活方式！",
            Self::Mild => "存在轻度认知障碍，建议加强认知训练和社交活动。",
            Self::Moderate => "存在中度认知障碍，建议尽快就医进行专业评估。",
            Self::Severe => "存在重度认知障碍，请立即就医进行专业诊断和治疗。",
        }
    }
}

impl std::fmt::Display for CognitiveStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Subtotal for one cognitive domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainScore {
    pub domain: Domain,
    pub score: u32,
    pub max_score: u32,
}

/// The final artifact of one assessment run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentReport {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    pub entries: Vec<ResultEntry>,
    pub total_score: u32,
    pub max_score: u32,
    pub status: CognitiveStatus,
    pub domains: Vec<DomainScore>,
}

impl AssessmentReport {
    pub(crate) fn from_entries(
        entries: Vec<ResultEntry>,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
    ) -> Self {
        let total_score: u32 = entries.iter().map(|e| e.score).sum();
        let max_score: u32 = entries.iter().map(|e| e.max_score).sum();
        let domains = Domain::ALL
            .iter()
            .map(|&domain| {
                let (score, max_score) = entries
                    .iter()
                    .filter(|e| e.domain == domain)
                    .fold((0, 0), |(s, m), e| (s + e.score, m + e.max_score));
                DomainScore {
                    domain,
                    score,
                    max_score,
                }
            })
            .collect();

        Self {
            id: Uuid::now_v7(),
            started_at,
            completed_at,
            total_score,
            max_score,
            status: CognitiveStatus::classify(total_score),
            domains,
            entries,
        }
    }

    /// Message asking the assistant to explain this result in plain language.
    pub fn analysis_prompt(&self) -> String {
        format!(
            "患者MMSE评估总得分为{}/{}分。评估结果为{}。请分析这个结果并提供专业建议，用通俗易懂的语言表达。",
            self.total_score, MAX_TOTAL_SCORE, self.status
        )
    }

    /// Multi-line summary with domain subtotals and advice.
    pub fn summary(&self) -> String {
        let mut out = format!(
            "总得分: {}/{}分\n评估结果: {}\n\n分类得分:\n",
            self.total_score, MAX_TOTAL_SCORE, self.status
        );
        for domain in &self.domains {
            out.push_str(&format!(
                "• {}: {}/{}分\n",
                domain.domain.label(),
                domain.score,
                domain.max_score
            ));
        }
        out.push('\n');
        out.push_str(self.status.advice());
        out
    }

    pub fn duration(&self) -> chrono::Duration {
        self.completed_at - self.started_at
    }

    /// Write the report as pretty JSON, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    /// File name used when saving into a reports directory.
    pub fn file_name(&self) -> String {
        format!(
            "mmse-{}-{}.json",
            self.completed_at.format("%Y%m%dT%H%M%SZ"),
            self.id.simple()
        )
    }
}

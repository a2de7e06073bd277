//! The operator-paced assessment run.
//!
//! A run moves through AwaitingLocationInfo → Ready → one Presenting/AwaitingAnswer/
//! Scored cycle per item → Complete. It is single pass: there is no way back to an
//! earlier item and a finished [`Assessment`] cannot be resumed.

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::bank::{ConfiguredBank, ItemBank, LocationFacts};
use crate::item::QuestionItem;
use crate::report::{AssessmentReport, MAX_TOTAL_SCORE, ResultEntry};
use crate::scoring::{self, TextMatching};
use crate::{Error, Operator, Result};

const LOCATION_HEADER: &str = "===== 请管理员输入当前地点信息 =====";
const START_HEADER: &str = "===== 简易智力状态检查(MMSE)开始 =====";
const START_PROMPT: &str = "请患者根据提示回答问题。管理员请按回车键开始...";
const PROPS_PROMPT: &str = "请管理员准备好所需物品，准备好后按回车键继续...";
const ANSWER_PROMPT: &str = "患者回答: ";
const NEXT_PROMPT: &str = "按回车键继续下一题...";

/// Where a run currently stands.
///
/// AwaitingLocationInfo is an [`ItemBank`] that has not been configured yet, and
/// Ready is a freshly built [`Assessment`], which reports `AwaitingAnswer { index: 0 }`.
/// Presenting and Scored happen inside a single [`Assessment::submit`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the answer to the item at this index.
    AwaitingAnswer { index: usize },
    Complete,
}

/// Ask the operator where the assessment is taking place.
pub fn collect_location_facts(operator: &mut dyn Operator) -> Result<LocationFacts> {
    operator.show(LOCATION_HEADER)?;
    Ok(LocationFacts {
        province_city: operator.ask("当前所在省/市: ")?,
        district_county: operator.ask("当前所在区/县: ")?,
        street_township: operator.ask("当前所在街道/乡: ")?,
        address: operator.ask("当前所在楼层/具体地址: ")?,
    })
}

/// Run a complete assessment: location facts, every item, report.
pub fn administer(
    bank: ItemBank,
    matching: TextMatching,
    operator: &mut dyn Operator,
) -> Result<AssessmentReport> {
    let location = collect_location_facts(operator)?;
    let assessment = Assessment::new(bank.configure(&location), matching);

    operator.show(START_HEADER)?;
    operator.pause(START_PROMPT)?;

    assessment.run(operator)
}

/// One pass over a configured item bank.
#[derive(Debug)]
pub struct Assessment {
    items: Vec<QuestionItem>,
    matching: TextMatching,
    entries: Vec<ResultEntry>,
    started_at: DateTime<Utc>,
}

impl Assessment {
    pub fn new(bank: ConfiguredBank, matching: TextMatching) -> Self {
        Self {
            items: bank.into_items(),
            matching,
            entries: Vec::new(),
            started_at: Utc::now(),
        }
    }

    pub fn phase(&self) -> Phase {
        if self.is_complete() {
            Phase::Complete
        } else {
            Phase::AwaitingAnswer {
                index: self.entries.len(),
            }
        }
    }

    /// The item awaiting an answer, or `None` once complete.
    pub fn current_item(&self) -> Option<&QuestionItem> {
        self.items.get(self.entries.len())
    }

    /// `(answered, total)`.
    pub fn progress(&self) -> (usize, usize) {
        (self.entries.len(), self.items.len())
    }

    pub fn is_complete(&self) -> bool {
        self.entries.len() >= self.items.len()
    }

    pub fn entries(&self) -> &[ResultEntry] {
        &self.entries
    }

    /// Score `answer` against the current item and advance.
    pub fn submit(&mut self, answer: &str, operator: &mut dyn Operator) -> Result<&ResultEntry> {
        let item = self.current_item().ok_or(Error::AlreadyComplete)?;
        let points = scoring::score(answer, item, self.matching, operator)?;
        let entry = ResultEntry::record(item, answer, points);
        debug!(
            item = entry.item_id,
            score = entry.score,
            max = entry.max_score,
            "recorded entry"
        );
        self.entries.push(entry);
        Ok(&self.entries[self.entries.len() - 1])
    }

    /// Present every remaining item and return the report.
    pub fn run(mut self, operator: &mut dyn Operator) -> Result<AssessmentReport> {
        info!(items = self.items.len(), "assessment started");
        while let Some(item) = self.current_item() {
            let prompt = item.prompt;
            let needs_props = item.needs_props;

            operator.show("")?;
            operator.show(&format!("问题: {prompt}"))?;
            if needs_props {
                operator.pause(PROPS_PROMPT)?;
            }

            let answer = operator.ask(ANSWER_PROMPT)?;
            let entry = self.submit(&answer, operator)?;
            let line = format!("本题得分: {}/{}", entry.score, entry.max_score);

            operator.show(&line)?;
            operator.pause(NEXT_PROMPT)?;
        }
        self.finish()
    }

    /// Aggregate the recorded entries. Fails unless every item was answered.
    pub fn finish(self) -> Result<AssessmentReport> {
        if !self.is_complete() {
            let (answered, total) = self.progress();
            return Err(Error::Incomplete { answered, total });
        }

        let report = AssessmentReport::from_entries(self.entries, self.started_at, Utc::now());
        debug_assert!(report.total_score <= MAX_TOTAL_SCORE);
        info!(
            total = report.total_score,
            status = report.status.as_str(),
            "assessment complete"
        );
        Ok(report)
    }
}

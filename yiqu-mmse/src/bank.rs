//! The standard 26-item instrument and its per-run configuration.

use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::item::{Domain, LocationSlot, QuestionItem, ScoringKind};

const MEMORY_WORDS: [&str; 3] = ["皮球", "国旗", "树木"];

const CHINESE_MONTHS: [&str; 12] = [
    "一月", "二月", "三月", "四月", "五月", "六月", "七月", "八月", "九月", "十月", "十一月",
    "十二月",
];

const WEEKDAY_FULL: [&str; 7] = [
    "星期一", "星期二", "星期三", "星期四", "星期五", "星期六", "星期日",
];

const WEEKDAY_SHORT: [&str; 7] = ["周一", "周二", "周三", "周四", "周五", "周六", "周日"];

/// Calendar facts the time-orientation items are graded against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TemporalFacts {
    date: NaiveDate,
}

impl TemporalFacts {
    /// Facts for a specific date.
    pub fn from_date(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Facts for today in the local timezone.
    pub fn today() -> Self {
        Self::from_date(Local::now().date_naive())
    }

    pub fn year_answers(&self) -> Vec<String> {
        vec![self.date.year().to_string()]
    }

    /// Northern-hemisphere season.
    pub fn season(&self) -> &'static str {
        match self.date.month() {
            3..=5 => "春季",
            6..=8 => "夏季",
            9..=11 => "秋季",
            _ => "冬季",
        }
    }

    pub fn month_answers(&self) -> Vec<String> {
        let month = self.date.month();
        vec![
            format!("{month}月"),
            CHINESE_MONTHS[month as usize - 1].to_string(),
        ]
    }

    pub fn day_answers(&self) -> Vec<String> {
        let day = self.date.day();
        vec![day.to_string(), format!("{day}号")]
    }

    pub fn weekday_answers(&self) -> Vec<String> {
        let index = self.date.weekday().num_days_from_monday() as usize;
        vec![
            WEEKDAY_FULL[index].to_string(),
            WEEKDAY_SHORT[index].to_string(),
        ]
    }
}

/// Where the assessment takes place, as entered by the operator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationFacts {
    pub province_city: String,
    pub district_county: String,
    pub street_township: String,
    pub address: String,
}

impl LocationFacts {
    fn answer_for(&self, slot: LocationSlot) -> &str {
        match slot {
            LocationSlot::ProvinceCity => &self.province_city,
            LocationSlot::DistrictCounty => &self.district_county,
            LocationSlot::StreetTownship => &self.street_township,
            LocationSlot::Address => &self.address,
        }
    }
}

/// The instrument before location facts are known.
#[derive(Debug, Clone)]
pub struct ItemBank {
    items: Vec<QuestionItem>,
}

impl ItemBank {
    /// Build the standard instrument for today's date.
    pub fn today() -> Self {
        Self::standard(TemporalFacts::today())
    }

    /// Build the standard 26-item instrument graded against `time`.
    pub fn standard(time: TemporalFacts) -> Self {
        use Domain::*;
        use ScoringKind::*;

        let mut items = vec![
            QuestionItem::new(1, "时间定向", TimeOrientation, "现在是哪一年？", ExactText, 1)
                .accepting(time.year_answers()),
            QuestionItem::new(2, "时间定向", TimeOrientation, "现在是什么季节？", ExactText, 1)
                .accepting([time.season()]),
            QuestionItem::new(3, "时间定向", TimeOrientation, "现在是哪个月？", ExactText, 1)
                .accepting(time.month_answers()),
            QuestionItem::new(4, "时间定向", TimeOrientation, "今天是几号？", ExactText, 1)
                .accepting(time.day_answers()),
            QuestionItem::new(5, "时间定向", TimeOrientation, "今天是星期几？", ExactText, 1)
                .accepting(time.weekday_answers()),
            QuestionItem::new(6, "地点定向", PlaceOrientation, "我们现在在哪个国家？", ExactText, 1)
                .accepting(["中国", "中华人民共和国", "China"]),
            QuestionItem::new(7, "地点定向", PlaceOrientation, "我们现在在哪个省/市？", ExactText, 1)
                .located(LocationSlot::ProvinceCity),
            QuestionItem::new(8, "地点定向", PlaceOrientation, "我们现在在哪个区/县？", ExactText, 1)
                .located(LocationSlot::DistrictCounty),
            QuestionItem::new(9, "地点定向", PlaceOrientation, "我们现在在哪个街道/乡？", ExactText, 1)
                .located(LocationSlot::StreetTownship),
            QuestionItem::new(
                10,
                "地点定向",
                PlaceOrientation,
                "我们现在在哪个楼层/具体地址？",
                ExactText,
                1,
            )
            .located(LocationSlot::Address),
            QuestionItem::new(
                11,
                "语言即刻记忆",
                Memory,
                "请记住这三样东西：皮球、国旗、树木。我会稍后问您。请您重复一遍这三样东西。",
                MemoryProduction,
                3,
            )
            .accepting(MEMORY_WORDS),
        ];

        let serial_sevens = [
            (12, "请计算：100减去7等于多少？", "93"),
            (13, "再减去7等于多少？", "86"),
            (14, "再减去7等于多少？", "79"),
            (15, "再减去7等于多少？", "72"),
            (16, "再减去7等于多少？", "65"),
        ];
        items.extend(serial_sevens.into_iter().map(|(id, prompt, answer)| {
            QuestionItem::new(id, "注意和计算", AttentionCalculation, prompt, Calculation, 1)
                .accepting([answer])
        }));

        items.extend([
            QuestionItem::new(
                17,
                "语言延迟记忆",
                Memory,
                "刚才我让您记住的三样东西是什么？",
                MemoryRecall,
                3,
            )
            .accepting(MEMORY_WORDS),
            QuestionItem::new(18, "语言命名", Language, "这是什么？（请向患者出示手表）", ExactText, 1)
                .accepting(["手表", "表", "腕表"])
                .with_props(),
            QuestionItem::new(19, "语言命名", Language, "这是什么？（请向患者出示铅笔）", ExactText, 1)
                .accepting(["铅笔", "笔"])
                .with_props(),
            QuestionItem::new(20, "语言复述", Language, "请跟我说：'四十四只石狮子'", ExactText, 1)
                .accepting(["四十四只石狮子"]),
            QuestionItem::new(21, "语言理解", Language, "请用右手拿纸。", ObservedAction, 1)
                .observing("观察患者是否能用右手拿纸"),
            QuestionItem::new(22, "语言理解", Language, "请把纸对折。", ObservedAction, 1)
                .observing("观察患者是否能把纸对折"),
            QuestionItem::new(23, "语言理解", Language, "请把纸放在桌子上。", ObservedAction, 1)
                .observing("观察患者是否能把纸放在桌子上"),
            QuestionItem::new(
                24,
                "语言阅读",
                Language,
                "请念这句话并照着做：'闭上你的眼睛'",
                ObservedAction,
                1,
            )
            .observing("观察患者是否能正确阅读并闭上眼睛"),
            QuestionItem::new(25, "语言书写", Language, "请写一个完整的句子。", ObservedAction, 1)
                .observing("判断句子是否完整且有意义"),
            QuestionItem::new(
                26,
                "语言结构",
                Language,
                "请模仿画这个图形。（出示交叉的五边形）",
                ObservedDrawing,
                1,
            )
            .observing("判断图形是否正确")
            .with_props(),
        ]);

        Self { items }
    }

    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    /// Fill the location items' accepted answers. Runs once, before any scoring.
    ///
    /// Blank facts leave the item with no accepted answer, so it scores 0.
    pub fn configure(self, location: &LocationFacts) -> ConfiguredBank {
        let items = self
            .items
            .into_iter()
            .map(|mut item| {
                if let Some(slot) = item.location_slot {
                    let answer = location.answer_for(slot).trim();
                    if answer.is_empty() {
                        warn!(
                            item = item.id,
                            ?slot,
                            "no location fact supplied, item cannot be credited"
                        );
                        item.accepted = Vec::new();
                    } else {
                        debug!(item = item.id, answer, "location answer configured");
                        item.accepted = vec![answer.to_string()];
                    }
                }
                item
            })
            .collect();

        ConfiguredBank { items }
    }
}

/// The instrument with every accepted-answer set filled in.
#[derive(Debug, Clone)]
pub struct ConfiguredBank {
    items: Vec<QuestionItem>,
}

impl ConfiguredBank {
    pub fn items(&self) -> &[QuestionItem] {
        &self.items
    }

    pub(crate) fn into_items(self) -> Vec<QuestionItem> {
        self.items
    }
}

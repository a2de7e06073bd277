//! `yiqu mmse`: run one assessment outside the chat loop.

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{
    Cell, CellAlignment, Color, ContentArrangement, Table, presets::UTF8_FULL_CONDENSED,
};
use tracing::info;
use yiqu_mmse::{AssessmentReport, ItemBank, Operator, TextMatching, administer};

use super::chat::Session;
use crate::config::ConfigLoader;
use crate::prompts::{print_header_to, print_success_to};
use crate::terminal::LineOperator;

#[derive(Debug, Args)]
pub struct MmseArgs {
    /// Ask the assistant to explain the result afterwards
    #[arg(long)]
    pub analyze: bool,

    /// Do not save the JSON report
    #[arg(long, conflicts_with = "output")]
    pub no_save: bool,

    /// Write the JSON report to this path instead of the reports directory
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub async fn run(args: MmseArgs) -> Result<()> {
    let config = ConfigLoader::load()?;
    let mut operator = LineOperator::stdio();

    let report = assess(ItemBank::today(), config.assessment.text_matching, &mut operator)?;

    if !args.no_save && (config.assessment.save_reports || args.output.is_some()) {
        let path = save_report(&report, args.output.as_deref())?;
        print_success_to(operator.writer(), &format!("评估报告已保存: {}", path.display()))?;
    }

    if args.analyze {
        let mut session = Session::new(&config);
        session.analyze(&report, &mut operator).await?;
    }

    Ok(())
}

/// Administer the assessment and print the results.
pub fn assess<R: BufRead, W: Write>(
    bank: ItemBank,
    matching: TextMatching,
    operator: &mut LineOperator<R, W>,
) -> Result<AssessmentReport> {
    let report = administer(bank, matching, operator).context("assessment aborted")?;

    let out = operator.writer();
    writeln!(out)?;
    print_header_to(out, "MMSE评估结果")?;
    writeln!(out, "{}", results_table(&report))?;
    writeln!(out)?;
    writeln!(out, "{}", report.summary())?;
    operator.show("")?;

    Ok(report)
}

/// Save `report` to `target`, or into the reports directory.
pub fn save_report(report: &AssessmentReport, target: Option<&Path>) -> Result<PathBuf> {
    let path = match target {
        Some(path) => path.to_path_buf(),
        None => yiqu_paths::reports_dir().join(report.file_name()),
    };
    report
        .save(&path)
        .with_context(|| format!("failed to save report to {}", path.display()))?;
    info!(path = %path.display(), "assessment report saved");
    Ok(path)
}

pub fn results_table(report: &AssessmentReport) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec![
        Cell::new("题号").fg(Color::Cyan),
        Cell::new("类别").fg(Color::Cyan),
        Cell::new("回答").fg(Color::Cyan),
        Cell::new("得分").fg(Color::Cyan),
    ]);

    for entry in &report.entries {
        let score = Cell::new(format!("{}/{}", entry.score, entry.max_score))
            .set_alignment(CellAlignment::Right);
        let score = if entry.score == entry.max_score {
            score.fg(Color::Green)
        } else if entry.score == 0 {
            score.fg(Color::Red)
        } else {
            score.fg(Color::Yellow)
        };

        table.add_row(vec![
            Cell::new(entry.item_id),
            Cell::new(&entry.category),
            Cell::new(&entry.answer),
            score,
        ]);
    }

    table
}

//! The interactive command loop: chat with the assistant or start an assessment.

use std::io::{BufRead, Write};

use anyhow::{Context, Result, bail};
use tracing::{debug, info};
use yiqu_mmse::{AssessmentReport, Error as MmseError, ItemBank, Operator};
use yiqu_models::auth::CredentialStore;
use yiqu_models::providers::{ChatProvider, SparkProvider};
use yiqu_models::Conversation;

use super::auth::KEYRING_SERVICE;
use super::mmse;
use crate::config::{ConfigLoader, YiquConfig};
use crate::prompts::{print_error_to, print_success_to};
use crate::terminal::LineOperator;

const COMMAND_PROMPT: &str = "\n请输入指令: ";
const ANALYZE_PROMPT: &str = "\n是否需要让AI分析本次评估结果？(y/n): ";
const GOODBYE: &str = "系统已退出，再见！";

pub async fn run() -> Result<()> {
    let config = ConfigLoader::load()?;
    let mut operator = LineOperator::stdio();
    let mut session = Session::new(&config);
    session.command_loop(&mut operator).await
}

/// What the operator typed at the command prompt.
#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Exit,
    Assess,
    Chat(&'a str),
    Empty,
}

impl<'a> Command<'a> {
    fn parse(line: &'a str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            Self::Empty
        } else if line.eq_ignore_ascii_case("exit") {
            Self::Exit
        } else if line.eq_ignore_ascii_case("mmse") {
            Self::Assess
        } else {
            Self::Chat(line)
        }
    }
}

/// One conversation with the assistant.
///
/// The provider is created on first use, so assessments work without credentials.
pub struct Session {
    config: YiquConfig,
    conversation: Conversation,
    provider: Option<Box<dyn ChatProvider>>,
}

impl Session {
    pub fn new(config: &YiquConfig) -> Self {
        let mut conversation = Conversation::new(config.assistant.system_prompt.clone());
        if let Some(window) = config.assistant.context_window {
            conversation = conversation.with_context_window(window);
        }
        Self {
            config: config.clone(),
            conversation,
            provider: None,
        }
    }

    #[cfg(test)]
    fn with_provider(config: &YiquConfig, provider: Box<dyn ChatProvider>) -> Self {
        Self {
            provider: Some(provider),
            ..Self::new(config)
        }
    }

    /// Send one message and stream the reply to the operator.
    pub async fn relay<R: BufRead, W: Write>(
        &mut self,
        content: &str,
        operator: &mut LineOperator<R, W>,
    ) -> Result<String> {
        if self.provider.is_none() {
            self.provider = Some(Box::new(spark_provider(&self.config)?));
        }
        let Some(provider) = self.provider.as_deref() else {
            bail!("no chat provider available");
        };

        operator.show("\nAI正在回复...\n")?;
        let reply = self
            .conversation
            .send(provider, content, self.config.spark.timeout(), |delta| {
                if let Err(err) = operator.write_fragment(delta) {
                    debug!(error = %err, "writing reply fragment");
                }
            })
            .await?;
        operator.show("")?;

        debug!(
            messages = self.conversation.messages().len(),
            "conversation turn complete"
        );
        Ok(reply)
    }

    /// Ask the assistant to explain an assessment result.
    pub async fn analyze<R: BufRead, W: Write>(
        &mut self,
        report: &AssessmentReport,
        operator: &mut LineOperator<R, W>,
    ) -> Result<String> {
        operator.show("\n正在请求AI分析评估结果...")?;
        self.relay(&report.analysis_prompt(), operator).await
    }

    /// Read commands until `exit` or end of input.
    pub async fn command_loop<R: BufRead, W: Write>(
        &mut self,
        operator: &mut LineOperator<R, W>,
    ) -> Result<()> {
        operator.show("欢迎使用忆趣康元系统！")?;
        operator.show("输入 'exit' 退出系统")?;
        operator.show("输入 'mmse' 开始简易智力状态检查")?;
        operator.show("输入其他内容与AI对话")?;

        loop {
            let line = match operator.ask(COMMAND_PROMPT) {
                Ok(line) => line,
                Err(MmseError::InputClosed) => break,
                Err(err) => return Err(err.into()),
            };

            match Command::parse(&line) {
                Command::Empty => continue,
                Command::Exit => break,
                Command::Assess => {
                    if !self.assess(operator).await? {
                        break;
                    }
                }
                Command::Chat(text) => {
                    if let Err(err) = self.relay(text, operator).await {
                        print_error_to(operator.writer(), &format!("对话失败: {err:#}"))?;
                    }
                }
            }
        }

        operator.show(GOODBYE)?;
        info!("session ended");
        Ok(())
    }

    /// Run an assessment from the loop. Returns `false` when input has ended.
    async fn assess<R: BufRead, W: Write>(
        &mut self,
        operator: &mut LineOperator<R, W>,
    ) -> Result<bool> {
        let matching = self.config.assessment.text_matching;
        let report = match mmse::assess(ItemBank::today(), matching, operator) {
            Ok(report) => report,
            Err(err) => {
                let closed = matches!(
                    err.downcast_ref::<MmseError>(),
                    Some(MmseError::InputClosed)
                );
                print_error_to(operator.writer(), &format!("{err:#}"))?;
                return Ok(!closed);
            }
        };

        if self.config.assessment.save_reports {
            match mmse::save_report(&report, None) {
                Ok(path) => print_success_to(
                    operator.writer(),
                    &format!("评估报告已保存: {}", path.display()),
                )?,
                Err(err) => print_error_to(operator.writer(), &format!("{err:#}"))?,
            }
        }

        let analyze = match operator.confirm(ANALYZE_PROMPT) {
            Ok(analyze) => analyze,
            Err(MmseError::InputClosed) => return Ok(false),
            Err(err) => return Err(err.into()),
        };
        if analyze && let Err(err) = self.analyze(&report, operator).await {
            print_error_to(operator.writer(), &format!("分析失败: {err:#}"))?;
        }
        Ok(true)
    }
}

fn spark_provider(config: &YiquConfig) -> Result<SparkProvider> {
    let credentials = CredentialStore::new(KEYRING_SERVICE)
        .with_env_fallback()
        .spark_credentials()
        .context(
            "Spark credentials missing; run `yiqu auth set` or set SPARK_APPID, SPARK_API_KEY and SPARK_API_SECRET",
        )?;
    let provider = SparkProvider::new(config.spark.provider_config(), credentials)?;
    debug!(endpoint = %config.spark.url, "spark provider ready");
    Ok(provider)
}

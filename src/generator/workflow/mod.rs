use crate::config::Config;
use crate::error::PipelineError;
use crate::generator::agent::ModelSettings;
use crate::generator::crews::CrewBuilder;
use crate::generator::graph::TaskGraph;
use crate::generator::invoker::Invoker;
use crate::generator::result::PipelineResult;
use crate::generator::scheduler::{Scheduler, SchedulerOptions};
use crate::generator::template::TemplateInputs;
use crate::llm::client::LLMClient;

use anyhow::Result;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span};

/// 时间跟踪作用域
pub struct TimingScope {
    start_time: Instant,
    phase_start_times: Vec<(&'static str, Instant)>,
    phase_durations: Vec<(&'static str, Duration)>,
}

impl Default for TimingScope {
    fn default() -> Self {
        Self::new()
    }
}

impl TimingScope {
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            phase_start_times: Vec::new(),
            phase_durations: Vec::new(),
        }
    }

    /// 开始一个新的阶段计时
    pub fn start_phase(&mut self, phase_name: &'static str) {
        self.phase_start_times.push((phase_name, Instant::now()));
    }

    /// 结束一个阶段的计时
    pub fn end_phase(&mut self, phase_name: &'static str) -> Option<Duration> {
        let pos = self
            .phase_start_times
            .iter()
            .position(|(name, _)| *name == phase_name)?;
        let (_, started) = self.phase_start_times.remove(pos);
        let duration = started.elapsed();
        self.phase_durations.push((phase_name, duration));
        Some(duration)
    }

    pub fn total_duration(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 按阶段结束顺序记录的耗时
    pub fn phase_durations(&self) -> &[(&'static str, Duration)] {
        &self.phase_durations
    }

    /// 获取格式化的执行时间报告
    pub fn generate_timing_report(&self) -> String {
        let mut report = format!(
            "总执行时间: {:.2}秒",
            self.total_duration().as_secs_f64()
        );
        for (phase, duration) in &self.phase_durations {
            report.push_str(&format!("\n- {}: {:.3}秒", phase, duration.as_secs_f64()));
        }
        report
    }
}

/// 时间跟踪常量
pub struct TimingKeys;

impl TimingKeys {
    pub const BUILD: &'static str = "build";
    pub const EXECUTE: &'static str = "execute";
}

/// 按配置构建本次运行的任务图
///
/// 模型配置在所有任务构建之前校验，失败时不会产生任何任务。
pub fn build_graph(config: &Config, topic: &str) -> Result<TaskGraph, PipelineError> {
    let model = Arc::new(ModelSettings::from_llm_config(&config.llm)?);
    let inputs = TemplateInputs::topic(topic);
    let crew = CrewBuilder::new(model, &inputs, config);
    config.crew.build_graph(&crew)
}

/// 以给定的调用器执行一次完整运行
pub async fn run_pipeline(
    config: &Config,
    topic: &str,
    invoker: &dyn Invoker,
) -> Result<PipelineResult, PipelineError> {
    run_pipeline_with_cancellation(config, topic, invoker, CancellationToken::new()).await
}

/// 同 [`run_pipeline`]，可由外部取消
pub async fn run_pipeline_with_cancellation(
    config: &Config,
    topic: &str,
    invoker: &dyn Invoker,
    cancel: CancellationToken,
) -> Result<PipelineResult, PipelineError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(PipelineError::EmptyTopic);
    }

    let span = info_span!("pipeline", run_id = %uuid::Uuid::new_v4(), crew = %config.crew);
    async move {
        let mut timing = TimingScope::new();

        timing.start_phase(TimingKeys::BUILD);
        let graph = build_graph(config, topic)?;
        timing.end_phase(TimingKeys::BUILD);
        info!(topic, tasks = graph.len(), "📋 任务图构建完成");

        timing.start_phase(TimingKeys::EXECUTE);
        let result = Scheduler::new(invoker, SchedulerOptions::from(&config.scheduler))
            .with_cancellation(cancel)
            .run(topic, &graph)
            .await?;
        timing.end_phase(TimingKeys::EXECUTE);

        info!("🎉 运行完成\n{}", timing.generate_timing_report());
        Ok::<_, PipelineError>(result)
    }
    .instrument(span)
    .await
}

/// 启动一次联网运行：检查模型连接后按配置执行
pub async fn launch(config: &Config, topic: &str) -> Result<PipelineResult> {
    if topic.trim().is_empty() {
        return Err(PipelineError::EmptyTopic.into());
    }

    // 先校验任务图，校验失败时不产生任何外部调用
    build_graph(config, topic)?;

    let client = LLMClient::new(config)?;

    // 启动时检查模型连接
    client.check_connection().await?;

    Ok(run_pipeline(config, topic, &client).await?)
}

// Include tests
#[cfg(test)]
mod tests;

//! 调度器 - 按依赖顺序驱动任务执行并汇总输出

use std::time::{Duration, Instant};

use futures::{StreamExt, TryStreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::SchedulerConfig;
use crate::error::{InvocationError, PipelineError, Result};
use crate::generator::context::ExecutionContext;
use crate::generator::graph::TaskGraph;
use crate::generator::invoker::{InvocationRequest, Invoker};
use crate::generator::result::PipelineResult;
use crate::generator::task::TaskDefinition;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// 一次只执行一个任务
    Sequential,
    /// 同一依赖层内的任务并发执行，最多 `max_parallels` 个同时在途
    Concurrent { max_parallels: usize },
}

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// 单个任务调用的超时时间
    pub task_timeout: Duration,
    pub mode: ExecutionMode,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            task_timeout: Duration::from_secs(300),
            mode: ExecutionMode::Sequential,
        }
    }
}

impl From<&SchedulerConfig> for SchedulerOptions {
    fn from(config: &SchedulerConfig) -> Self {
        let mode = if config.concurrent {
            ExecutionMode::Concurrent {
                max_parallels: config.max_parallels.max(1),
            }
        } else {
            ExecutionMode::Sequential
        };
        Self {
            // 超时至少 1 秒
            task_timeout: Duration::from_secs(config.task_timeout_seconds.max(1)),
            mode,
        }
    }
}

pub struct Scheduler<'a> {
    invoker: &'a dyn Invoker,
    options: SchedulerOptions,
    cancel: CancellationToken,
}

impl<'a> Scheduler<'a> {
    pub fn new(invoker: &'a dyn Invoker, options: SchedulerOptions) -> Self {
        Self {
            invoker,
            options,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// 执行整个任务图，任一任务失败即中止，不返回部分结果
    pub async fn run(&self, topic: &str, graph: &TaskGraph) -> Result<PipelineResult> {
        let mut context = ExecutionContext::new();

        match self.options.mode {
            ExecutionMode::Sequential => {
                for task in graph.execution_order() {
                    let output = self.execute_task(task, &context).await?;
                    context.record(task.id().clone(), task.agent().role(), output)?;
                }
            }
            ExecutionMode::Concurrent { max_parallels } => {
                for (level, wave) in graph.waves().into_iter().enumerate() {
                    debug!(level, tasks = wave.len(), max_parallels, "执行依赖层");
                    let outputs: Vec<String> = {
                        let completed = &context;
                        futures::stream::iter(
                            wave.iter().map(|task| self.execute_task(task, completed)),
                        )
                        .buffered(max_parallels.max(1))
                        .try_collect()
                        .await?
                    };
                    // 单一写入方：整层完成后按源顺序落盘
                    for (task, output) in wave.iter().zip(outputs) {
                        context.record(task.id().clone(), task.agent().role(), output)?;
                    }
                }
            }
        }

        let terminal = graph.terminal();
        let output = context
            .get(terminal.id())
            .map(str::to_string)
            .unwrap_or_default();
        info!(
            final_task = %terminal.id(),
            tasks = context.len(),
            bytes = context.total_size(),
            "✓ 任务图执行完毕"
        );

        Ok(PipelineResult::new(
            topic,
            terminal.id().clone(),
            output,
            context,
        ))
    }

    async fn execute_task(
        &self,
        task: &TaskDefinition,
        completed: &ExecutionContext,
    ) -> Result<String> {
        debug_assert!(task.context().iter().all(|id| completed.contains(id)));

        let upstream = completed.assemble(task.context());
        let request = InvocationRequest::for_task(task, &upstream);
        let timeout = self.options.task_timeout;

        info!(
            task = %task.id(),
            agent = %task.agent().role(),
            upstream = task.context().len(),
            "🤖 执行任务"
        );
        let started = Instant::now();

        let outcome = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => {
                warn!(task = %task.id(), "运行已取消");
                return Err(PipelineError::Cancelled {
                    task: task.id().clone(),
                });
            }
            outcome = tokio::time::timeout(timeout, self.invoker.invoke(&request)) => outcome,
        };

        let output = outcome
            .unwrap_or(Err(InvocationError::Timeout(timeout)))
            .and_then(|text| {
                if text.trim().is_empty() {
                    Err(InvocationError::MalformedResponse(
                        "模型返回了空内容".to_string(),
                    ))
                } else {
                    Ok(text)
                }
            })
            .map_err(|source| {
                warn!(task = %task.id(), error = %source, "❌ 任务失败");
                PipelineError::Invocation {
                    task: task.id().clone(),
                    source,
                }
            })?;

        info!(
            task = %task.id(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            chars = output.len(),
            "✅ 任务完成"
        );
        Ok(output)
    }
}

use std::fmt::Display;

use serde::Serialize;

use crate::generator::context::{ExecutionContext, TaskOutput};
use crate::generator::task::TaskId;

/// 一次运行的最终产物：终结任务的输出 + 全部任务的历史
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineResult {
    topic: String,
    final_task: TaskId,
    output: String,
    history: ExecutionContext,
}

impl PipelineResult {
    pub(crate) fn new(
        topic: impl Into<String>,
        final_task: TaskId,
        output: String,
        history: ExecutionContext,
    ) -> Self {
        Self {
            topic: topic.into(),
            final_task,
            output,
            history,
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn final_task(&self) -> &TaskId {
        &self.final_task
    }

    /// 最终文档正文
    pub fn output(&self) -> &str {
        &self.output
    }

    pub fn history(&self) -> &ExecutionContext {
        &self.history
    }

    pub fn task_output(&self, task_id: &TaskId) -> Option<&str> {
        self.history.get(task_id)
    }

    pub fn stages(&self) -> impl Iterator<Item = &TaskOutput> {
        self.history.iter()
    }

    pub fn into_output(self) -> String {
        self.output
    }
}

impl Display for PipelineResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.output)
    }
}

use std::collections::HashMap;

use serde::Serialize;

use crate::error::PipelineError;
use crate::generator::task::TaskId;

/// 单个任务的执行记录
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskOutput {
    pub task_id: TaskId,
    pub agent_role: String,
    pub output: String,
}

/// 执行上下文 - 按执行顺序追加的任务输出，只增不改
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ExecutionContext {
    entries: Vec<TaskOutput>,
    #[serde(skip)]
    index: HashMap<TaskId, usize>,
    #[serde(skip)]
    total_size: usize,
}

impl ExecutionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录任务输出，同一任务重复记录视为错误
    pub fn record(
        &mut self,
        task_id: TaskId,
        agent_role: impl Into<String>,
        output: impl Into<String>,
    ) -> Result<(), PipelineError> {
        if self.index.contains_key(&task_id) {
            return Err(PipelineError::OutputAlreadyRecorded(task_id));
        }

        let output = output.into();
        self.total_size += output.len();
        self.index.insert(task_id.clone(), self.entries.len());
        self.entries.push(TaskOutput {
            task_id,
            agent_role: agent_role.into(),
            output,
        });
        Ok(())
    }

    pub fn get(&self, task_id: &TaskId) -> Option<&str> {
        self.entry(task_id).map(|e| e.output.as_str())
    }

    pub fn entry(&self, task_id: &TaskId) -> Option<&TaskOutput> {
        self.index.get(task_id).map(|&i| &self.entries[i])
    }

    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.index.contains_key(task_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按执行顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &TaskOutput> {
        self.entries.iter()
    }

    /// 已记录输出的总字节数
    pub fn total_size(&self) -> usize {
        self.total_size
    }

    /// 按声明顺序拼接上游任务输出，作为下游任务的上下文
    ///
    /// 调度器保证调用时所有依赖均已完成；若缺失则跳过该段。
    pub fn assemble(&self, upstream: &[TaskId]) -> String {
        upstream
            .iter()
            .filter_map(|id| self.entry(id))
            .map(|entry| {
                format!(
                    "### {} ({})\n{}",
                    entry.agent_role,
                    entry.task_id,
                    entry.output.trim_end()
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_is_append_only() {
        let mut ctx = ExecutionContext::new();
        ctx.record(TaskId::from("research"), "Researcher", "facts")
            .unwrap();

        let err = ctx
            .record(TaskId::from("research"), "Researcher", "other facts")
            .unwrap_err();
        assert_eq!(err, PipelineError::OutputAlreadyRecorded(TaskId::from("research")));
        assert_eq!(ctx.get(&TaskId::from("research")), Some("facts"));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_iteration_follows_record_order() {
        let mut ctx = ExecutionContext::new();
        for id in ["c", "a", "b"] {
            ctx.record(TaskId::from(id), "R", id).unwrap();
        }
        let order: Vec<_> = ctx.iter().map(|e| e.task_id.as_str()).collect();
        assert_eq!(order, vec!["c", "a", "b"]);
        assert_eq!(ctx.total_size(), 3);
    }

    #[test]
    fn test_assemble_uses_declared_order() {
        let mut ctx = ExecutionContext::new();
        ctx.record(TaskId::from("t1"), "Researcher", "first\n").unwrap();
        ctx.record(TaskId::from("t2"), "Analyst", "second").unwrap();

        let assembled = ctx.assemble(&[TaskId::from("t2"), TaskId::from("t1")]);
        assert_eq!(
            assembled,
            "### Analyst (t2)\nsecond\n\n### Researcher (t1)\nfirst"
        );
        assert_eq!(ctx.assemble(&[]), "");
    }

    #[test]
    fn test_serialize_history() {
        let mut ctx = ExecutionContext::new();
        ctx.record(TaskId::from("t1"), "Researcher", "out").unwrap();
        let json = serde_json::to_value(&ctx).unwrap();
        assert_eq!(json["entries"][0]["task_id"], "t1");
        assert!(json.get("index").is_none());
    }
}

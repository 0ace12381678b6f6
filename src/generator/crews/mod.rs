//! 内置的 Crew 蓝图：每个蓝图声明一组 Agent 与任务，并按主题渲染

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::{ConstructionError, PipelineError};
use crate::generator::agent::{AgentDefinition, ModelSettings};
use crate::generator::capability::{CapabilityKind, PrerequisiteSource};
use crate::generator::graph::TaskGraph;
use crate::generator::task::{TaskDefinition, TaskId};
use crate::generator::template::TemplateInputs;

pub mod action_research;
pub mod research_proposal;

/// Crew 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum CrewKind {
    /// 通用科研项目申请书
    #[default]
    ResearchProposal,
    /// 面向加纳基础教育的行动研究申请书
    ActionResearch,
}

impl CrewKind {
    /// 标题区横幅文本
    pub fn banner(&self) -> &'static str {
        match self {
            CrewKind::ResearchProposal => "FINAL RESEARCH PROPOSAL",
            CrewKind::ActionResearch => "ACTION RESEARCH PROPOSAL",
        }
    }

    /// 由已清洗的主题生成输出文件名
    pub fn file_name(&self, sanitized_topic: &str) -> String {
        match self {
            CrewKind::ResearchProposal => format!("{}_proposal.md", sanitized_topic),
            CrewKind::ActionResearch => format!("Proposal_{}.md", sanitized_topic),
        }
    }

    /// 构建该 Crew 的任务列表（尚未校验依赖）
    pub fn tasks(&self, crew: &CrewBuilder<'_>) -> Result<Vec<TaskDefinition>, ConstructionError> {
        match self {
            CrewKind::ResearchProposal => research_proposal::tasks(crew),
            CrewKind::ActionResearch => action_research::tasks(crew),
        }
    }

    /// 构建并校验任务图
    pub fn build_graph(&self, crew: &CrewBuilder<'_>) -> Result<TaskGraph, PipelineError> {
        let tasks = self.tasks(crew)?;
        Ok(TaskGraph::new(tasks)?)
    }
}

impl std::fmt::Display for CrewKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CrewKind::ResearchProposal => write!(f, "research-proposal"),
            CrewKind::ActionResearch => write!(f, "action-research"),
        }
    }
}

/// 蓝图构建上下文：同一 Crew 内所有 Agent 共享一份模型配置
pub struct CrewBuilder<'a> {
    model: Arc<ModelSettings>,
    inputs: &'a TemplateInputs,
    prerequisites: &'a dyn PrerequisiteSource,
}

impl<'a> CrewBuilder<'a> {
    pub fn new(
        model: Arc<ModelSettings>,
        inputs: &'a TemplateInputs,
        prerequisites: &'a dyn PrerequisiteSource,
    ) -> Self {
        Self {
            model,
            inputs,
            prerequisites,
        }
    }

    pub fn agent(
        &self,
        role: &str,
        goal: &str,
        backstory: &str,
        capabilities: &[CapabilityKind],
    ) -> Result<Arc<AgentDefinition>, ConstructionError> {
        let owner = format!("agent `{}`", role);
        let mut builder = AgentDefinition::builder(role)
            .goal(self.inputs.render(&owner, goal)?)
            .backstory(self.inputs.render(&owner, backstory)?);
        for &kind in capabilities {
            builder = builder.capability(kind);
        }
        Ok(Arc::new(
            builder.build(Arc::clone(&self.model), self.prerequisites)?,
        ))
    }

    pub fn task(
        &self,
        id: &str,
        agent: &Arc<AgentDefinition>,
        description: &str,
        expected_output: &str,
        context: &[&str],
    ) -> Result<TaskDefinition, ConstructionError> {
        let owner = format!("task `{}`", id);
        let task = TaskDefinition::new(
            id,
            Arc::clone(agent),
            self.inputs.render(&owner, description)?,
            self.inputs.render(&owner, expected_output)?,
        )?;
        Ok(task.with_context(context.iter().map(|&dep| TaskId::from(dep))))
    }
}

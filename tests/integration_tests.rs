use async_trait::async_trait;
use std::fs;
use std::sync::Arc;
use std::sync::Mutex;
use tempfile::TempDir;

use proposal_crew::config::Config;
use proposal_crew::error::GraphError;
use proposal_crew::generator::agent::{AgentDefinition, ModelSettings};
use proposal_crew::generator::capability::CapabilityKind;
use proposal_crew::generator::crews::CrewKind;
use proposal_crew::generator::graph::TaskGraph;
use proposal_crew::generator::outlet::{DiskOutlet, Outlet};
use proposal_crew::generator::task::{TaskDefinition, TaskId};
use proposal_crew::{
    EchoInvoker, InvocationError, InvocationRequest, Invoker, PipelineError, run_pipeline,
};

/// 记录每次调用的任务与能力，可指定某个任务失败
#[derive(Default)]
struct RecordingInvoker {
    calls: Mutex<Vec<(String, Vec<CapabilityKind>)>>,
    fail_on: Option<&'static str>,
}

#[async_trait]
impl Invoker for RecordingInvoker {
    async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<String, InvocationError> {
        self.calls.lock().unwrap().push((
            request.task_id.to_string(),
            request.capabilities.kinds(),
        ));
        if self.fail_on == Some(request.task_id.as_str()) {
            return Err(InvocationError::QuotaExceeded("429 Too Many Requests".to_string()));
        }
        Ok(format!("{} done", request.task_id))
    }
}

impl RecordingInvoker {
    fn failing_on(task: &'static str) -> Self {
        Self {
            fail_on: Some(task),
            ..Self::default()
        }
    }

    fn task_ids(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(id, _)| id.clone())
            .collect()
    }
}

fn offline_config(crew: CrewKind) -> Config {
    let mut config = Config::default();
    config.crew = crew;
    config.search.api_key = None;
    config
}

#[tokio::test]
async fn test_research_proposal_crew_end_to_end() {
    let invoker = RecordingInvoker::default();
    let config = offline_config(CrewKind::ResearchProposal);

    let result = run_pipeline(&config, "Urban Heat Islands", &invoker)
        .await
        .unwrap();

    assert_eq!(invoker.task_ids(), vec!["research", "analysis", "proposal"]);
    assert_eq!(result.output(), "proposal done");
    assert_eq!(
        result.task_output(&TaskId::from("research")),
        Some("research done")
    );
}

#[tokio::test]
async fn test_action_research_crew_end_to_end() {
    let invoker = RecordingInvoker::default();
    let config = offline_config(CrewKind::ActionResearch);

    let result = run_pipeline(&config, "Class 3 Reading", &invoker)
        .await
        .unwrap();

    assert_eq!(invoker.task_ids(), vec!["research", "design", "proposal"]);
    assert_eq!(result.final_task(), &TaskId::from("proposal"));
    assert_eq!(result.history().len(), 3);
}

#[tokio::test]
async fn test_dry_run_output_saved_to_disk() {
    let temp_dir = TempDir::new().unwrap();
    let mut config = offline_config(CrewKind::ResearchProposal);
    config.output_path = temp_dir.path().join("output");
    config.write_history = true;

    let result = run_pipeline(&config, "AI Ethics", &EchoInvoker).await.unwrap();
    let saved = DiskOutlet::from_config(&config).save(&result).await.unwrap();

    assert_eq!(
        saved.document,
        temp_dir.path().join("output/AI_Ethics_proposal.md")
    );
    assert_eq!(fs::read_to_string(&saved.document).unwrap(), result.output());
    assert!(saved.history.unwrap().exists());
}

#[tokio::test]
async fn test_rerun_produces_identical_result() {
    let config = offline_config(CrewKind::ResearchProposal);
    let first = run_pipeline(&config, "AI Ethics", &EchoInvoker).await.unwrap();
    let second = run_pipeline(&config, "AI Ethics", &EchoInvoker).await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first.to_string(), second.to_string());
}

#[tokio::test]
async fn test_empty_topic_makes_no_calls() {
    let invoker = RecordingInvoker::default();
    let err = run_pipeline(&offline_config(CrewKind::ActionResearch), " \n\t", &invoker)
        .await
        .unwrap_err();

    assert_eq!(err, PipelineError::EmptyTopic);
    assert!(invoker.task_ids().is_empty());
}

#[tokio::test]
async fn test_web_search_requires_credential() {
    let invoker = RecordingInvoker::default();
    run_pipeline(&offline_config(CrewKind::ActionResearch), "Soil", &invoker)
        .await
        .unwrap();
    let calls = invoker.calls.lock().unwrap().clone();
    assert!(calls.iter().all(|(_, caps)| caps.is_empty()));

    let invoker = RecordingInvoker::default();
    let mut config = offline_config(CrewKind::ActionResearch);
    config.search.api_key = Some("serper-key".to_string());
    run_pipeline(&config, "Soil", &invoker).await.unwrap();
    let calls = invoker.calls.lock().unwrap().clone();
    assert_eq!(calls[0].1, vec![CapabilityKind::WebSearch]);
    assert!(calls[1].1.is_empty());
}

#[tokio::test]
async fn test_failure_names_task_and_stops_downstream() {
    let invoker = RecordingInvoker::failing_on("analysis");
    let err = run_pipeline(
        &offline_config(CrewKind::ResearchProposal),
        "AI Ethics",
        &invoker,
    )
    .await
    .unwrap_err();

    assert_eq!(err.failed_task(), Some(&TaskId::from("analysis")));
    assert!(matches!(
        err,
        PipelineError::Invocation {
            source: InvocationError::QuotaExceeded(_),
            ..
        }
    ));
    assert_eq!(invoker.task_ids(), vec!["research", "analysis"]);
}

#[tokio::test]
async fn test_invalid_model_makes_no_calls() {
    let invoker = RecordingInvoker::default();
    let mut config = offline_config(CrewKind::ResearchProposal);
    config.llm.max_tokens = 0;

    let err = run_pipeline(&config, "AI Ethics", &invoker).await.unwrap_err();
    assert!(matches!(err, PipelineError::Construction(_)));
    assert!(invoker.task_ids().is_empty());
}

#[test]
fn test_cyclic_graph_rejected() {
    let model = Arc::new(ModelSettings::new("test-model", 0.5, 1000).unwrap());
    let agent = Arc::new(
        AgentDefinition::builder("Planner")
            .goal("Plan the study")
            .build(model, &Config::default())
            .unwrap(),
    );

    let a = TaskDefinition::new("a", agent.clone(), "Step A", "A notes")
        .unwrap()
        .with_context(["b"]);
    let b = TaskDefinition::new("b", agent, "Step B", "B notes")
        .unwrap()
        .with_context(["a"]);

    let err = TaskGraph::new(vec![a, b]).unwrap_err();
    assert!(matches!(err, GraphError::CycleDetected { .. }));
}

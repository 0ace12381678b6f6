#[cfg(test)]
mod tests {
    use crate::config::{Config, LLMProvider};
    use crate::error::{ConstructionError, InvocationError, PipelineError};
    use crate::generator::crews::CrewKind;
    use crate::generator::invoker::{EchoInvoker, InvocationRequest, Invoker};
    use crate::generator::task::TaskId;
    use crate::generator::workflow::{
        TimingKeys, TimingScope, build_graph, launch, run_pipeline, run_pipeline_with_cancellation,
    };
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio_util::sync::CancellationToken;

    #[derive(Default)]
    struct CountingInvoker {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Invoker for CountingInvoker {
        async fn invoke(&self, request: &InvocationRequest<'_>) -> Result<String, InvocationError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            EchoInvoker.invoke(request).await
        }
    }

    fn offline_config() -> Config {
        let mut config = Config::default();
        config.search.api_key = None;
        config
    }

    #[tokio::test]
    async fn test_run_pipeline_research_crew() {
        let config = offline_config();
        let result = run_pipeline(&config, "AI Ethics", &EchoInvoker).await.unwrap();

        assert_eq!(result.topic(), "AI Ethics");
        assert_eq!(result.final_task(), &TaskId::from("proposal"));
        assert_eq!(result.history().len(), 3);
        assert!(result
            .output()
            .starts_with("[Senior Research Proposal Writer] Write a formal research proposal about AI Ethics"));
        // 撰写任务的上下文来自分析任务
        assert!(result
            .output()
            .contains("Context:\n### Lead Data Analyst (analysis)\n[Lead Data Analyst]"));
    }

    #[tokio::test]
    async fn test_empty_topic_rejected_before_any_call() {
        let invoker = CountingInvoker::default();
        let err = run_pipeline(&offline_config(), "   ", &invoker)
            .await
            .unwrap_err();
        assert_eq!(err, PipelineError::EmptyTopic);
        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);

        let err = launch(&offline_config(), "").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::EmptyTopic)
        );
    }

    #[tokio::test]
    async fn test_invalid_model_fails_before_any_call() {
        let invoker = CountingInvoker::default();

        let mut config = offline_config();
        config.llm.model = String::new();
        let err = run_pipeline(&config, "AI Ethics", &invoker).await.unwrap_err();
        assert_eq!(err, PipelineError::Construction(ConstructionError::EmptyModel));

        let mut config = offline_config();
        config.llm.temperature = 3.5;
        let err = run_pipeline(&config, "AI Ethics", &invoker).await.unwrap_err();
        assert_eq!(
            err,
            PipelineError::Construction(ConstructionError::InvalidTemperature(3.5))
        );

        assert_eq!(invoker.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_launch_validates_plan_before_connecting() {
        let mut config = offline_config();
        config.llm.provider = LLMProvider::Ollama;
        config.llm.api_base_url = Some("http://127.0.0.1:9".to_string());
        config.llm.temperature = 3.5;

        let err = launch(&config, "AI Ethics").await.unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::Construction(
                ConstructionError::InvalidTemperature(3.5)
            ))
        );
    }

    #[tokio::test]
    async fn test_rerun_is_idempotent() {
        let mut config = offline_config();
        config.crew = CrewKind::ActionResearch;

        let first = run_pipeline(&config, "Reading Comprehension", &EchoInvoker)
            .await
            .unwrap();
        let second = run_pipeline(&config, "Reading Comprehension", &EchoInvoker)
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_concurrent_config_matches_sequential() {
        let sequential = run_pipeline(&offline_config(), "AI Ethics", &EchoInvoker)
            .await
            .unwrap();

        let mut config = offline_config();
        config.scheduler.concurrent = true;
        config.scheduler.max_parallels = 4;
        let concurrent = run_pipeline(&config, "AI Ethics", &EchoInvoker).await.unwrap();

        assert_eq!(sequential, concurrent);
    }

    #[tokio::test]
    async fn test_cancelled_run() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let err = run_pipeline_with_cancellation(
            &offline_config(),
            "AI Ethics",
            &EchoInvoker,
            cancel,
        )
        .await
        .unwrap_err();
        assert_eq!(
            err,
            PipelineError::Cancelled {
                task: TaskId::from("research")
            }
        );
    }

    #[test]
    fn test_build_graph_respects_search_credential() {
        let config = offline_config();
        let graph = build_graph(&config, "Soil").unwrap();
        assert_eq!(graph.tasks()[0].agent().capabilities().len(), 1);

        let mut config = offline_config();
        config.search.api_key = Some("serper".to_string());
        let graph = build_graph(&config, "Soil").unwrap();
        assert_eq!(graph.tasks()[0].agent().capabilities().len(), 2);
    }

    #[test]
    fn test_timing_scope() {
        let mut timing = TimingScope::new();
        timing.start_phase(TimingKeys::BUILD);
        assert!(timing.end_phase(TimingKeys::BUILD).is_some());
        assert!(timing.end_phase(TimingKeys::EXECUTE).is_none());
        assert_eq!(timing.phase_durations().len(), 1);
        assert!(timing.generate_timing_report().contains("- build:"));
    }
}

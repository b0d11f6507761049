use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField};
use crate::research::state::{StatePatch, WorkflowState};

/// 情报收集 - 搜索话题并整理为结构化要点
#[derive(Default)]
pub struct IntelligenceNode;

#[async_trait]
impl ResearchStage for IntelligenceNode {
    fn id(&self) -> StageId {
        StageId::Intelligence
    }

    fn required_inputs(&self) -> &'static [StateField] {
        &[StateField::Topic]
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure> {
        let search_data = ctx.search.search(&state.topic).await?;
        tracing::debug!(bytes = search_data.len(), "🔎 搜索结果已获取");

        let mut variables = PromptVariables::new();
        variables.insert("topic", state.topic.clone());
        variables.insert("data", search_data.clone());
        let notes = ctx
            .generate(PromptTemplateId::IntelligenceNotes, variables)
            .await?;

        Ok(StatePatch {
            raw_search: Some(search_data),
            summary_notes: Some(notes),
            iteration: Some(0),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::error::SearchError;
    use crate::research::session::SessionContext;
    use crate::research::stages::test_support::{ScriptedModel, StaticSearch};

    #[tokio::test]
    async fn test_search_feeds_notes_prompt() {
        let llm = ScriptedModel::new()
            .respond(PromptTemplateId::IntelligenceNotes, &["- solar capacity up"]);
        let search = StaticSearch::ok("solar capacity grew 30% in 2024");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let patch = IntelligenceNode
            .run(&ctx, &WorkflowState::new("solar energy trends"))
            .await
            .unwrap();

        assert_eq!(search.queries(), vec!["solar energy trends".to_string()]);
        assert_eq!(
            patch.raw_search.as_deref(),
            Some("solar capacity grew 30% in 2024")
        );
        assert_eq!(patch.summary_notes.as_deref(), Some("- solar capacity up"));
        assert_eq!(patch.iteration, Some(0));

        let variables = llm
            .last_variables(PromptTemplateId::IntelligenceNotes)
            .unwrap();
        assert_eq!(variables["data"], "solar capacity grew 30% in 2024");
    }

    #[tokio::test]
    async fn test_search_failure_skips_model() {
        let llm = ScriptedModel::in_domain();
        let search = StaticSearch::failing("quota exceeded");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let err = IntelligenceNode
            .run(&ctx, &WorkflowState::new("solar energy trends"))
            .await
            .unwrap_err();

        assert!(matches!(err, StageFailure::Search(SearchError::Upstream(_))));
        assert_eq!(llm.calls_to(PromptTemplateId::IntelligenceNotes), 0);
    }
}

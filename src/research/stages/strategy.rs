use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField, require};
use crate::research::state::{StatePatch, WorkflowState};

/// 战略分析 - 从调研要点中提炼趋势、商业影响与风险
#[derive(Default)]
pub struct StrategyNode;

#[async_trait]
impl ResearchStage for StrategyNode {
    fn id(&self) -> StageId {
        StageId::Strategy
    }

    fn required_inputs(&self) -> &'static [StateField] {
        &[StateField::SummaryNotes]
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure> {
        let notes = require(&state.summary_notes, StateField::SummaryNotes)?;

        let mut variables = PromptVariables::new();
        variables.insert("notes", notes.to_string());
        let insights = ctx
            .generate(PromptTemplateId::StrategicAnalysis, variables)
            .await?;

        Ok(StatePatch {
            strategic_insights: Some(insights),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::session::SessionContext;
    use crate::research::stages::test_support::{ScriptedModel, StaticSearch};

    #[tokio::test]
    async fn test_notes_become_insights() {
        let llm = ScriptedModel::new()
            .respond(PromptTemplateId::StrategicAnalysis, &["Trend: storage"]);
        let search = StaticSearch::ok("unused");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let mut state = WorkflowState::new("grid storage");
        state.summary_notes = Some("- batteries cheaper".to_string());

        let patch = StrategyNode.run(&ctx, &state).await.unwrap();
        assert_eq!(patch.strategic_insights.as_deref(), Some("Trend: storage"));
        assert_eq!(
            llm.last_variables(PromptTemplateId::StrategicAnalysis).unwrap()["notes"],
            "- batteries cheaper"
        );
    }

    #[tokio::test]
    async fn test_empty_model_output_is_rejected() {
        let llm = ScriptedModel::new().respond(PromptTemplateId::StrategicAnalysis, &["   "]);
        let search = StaticSearch::ok("unused");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let mut state = WorkflowState::new("grid storage");
        state.summary_notes = Some("- notes".to_string());

        let err = StrategyNode.run(&ctx, &state).await.unwrap_err();
        assert!(matches!(err, StageFailure::Generation(_)));
    }
}

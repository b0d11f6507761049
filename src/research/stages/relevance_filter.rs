use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField};
use crate::research::state::{ReviewStatus, StatePatch, WorkflowState};

/// 非能源领域话题的固定回复
pub const REJECTION_MESSAGE: &str = "This assistant specializes in energy-related topics only.";

/// 相关性过滤 - 判断话题是否属于能源领域
#[derive(Default)]
pub struct RelevanceFilter;

impl RelevanceFilter {
    /// 模型回答中包含 YES 即视为领域内
    pub fn is_in_domain(answer: &str) -> bool {
        answer.trim().to_uppercase().contains("YES")
    }
}

#[async_trait]
impl ResearchStage for RelevanceFilter {
    fn id(&self) -> StageId {
        StageId::Filter
    }

    fn required_inputs(&self) -> &'static [StateField] {
        &[StateField::Topic]
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure> {
        let mut variables = PromptVariables::new();
        variables.insert("topic", state.topic.clone());

        let answer = ctx
            .generate(PromptTemplateId::RelevanceCheck, variables)
            .await?;

        if Self::is_in_domain(&answer) {
            return Ok(StatePatch::default());
        }

        tracing::info!(topic = %state.topic, "🚫 话题不属于能源领域，终止流程");
        Ok(StatePatch {
            final_document: Some(REJECTION_MESSAGE.to_string()),
            followups: Some(Vec::new()),
            review_status: Some(ReviewStatus::Stop),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::research::session::SessionContext;
    use crate::research::stages::test_support::{ScriptedModel, StaticSearch};

    #[test]
    fn test_is_in_domain() {
        assert!(RelevanceFilter::is_in_domain("YES"));
        assert!(RelevanceFilter::is_in_domain("  yes.\n"));
        assert!(!RelevanceFilter::is_in_domain("NO"));
        assert!(!RelevanceFilter::is_in_domain(""));
    }

    #[tokio::test]
    async fn test_in_domain_returns_empty_patch() {
        let llm = ScriptedModel::new().respond(PromptTemplateId::RelevanceCheck, &["YES"]);
        let search = StaticSearch::ok("unused");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let patch = RelevanceFilter
            .run(&ctx, &WorkflowState::new("solar energy trends"))
            .await
            .unwrap();
        assert!(patch.is_empty());
        let variables = llm.last_variables(PromptTemplateId::RelevanceCheck).unwrap();
        assert_eq!(variables["topic"], "solar energy trends");
    }

    #[tokio::test]
    async fn test_out_of_domain_stops() {
        let llm = ScriptedModel::new().respond(PromptTemplateId::RelevanceCheck, &["NO"]);
        let search = StaticSearch::ok("unused");
        let session = SessionContext::new("t");
        let ctx = StageContext {
            llm: &llm,
            search: &search,
            session: &session,
        };

        let patch = RelevanceFilter
            .run(&ctx, &WorkflowState::new("pizza recipes"))
            .await
            .unwrap();
        assert_eq!(patch.final_document.as_deref(), Some(REJECTION_MESSAGE));
        assert_eq!(patch.followups, Some(vec![]));
        assert_eq!(patch.review_status, Some(ReviewStatus::Stop));
    }
}

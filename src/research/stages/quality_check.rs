use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField, require};
use crate::research::state::{ReviewStatus, StatePatch, WorkflowState};

/// 强制通过的修订序号：第三次撰写（序号 0、1、2 中的 2）后无论评审结论如何都通过
pub const FORCED_APPROVAL_REVISION: u32 = 2;

/// 质量评审 - 给出 PASS/FAIL 结论并决定是否需要修订
#[derive(Default)]
pub struct QualityCheckNode;

impl QualityCheckNode {
    pub fn is_pass(verdict: &str) -> bool {
        verdict.to_uppercase().contains("PASS")
    }

    pub fn decide(verdict: &str, state: &WorkflowState) -> ReviewStatus {
        if Self::is_pass(verdict) || state.revision_index() >= FORCED_APPROVAL_REVISION {
            ReviewStatus::Approved
        } else {
            ReviewStatus::Revise
        }
    }
}

#[async_trait]
impl ResearchStage for QualityCheckNode {
    fn id(&self) -> StageId {
        StageId::Review
    }

    fn required_inputs(&self) -> &'static [StateField] {
        &[StateField::FinalDocument]
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure> {
        let report = require(&state.final_document, StateField::FinalDocument)?;

        let mut variables = PromptVariables::new();
        variables.insert("report", report.to_string());
        let verdict = ctx
            .generate(PromptTemplateId::QualityReview, variables)
            .await?;

        let status = Self::decide(&verdict, state);
        if status == ReviewStatus::Approved && !Self::is_pass(&verdict) {
            tracing::warn!(
                iteration = state.iteration,
                "⚠️ 已达到修订上限，强制通过评审"
            );
        } else {
            tracing::info!(iteration = state.iteration, status = %status, "🔍 质量评审完成");
        }

        Ok(StatePatch {
            review_status: Some(status),
            ..Default::default()
        })
    }
}

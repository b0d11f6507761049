use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::session::SessionDraft;
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField, require};
use crate::research::state::{StatePatch, WorkflowState};

/// 作为撰写上下文引用的会话草稿数
const SESSION_CONTEXT_DRAFTS: usize = 3;

/// 每条会话草稿引用的最大字符数
const DRAFT_EXCERPT_CHARS: usize = 280;

/// 报告撰写 - 生成五章节的行业报告，可重复进入以完成修订
#[derive(Default)]
pub struct ComposerNode;

impl ComposerNode {
    fn format_session_history(drafts: &[SessionDraft]) -> String {
        if drafts.is_empty() {
            return "None".to_string();
        }

        drafts
            .iter()
            .map(|draft| {
                let excerpt: String = draft.document.chars().take(DRAFT_EXCERPT_CHARS).collect();
                let ellipsis = if draft.document.chars().count() > DRAFT_EXCERPT_CHARS {
                    "..."
                } else {
                    ""
                };
                format!(
                    "- {} (draft {}): {}{}",
                    draft.topic, draft.iteration, excerpt, ellipsis
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[async_trait]
impl ResearchStage for ComposerNode {
    fn id(&self) -> StageId {
        StageId::Compose
    }

    fn required_inputs(&self) -> &'static [StateField] {
        &[StateField::StrategicInsights]
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure> {
        let insights = require(&state.strategic_insights, StateField::StrategicInsights)?;
        let drafts = ctx.session.recent_drafts(SESSION_CONTEXT_DRAFTS).await;

        let mut variables = PromptVariables::new();
        variables.insert("insights", insights.to_string());
        variables.insert(
            "previous_draft",
            state
                .final_document
                .clone()
                .unwrap_or_else(|| "None (first draft)".to_string()),
        );
        variables.insert("session_history", Self::format_session_history(&drafts));

        let document = ctx
            .generate(PromptTemplateId::ReportComposer, variables)
            .await?;
        let iteration = state.iteration + 1;

        ctx.session
            .record_draft(&state.topic, &document, iteration)
            .await;
        tracing::info!(iteration, "📝 报告草稿已生成");

        Ok(StatePatch {
            final_document: Some(document),
            iteration: Some(iteration),
            ..Default::default()
        })
    }
}

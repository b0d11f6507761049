use async_trait::async_trait;

use crate::research::error::StageFailure;
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::stages::{ResearchStage, StageContext, StageId, StateField, require};
use crate::research::state::{StatePatch, WorkflowState};

/// 最多保留的追问数量
pub const MAX_FOLLOWUPS: usize = 3;

/// 追问生成 - 基于最终报告给出后续研究问题
#[derive(Default)]
pub struct FollowupNode;

impl FollowupNode {
    /// 按行拆分，去除首尾空白与空行，只保留前三条
    pub fn parse_questions(raw: &str) -> Vec<String> {
        raw.lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .take(MAX_FOLLOWUPS)
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl ResearchStage for FollowupNode {
    fn id(&self) -> StageId {
        StageId::Followup
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
        let raw = ctx
            .generate(PromptTemplateId::FollowupQuestions, variables)
            .await?;

        Ok(StatePatch {
            followups: Some(Self::parse_questions(&raw)),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_questions_trims_and_drops_blank_lines() {
        let raw = "  What about storage?  \n\n\t\nHow do tariffs matter?\r\n";
        assert_eq!(
            FollowupNode::parse_questions(raw),
            vec![
                "What about storage?".to_string(),
                "How do tariffs matter?".to_string()
            ]
        );
    }

    #[test]
    fn test_parse_questions_keeps_first_three() {
        let raw = "Q1\nQ2\nQ3\nQ4\nQ5";
        assert_eq!(FollowupNode::parse_questions(raw), vec!["Q1", "Q2", "Q3"]);
    }

    #[test]
    fn test_parse_questions_empty_input() {
        assert!(FollowupNode::parse_questions("\n  \n").is_empty());
    }
}

//! 研究流程的六个阶段
//
// filter（相关性过滤） -> intelligence（情报收集） -> strategy（战略分析）
// -> compose（报告撰写） -> review（质量评审） -> followup（追问生成）

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

use crate::research::error::{GenerationError, StageFailure};
use crate::research::ports::{LanguageModelPort, SearchPort};
use crate::research::prompts::{PromptTemplateId, PromptVariables};
use crate::research::session::SessionContext;
use crate::research::state::{StatePatch, WorkflowState};

pub mod composer;
pub mod followup;
pub mod intelligence;
pub mod quality_check;
pub mod relevance_filter;
pub mod strategy;

pub use composer::ComposerNode;
pub use followup::FollowupNode;
pub use intelligence::IntelligenceNode;
pub use quality_check::QualityCheckNode;
pub use relevance_filter::RelevanceFilter;
pub use strategy::StrategyNode;

/// 阶段标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StageId {
    Filter,
    Intelligence,
    Strategy,
    Compose,
    Review,
    Followup,
}

impl StageId {
    pub const ALL: [StageId; 6] = [
        StageId::Filter,
        StageId::Intelligence,
        StageId::Strategy,
        StageId::Compose,
        StageId::Review,
        StageId::Followup,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::Filter => "filter",
            StageId::Intelligence => "intelligence",
            StageId::Strategy => "strategy",
            StageId::Compose => "compose",
            StageId::Review => "review",
            StageId::Followup => "followup",
        }
    }
}

impl Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// 阶段可声明依赖的状态字段
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateField {
    Topic,
    SummaryNotes,
    StrategicInsights,
    FinalDocument,
}

impl StateField {
    pub fn name(&self) -> &'static str {
        match self {
            StateField::Topic => "topic",
            StateField::SummaryNotes => "summary_notes",
            StateField::StrategicInsights => "strategic_insights",
            StateField::FinalDocument => "final_document",
        }
    }

    pub fn is_present(&self, state: &WorkflowState) -> bool {
        match self {
            StateField::Topic => !state.topic.is_empty(),
            StateField::SummaryNotes => state.summary_notes.is_some(),
            StateField::StrategicInsights => state.strategic_insights.is_some(),
            StateField::FinalDocument => state.final_document.is_some(),
        }
    }
}

/// 阶段执行时可用的外部能力
pub struct StageContext<'a> {
    pub llm: &'a dyn LanguageModelPort,
    pub search: &'a dyn SearchPort,
    pub session: &'a SessionContext,
}

impl StageContext<'_> {
    /// 调用语言模型，空响应视为不可用输出
    pub async fn generate(
        &self,
        template: PromptTemplateId,
        variables: PromptVariables,
    ) -> Result<String, StageFailure> {
        let text = self.llm.generate(template, &variables).await?;
        if text.trim().is_empty() {
            return Err(GenerationError::EmptyResponse(template).into());
        }
        Ok(text)
    }
}

/// 研究阶段
#[async_trait]
pub trait ResearchStage: Send + Sync {
    fn id(&self) -> StageId;

    /// 必需的输入字段，缺少时阶段不会启动
    fn required_inputs(&self) -> &'static [StateField];

    fn check_inputs(&self, state: &WorkflowState) -> Result<(), StageFailure> {
        for field in self.required_inputs() {
            if !field.is_present(state) {
                return Err(StageFailure::MissingInput(field.name()));
            }
        }
        Ok(())
    }

    async fn run(
        &self,
        ctx: &StageContext<'_>,
        state: &WorkflowState,
    ) -> Result<StatePatch, StageFailure>;
}

/// 取出已校验存在的字段
pub(crate) fn require<'s>(
    value: &'s Option<String>,
    field: StateField,
) -> Result<&'s str, StageFailure> {
    value
        .as_deref()
        .ok_or(StageFailure::MissingInput(field.name()))
}

#[cfg(test)]
pub(crate) mod test_support;

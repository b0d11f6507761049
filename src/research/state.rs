use serde::{Deserialize, Serialize};

/// 评审状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReviewStatus {
    #[default]
    None,
    /// 相关性过滤拒绝，后续阶段全部跳过
    Stop,
    Approved,
    Revise,
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReviewStatus::None => write!(f, "none"),
            ReviewStatus::Stop => write!(f, "STOP"),
            ReviewStatus::Approved => write!(f, "APPROVED"),
            ReviewStatus::Revise => write!(f, "REVISE"),
        }
    }
}

/// 工作流状态，贯穿每一个阶段
///
/// 每次调用都会新建一份，只以 `topic` 作为种子；各阶段返回 [`StatePatch`]，
/// 由引擎合并回当前状态。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub topic: String,
    pub raw_search: Option<String>,
    pub summary_notes: Option<String>,
    pub strategic_insights: Option<String>,
    pub final_document: Option<String>,
    pub followups: Option<Vec<String>>,
    pub review_status: ReviewStatus,
    /// 报告撰写阶段的执行次数
    pub iteration: u32,
}

impl WorkflowState {
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Default::default()
        }
    }

    /// 合并阶段产出的增量
    pub fn apply(&mut self, patch: StatePatch) {
        if let Some(raw_search) = patch.raw_search {
            self.raw_search = Some(raw_search);
        }
        if let Some(summary_notes) = patch.summary_notes {
            self.summary_notes = Some(summary_notes);
        }
        if let Some(insights) = patch.strategic_insights {
            self.strategic_insights = Some(insights);
        }
        if let Some(document) = patch.final_document {
            self.final_document = Some(document);
        }
        if let Some(followups) = patch.followups {
            self.followups = Some(followups);
        }
        if let Some(status) = patch.review_status {
            self.review_status = status;
        }
        if let Some(iteration) = patch.iteration {
            self.iteration = iteration;
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.review_status == ReviewStatus::Stop
    }

    /// 最近一次撰写的0基序号（0 表示初稿，1、2 表示修订稿）
    pub fn revision_index(&self) -> u32 {
        self.iteration.saturating_sub(1)
    }
}

/// 阶段产出的部分状态更新
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatePatch {
    pub raw_search: Option<String>,
    pub summary_notes: Option<String>,
    pub strategic_insights: Option<String>,
    pub final_document: Option<String>,
    pub followups: Option<Vec<String>>,
    pub review_status: Option<ReviewStatus>,
    pub iteration: Option<u32>,
}

impl StatePatch {
    pub fn is_empty(&self) -> bool {
        *self == StatePatch::default()
    }
}

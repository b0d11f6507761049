//! 阶段流转：静态转移表 + 评审之后唯一的条件边

use crate::research::stages::StageId;
use crate::research::state::{ReviewStatus, WorkflowState};

/// 单次执行中报告撰写阶段的最大执行次数
pub const MAX_COMPOSER_RUNS: u32 = 3;

/// 阶段的出边
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    /// 无条件进入下一阶段
    Always(StageId),
    /// 由评审结论决定：通过进入第一个目标，否则回到第二个目标
    OnReview {
        approved: StageId,
        revise: StageId,
    },
    End,
}

/// 路由结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(StageId),
    Done,
}

/// 流程入口
pub const ENTRY: StageId = StageId::Filter;

/// 固定的阶段拓扑
pub fn edge_of(stage: StageId) -> Edge {
    match stage {
        StageId::Filter => Edge::Always(StageId::Intelligence),
        StageId::Intelligence => Edge::Always(StageId::Strategy),
        StageId::Strategy => Edge::Always(StageId::Compose),
        StageId::Compose => Edge::Always(StageId::Review),
        StageId::Review => Edge::OnReview {
            approved: StageId::Followup,
            revise: StageId::Compose,
        },
        StageId::Followup => Edge::End,
    }
}

/// 评审之后的条件判断
pub fn review_router(state: &WorkflowState) -> bool {
    state.review_status == ReviewStatus::Approved
}

/// 根据当前阶段与状态决定下一步
///
/// STOP 状态在任何阶段之后都直接结束；回到撰写阶段之前再次检查执行次数上限。
pub fn route(stage: StageId, state: &WorkflowState) -> Transition {
    if state.is_stopped() {
        return Transition::Done;
    }

    match edge_of(stage) {
        Edge::Always(next) => Transition::Next(next),
        Edge::OnReview { approved, revise } => {
            if review_router(state) || state.iteration >= MAX_COMPOSER_RUNS {
                Transition::Next(approved)
            } else {
                Transition::Next(revise)
            }
        }
        Edge::End => Transition::Done,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linear_edges() {
        let state = WorkflowState::new("solar");
        assert_eq!(route(StageId::Filter, &state), Transition::Next(StageId::Intelligence));
        assert_eq!(route(StageId::Intelligence, &state), Transition::Next(StageId::Strategy));
        assert_eq!(route(StageId::Strategy, &state), Transition::Next(StageId::Compose));
        assert_eq!(route(StageId::Compose, &state), Transition::Next(StageId::Review));
        assert_eq!(route(StageId::Followup, &state), Transition::Done);
    }

    #[test]
    fn test_stop_after_filter_ends_immediately() {
        let mut state = WorkflowState::new("pizza recipes");
        state.review_status = ReviewStatus::Stop;
        assert_eq!(route(StageId::Filter, &state), Transition::Done);
    }

    #[test]
    fn test_review_branches() {
        let mut state = WorkflowState::new("solar");
        state.iteration = 1;

        state.review_status = ReviewStatus::Approved;
        assert_eq!(route(StageId::Review, &state), Transition::Next(StageId::Followup));

        state.review_status = ReviewStatus::Revise;
        assert_eq!(route(StageId::Review, &state), Transition::Next(StageId::Compose));
    }

    #[test]
    fn test_review_never_reenters_compose_past_cap() {
        let mut state = WorkflowState::new("solar");
        state.review_status = ReviewStatus::Revise;
        state.iteration = MAX_COMPOSER_RUNS;
        assert_eq!(route(StageId::Review, &state), Transition::Next(StageId::Followup));
    }

    #[test]
    fn test_entry_is_filter() {
        assert_eq!(ENTRY, StageId::Filter);
        assert_eq!(edge_of(StageId::Followup), Edge::End);
    }
}

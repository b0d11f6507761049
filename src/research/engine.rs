use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;
use uuid::Uuid;

use crate::research::error::{PipelineExecutionError, StageFailure};
use crate::research::ports::{LanguageModelPort, SearchPort};
use crate::research::router::{ENTRY, Transition, route};
use crate::research::session::{DEFAULT_SESSION_KEY, SessionContext, SessionStore};
use crate::research::stages::{
    ComposerNode, FollowupNode, IntelligenceNode, QualityCheckNode, RelevanceFilter,
    ResearchStage, StageContext, StageId, StrategyNode,
};
use crate::research::state::WorkflowState;
use crate::research::timing::TimingScope;

/// 没有任何文档产出时的兜底回复
pub const NO_REPORT_MESSAGE: &str = "No report generated.";

/// 引擎对外返回的结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResearchOutcome {
    pub report: String,
    pub suggestions: Vec<String>,
}

impl From<WorkflowState> for ResearchOutcome {
    fn from(state: WorkflowState) -> Self {
        Self {
            report: state
                .final_document
                .unwrap_or_else(|| NO_REPORT_MESSAGE.to_string()),
            suggestions: state.followups.unwrap_or_default(),
        }
    }
}

/// 编译后的阶段图，按 [`StageId`] 顺序存放各阶段实现
struct StageGraph {
    stages: Vec<Box<dyn ResearchStage>>,
}

impl StageGraph {
    fn compile() -> Self {
        let stages: Vec<Box<dyn ResearchStage>> = StageId::ALL
            .iter()
            .map(|id| -> Box<dyn ResearchStage> {
                match id {
                    StageId::Filter => Box::new(RelevanceFilter),
                    StageId::Intelligence => Box::new(IntelligenceNode),
                    StageId::Strategy => Box::new(StrategyNode),
                    StageId::Compose => Box::new(ComposerNode),
                    StageId::Review => Box::new(QualityCheckNode),
                    StageId::Followup => Box::new(FollowupNode),
                }
            })
            .collect();
        debug_assert!(
            stages
                .iter()
                .zip(StageId::ALL.iter())
                .all(|(stage, id)| stage.id() == *id)
        );
        Self { stages }
    }

    fn stage(&self, id: StageId) -> &dyn ResearchStage {
        self.stages[id as usize].as_ref()
    }
}

/// 研究工作流引擎
///
/// 阶段图在构造时编译一次，之后所有调用共享；每次调用拥有独立的
/// [`WorkflowState`]。引擎是 `Send + Sync` 的，可以放进 `Arc` 供多个任务并发使用。
pub struct WorkflowEngine {
    graph: StageGraph,
    llm: Arc<dyn LanguageModelPort>,
    search: Arc<dyn SearchPort>,
    sessions: Arc<dyn SessionStore>,
    default_session_key: String,
}

impl WorkflowEngine {
    pub fn new(
        llm: Arc<dyn LanguageModelPort>,
        search: Arc<dyn SearchPort>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            graph: StageGraph::compile(),
            llm,
            search,
            sessions,
            default_session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }

    pub fn with_default_session_key(mut self, key: impl Into<String>) -> Self {
        self.default_session_key = key.into();
        self
    }

    /// 执行完整研究流程
    pub async fn execute(
        &self,
        topic: &str,
        session_key: Option<&str>,
    ) -> Result<ResearchOutcome, PipelineExecutionError> {
        self.execute_with_cancellation(topic, session_key, &CancellationToken::new())
            .await
    }

    /// 执行完整研究流程，每个阶段开始前检查取消信号
    pub async fn execute_with_cancellation(
        &self,
        topic: &str,
        session_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<ResearchOutcome, PipelineExecutionError> {
        let state = self.run(topic, session_key, cancel).await?;
        Ok(state.into())
    }

    /// 执行流程并返回终态快照
    pub async fn run(
        &self,
        topic: &str,
        session_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<WorkflowState, PipelineExecutionError> {
        let span = tracing::info_span!(
            "research",
            run_id = %Uuid::new_v4(),
            topic = %topic,
            session = %session_key.unwrap_or(&self.default_session_key)
        );

        self.run_inner(topic, session_key, cancel)
            .instrument(span)
            .await
    }

    /// 显式会话键从存储中恢复会话；未提供时使用一次性的新会话，不写入存储
    async fn open_session(&self, session_key: Option<&str>) -> Arc<SessionContext> {
        match session_key {
            Some(key) => self.sessions.get_or_create(key).await,
            None => Arc::new(SessionContext::new(self.default_session_key.as_str())),
        }
    }

    async fn run_inner(
        &self,
        topic: &str,
        session_key: Option<&str>,
        cancel: &CancellationToken,
    ) -> Result<WorkflowState, PipelineExecutionError> {
        tracing::info!("🚀 开始执行能源研究流程...");

        let session = self.open_session(session_key).await;
        let ctx = StageContext {
            llm: self.llm.as_ref(),
            search: self.search.as_ref(),
            session: &session,
        };

        let mut state = WorkflowState::new(topic);
        let mut timing = TimingScope::new();
        let mut current = ENTRY;

        loop {
            if cancel.is_cancelled() {
                tracing::warn!(stage = %current, "⏹️ 流程已取消");
                return Err(PipelineExecutionError::new(current, StageFailure::Cancelled));
            }

            let stage = self.graph.stage(current);
            stage
                .check_inputs(&state)
                .map_err(|cause| PipelineExecutionError::new(current, cause))?;

            tracing::debug!(stage = %current, "🤖 执行阶段");
            timing.start_phase(current.as_str());
            let patch = stage.run(&ctx, &state).await.map_err(|cause| {
                tracing::error!(stage = %current, error = %cause, "❌ 阶段执行失败");
                PipelineExecutionError::new(current, cause)
            })?;
            timing.end_phase(current.as_str());

            state.apply(patch);

            match route(current, &state) {
                Transition::Next(next) => current = next,
                Transition::Done => break,
            }
        }

        tracing::info!(
            iteration = state.iteration,
            status = %state.review_status,
            "✓ 能源研究流程执行完毕"
        );
        tracing::debug!("{}", timing.generate_timing_report());

        Ok(state)
    }
}

// 能源研究工作流
// filter（领域过滤） = topic -> 通过则空补丁，否则固定回复 + STOP
// intelligence（情报收集） = topic + 搜索结果 -> 结构化要点
// strategy（战略分析） = 要点 -> 趋势 / 商业影响 / 风险
// compose（报告撰写） = 战略洞察 + 上一版草稿 + 会话草稿 -> 五章节报告
// review（质量评审） = 报告 -> APPROVED / REVISE，第三稿后强制通过
// followup（追问生成） = 报告 -> 至多三个后续问题

pub mod engine;
pub mod error;
pub mod ports;
pub mod prompts;
pub mod router;
pub mod session;
pub mod stages;
pub mod state;
pub mod timing;

pub use engine::{NO_REPORT_MESSAGE, ResearchOutcome, WorkflowEngine};
pub use error::{
    GenerationError, PipelineExecutionError, SearchError, StageFailure, ValidationError,
};
pub use ports::{LanguageModelPort, SearchPort};
pub use prompts::{PromptTemplateId, PromptVariables};
pub use session::{DEFAULT_SESSION_KEY, InMemorySessionStore, SessionContext, SessionStore};
pub use stages::StageId;
pub use stages::relevance_filter::REJECTION_MESSAGE;
pub use state::{ReviewStatus, StatePatch, WorkflowState};

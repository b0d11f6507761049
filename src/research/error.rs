use thiserror::Error;

use crate::research::prompts::PromptTemplateId;
use crate::research::stages::StageId;

/// 语言模型调用失败
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("language model request failed: {0}")]
    Upstream(String),

    #[error("language model returned an empty response for `{0}`")]
    EmptyResponse(PromptTemplateId),

    #[error("prompt `{template}` is missing variable `{name}`")]
    MissingVariable {
        template: PromptTemplateId,
        name: &'static str,
    },
}

/// 搜索调用失败
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search request timed out")]
    Timeout,

    #[error("search provider rejected the credentials")]
    Unauthorized,

    #[error("search provider rate limited the request")]
    RateLimited,

    #[error("search request failed: {0}")]
    Upstream(String),

    #[error("failed to parse search response: {0}")]
    Parse(String),
}

/// 单个阶段失败的具体原因
#[derive(Debug, Error)]
pub enum StageFailure {
    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error(transparent)]
    Search(#[from] SearchError),

    #[error("required input `{0}` has not been produced yet")]
    MissingInput(&'static str),

    #[error("execution cancelled before the stage started")]
    Cancelled,
}

/// 工作流执行失败，携带失败阶段与底层原因
#[derive(Debug, Error)]
#[error("research pipeline failed at stage `{stage}`: {cause}")]
pub struct PipelineExecutionError {
    pub stage: StageId,
    #[source]
    pub cause: StageFailure,
}

impl PipelineExecutionError {
    pub fn new(stage: StageId, cause: StageFailure) -> Self {
        Self { stage, cause }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.cause, StageFailure::Cancelled)
    }
}

/// 请求校验失败（由服务层在调用引擎之前检查）
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("topic must not be empty")]
    EmptyTopic,

    #[error("topic must be at least {min} characters long")]
    TopicTooShort { min: usize },
}

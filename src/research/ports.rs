//! 工作流依赖的外部能力边界

use async_trait::async_trait;

use crate::research::error::{GenerationError, SearchError};
use crate::research::prompts::{PromptTemplateId, PromptVariables};

/// 语言模型能力：按模板与变量生成文本
#[async_trait]
pub trait LanguageModelPort: Send + Sync {
    async fn generate(
        &self,
        template: PromptTemplateId,
        variables: &PromptVariables,
    ) -> Result<String, GenerationError>;
}

/// 搜索能力：按查询返回原始文本结果
#[async_trait]
pub trait SearchPort: Send + Sync {
    async fn search(&self, query: &str) -> Result<String, SearchError>;
}

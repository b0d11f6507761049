use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use crate::research::error::{GenerationError, SearchError};
use crate::research::ports::{LanguageModelPort, SearchPort};
use crate::research::prompts::{PromptTemplateId, PromptVariables};

/// 按模板预设响应的语言模型替身；队列只剩一条时重复使用
#[derive(Default)]
pub struct ScriptedModel {
    responses: Mutex<HashMap<PromptTemplateId, VecDeque<String>>>,
    failures: Mutex<HashMap<PromptTemplateId, String>>,
    calls: Mutex<Vec<(PromptTemplateId, PromptVariables)>>,
}

impl ScriptedModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, template: PromptTemplateId, responses: &[&str]) -> Self {
        self.responses.lock().unwrap().insert(
            template,
            responses.iter().map(|r| r.to_string()).collect(),
        );
        self
    }

    pub fn fail(self, template: PromptTemplateId, message: &str) -> Self {
        self.failures
            .lock()
            .unwrap()
            .insert(template, message.to_string());
        self
    }

    /// 在线研究流程的默认响应
    pub fn in_domain() -> Self {
        Self::new()
            .respond(PromptTemplateId::RelevanceCheck, &["YES"])
            .respond(PromptTemplateId::IntelligenceNotes, &["- notes"])
            .respond(PromptTemplateId::StrategicAnalysis, &["- insights"])
            .respond(PromptTemplateId::ReportComposer, &["# Report"])
            .respond(PromptTemplateId::QualityReview, &["PASS"])
            .respond(
                PromptTemplateId::FollowupQuestions,
                &["What next?\nWhy?\nHow?"],
            )
    }

    pub fn calls_to(&self, template: PromptTemplateId) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(t, _)| *t == template)
            .count()
    }

    pub fn last_variables(&self, template: PromptTemplateId) -> Option<PromptVariables> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(t, _)| *t == template)
            .map(|(_, v)| v.clone())
    }

    pub fn call_order(&self) -> Vec<PromptTemplateId> {
        self.calls.lock().unwrap().iter().map(|(t, _)| *t).collect()
    }
}

#[async_trait]
impl LanguageModelPort for ScriptedModel {
    async fn generate(
        &self,
        template: PromptTemplateId,
        variables: &PromptVariables,
    ) -> Result<String, GenerationError> {
        self.calls
            .lock()
            .unwrap()
            .push((template, variables.clone()));

        if let Some(message) = self.failures.lock().unwrap().get(&template) {
            return Err(GenerationError::Upstream(message.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        let queue = responses
            .get_mut(&template)
            .ok_or_else(|| GenerationError::Upstream(format!("no script for {template}")))?;
        let response = if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        };
        response.ok_or_else(|| GenerationError::Upstream(format!("empty script for {template}")))
    }
}

/// 搜索替身
pub struct StaticSearch {
    result: Result<String, String>,
    calls: Mutex<Vec<String>>,
}

impl StaticSearch {
    pub fn ok(result: &str) -> Self {
        Self {
            result: Ok(result.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: &str) -> Self {
        Self {
            result: Err(message.to_string()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchPort for StaticSearch {
    async fn search(&self, query: &str) -> Result<String, SearchError> {
        self.calls.lock().unwrap().push(query.to_string());
        self.result.clone().map_err(SearchError::Upstream)
    }
}

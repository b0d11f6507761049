use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::Display;

use crate::research::error::GenerationError;

/// 提示词变量表，键为模板中的占位符名称
pub type PromptVariables = BTreeMap<&'static str, String>;

/// 提示词模板标识
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PromptTemplateId {
    RelevanceCheck,
    IntelligenceNotes,
    StrategicAnalysis,
    ReportComposer,
    QualityReview,
    FollowupQuestions,
}

impl Display for PromptTemplateId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let str = match self {
            PromptTemplateId::RelevanceCheck => "relevance_check",
            PromptTemplateId::IntelligenceNotes => "intelligence_notes",
            PromptTemplateId::StrategicAnalysis => "strategic_analysis",
            PromptTemplateId::ReportComposer => "report_composer",
            PromptTemplateId::QualityReview => "quality_review",
            PromptTemplateId::FollowupQuestions => "followup_questions",
        };
        write!(f, "{}", str)
    }
}

/// Prompt模板配置
#[derive(Debug, Clone, Copy)]
pub struct PromptTemplate {
    /// 系统提示词
    pub system_prompt: &'static str,
    /// 用户提示词，`{name}` 形式的占位符由变量表填充
    pub user_template: &'static str,
    /// 必需的变量
    pub required_variables: &'static [&'static str],
}

impl PromptTemplate {
    /// 渲染为 (系统提示词, 用户提示词)
    pub fn render(
        &self,
        id: PromptTemplateId,
        variables: &PromptVariables,
    ) -> Result<(String, String), GenerationError> {
        let mut user_prompt = self.user_template.to_string();
        for &name in self.required_variables {
            let value = variables
                .get(name)
                .ok_or(GenerationError::MissingVariable { template: id, name })?;
            user_prompt = user_prompt.replace(&format!("{{{}}}", name), value);
        }
        Ok((self.system_prompt.to_string(), user_prompt))
    }
}

impl PromptTemplateId {
    pub fn template(&self) -> PromptTemplate {
        match self {
            PromptTemplateId::RelevanceCheck => PromptTemplate {
                system_prompt: "You are an Energy Domain Validator.",
                user_template: r#"Determine whether the following topic belongs to the energy sector
(renewables, fossil fuels, grids, EVs, batteries, sustainability, etc.).

Topic: {topic}

Respond ONLY with YES or NO."#,
                required_variables: &["topic"],
            },
            PromptTemplateId::IntelligenceNotes => PromptTemplate {
                system_prompt: "You are an Energy Intelligence Analyst.",
                user_template: r#"Using the search data below, create structured bullet insights.

Topic: {topic}

Search Data:
{data}"#,
                required_variables: &["topic", "data"],
            },
            PromptTemplateId::StrategicAnalysis => PromptTemplate {
                system_prompt: "You are a strategy consultant for the energy sector.",
                user_template: r#"From the research notes below, extract:

- Emerging Trends
- Business Implications
- Risk Factors

Notes:
{notes}"#,
                required_variables: &["notes"],
            },
            PromptTemplateId::ReportComposer => PromptTemplate {
                system_prompt: "You are a professional energy sector report writer.",
                user_template: r#"Create a professional energy sector report with:

1. Overview
2. Market Trends
3. Strategic Outlook
4. Risks & Challenges
5. Conclusion

Insights:
{insights}

Previous draft:
{previous_draft}

Earlier reports in this session:
{session_history}

If this is a revision, improve clarity and analytical depth."#,
                required_variables: &["insights", "previous_draft", "session_history"],
            },
            PromptTemplateId::QualityReview => PromptTemplate {
                system_prompt: "You are a demanding editor reviewing energy sector reports.",
                user_template: r#"Evaluate the quality of this report.

If it is complete and well-structured, respond PASS.
Otherwise respond FAIL.

Report:
{report}"#,
                required_variables: &["report"],
            },
            PromptTemplateId::FollowupQuestions => PromptTemplate {
                system_prompt: "You are an energy research assistant.",
                user_template: r#"Based on this energy report, generate 3 intelligent follow-up questions.
Return only the questions separated by new lines.

Report:
{report}"#,
                required_variables: &["report"],
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_placeholders() {
        let mut variables = PromptVariables::new();
        variables.insert("topic", "solar energy trends".to_string());
        variables.insert("data", "capacity grew 30%".to_string());

        let (system, user) = PromptTemplateId::IntelligenceNotes
            .template()
            .render(PromptTemplateId::IntelligenceNotes, &variables)
            .unwrap();

        assert!(system.contains("Energy Intelligence Analyst"));
        assert!(user.contains("Topic: solar energy trends"));
        assert!(user.contains("capacity grew 30%"));
        assert!(!user.contains("{topic}"));
        assert!(!user.contains("{data}"));
    }

    #[test]
    fn test_render_missing_variable() {
        let variables = PromptVariables::new();
        let err = PromptTemplateId::QualityReview
            .template()
            .render(PromptTemplateId::QualityReview, &variables)
            .unwrap_err();

        match err {
            GenerationError::MissingVariable { template, name } => {
                assert_eq!(template, PromptTemplateId::QualityReview);
                assert_eq!(name, "report");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_template_id_display() {
        assert_eq!(PromptTemplateId::RelevanceCheck.to_string(), "relevance_check");
        assert_eq!(PromptTemplateId::ReportComposer.to_string(), "report_composer");
    }
}

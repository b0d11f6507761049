use crate::config::{Config, LLMProvider, SearchDepth};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "energy-intel.toml";

/// Energy-Intel-RS - 由Rust与AI驱动的能源行业研究报告生成引擎
#[derive(Parser, Debug)]
#[command(name = "energy-intel-rs")]
#[command(
    about = "AI-driven research engine for the energy sector. It checks topic relevance, gathers web intelligence, and composes a reviewed strategic report with follow-up questions."
)]
#[command(version)]
pub struct Args {
    /// 研究主题
    #[arg(short, long)]
    pub topic: Option<String>,

    /// 会话标识，同一会话内的多次研究共享草稿上下文
    #[arg(short, long)]
    pub session: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 报告归档目录
    #[arg(short, long)]
    pub output_path: Option<PathBuf>,

    /// 显示最近的研究记录
    #[arg(long)]
    pub history: bool,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (openai/groq, deepseek, anthropic, ollama)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// 模型名称
    #[arg(long)]
    pub model: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// Tavily API KEY
    #[arg(long)]
    pub search_api_key: Option<String>,

    /// 搜索返回的最大结果数
    #[arg(long)]
    pub max_results: Option<u32>,

    /// 搜索深度 (basic, advanced)
    #[arg(long, value_enum)]
    pub search_depth: Option<SearchDepthArg>,

    /// 研究流程超时时间（秒），0 表示不限制
    #[arg(long)]
    pub timeout: Option<u64>,

    /// 是否禁用缓存
    #[arg(long)]
    pub no_cache: bool,

    /// 强制重新生成（忽略已缓存的报告）
    #[arg(long)]
    pub force_regenerate: bool,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchDepthArg {
    Basic,
    Advanced,
}

impl From<SearchDepthArg> for SearchDepth {
    fn from(arg: SearchDepthArg) -> Self {
        match arg {
            SearchDepthArg::Basic => SearchDepth::Basic,
            SearchDepthArg::Advanced => SearchDepth::Advanced,
        }
    }
}

impl Args {
    /// 将CLI参数转换为配置
    pub fn into_config(self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            // 显式指定的配置文件必须可读
            Config::from_file(config_path)
                .context(format!("无法读取配置文件 {:?}", config_path))?
        } else {
            let default_config_path = std::env::current_dir()
                .unwrap_or_else(|_| PathBuf::from("."))
                .join(DEFAULT_CONFIG_FILE);

            if default_config_path.exists() {
                Config::from_file(&default_config_path)
                    .context(format!("无法读取默认配置文件 {:?}", default_config_path))?
            } else {
                Config::default()
            }
        };

        if let Some(output_path) = self.output_path {
            config.output_path = output_path;
        }

        // 覆盖LLM配置
        if let Some(provider_str) = self.llm_provider {
            match provider_str.parse::<LLMProvider>() {
                Ok(provider) => config.llm.provider = provider,
                Err(_) => tracing::warn!(
                    provider = %provider_str,
                    "⚠️ 未知的provider，使用配置中的provider: {}",
                    config.llm.provider
                ),
            }
        }
        if let Some(model) = self.model {
            config.llm.model = model;
        }
        if let Some(llm_api_base_url) = self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url;
        }
        if let Some(llm_api_key) = self.llm_api_key {
            config.llm.api_key = llm_api_key;
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }

        // 搜索配置
        if let Some(search_api_key) = self.search_api_key {
            config.search.api_key = search_api_key;
        }
        if let Some(max_results) = self.max_results {
            config.search.max_results = max_results;
        }
        if let Some(search_depth) = self.search_depth {
            config.search.search_depth = search_depth.into();
        }

        if let Some(timeout) = self.timeout {
            config.pipeline_timeout_seconds = timeout;
        }

        // 缓存配置
        if self.no_cache {
            config.cache.enabled = false;
        }

        config.force_regenerate = config.force_regenerate || self.force_regenerate;
        config.verbose = config.verbose || self.verbose;

        Ok(config)
    }
}

// Include tests
#[cfg(test)]
mod tests;

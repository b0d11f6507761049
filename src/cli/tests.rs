#[cfg(test)]
mod tests {
    use crate::cli::Args;
    use crate::config::{LLMProvider, SearchDepth};
    use clap::Parser;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_args_default_values() {
        let args = Args::try_parse_from(["energy-intel-rs"]).unwrap();

        assert!(args.topic.is_none());
        assert!(args.session.is_none());
        assert!(args.output_path.is_none());
        assert!(!args.history);
        assert!(!args.verbose);
        assert!(!args.force_regenerate);
        assert!(!args.no_cache);
    }

    #[test]
    fn test_args_short_options() {
        let args = Args::try_parse_from([
            "energy-intel-rs",
            "-t", "Solar Energy Trends",
            "-s", "thread-42",
            "-o", "/test/output",
            "-v",
        ])
        .unwrap();

        assert_eq!(args.topic.as_deref(), Some("Solar Energy Trends"));
        assert_eq!(args.session.as_deref(), Some("thread-42"));
        assert_eq!(args.output_path, Some(PathBuf::from("/test/output")));
        assert!(args.verbose);
    }

    #[test]
    fn test_args_llm_and_search_options() {
        let args = Args::try_parse_from([
            "energy-intel-rs",
            "--llm-provider", "groq",
            "--llm-api-key", "test-key",
            "--llm-api-base-url", "https://api.groq.com/openai/v1",
            "--model", "llama-3.3-70b-versatile",
            "--max-tokens", "2048",
            "--temperature", "0.7",
            "--search-api-key", "tvly-test",
            "--max-results", "6",
            "--search-depth", "advanced",
            "--timeout", "90",
        ])
        .unwrap();

        assert_eq!(args.llm_provider.as_deref(), Some("groq"));
        assert_eq!(args.model.as_deref(), Some("llama-3.3-70b-versatile"));
        assert_eq!(args.max_tokens, Some(2048));
        assert_eq!(args.temperature, Some(0.7));
        assert_eq!(args.max_results, Some(6));
        assert_eq!(args.timeout, Some(90));

        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.api_key, "test-key");
        assert_eq!(config.search.api_key, "tvly-test");
        assert_eq!(config.search.search_depth, SearchDepth::Advanced);
        assert_eq!(config.pipeline_timeout_seconds, 90);
    }

    #[test]
    fn test_invalid_search_depth_is_rejected() {
        let result = Args::try_parse_from(["energy-intel-rs", "--search-depth", "deep"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_into_config_basic() {
        let args = Args::try_parse_from(["energy-intel-rs", "-o", "/test/output"]).unwrap();
        let config = args.into_config().unwrap();

        assert_eq!(config.output_path, PathBuf::from("/test/output"));
        assert!(config.cache.enabled);
        assert!(!config.force_regenerate);
        assert!(!config.verbose);
    }

    #[test]
    fn test_into_config_flags() {
        let args = Args::try_parse_from([
            "energy-intel-rs",
            "--no-cache",
            "--force-regenerate",
            "--verbose",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert!(!config.cache.enabled);
        assert!(config.force_regenerate);
        assert!(config.verbose);
    }

    #[test]
    fn test_unknown_provider_keeps_configured_one() {
        let args =
            Args::try_parse_from(["energy-intel-rs", "--llm-provider", "invalid"]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
    }

    #[test]
    fn test_cli_overrides_config_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("custom.toml");
        std::fs::write(
            &config_path,
            r#"
output_path = "/from/file"

[llm]
provider = "ollama"
model = "llama3"
"#,
        )
        .unwrap();

        let args = Args::try_parse_from([
            "energy-intel-rs",
            "-c",
            config_path.to_str().unwrap(),
            "--model",
            "qwen2.5",
        ])
        .unwrap();

        let config = args.into_config().unwrap();
        assert_eq!(config.output_path, PathBuf::from("/from/file"));
        assert_eq!(config.llm.provider, LLMProvider::Ollama);
        assert_eq!(config.llm.model, "qwen2.5");
    }

    #[test]
    fn test_missing_explicit_config_is_an_error() {
        let args =
            Args::try_parse_from(["energy-intel-rs", "-c", "/definitely/missing.toml"]).unwrap();
        assert!(args.into_config().is_err());
    }
}

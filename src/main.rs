use anyhow::{Context, Result, bail};
use clap::Parser;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use energy_intel_rs::cli::Args;
use energy_intel_rs::history::RECENT_HISTORY_LIMIT;
use energy_intel_rs::llm::LLMClient;
use energy_intel_rs::research::{InMemorySessionStore, WorkflowEngine};
use energy_intel_rs::search::TavilySearch;
use energy_intel_rs::service::{ResearchRequest, ResearchResponse, ResearchService};

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("energy_intel_rs={default_level},warn")));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn print_response(response: &ResearchResponse) {
    println!("\n{}\n", response.result);
    match response.file_path.as_deref() {
        Some(path) if response.is_cached() => println!("📦 来源: 缓存 ({})", path),
        Some(path) => println!("💾 报告已保存: {}", path),
        None => {}
    }
    if !response.suggestions.is_empty() {
        println!("\n💡 后续可以研究的问题:");
        for (index, question) in response.suggestions.iter().enumerate() {
            println!("  {}. {}", index + 1, question);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();

    let args = Args::parse();
    let topic = args.topic.clone();
    let session = args.session.clone();
    let show_history = args.history;

    let config = args.into_config()?;
    init_tracing(config.verbose);

    let llm = LLMClient::new(config.llm.clone())?;
    let search = TavilySearch::new(&config.search);
    let engine = WorkflowEngine::new(
        Arc::new(llm.clone()),
        Arc::new(search),
        Arc::new(InMemorySessionStore::new()),
    )
    .with_default_session_key(config.default_session_key.clone());
    let service = ResearchService::new(Arc::new(engine), &config);

    if show_history {
        let entries = service.history(RECENT_HISTORY_LIMIT).await?;
        if entries.is_empty() {
            println!("暂无研究记录");
        }
        for entry in entries {
            println!("🕒 {} | {}", entry.timestamp.format("%Y-%m-%d %H:%M:%S"), entry.query);
            let preview: String = entry.response.chars().take(200).collect();
            println!("   {}\n", preview.replace('\n', " "));
        }
        return Ok(());
    }

    let Some(topic) = topic else {
        bail!("请通过 --topic 指定研究主题，或使用 --history 查看最近的研究记录");
    };

    llm.check_connection()
        .await
        .context("LLM服务不可用，请检查 provider / api_key / api_base_url 配置")?;

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("⏹️ 收到中断信号，将在当前阶段结束后停止");
            ctrl_c.cancel();
        }
    });

    let mut request = ResearchRequest::new(topic);
    if let Some(session) = session {
        request = request.with_thread_id(session);
    }

    let response = service.research_with_cancellation(&request, &cancel).await?;
    print_response(&response);

    if config.verbose {
        let stats = service.cache_report();
        tracing::debug!(
            hits = stats.cache_hits,
            misses = stats.cache_misses,
            writes = stats.cache_writes,
            "📊 缓存命中率 {:.1}%",
            stats.hit_rate * 100.0
        );
    }

    Ok(())
}

//! Magpie - Rust 浏览智能体编排器
//!
//! 入口：初始化日志、加载配置、组装组件，对命令行传入的意图跑一次
//! 完整编排流程；过程事件以 JSON 行打印到 stdout，最后输出总结。

use anyhow::Context;
use magpie::config::AppConfig;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 日志：默认 info，可通过 RUST_LOG 覆盖
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with(fmt::layer())
        .init();

    let intent: String = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if intent.trim().is_empty() {
        anyhow::bail!("Usage: magpie <intent text>");
    }

    let cfg = magpie::config::load_config(None).context("Failed to load config")?;
    run(cfg, intent).await
}

#[cfg(feature = "browser")]
async fn run(cfg: AppConfig, intent: String) -> anyhow::Result<()> {
    use std::sync::Arc;

    let llm = magpie::agent::create_llm_from_config(&cfg);
    let actuator = Arc::new(magpie::actuator::ChromeActuator::new(
        cfg.browser.executable_path.clone(),
        cfg.browser.headless,
        cfg.browser.max_result_chars,
    ));
    let components = magpie::create_agent_components(&cfg, llm, actuator);

    let (event_tx, mut event_rx) = tokio::sync::mpsc::unbounded_channel();
    let printer = tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            if let Ok(line) = serde_json::to_string(&event) {
                println!("{}", line);
            }
        }
    });

    let status = magpie::StatusBoard::new();
    let cancel_token = tokio_util::sync::CancellationToken::new();
    {
        let cancel_token = cancel_token.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Ctrl+C received, cancelling run...");
                cancel_token.cancel();
            }
        });
    }

    let summary =
        magpie::run_intent_stream(&components, &intent, &event_tx, &status, cancel_token)
            .await
            .context("Run failed")?;

    drop(event_tx);
    let _ = printer.await;

    println!("\n{}", summary);
    Ok(())
}

#[cfg(not(feature = "browser"))]
async fn run(_cfg: AppConfig, _intent: String) -> anyhow::Result<()> {
    anyhow::bail!(
        "Built without the \"browser\" feature; rebuild with --features browser \
         to run real browsing tasks."
    )
}

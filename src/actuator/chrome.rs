//! Chrome 执行器：使用 Headless Chrome 访问页面并提取文本
//!
//! 需启用 feature "browser" 且系统已安装 Chrome/Chromium。
//! 从子任务描述中取出 URL，导航后提取页面标题与可读正文作为步骤文本；
//! 更复杂的交互式执行器（点击、表单）可以实现同一个 Actuator trait 接入。
//!
//! Browser 实例懒初始化并保存在本结构体内部，由持有者决定共享范围；
//! headless_chrome 是同步 API，调用包在 spawn_blocking 里。

use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use headless_chrome::{Browser, LaunchOptions};

use crate::actuator::{Actuator, ActuatorRun};

/// 从描述中提取第一个 http(s) URL
fn extract_url(description: &str) -> Option<String> {
    description
        .split_whitespace()
        .find(|w| w.starts_with("https://") || w.starts_with("http://"))
        .map(|w| w.trim_end_matches(|c: char| matches!(c, '.' | ',' | ')' | '"' | '\'')))
        .map(|w| w.to_string())
}

/// Chrome 执行器：访问 URL、等待渲染、提取标题与正文
pub struct ChromeActuator {
    browser: Arc<RwLock<Option<Browser>>>,
    executable_path: Option<PathBuf>,
    headless: bool,
    max_result_chars: usize,
}

impl ChromeActuator {
    pub fn new(executable_path: Option<PathBuf>, headless: bool, max_result_chars: usize) -> Self {
        Self {
            browser: Arc::new(RwLock::new(None)),
            executable_path,
            headless,
            max_result_chars,
        }
    }

}

#[async_trait]
impl Actuator for ChromeActuator {
    async fn run(&self, description: &str) -> Result<ActuatorRun, String> {
        let url = extract_url(description)
            .ok_or_else(|| format!("No URL found in sub-task description: {}", description))?;

        tracing::info!(url = %url, "chrome actuator navigate");

        let browser_arc = Arc::clone(&self.browser);
        let executable_path = self.executable_path.clone();
        let headless = self.headless;
        let max_chars = self.max_result_chars;

        tokio::task::spawn_blocking(move || {
            let mut browser_guard = browser_arc.write().map_err(|e| e.to_string())?;
            if browser_guard.is_none() {
                let options = LaunchOptions::default_builder()
                    .headless(headless)
                    .path(executable_path)
                    .build()
                    .map_err(|e| format!("Chrome launch options failed: {}", e))?;
                let browser =
                    Browser::new(options).map_err(|e| format!("Chrome launch failed: {}", e))?;
                *browser_guard = Some(browser);
            }
            let browser = browser_guard.as_ref().expect("browser just initialised");

            let tab = browser
                .new_tab()
                .map_err(|e| format!("Browser tab failed: {}", e))?;
            tab.navigate_to(&url)
                .map_err(|e| format!("Navigate failed: {}", e))?;
            tab.wait_for_element("body")
                .map_err(|e| format!("Page load failed: {}", e))?;

            std::thread::sleep(Duration::from_millis(500));

            let title = tab.get_title().unwrap_or_default();

            let body = tab
                .evaluate("document.body.innerText", false)
                .map_err(|e| format!("Text extraction failed: {}", e))?;
            let mut text = body
                .value
                .and_then(|v| v.as_str().map(|s| s.to_string()))
                .unwrap_or_default();
            if text.chars().count() > max_chars {
                text = text.chars().take(max_chars).collect::<String>() + "...";
            }

            let _ = tab.close(true);

            let mut extracts = Vec::new();
            if !title.is_empty() {
                extracts.push(format!("[{}] {}", title, url));
            }
            if !text.trim().is_empty() {
                extracts.push(text);
            }

            Ok(ActuatorRun::extracts_only(extracts))
        })
        .await
        .map_err(|e| format!("Chrome task join failed: {}", e))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_url() {
        assert_eq!(
            extract_url("Open https://example.com/page, then read it"),
            Some("https://example.com/page".to_string())
        );
        assert_eq!(extract_url("no url here"), None);
    }
}

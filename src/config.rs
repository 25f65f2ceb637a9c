//! 应用配置：从 config/default.toml 与环境变量加载
//!
//! 加载顺序：先读 TOML 文件，再用环境变量 `MAGPIE__*` 覆盖
//! （双下划线表示嵌套，如 `MAGPIE__LLM__MODEL=gemma3`）。

use std::path::PathBuf;

use serde::Deserialize;

/// 应用配置根（对应 config/default.toml 的顶层）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    #[serde(default)]
    pub agent: AgentSection,
    #[serde(default)]
    pub llm: LlmSection,
    #[serde(default)]
    pub browser: BrowserSection,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            agent: AgentSection::default(),
            llm: LlmSection::default(),
            browser: BrowserSection::default(),
        }
    }
}

/// [agent] 段：应用名与每个子任务的重试上限
#[derive(Debug, Clone, Deserialize)]
pub struct AgentSection {
    pub name: Option<String>,
    /// 单个子任务校验触发的重试 / 改写次数上限，超过后强制完成
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

impl Default for AgentSection {
    fn default() -> Self {
        Self {
            name: None,
            max_retries: default_max_retries(),
        }
    }
}

fn default_max_retries() -> u32 {
    3
}

/// [llm] 段：OpenAI 兼容端点、模型与超时
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    #[serde(default = "default_model")]
    pub model: String,
    /// OpenAI 兼容端点；默认指向本地 Ollama 的 /v1
    pub base_url: Option<String>,
    /// 读取 API Key 的环境变量名；未设置时用 OPENAI_API_KEY
    pub api_key_env: Option<String>,
    /// 采样温度
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default)]
    pub timeouts: LlmTimeoutsSection,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            model: default_model(),
            base_url: Some("http://localhost:11434/v1".to_string()),
            api_key_env: None,
            temperature: default_temperature(),
            timeouts: LlmTimeoutsSection::default(),
        }
    }
}

fn default_model() -> String {
    "gemma3".to_string()
}

fn default_temperature() -> f32 {
    0.2
}

/// [llm.timeouts] 段：单次补全请求的超时（秒）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LlmTimeoutsSection {
    #[serde(default = "default_request_timeout")]
    pub request: u64,
}

impl Default for LlmTimeoutsSection {
    fn default() -> Self {
        Self {
            request: default_request_timeout(),
        }
    }
}

fn default_request_timeout() -> u64 {
    60
}

/// [browser] 段：Chrome 可执行路径、窗口模式与结果截断
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BrowserSection {
    /// 不设置时交给 headless_chrome 自行发现系统 Chrome
    pub executable_path: Option<PathBuf>,
    pub headless: bool,
    /// 单页提取文本上限（字符）
    pub max_result_chars: usize,
    /// 组装子任务结果时取最后几个步骤的提取文本
    pub step_extract_limit: usize,
}

impl Default for BrowserSection {
    fn default() -> Self {
        Self {
            executable_path: None,
            headless: false,
            max_result_chars: 8000,
            step_extract_limit: 3,
        }
    }
}

/// 从 config 目录加载配置，环境变量 MAGPIE__* 可覆盖
///
/// 1. 按顺序查找 config/default.toml、../config/default.toml、default.toml，找到则作为第一源
/// 2. 若传入 config_path 且文件存在，则追加该文件（可覆盖前面的键）
/// 3. 最后叠加环境变量 MAGPIE__*（双下划线表示嵌套键）
pub fn load_config(config_path: Option<PathBuf>) -> Result<AppConfig, config::ConfigError> {
    let mut builder = config::Config::builder();

    let default_names = ["config/default", "../config/default", "default"];
    for name in default_names {
        let path = format!("{}.toml", name);
        if std::path::Path::new(&path).exists() {
            builder = builder.add_source(config::File::with_name(name).required(false));
            break;
        }
    }

    if let Some(ref path) = config_path {
        if path.exists() {
            builder = builder.add_source(config::File::from(path.clone()).required(false));
        }
    }

    builder = builder.add_source(
        config::Environment::with_prefix("MAGPIE")
            .separator("__")
            .try_parsing(true),
    );

    let c = builder.build()?;
    c.try_deserialize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.agent.max_retries, 3);
        assert_eq!(cfg.llm.model, "gemma3");
        assert_eq!(cfg.browser.step_extract_limit, 3);
    }

    #[test]
    fn test_llm_defaults() {
        let cfg = AppConfig::default();
        assert!(cfg.llm.api_key_env.is_none());
        assert!((cfg.llm.temperature - 0.2).abs() < f32::EPSILON);
        assert_eq!(cfg.llm.timeouts.request, 60);
    }
}

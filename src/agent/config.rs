use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// 後端位址的環境變數名稱。
pub const BACKEND_URL_ENV: &str = "AGENTCHAT_BACKEND_URL";
/// 未設定時使用的本地後端位址。
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// 設定面板中可選擇的模型，依顯示順序排列。
pub const MODEL_CHOICES: &[(&str, &str)] = &[
    ("gemini-3-pro-preview", "Gemini Pro"),
    ("gpt-4", "GPT-4"),
    ("gpt-3.5-turbo", "GPT-3.5 Turbo"),
    ("claude-3-opus", "Claude 3 Opus"),
    ("claude-3-sonnet", "Claude 3 Sonnet"),
];

pub const TEMPERATURE_STEP: f32 = 0.1;
pub const MAX_TOKENS_MIN: u32 = 128;
pub const MAX_TOKENS_MAX: u32 = 8192;
pub const MAX_TOKENS_STEP: u32 = 128;

/// 查詢所要使用的後端代理能力。
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum AgentVariant {
    #[default]
    CityInfo,
    Crypto,
    Law,
}

impl AgentVariant {
    pub const ALL: [AgentVariant; 3] = [AgentVariant::CityInfo, AgentVariant::Crypto, AgentVariant::Law];

    /// 對應的後端端點路徑。
    pub fn endpoint(&self) -> &'static str {
        match self {
            AgentVariant::CityInfo => "/city-info",
            AgentVariant::Crypto => "/crypto",
            AgentVariant::Law => "/law",
        }
    }

    /// 標題列顯示的名稱。
    pub fn display_name(&self) -> &'static str {
        match self {
            AgentVariant::CityInfo => "City Info",
            AgentVariant::Crypto => "Crypto",
            AgentVariant::Law => "Legal",
        }
    }

    pub fn slug(&self) -> &'static str {
        match self {
            AgentVariant::CityInfo => "city-info",
            AgentVariant::Crypto => "crypto",
            AgentVariant::Law => "law",
        }
    }

    /// 依 `delta` 在三種代理間循環切換。
    pub fn cycle(&self, delta: isize) -> Self {
        let len = Self::ALL.len() as isize;
        let index = Self::ALL.iter().position(|v| v == self).unwrap_or(0) as isize;
        Self::ALL[(index + delta).rem_euclid(len) as usize]
    }
}

/// 使用者的代理偏好設定，持久化為 `agent-settings-storage`。
///
/// 只能透過 setter 修改；超出範圍的值會被夾回有效區間。
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct AgentSettings {
    model: String,
    temperature: f32,
    max_tokens: u32,
    agent_type: AgentVariant,
}

impl Default for AgentSettings {
    fn default() -> Self {
        Self {
            model: String::from("gemini-3-pro-preview"),
            temperature: 0.7,
            max_tokens: 2048,
            agent_type: AgentVariant::CityInfo,
        }
    }
}

impl AgentSettings {
    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn temperature(&self) -> f32 {
        self.temperature
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    pub fn agent_variant(&self) -> AgentVariant {
        self.agent_type
    }

    pub fn set_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
    }

    /// 設定溫度，並以 0.1 為單位取整至 0.0..=1.0。
    pub fn set_temperature(&mut self, temperature: f32) {
        let clamped = if temperature.is_finite() {
            temperature.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.temperature = (clamped / TEMPERATURE_STEP).round() * TEMPERATURE_STEP;
    }

    /// 設定最大輸出 token 數，並以 128 為單位取整至 128..=8192。
    pub fn set_max_tokens(&mut self, max_tokens: u32) {
        let clamped = max_tokens.clamp(MAX_TOKENS_MIN, MAX_TOKENS_MAX);
        let steps = (clamped + MAX_TOKENS_STEP / 2) / MAX_TOKENS_STEP;
        self.max_tokens = (steps * MAX_TOKENS_STEP).clamp(MAX_TOKENS_MIN, MAX_TOKENS_MAX);
    }

    pub fn set_agent_variant(&mut self, variant: AgentVariant) {
        self.agent_type = variant;
    }

    /// 在 `MODEL_CHOICES` 中循環切換模型；不在清單中的模型從第一項開始。
    pub fn cycle_model(&mut self, delta: isize) {
        let len = MODEL_CHOICES.len() as isize;
        let next = match MODEL_CHOICES.iter().position(|(id, _)| *id == self.model) {
            Some(index) => (index as isize + delta).rem_euclid(len) as usize,
            None => 0,
        };
        self.model = MODEL_CHOICES[next].0.to_string();
    }

    /// 目前模型的顯示名稱。
    pub fn model_label(&self) -> &str {
        MODEL_CHOICES
            .iter()
            .find(|(id, _)| *id == self.model)
            .map(|(_, label)| *label)
            .unwrap_or(self.model.as_str())
    }
}

/// 從 `config/agentchat.toml` 讀入的檔案設定，所有欄位皆可省略。
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientConfigFile {
    #[serde(default)]
    pub backend_url: Option<String>,
    #[serde(default)]
    pub state_dir: Option<PathBuf>,
    #[serde(default)]
    pub offline: Option<bool>,
    #[serde(default)]
    pub simulated_latency_ms: Option<u64>,
}

impl ClientConfigFile {
    /// 讀取工作目錄下的 `config/agentchat.toml`；檔案不存在時回傳空設定。
    pub fn load(workspace_root: &Path) -> Result<Self> {
        let config_path = workspace_root.join("config/agentchat.toml");
        if !config_path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&config_path)
            .with_context(|| format!("讀取用戶端設定失敗: {}", config_path.display()))?;
        toml::from_str(&raw).with_context(|| format!("解析用戶端設定失敗: {}", config_path.display()))
    }
}

/// 命令列可覆寫的設定值。
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub backend_url: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub offline: bool,
}

/// 用戶端最終生效的設定。
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// 後端基礎 URL，不含結尾斜線。
    pub backend_url: String,
    /// 持久化狀態與日誌所在目錄。
    pub state_dir: PathBuf,
    /// 為真時以模擬後端回應，不發出任何網路請求。
    pub offline: bool,
    /// 模擬後端的固定延遲。
    pub simulated_latency: Duration,
}

impl ClientConfig {
    /// 依序套用：內建預設值、設定檔、環境變數、命令列參數。
    pub fn resolve(workspace_root: &Path, overrides: ConfigOverrides) -> Result<Self> {
        let file = ClientConfigFile::load(workspace_root)?;
        let env_url = env::var(BACKEND_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty());
        Ok(Self::layer(file, env_url, overrides))
    }

    fn layer(file: ClientConfigFile, env_url: Option<String>, overrides: ConfigOverrides) -> Self {
        let backend_url = overrides
            .backend_url
            .or(env_url)
            .or(file.backend_url)
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());
        let state_dir = overrides
            .state_dir
            .or(file.state_dir)
            .unwrap_or_else(default_state_dir);
        Self {
            backend_url: backend_url.trim_end_matches('/').to_string(),
            state_dir,
            offline: overrides.offline || file.offline.unwrap_or(false),
            simulated_latency: Duration::from_millis(file.simulated_latency_ms.unwrap_or(600)),
        }
    }
}

/// 平台資料目錄下的 `agentchat`，無法取得時退回目前目錄的 `.agentchat`。
pub fn default_state_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("agentchat"))
        .unwrap_or_else(|| PathBuf::from(".agentchat"))
}

//! 时间查询工具

use rig::tool::Tool;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// 时间工具
#[derive(Debug, Clone, Default)]
pub struct AgentToolTime;

/// 时间查询参数
#[derive(Debug, Deserialize)]
pub struct TimeArgs {
    #[serde(rename = "format")]
    pub format: Option<String>,
}

/// 时间查询结果
#[derive(Debug, Serialize)]
pub struct TimeResult {
    pub current_time: String,
    pub timestamp: u64,
    pub utc_time: String,
}

/// 时间工具错误
#[derive(Debug, thiserror::Error)]
#[error("Time tool error: {0}")]
pub struct TimeToolError(String);

impl AgentToolTime {
    pub fn new() -> Self {
        Self
    }

    fn current_time(&self, args: &TimeArgs) -> Result<TimeResult, TimeToolError> {
        let now = SystemTime::now();
        let timestamp = now
            .duration_since(UNIX_EPOCH)
            .map_err(|e| TimeToolError(e.to_string()))?
            .as_secs();

        let format = args.format.as_deref().unwrap_or("%Y-%m-%d %H:%M:%S");
        // 非法格式串会让 chrono 在 Display 时 panic，先校验
        if chrono::format::StrftimeItems::new(format)
            .any(|item| matches!(item, chrono::format::Item::Error))
        {
            return Err(TimeToolError(format!("invalid format `{}`", format)));
        }

        let local: chrono::DateTime<chrono::Local> = now.into();
        let utc: chrono::DateTime<chrono::Utc> = now.into();

        Ok(TimeResult {
            current_time: local.format(format).to_string(),
            timestamp,
            utc_time: utc.format(format).to_string(),
        })
    }
}

impl Tool for AgentToolTime {
    const NAME: &'static str = "time";

    type Error = TimeToolError;
    type Args = TimeArgs;
    type Output = TimeResult;

    async fn definition(&self, _prompt: String) -> rig::completion::ToolDefinition {
        rig::completion::ToolDefinition {
            name: Self::NAME.to_string(),
            description: "Get the current date and time (local and UTC) plus a Unix timestamp. Use it to anchor research to the present date.".to_string(),
            parameters: serde_json::json!({
                "type": "object",
                "properties": {
                    "format": {
                        "type": "string",
                        "description": "chrono format string, defaults to '%Y-%m-%d %H:%M:%S'"
                    }
                },
                "required": []
            }),
        }
    }

    async fn call(&self, args: Self::Args) -> Result<Self::Output, Self::Error> {
        tracing::debug!("   🔧 tool called...time@{:?}", args);
        self.current_time(&args)
    }
}

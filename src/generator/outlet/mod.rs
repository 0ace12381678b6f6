use anyhow::{Context, Result};
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tracing::info;

use crate::config::Config;
use crate::generator::crews::CrewKind;
use crate::generator::result::PipelineResult;

static PATH_HOSTILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[/\\:*?"<>|\x00-\x1f]"#).expect("valid path regex"));

/// 已写出的文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedArtifacts {
    pub document: PathBuf,
    pub history: Option<PathBuf>,
}

pub trait Outlet {
    async fn save(&self, result: &PipelineResult) -> Result<SavedArtifacts>;
}

/// 把主题转换成文件名片段：空白变下划线，去掉路径非法字符
pub fn sanitize_topic(topic: &str) -> String {
    let joined = topic.split_whitespace().collect::<Vec<_>>().join("_");
    let cleaned = PATH_HOSTILE.replace_all(&joined, "");
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "untitled".to_string()
    } else {
        cleaned.to_string()
    }
}

pub struct DiskOutlet {
    output_dir: PathBuf,
    crew: CrewKind,
    write_history: bool,
}

impl DiskOutlet {
    pub fn new(output_dir: impl Into<PathBuf>, crew: CrewKind, write_history: bool) -> Self {
        Self {
            output_dir: output_dir.into(),
            crew,
            write_history,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.output_path.clone(), config.crew, config.write_history)
    }

    /// 最终文档的保存路径
    pub fn document_path(&self, topic: &str) -> PathBuf {
        self.output_dir
            .join(self.crew.file_name(&sanitize_topic(topic)))
    }

    fn history_path(document: &Path) -> PathBuf {
        document.with_extension("history.json")
    }
}

impl Outlet for DiskOutlet {
    async fn save(&self, result: &PipelineResult) -> Result<SavedArtifacts> {
        info!("🖊️ 文档存储中...");
        fs::create_dir_all(&self.output_dir).context(format!(
            "Failed to create output directory: {:?}",
            self.output_dir
        ))?;

        let document = self.document_path(result.topic());
        fs::write(&document, result.output())
            .context(format!("Failed to write proposal: {:?}", document))?;
        info!("💾 已保存文档: {}", document.display());

        let history = if self.write_history {
            let path = Self::history_path(&document);
            let json = serde_json::to_string_pretty(result)?;
            fs::write(&path, json).context(format!("Failed to write history: {:?}", path))?;
            info!("💾 已保存中间产物: {}", path.display());
            Some(path)
        } else {
            None
        };

        Ok(SavedArtifacts { document, history })
    }
}

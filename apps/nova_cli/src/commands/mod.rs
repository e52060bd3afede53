// apps/nova_cli/src/commands/mod.rs

//! 子命令实现

pub mod info;
pub mod run;
pub mod validate;

use std::path::Path;

use anyhow::{Context, Result};
use nova_physics::SolverConfig;

/// 读取并校验配置；无路径时用默认配置
pub fn load_config(path: Option<&Path>) -> Result<SolverConfig> {
    let config: SolverConfig = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p)
                .with_context(|| format!("读取配置文件 {} 失败", p.display()))?;
            serde_json::from_str(&text).context("解析配置失败")?
        }
        None => SolverConfig::default(),
    };
    config.validate().context("配置校验失败")?;
    Ok(config)
}

// apps/nova_cli/src/commands/validate.rs

//! 校验配置文件命令

use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use tracing::info;

/// 校验参数
#[derive(Args)]
pub struct ValidateArgs {
    /// 配置文件路径（JSON）
    #[arg(short, long)]
    pub config: PathBuf,
}

/// 执行校验命令
pub fn execute(args: ValidateArgs) -> Result<()> {
    let config = super::load_config(Some(&args.config))?;
    info!("配置有效: {}", args.config.display());
    info!(
        "γ={}, CFL={}, 分辨率={}, 模板数={}",
        config.gamma,
        config.cfl,
        config.mesh_resolution,
        config.reconstruction.orders.len()
    );
    Ok(())
}

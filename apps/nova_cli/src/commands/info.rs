// apps/nova_cli/src/commands/info.rs

//! 显示网格与重构信息命令

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::Args;
use tracing::info;

use nova_mesh::unit_square;
use nova_physics::model::equilibrium::NoEquilibrium;
use nova_physics::model::euler::IdealGasEos;
use nova_physics::model::scaling::Scaling;
use nova_physics::reconstruction::GlobalReconstruction;

/// 信息参数
#[derive(Args)]
pub struct InfoArgs {
    /// 配置文件路径（JSON），缺省用默认配置
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// 执行信息命令
pub fn execute(args: InfoArgs) -> Result<()> {
    let config = super::load_config(args.config.as_deref())?;

    let mesh = Arc::new(unit_square(config.mesh_resolution)?);
    info!("网格: {} 单元, {} 顶点, {} 面", mesh.n_cells(), mesh.n_vertices, mesh.faces.len());
    let boundary = mesh.faces.iter().filter(|f| f.is_boundary()).count();
    info!("边界面: {}, 总面积: {:.6}", boundary, mesh.total_area());

    // 模板搜索只依赖几何，用朴素模式即可统计
    let recon = GlobalReconstruction::new(
        Arc::clone(&mesh),
        &config.reconstruction,
        NoEquilibrium,
        IdealGasEos::new(config.gamma),
        Scaling::Unity,
    )?;

    let max_order = config.reconstruction.orders.iter().copied().max().unwrap_or(1);
    let mut order_counts = vec![0usize; max_order + 1];
    let mut combined_total = 0usize;
    for i in 0..mesh.n_cells() {
        let family = recon.cell(i).weno().stencils();
        order_counts[family.order()] += 1;
        combined_total += family.combined_size();
    }

    info!("重构: {} 个模板/单元, 杂交模式 {:?}", config.reconstruction.orders.len(), config.reconstruction.mode);
    for (order, count) in order_counts.iter().enumerate().skip(1) {
        if *count > 0 {
            info!("  达到 {} 阶的单元: {}", order, count);
        }
    }
    info!(
        "合并模板平均规模: {:.1} 单元",
        combined_total as f64 / mesh.n_cells() as f64
    );

    Ok(())
}

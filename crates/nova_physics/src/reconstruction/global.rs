// crates/nova_physics/src/reconstruction/global.rs

//! 全场重构编排
//!
//! 每个单元一个 [`LocalReconstruction`] 槽位的竞技场。单元之间
//! 只读共享状态、互不写入对方槽位，`rayon` 并行无锁。
//!
//! `compute_subset` 支持只更新一部分单元（例如先算分区内部、
//! 等通信完成后再算外层）。

use std::sync::Arc;

use rayon::prelude::*;

use nova_foundation::NovaResult;
use nova_mesh::TriMesh;

use crate::model::equilibrium::Equilibrium;
use crate::model::euler::IdealGasEos;
use crate::state::StateAccess;

use super::config::ReconstructionConfig;
use super::local::{LocalReconstruction, RecomputePolicy};

/// 全场重构
#[derive(Debug, Clone)]
pub struct GlobalReconstruction<E: Equilibrium> {
    mesh: Arc<TriMesh>,
    cells: Vec<LocalReconstruction<E>>,
}

impl<E: Equilibrium> GlobalReconstruction<E> {
    /// 为整个网格搭建重构算子
    ///
    /// 配置校验与模板搜索都在这里发生，之后的 `compute` 不再失败。
    pub fn new(
        mesh: Arc<TriMesh>,
        config: &ReconstructionConfig,
        equilibrium: E,
        eos: IdealGasEos,
        scaling: crate::model::scaling::Scaling,
    ) -> NovaResult<Self> {
        let weno_params = config.weno_params()?;
        let policy = RecomputePolicy {
            scaling,
            steps_per_recompute: config.steps_per_recompute,
            recompute_threshold: config.recompute_threshold,
        };

        let cells = (0..mesh.n_cells())
            .map(|i| {
                LocalReconstruction::new(&mesh, i, &weno_params, equilibrium.clone(), eos, policy)
            })
            .collect::<NovaResult<Vec<_>>>()?;

        Ok(Self { mesh, cells })
    }

    /// 网格
    #[inline]
    pub fn mesh(&self) -> &Arc<TriMesh> {
        &self.mesh
    }

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.cells.len()
    }

    /// 单元的局部重构
    #[inline]
    pub fn cell(&self, i: usize) -> &LocalReconstruction<E> {
        &self.cells[i]
    }

    /// 更新全部单元
    pub fn compute<S: StateAccess>(&mut self, state: &S) {
        let mesh = Arc::clone(&self.mesh);
        self.cells
            .par_iter_mut()
            .for_each(|local| local.compute(&mesh, state));
    }

    /// 只更新 `mask[i]` 为真的单元
    pub fn compute_subset<S: StateAccess>(&mut self, state: &S, mask: &[bool]) {
        debug_assert_eq!(mask.len(), self.cells.len());
        let mesh = Arc::clone(&self.mesh);
        self.cells
            .par_iter_mut()
            .enumerate()
            .filter(|(i, _)| mask[*i])
            .for_each(|(_, local)| local.compute(&mesh, state));
    }
}

// crates/nova_physics/src/reconstruction/stencil_family.rs

//! 模板家族
//!
//! 一个单元的全部模板（通常一个中心高阶 + 三个单侧低阶）与它们的
//! 合并索引表 `l2g`。合并表按首次出现的顺序编号，局部索引 0 恒为
//! 所属单元；状态按合并表一次取齐，各模板通过局部索引复用。

use smallvec::SmallVec;
use tracing::debug;

use nova_foundation::NovaResult;
use nova_mesh::TriMesh;

use super::stencil::{Stencil, StencilBias};

/// 家族构造参数（已解析的配置片段）
#[derive(Debug, Clone, PartialEq)]
pub struct StencilFamilyParams {
    /// 每个模板请求的阶数
    pub orders: Vec<usize>,
    /// 每个模板的偏向
    pub biases: Vec<StencilBias>,
    /// 每个模板的过拟合系数
    pub overfit_factors: Vec<f64>,
}

/// 一个单元的模板家族
#[derive(Debug, Clone, PartialEq)]
pub struct StencilFamily {
    /// 所属单元
    cell: usize,
    /// 模板
    stencils: SmallVec<[Stencil; 4]>,
    /// 合并模板：局部索引 → 全局单元索引
    l2g: Vec<u32>,
}

impl StencilFamily {
    /// 搜索单元 `cell` 的模板家族
    pub fn new(mesh: &TriMesh, cell: usize, params: &StencilFamilyParams) -> NovaResult<Self> {
        let mut stencils: SmallVec<[Stencil; 4]> = SmallVec::new();
        for k in 0..params.orders.len() {
            stencils.push(Stencil::new(
                mesh,
                cell,
                params.biases[k],
                params.orders[k],
                params.overfit_factors[k],
            )?);
        }

        let mut l2g = Vec::new();
        for s in stencils.iter_mut() {
            s.assign_local(&mut l2g);
        }
        debug_assert_eq!(l2g[0], cell as u32);

        Ok(Self {
            cell,
            stencils,
            l2g,
        })
    }

    /// 所属单元
    #[inline]
    pub fn cell(&self) -> usize {
        self.cell
    }

    /// 模板个数
    #[inline]
    pub fn len(&self) -> usize {
        self.stencils.len()
    }

    /// 是否为空
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.stencils.is_empty()
    }

    /// 按索引取模板
    #[inline]
    pub fn stencil(&self, k: usize) -> &Stencil {
        &self.stencils[k]
    }

    /// 遍历模板
    pub fn iter(&self) -> impl Iterator<Item = &Stencil> {
        self.stencils.iter()
    }

    /// 合并模板的局部 → 全局索引表
    #[inline]
    pub fn l2g(&self) -> &[u32] {
        &self.l2g
    }

    /// 合并模板大小
    #[inline]
    pub fn combined_size(&self) -> usize {
        self.l2g.len()
    }

    /// 家族的总体阶数 = 各模板实际阶数的最大值
    pub fn order(&self) -> usize {
        self.stencils.iter().map(|s| s.order).max().unwrap_or(1)
    }

    /// 最高阶模板的索引；同阶时优先中心模板
    pub fn highest_order_stencil(&self) -> usize {
        let mut best = 0;
        for (k, s) in self.stencils.iter().enumerate() {
            let better = s.order > self.stencils[best].order
                || (s.order == self.stencils[best].order
                    && s.bias == StencilBias::Central
                    && self.stencils[best].bias != StencilBias::Central);
            if better {
                best = k;
            }
        }
        best
    }

    /// 整体退化为一阶
    ///
    /// 用于邻接信息不完整的单元（例如并行分区边缘的外层单元），
    /// 属于刻意降阶而非错误。
    pub fn truncate_to_first_order(&mut self) {
        debug!(cell = self.cell, "模板家族退化为一阶");
        let mut l2g = Vec::new();
        for s in self.stencils.iter_mut() {
            *s = Stencil::first_order(self.cell, s.bias, s.overfit_factor);
            s.assign_local(&mut l2g);
        }
        self.l2g = l2g;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nova_mesh::unit_square;

    fn params_3222() -> StencilFamilyParams {
        StencilFamilyParams {
            orders: vec![3, 2, 2, 2],
            biases: vec![
                StencilBias::Central,
                StencilBias::OneSided(0),
                StencilBias::OneSided(1),
                StencilBias::OneSided(2),
            ],
            overfit_factors: vec![2.0; 4],
        }
    }

    #[test]
    fn test_family_build() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(glam::DVec2::new(0.5, 0.5)).unwrap();
        let fam = StencilFamily::new(&mesh, cell, &params_3222()).unwrap();
        assert_eq!(fam.len(), 4);
        assert_eq!(fam.order(), 3);
        assert_eq!(fam.l2g()[0], cell as u32);
        // 合并表无重复
        let mut sorted = fam.l2g().to_vec();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), fam.combined_size());
    }

    #[test]
    fn test_highest_order_prefers_central() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(glam::DVec2::new(0.5, 0.5)).unwrap();

        let fam = StencilFamily::new(&mesh, cell, &params_3222()).unwrap();
        assert_eq!(fam.highest_order_stencil(), 0);

        // 同阶时也应选中心模板
        let params = StencilFamilyParams {
            orders: vec![2, 2, 2, 2],
            biases: vec![
                StencilBias::OneSided(0),
                StencilBias::Central,
                StencilBias::OneSided(1),
                StencilBias::OneSided(2),
            ],
            overfit_factors: vec![2.0; 4],
        };
        let fam = StencilFamily::new(&mesh, cell, &params).unwrap();
        let k = fam.highest_order_stencil();
        assert_eq!(fam.stencil(k).bias, StencilBias::Central);
    }

    #[test]
    fn test_truncate_to_first_order() {
        let mesh = unit_square(8).unwrap();
        let cell = mesh.locate(glam::DVec2::new(0.5, 0.5)).unwrap();
        let mut fam = StencilFamily::new(&mesh, cell, &params_3222()).unwrap();
        fam.truncate_to_first_order();
        assert_eq!(fam.order(), 1);
        assert_eq!(fam.combined_size(), 1);
        for s in fam.iter() {
            assert_eq!(s.size(), 1);
            assert_eq!(s.local[0], 0);
        }
    }
}

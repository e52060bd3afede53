// crates/nova_physics/src/reconstruction/stencil.rs

//! 模板搜索
//!
//! 从单元邻接关系出发做广度优先生长，候选限制在接受域内：
//! 中心模板接受全平面，单侧模板只接受以形心为顶点、张过某条边
//! 两端点的锥形域。候选按到形心的距离排序后截断。
//!
//! 模板大小与可达阶数的换算：次数 d 的拟合需要
//! `ceil((poly_dof(d) - 1) · overfit_factor)` 个单元（含中心，
//! 0 次退化为 1）。候选不足时阶数自动下调，这是正常的降阶而非错误；
//! 只有在请求高阶却连一个邻居都找不到时才报错。
//!
//! 约定：局部索引 0 恒为所属单元本身。

use glam::DVec2;
use smallvec::SmallVec;
use tracing::debug;

use nova_foundation::{NovaError, NovaResult};
use nova_mesh::frozen::NO_NEIGHBOUR;
use nova_mesh::moments::poly_dof;
use nova_mesh::TriMesh;

use super::poly::MAX_DEGREE;

/// 模板内索引的内联容量
pub type IndexVec = SmallVec<[u32; 24]>;

/// 模板偏向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StencilBias {
    /// 中心模板：各向同性
    Central,
    /// 单侧模板：偏向第 k 条边一侧的锥形域
    OneSided(usize),
}

/// 次数 `deg` 的拟合所需的模板大小（含中心单元）
#[inline]
pub fn required_stencil_size(deg: usize, factor: f64) -> usize {
    if deg == 0 {
        1
    } else {
        ((poly_dof(deg) - 1) as f64 * factor).ceil() as usize
    }
}

/// 给定模板大小可达的最高阶数（阶 = 次数 + 1）
#[inline]
pub fn deduce_max_order(size: usize, factor: f64) -> usize {
    for deg in (1..=MAX_DEGREE).rev() {
        if required_stencil_size(deg, factor) <= size {
            return deg + 1;
        }
    }
    1
}

/// 单个重构模板
#[derive(Debug, Clone, PartialEq)]
pub struct Stencil {
    /// 全局单元索引，`global[0]` 是所属单元
    pub global: IndexVec,
    /// 家族合并模板内的局部索引，与 `global` 对齐
    pub local: IndexVec,
    /// 实际可达阶数
    pub order: usize,
    /// 偏向
    pub bias: StencilBias,
    /// 过拟合系数
    pub overfit_factor: f64,
}

impl Stencil {
    /// 搜索单元 `i_cell` 的模板
    ///
    /// `max_order` 是请求的阶数上限；实际阶数受候选数量限制。
    pub fn new(
        mesh: &TriMesh,
        i_cell: usize,
        bias: StencilBias,
        max_order: usize,
        overfit_factor: f64,
    ) -> NovaResult<Self> {
        debug_assert!(max_order >= 1 && max_order <= MAX_DEGREE + 1);

        let needed = required_stencil_size(max_order - 1, overfit_factor);
        let candidates = grow_candidates(mesh, i_cell, bias, 2 * needed.max(1))?;

        // 单侧锥可能整体落在边界外，此时降为一阶；中心模板找不到
        // 任何邻居才是拓扑缺陷
        if candidates.is_empty() && max_order > 1 {
            match bias {
                StencilBias::Central => {
                    return Err(NovaError::numerical(format!(
                        "单元 {i_cell} 的中心模板候选为空"
                    )));
                }
                StencilBias::OneSided(k) => {
                    debug!(cell = i_cell, edge = k, "单侧锥内无候选，降为一阶");
                }
            }
        }

        let order = deduce_max_order(1 + candidates.len(), overfit_factor).min(max_order);
        let size = required_stencil_size(order.saturating_sub(1), overfit_factor).max(1);

        let mut global = IndexVec::new();
        global.push(i_cell as u32);
        global.extend(candidates.into_iter().take(size.saturating_sub(1)));

        Ok(Self {
            global,
            local: IndexVec::new(),
            order,
            bias,
            overfit_factor,
        })
    }

    /// 退化为一阶单点模板
    pub fn first_order(i_cell: usize, bias: StencilBias, overfit_factor: f64) -> Self {
        let mut global = IndexVec::new();
        global.push(i_cell as u32);
        Self {
            global,
            local: IndexVec::new(),
            order: 1,
            bias,
            overfit_factor,
        }
    }

    /// 模板大小（含中心）
    #[inline]
    pub fn size(&self) -> usize {
        self.global.len()
    }

    /// 把全局索引映射进家族合并模板，首次出现的索引追加到 `l2g` 末尾
    pub fn assign_local(&mut self, l2g: &mut Vec<u32>) {
        self.local.clear();
        for &g in &self.global {
            let pos = match l2g.iter().position(|&x| x == g) {
                Some(p) => p,
                None => {
                    l2g.push(g);
                    l2g.len() - 1
                }
            };
            self.local.push(pos as u32);
        }
    }
}

// ============================================================================
// 候选生长
// ============================================================================

/// 接受域
enum Region {
    All,
    Cone { apex: DVec2, r1: DVec2, r2: DVec2 },
}

impl Region {
    fn contains(&self, p: DVec2) -> bool {
        match self {
            Region::All => true,
            Region::Cone { apex, r1, r2 } => {
                const TOL: f64 = -1e-12;
                let d = p - *apex;
                r1.perp_dot(d) >= TOL * d.length() && d.perp_dot(*r2) >= TOL * d.length()
            }
        }
    }
}

fn make_region(mesh: &TriMesh, i_cell: usize, bias: StencilBias) -> NovaResult<Region> {
    match bias {
        StencilBias::Central => Ok(Region::All),
        StencilBias::OneSided(k) => {
            if k >= 3 {
                return Err(NovaError::config(format!("单侧模板边索引越界: {k}")));
            }
            let tri = mesh.tri_vertices[i_cell];
            let apex = mesh.cell_centers[i_cell];
            let va = mesh.vertices[tri[k] as usize];
            let vb = mesh.vertices[tri[(k + 1) % 3] as usize];
            // 顶点逆时针排列，(va - apex) 到 (vb - apex) 的夹角小于 π
            Ok(Region::Cone {
                apex,
                r1: (va - apex).normalize(),
                r2: (vb - apex).normalize(),
            })
        }
    }
}

/// 广度优先生长候选，只经由接受域内的单元扩展，按距离排序返回
fn grow_candidates(
    mesh: &TriMesh,
    i_cell: usize,
    bias: StencilBias,
    max_candidates: usize,
) -> NovaResult<Vec<u32>> {
    let region = make_region(mesh, i_cell, bias)?;
    let center = mesh.cell_centers[i_cell];

    let mut visited = vec![false; mesh.n_cells()];
    visited[i_cell] = true;

    let mut accepted: Vec<u32> = Vec::new();
    let mut frontier: Vec<u32> = vec![i_cell as u32];

    while !frontier.is_empty() && accepted.len() < max_candidates {
        let mut next = Vec::new();
        for &c in &frontier {
            for &n in &mesh.neighbours[c as usize] {
                if n == NO_NEIGHBOUR || visited[n as usize] {
                    continue;
                }
                visited[n as usize] = true;
                if region.contains(mesh.cell_centers[n as usize]) {
                    accepted.push(n);
                    next.push(n);
                }
            }
        }
        frontier = next;
    }

    accepted.sort_unstable_by(|&a, &b| {
        let da = (mesh.cell_centers[a as usize] - center).length_squared();
        let db = (mesh.cell_centers[b as usize] - center).length_squared();
        da.partial_cmp(&db).unwrap().then(a.cmp(&b))
    });
    Ok(accepted)
}

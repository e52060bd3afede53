// crates/nova_mesh/src/frozen.rs

//! 只读三角网格
//!
//! 构造后不可修改的 SoA 布局，重构与通量回路直接按数组索引访问。
//!
//! # 设计要点
//!
//! 1. **SoA布局**: 单元/面数据按属性分数组存放
//! 2. **只读**: 冻结后不可修改，可安全地在 rayon 任务间共享
//! 3. **预计算**: 形心、面积、外接圆半径、归一化矩、体/面求积点
//!    全部在构造期算好
//! 4. **哨兵约定**: 邻居表和面的 neighbour 用 `u32::MAX` 表示边界
//!
//! # 几何约定
//!
//! - 单元顶点按逆时针排列（构造时自动纠正）
//! - 单元的第 k 条边连接顶点 k 与 (k+1)%3，邻居表按边索引对齐
//! - 特征长度取外接圆半径
//! - 体求积点的第一个点是形心

use std::collections::HashMap;

use glam::DVec2;
use serde::{Deserialize, Serialize};

use nova_foundation::{ensure, NovaError, NovaResult};

use crate::moments::{normalized_moments, N_MOMENTS};
use crate::quadrature::{denormalize_edge, edge_rule, triangle_rule};

/// 边界哨兵值
pub const NO_NEIGHBOUR: u32 = u32::MAX;

/// 每个单元的体求积点数（5 阶 Dunavant 规则）
pub const N_VOLUME_POINTS: usize = 7;

/// 每条面的线求积点数（3 点 Gauss-Legendre）
pub const N_FACE_POINTS: usize = 3;

/// 网格面
///
/// 内部面连接 owner 与 neighbour 两个单元；边界面 `neighbour == NO_NEIGHBOUR`。
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Face {
    /// owner 单元索引
    pub owner: u32,
    /// neighbour 单元索引（`NO_NEIGHBOUR` 表示边界）
    pub neighbour: u32,
    /// 单位外法向（从 owner 指向外）
    pub normal: DVec2,
    /// 面长度
    pub length: f64,
    /// 面上的求积点
    pub points: [DVec2; N_FACE_POINTS],
}

impl Face {
    /// 是否为边界面
    #[inline]
    pub fn is_boundary(&self) -> bool {
        self.neighbour == NO_NEIGHBOUR
    }
}

/// 只读三角网格
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TriMesh {
    /// 单元数量
    pub n_cells: usize,
    /// 顶点数量
    pub n_vertices: usize,
    /// 顶点坐标
    pub vertices: Vec<DVec2>,
    /// 单元顶点索引（逆时针）
    pub tri_vertices: Vec<[u32; 3]>,
    /// 单元形心
    pub cell_centers: Vec<DVec2>,
    /// 单元面积
    pub areas: Vec<f64>,
    /// 单元邻居索引，按边索引对齐（`NO_NEIGHBOUR` 表示边界）
    pub neighbours: Vec<[u32; 3]>,
    /// 单元特征长度（外接圆半径）
    pub char_length: Vec<f64>,
    /// 单元归一化几何矩（至 4 次）
    pub normalized_moments: Vec<[f64; N_MOMENTS]>,
    /// 单元体求积点（第一个点是形心）
    pub volume_points: Vec<[DVec2; N_VOLUME_POINTS]>,
    /// 体求积权重（和为 1，所有单元共用）
    pub volume_weights: [f64; N_VOLUME_POINTS],
    /// 网格面
    pub faces: Vec<Face>,
    /// 面求积权重（和为 1，所有面共用）
    pub face_weights: [f64; N_FACE_POINTS],
    /// 单元到面的索引映射，按边索引对齐
    pub cell_faces: Vec<[u32; 3]>,
}

impl TriMesh {
    /// 从顶点和三角形连接表构造网格
    ///
    /// 顺时针排列的三角形会被自动翻转；退化（零面积）三角形是致命错误。
    pub fn new(vertices: Vec<DVec2>, mut tri_vertices: Vec<[u32; 3]>) -> NovaResult<Self> {
        let n_cells = tri_vertices.len();
        let n_vertices = vertices.len();
        ensure!(n_cells > 0, NovaError::mesh("网格没有单元"));

        for tri in &tri_vertices {
            for &v in tri {
                ensure!(
                    (v as usize) < n_vertices,
                    NovaError::mesh(format!("顶点索引越界: {v} >= {n_vertices}"))
                );
            }
        }

        let mut cell_centers = Vec::with_capacity(n_cells);
        let mut areas = Vec::with_capacity(n_cells);
        let mut char_length = Vec::with_capacity(n_cells);

        for tri in tri_vertices.iter_mut() {
            let a = vertices[tri[0] as usize];
            let b = vertices[tri[1] as usize];
            let c = vertices[tri[2] as usize];
            let mut signed = 0.5 * (b - a).perp_dot(c - a);
            if signed < 0.0 {
                tri.swap(1, 2);
                signed = -signed;
            }
            ensure!(
                signed > 1e-14,
                NovaError::mesh(format!("退化三角形: 顶点 {tri:?}"))
            );

            let a = vertices[tri[0] as usize];
            let b = vertices[tri[1] as usize];
            let c = vertices[tri[2] as usize];
            cell_centers.push((a + b + c) / 3.0);
            areas.push(signed);

            let la = (b - a).length();
            let lb = (c - b).length();
            let lc = (a - c).length();
            char_length.push(la * lb * lc / (4.0 * signed));
        }

        // ====================================================================
        // 邻接与面：按无向边去重
        // ====================================================================

        let mut neighbours = vec![[NO_NEIGHBOUR; 3]; n_cells];
        let mut cell_faces = vec![[NO_NEIGHBOUR; 3]; n_cells];
        let mut faces: Vec<Face> = Vec::new();
        let erule = edge_rule();

        let mut edge_map: HashMap<(u32, u32), (u32, usize)> = HashMap::new();
        for (i, tri) in tri_vertices.iter().enumerate() {
            for k in 0..3 {
                let va = tri[k];
                let vb = tri[(k + 1) % 3];
                let key = if va < vb { (va, vb) } else { (vb, va) };
                match edge_map.remove(&key) {
                    None => {
                        edge_map.insert(key, (i as u32, k));
                    }
                    Some((j, kj)) => {
                        neighbours[i][k] = j;
                        neighbours[j as usize][kj] = i as u32;
                        let pa = vertices[va as usize];
                        let pb = vertices[vb as usize];
                        let face = Self::build_face(j, i as u32, vertices_of_edge(&tri_vertices, j as usize, kj, &vertices), pa, pb, &erule)?;
                        let fi = faces.len() as u32;
                        faces.push(face);
                        cell_faces[i][k] = fi;
                        cell_faces[j as usize][kj] = fi;
                    }
                }
            }
        }

        // 剩下的都是边界面；排序保证面编号可复现
        let mut boundary: Vec<(u32, usize)> = edge_map.values().copied().collect();
        boundary.sort_unstable();
        for (i, k) in boundary {
            let tri = tri_vertices[i as usize];
            let pa = vertices[tri[k] as usize];
            let pb = vertices[tri[(k + 1) % 3] as usize];
            let face = Self::build_face(i, NO_NEIGHBOUR, (pa, pb), pa, pb, &erule)?;
            let fi = faces.len() as u32;
            faces.push(face);
            cell_faces[i as usize][k] = fi;
        }

        // ====================================================================
        // 几何矩与求积点
        // ====================================================================

        let vrule = triangle_rule(5)?;
        let mut volume_weights = [0.0; N_VOLUME_POINTS];
        volume_weights.copy_from_slice(vrule.weights);

        let mut face_weights = [0.0; N_FACE_POINTS];
        face_weights.copy_from_slice(erule.weights);

        let mut moments = Vec::with_capacity(n_cells);
        let mut volume_points = Vec::with_capacity(n_cells);
        for (i, tri) in tri_vertices.iter().enumerate() {
            let a = vertices[tri[0] as usize];
            let b = vertices[tri[1] as usize];
            let c = vertices[tri[2] as usize];
            moments.push(normalized_moments(a, b, c, cell_centers[i], char_length[i]));

            let mut pts = [DVec2::ZERO; N_VOLUME_POINTS];
            for (q, bc) in vrule.points.iter().enumerate() {
                pts[q] = a * bc[0] + b * bc[1] + c * bc[2];
            }
            volume_points.push(pts);
        }

        Ok(Self {
            n_cells,
            n_vertices,
            vertices,
            tri_vertices,
            cell_centers,
            areas,
            neighbours,
            char_length,
            normalized_moments: moments,
            volume_points,
            volume_weights,
            faces,
            face_weights,
            cell_faces,
        })
    }

    fn build_face(
        owner: u32,
        neighbour: u32,
        owner_edge: (DVec2, DVec2),
        pa: DVec2,
        pb: DVec2,
        erule: &crate::quadrature::EdgeRule,
    ) -> NovaResult<Face> {
        // 法向取 owner 的边方向旋转 -90°；owner 顶点逆时针，结果指向外
        let (oa, ob) = owner_edge;
        let t = ob - oa;
        let length = t.length();
        ensure!(length > 1e-14, NovaError::mesh("零长度面"));
        let normal = DVec2::new(t.y, -t.x) / length;

        let pts = denormalize_edge(erule, pa, pb);
        let mut points = [DVec2::ZERO; N_FACE_POINTS];
        points.copy_from_slice(&pts);

        Ok(Face {
            owner,
            neighbour,
            normal,
            length,
            points,
        })
    }

    // =========================================================================
    // 访问器
    // =========================================================================

    /// 单元数量
    #[inline]
    pub fn n_cells(&self) -> usize {
        self.n_cells
    }

    /// 单元的三个顶点坐标
    #[inline]
    pub fn cell_vertices(&self, i: usize) -> (DVec2, DVec2, DVec2) {
        let tri = self.tri_vertices[i];
        (
            self.vertices[tri[0] as usize],
            self.vertices[tri[1] as usize],
            self.vertices[tri[2] as usize],
        )
    }

    /// 函数在单元上的平均值（按体求积规则）
    pub fn volume_average<F>(&self, i: usize, f: F) -> f64
    where
        F: Fn(DVec2) -> f64,
    {
        self.volume_points[i]
            .iter()
            .zip(&self.volume_weights)
            .map(|(&p, &w)| w * f(p))
            .sum()
    }

    /// 总面积
    pub fn total_area(&self) -> f64 {
        self.areas.iter().sum()
    }

    /// 点定位：返回包含 p 的单元索引（线性扫描）
    pub fn locate(&self, p: DVec2) -> Option<usize> {
        const TOL: f64 = 1e-12;
        (0..self.n_cells).find(|&i| {
            let (a, b, c) = self.cell_vertices(i);
            let s0 = (b - a).perp_dot(p - a);
            let s1 = (c - b).perp_dot(p - b);
            let s2 = (a - c).perp_dot(p - c);
            s0 >= -TOL && s1 >= -TOL && s2 >= -TOL
        })
    }

    /// 判断单元是否与边界相邻
    #[inline]
    pub fn is_boundary_cell(&self, i: usize) -> bool {
        self.neighbours[i].contains(&NO_NEIGHBOUR)
    }
}

fn vertices_of_edge(
    tri_vertices: &[[u32; 3]],
    cell: usize,
    k: usize,
    vertices: &[DVec2],
) -> (DVec2, DVec2) {
    let tri = tri_vertices[cell];
    (
        vertices[tri[k] as usize],
        vertices[tri[(k + 1) % 3] as usize],
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 两个三角形组成的单位正方形
    fn two_triangle_square() -> TriMesh {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(1.0, 1.0),
            DVec2::new(0.0, 1.0),
        ];
        let tris = vec![[0, 1, 2], [0, 2, 3]];
        TriMesh::new(vertices, tris).unwrap()
    }

    #[test]
    fn test_basic_geometry() {
        let mesh = two_triangle_square();
        assert_eq!(mesh.n_cells(), 2);
        assert!((mesh.total_area() - 1.0).abs() < 1e-14);
        assert!((mesh.areas[0] - 0.5).abs() < 1e-14);
    }

    #[test]
    fn test_neighbours_symmetric() {
        let mesh = two_triangle_square();
        assert!(mesh.neighbours[0].contains(&1));
        assert!(mesh.neighbours[1].contains(&0));
        // 每个三角形各有两条边界边
        let n_bnd0 = mesh.neighbours[0]
            .iter()
            .filter(|&&n| n == NO_NEIGHBOUR)
            .count();
        assert_eq!(n_bnd0, 2);
    }

    #[test]
    fn test_interior_face_normal() {
        let mesh = two_triangle_square();
        let face = mesh.faces.iter().find(|f| !f.is_boundary()).unwrap();
        // 内部面是对角线 (0,0)-(1,1)，法向垂直于它
        let diag = DVec2::new(1.0, 1.0).normalize();
        assert!(face.normal.dot(diag).abs() < 1e-14);
        assert!((face.length - 2.0_f64.sqrt()).abs() < 1e-14);
        // 法向从 owner 指向 neighbour
        let o = mesh.cell_centers[face.owner as usize];
        let n = mesh.cell_centers[face.neighbour as usize];
        assert!(face.normal.dot(n - o) > 0.0);
    }

    #[test]
    fn test_clockwise_triangle_fixed() {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        // 顺时针给定
        let mesh = TriMesh::new(vertices, vec![[0, 2, 1]]).unwrap();
        assert!(mesh.areas[0] > 0.0);
    }

    #[test]
    fn test_degenerate_triangle_rejected() {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(2.0, 0.0),
        ];
        assert!(TriMesh::new(vertices, vec![[0, 1, 2]]).is_err());
    }

    #[test]
    fn test_volume_average_linear() {
        let mesh = two_triangle_square();
        // 线性函数的单元平均等于形心值
        for i in 0..mesh.n_cells() {
            let avg = mesh.volume_average(i, |p| 2.0 * p.x - 3.0 * p.y + 1.0);
            let c = mesh.cell_centers[i];
            let want = 2.0 * c.x - 3.0 * c.y + 1.0;
            assert!((avg - want).abs() < 1e-14);
        }
    }

    #[test]
    fn test_locate() {
        let mesh = two_triangle_square();
        let p = DVec2::new(0.7, 0.2);
        let i = mesh.locate(p).unwrap();
        let (a, b, c) = mesh.cell_vertices(i);
        let s0 = (b - a).perp_dot(p - a);
        let s1 = (c - b).perp_dot(p - b);
        let s2 = (a - c).perp_dot(p - c);
        assert!(s0 >= 0.0 && s1 >= 0.0 && s2 >= 0.0);
        assert!(mesh.locate(DVec2::new(5.0, 5.0)).is_none());
    }

    #[test]
    fn test_char_length_is_circumradius() {
        let vertices = vec![
            DVec2::new(0.0, 0.0),
            DVec2::new(1.0, 0.0),
            DVec2::new(0.0, 1.0),
        ];
        let mesh = TriMesh::new(vertices, vec![[0, 1, 2]]).unwrap();
        // 直角三角形的外接圆半径是斜边的一半
        let want = 0.5 * 2.0_f64.sqrt();
        assert!((mesh.char_length[0] - want).abs() < 1e-14);
    }
}

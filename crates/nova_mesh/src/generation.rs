// crates/nova_mesh/src/generation.rs

//! 结构化网格生成
//!
//! 生成测试与 CLI 演示用的单位正方形三角网格。把 [0,1]² 划分为
//! n×n 个方格，每个方格沿对角线剖成两个三角形；对角线方向按
//! 奇偶棋盘交替，避免网格方向性偏差。

use glam::DVec2;
use nova_foundation::{ensure, NovaError, NovaResult};

use crate::frozen::TriMesh;

/// 生成 n×n 的单位正方形三角网格（2n² 个单元）
pub fn unit_square(n: usize) -> NovaResult<TriMesh> {
    ensure!(n >= 1, NovaError::config("网格分辨率必须 >= 1"));

    let np = n + 1;
    let h = 1.0 / n as f64;

    let mut vertices = Vec::with_capacity(np * np);
    for j in 0..np {
        for i in 0..np {
            vertices.push(DVec2::new(i as f64 * h, j as f64 * h));
        }
    }

    let vid = |i: usize, j: usize| (j * np + i) as u32;

    let mut tris = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let bl = vid(i, j);
            let br = vid(i + 1, j);
            let tr = vid(i + 1, j + 1);
            let tl = vid(i, j + 1);
            if (i + j) % 2 == 0 {
                tris.push([bl, br, tr]);
                tris.push([bl, tr, tl]);
            } else {
                tris.push([bl, br, tl]);
                tris.push([br, tr, tl]);
            }
        }
    }

    TriMesh::new(vertices, tris)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mesh = unit_square(4).unwrap();
        assert_eq!(mesh.n_cells(), 32);
        assert_eq!(mesh.n_vertices, 25);
    }

    #[test]
    fn test_total_area() {
        for n in [1, 3, 8] {
            let mesh = unit_square(n).unwrap();
            assert!(
                (mesh.total_area() - 1.0).abs() < 1e-12,
                "n={n} 总面积 {}",
                mesh.total_area()
            );
        }
    }

    #[test]
    fn test_interior_cell_has_three_neighbours() {
        let mesh = unit_square(4).unwrap();
        let interior = (0..mesh.n_cells())
            .filter(|&i| !mesh.is_boundary_cell(i))
            .count();
        assert!(interior > 0);
        // 边界面数 = 4n
        let n_bnd = mesh.faces.iter().filter(|f| f.is_boundary()).count();
        assert_eq!(n_bnd, 16);
    }

    #[test]
    fn test_zero_resolution_rejected() {
        assert!(unit_square(0).is_err());
    }
}

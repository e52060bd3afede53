// crates/nova_mesh/src/quadrature.rs

//! 求积规则
//!
//! 参考单元上的求积规则，权重均归一化为和为 1，即规则直接给出
//! 单元/线段上的平均值；积分值需再乘以面积或长度。
//!
//! 三角形规则以重心坐标给出，线段规则以 [0,1] 参数给出。
//! 三角形规则的第一个点始终是形心，下游的点缓存依赖这一约定。

use glam::DVec2;
use nova_foundation::{NovaError, NovaResult};

/// 三角形参考求积规则（重心坐标）
#[derive(Debug, Clone, Copy)]
pub struct TriangleRule {
    /// 多项式精确次数
    pub exactness: u8,
    /// 重心坐标点
    pub points: &'static [[f64; 3]],
    /// 权重（和为 1）
    pub weights: &'static [f64],
}

// ============================================================================
// 三角形规则表
// ============================================================================

const TRI_DEG1_POINTS: [[f64; 3]; 1] = [[1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0]];
const TRI_DEG1_WEIGHTS: [f64; 1] = [1.0];

const TRI_DEG2_POINTS: [[f64; 3]; 3] = [
    [0.5, 0.5, 0.0],
    [0.0, 0.5, 0.5],
    [0.5, 0.0, 0.5],
];
const TRI_DEG2_WEIGHTS: [f64; 3] = [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0];

const TRI_DEG3_POINTS: [[f64; 3]; 4] = [
    [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
    [0.6, 0.2, 0.2],
    [0.2, 0.6, 0.2],
    [0.2, 0.2, 0.6],
];
const TRI_DEG3_WEIGHTS: [f64; 4] = [-27.0 / 48.0, 25.0 / 48.0, 25.0 / 48.0, 25.0 / 48.0];

// Dunavant 5 阶 7 点规则
const D5_A: f64 = 0.470_142_064_105_115;
const D5_B: f64 = 0.101_286_507_323_456;
const D5_WA: f64 = 0.132_394_152_788_506;
const D5_WB: f64 = 0.125_939_180_544_827;

const TRI_DEG5_POINTS: [[f64; 3]; 7] = [
    [1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0],
    [D5_A, D5_A, 1.0 - 2.0 * D5_A],
    [D5_A, 1.0 - 2.0 * D5_A, D5_A],
    [1.0 - 2.0 * D5_A, D5_A, D5_A],
    [D5_B, D5_B, 1.0 - 2.0 * D5_B],
    [D5_B, 1.0 - 2.0 * D5_B, D5_B],
    [1.0 - 2.0 * D5_B, D5_B, D5_B],
];
const TRI_DEG5_WEIGHTS: [f64; 7] = [
    0.225,
    D5_WA,
    D5_WA,
    D5_WA,
    D5_WB,
    D5_WB,
    D5_WB,
];

/// 按精确次数选择三角形规则
///
/// 支持 1/2/3/5 阶；请求 4 阶时返回 5 阶规则。
pub fn triangle_rule(deg: u8) -> NovaResult<TriangleRule> {
    let rule = match deg {
        0 | 1 => TriangleRule {
            exactness: 1,
            points: &TRI_DEG1_POINTS,
            weights: &TRI_DEG1_WEIGHTS,
        },
        2 => TriangleRule {
            exactness: 2,
            points: &TRI_DEG2_POINTS,
            weights: &TRI_DEG2_WEIGHTS,
        },
        3 => TriangleRule {
            exactness: 3,
            points: &TRI_DEG3_POINTS,
            weights: &TRI_DEG3_WEIGHTS,
        },
        4 | 5 => TriangleRule {
            exactness: 5,
            points: &TRI_DEG5_POINTS,
            weights: &TRI_DEG5_WEIGHTS,
        },
        _ => {
            return Err(NovaError::config(format!(
                "不支持的三角形求积阶数: {deg} (最高 5)"
            )))
        }
    };
    Ok(rule)
}

/// 将重心坐标规则落到物理三角形上，返回物理求积点
pub fn denormalize_triangle(rule: &TriangleRule, a: DVec2, b: DVec2, c: DVec2) -> Vec<DVec2> {
    rule.points
        .iter()
        .map(|bc| a * bc[0] + b * bc[1] + c * bc[2])
        .collect()
}

// ============================================================================
// 线段规则（Gauss-Legendre，参数化到 [0,1]）
// ============================================================================

/// 线段参考求积规则
#[derive(Debug, Clone, Copy)]
pub struct EdgeRule {
    /// 多项式精确次数
    pub exactness: u8,
    /// [0,1] 上的参数
    pub points: &'static [f64],
    /// 权重（和为 1）
    pub weights: &'static [f64],
}

// sqrt(3/5) 的预计算值
const GL3_T: f64 = 0.774_596_669_241_483;

const EDGE_GL3_POINTS: [f64; 3] = [0.5 * (1.0 - GL3_T), 0.5, 0.5 * (1.0 + GL3_T)];
const EDGE_GL3_WEIGHTS: [f64; 3] = [5.0 / 18.0, 8.0 / 18.0, 5.0 / 18.0];

/// 3 点 Gauss-Legendre 线段规则（5 阶精确）
pub fn edge_rule() -> EdgeRule {
    EdgeRule {
        exactness: 5,
        points: &EDGE_GL3_POINTS,
        weights: &EDGE_GL3_WEIGHTS,
    }
}

/// 将线段规则落到物理边上
pub fn denormalize_edge(rule: &EdgeRule, a: DVec2, b: DVec2) -> Vec<DVec2> {
    rule.points.iter().map(|&t| a + (b - a) * t).collect()
}

/// 按规则求函数在三角形上的平均值
pub fn average_on_triangle<F>(rule: &TriangleRule, a: DVec2, b: DVec2, c: DVec2, f: F) -> f64
where
    F: Fn(DVec2) -> f64,
{
    rule.points
        .iter()
        .zip(rule.weights)
        .map(|(bc, &w)| w * f(a * bc[0] + b * bc[1] + c * bc[2]))
        .sum()
}

// crates/nova_physics/src/reconstruction/config.rs

//! 重构配置
//!
//! serde 反序列化的配置面，带字段级默认值。`validate` 在构造任何
//! 算子之前执行，配置错误一律致命。

use serde::{Deserialize, Serialize};

use nova_foundation::{ensure, NovaError, NovaResult};

use super::poly::MAX_DEGREE;
use super::stencil::StencilBias;
use super::stencil_family::StencilFamilyParams;
use super::weno::{HybridizeMode, WenoParams};

/// 良平衡模式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellBalancing {
    /// 等熵平衡态背景
    Isentropic,
    /// 朴素模式：零背景
    Naive,
}

/// 重构配置
///
/// `orders`/`biases`/`overfit_factors`/`linear_weights` 是平行数组，
/// 每个条目描述一个模板；`"c"` 为中心模板，`"b"` 为单侧模板，
/// 第 k 个 `"b"` 条目对应第 k 条边。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReconstructionConfig {
    /// 每个模板请求的阶数
    pub orders: Vec<usize>,
    /// 模板偏向（"c" / "b"）
    pub biases: Vec<String>,
    /// 过拟合系数
    pub overfit_factors: Vec<f64>,
    /// 线性权重
    pub linear_weights: Vec<f64>,
    /// 光滑度正则化量
    pub epsilon: f64,
    /// 光滑度指数
    pub exponent: i32,
    /// 杂交模式
    pub mode: HybridizeMode,
    /// 良平衡模式
    pub well_balancing: WellBalancing,
    /// 背景重算的步数间隔（0 表示每次都重算）
    pub steps_per_recompute: usize,
    /// 背景漂移的重算阈值（无量纲）
    pub recompute_threshold: f64,
}

impl Default for ReconstructionConfig {
    fn default() -> Self {
        Self {
            orders: vec![3, 2, 2, 2],
            biases: vec!["c".into(), "b".into(), "b".into(), "b".into()],
            overfit_factors: vec![2.0; 4],
            linear_weights: vec![100.0, 1.0, 1.0, 1.0],
            epsilon: 1e-10,
            exponent: 4,
            mode: HybridizeMode::CwenoAo,
            well_balancing: WellBalancing::Isentropic,
            steps_per_recompute: 0,
            recompute_threshold: 0.0,
        }
    }
}

impl ReconstructionConfig {
    /// 校验配置并解析偏向字符串
    pub fn validate(&self) -> NovaResult<StencilFamilyParams> {
        let n = self.orders.len();
        ensure!(n > 0, NovaError::config("至少需要一个模板"));
        NovaError::check_size("biases", n, self.biases.len())?;
        NovaError::check_size("overfit_factors", n, self.overfit_factors.len())?;
        NovaError::check_size("linear_weights", n, self.linear_weights.len())?;

        for &o in &self.orders {
            ensure!(
                (1..=MAX_DEGREE + 1).contains(&o),
                NovaError::config(format!("阶数 {o} 超出支持范围 1..={}", MAX_DEGREE + 1))
            );
        }
        for &f in &self.overfit_factors {
            ensure!(
                f >= 1.0,
                NovaError::config(format!("过拟合系数 {f} 必须 >= 1"))
            );
        }
        ensure!(self.epsilon > 0.0, NovaError::config("epsilon 必须为正"));
        ensure!(self.exponent >= 1, NovaError::config("exponent 必须 >= 1"));

        let mut biases = Vec::with_capacity(n);
        let mut n_one_sided = 0;
        for b in &self.biases {
            match b.as_str() {
                "c" => biases.push(StencilBias::Central),
                "b" => {
                    ensure!(
                        n_one_sided < 3,
                        NovaError::config("单侧模板最多 3 个（每条边一个）")
                    );
                    biases.push(StencilBias::OneSided(n_one_sided));
                    n_one_sided += 1;
                }
                other => {
                    return Err(NovaError::config(format!(
                        "未知的模板偏向 \"{other}\" (支持 \"c\" / \"b\")"
                    )))
                }
            }
        }

        Ok(StencilFamilyParams {
            orders: self.orders.clone(),
            biases,
            overfit_factors: self.overfit_factors.clone(),
        })
    }

    /// 组装 WENO 参数（含校验）
    pub fn weno_params(&self) -> NovaResult<WenoParams> {
        let family = self.validate()?;
        Ok(WenoParams {
            family,
            linear_weights: self.linear_weights.clone(),
            epsilon: self.epsilon,
            exponent: self.exponent,
            mode: self.mode,
        })
    }
}

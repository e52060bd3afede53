// crates/nova_foundation/src/lib.rs

//! NovaHydro Foundation Layer
//!
//! 零物理依赖的基础层，提供整个项目共用的基础抽象。
//!
//! # 模块概览
//!
//! - [`error`]: 统一错误类型 `NovaError` / `NovaResult`
//! - [`tolerance`]: 集中管理的数值容差常量
//!
//! # 设计原则
//!
//! 1. **层次化**: 基础层不引用网格或物理概念，上层通过带消息的变体复用
//! 2. **最小依赖**: 仅依赖 thiserror
//! 3. **可追溯**: 错误信息携带足够的上下文（字段名、期望值、实际值）

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod tolerance;

pub use error::{NovaError, NovaResult};

/// Prelude 模块，包含常用类型
pub mod prelude {
    pub use crate::error::{NovaError, NovaResult};
    pub use crate::{ensure, require};
}

/// 条件不满足时提前返回错误
///
/// # 示例
///
/// ```
/// use nova_foundation::{ensure, NovaError, NovaResult};
///
/// fn check(value: f64) -> NovaResult<()> {
///     ensure!(value > 0.0, NovaError::invalid_input("值必须为正"));
///     Ok(())
/// }
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $err:expr) => {
        if !($cond) {
            return Err($err);
        }
    };
}

/// 从 `Option` 取值，`None` 时提前返回错误
#[macro_export]
macro_rules! require {
    ($opt:expr, $err:expr) => {
        match $opt {
            Some(v) => v,
            None => return Err($err),
        }
    };
}

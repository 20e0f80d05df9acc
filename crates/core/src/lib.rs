//! # fundwatch-core
//!
//! 行情看板状态引擎的领域层：实体、端口 (Trait) 契约、错误类型与配置。
//! 其他 crate 只依赖这里的抽象，具体实现由 app 注入。

pub mod common;
pub mod config;
pub mod market;
pub mod notify;
pub mod view;

#[cfg(feature = "test-utils")]
pub mod test_utils;

//! # fundwatch-series
//!
//! 每个标的的有界滚动窗口，以及统一负责快照重建、增量追加、校验与淘汰的 `SeriesStore`。

pub mod buffer;
pub mod store;
pub mod window;

use crate::buffer::RollingBuffer;
use fundwatch_core::market::entity::SeriesPoint;

/// # Summary
/// 单个标的的有界滚动历史 (时间, 涨跌幅)。
///
/// # Invariants
/// - 时间序列与数值序列等长，由内部以点对存储保证。
/// - 长度不超过容量，超出时淘汰最旧的点。
/// - 只能由 `SeriesStore` 修改。
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesWindow {
    points: RollingBuffer<SeriesPoint>,
}

impl SeriesWindow {
    pub(crate) fn from_points(points: Vec<SeriesPoint>, capacity: usize) -> Self {
        Self {
            points: RollingBuffer::from_tail(points, capacity),
        }
    }

    pub(crate) fn push(&mut self, point: SeriesPoint) -> Option<SeriesPoint> {
        self.points.push(point)
    }

    /// 时间轴 (按到达顺序)。
    pub fn times(&self) -> Vec<String> {
        self.points.iter().map(|p| p.time.clone()).collect()
    }

    /// 涨跌幅序列 (与 `times` 一一对应)。
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    pub fn points(&self) -> Vec<SeriesPoint> {
        self.points.to_vec()
    }

    pub fn last(&self) -> Option<&SeriesPoint> {
        self.points.last()
    }

    pub fn first(&self) -> Option<&SeriesPoint> {
        self.points.first()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// # Summary
/// 固定容量的滚动环形缓冲区。
///
/// # Invariants
/// - 内存空间在初始化时一次性分配，后续不再扩容。
/// - 始终保持最近 N 个元素，超出容量时淘汰最旧的元素 (FIFO)。
#[derive(Debug, Clone, PartialEq)]
pub struct RollingBuffer<T> {
    // 内部存储容器
    data: Vec<T>,
    // 最大容量
    capacity: usize,
    // 已满时下一个被覆盖的位置，即最旧元素的索引
    cursor: usize,
}

impl<T: Clone> RollingBuffer<T> {
    /// # Summary
    /// 创建一个新的滚动缓冲区。
    ///
    /// # Arguments
    /// * `capacity`: 固定容量上限，为 0 时缓冲区不保留任何元素。
    ///
    /// # Returns
    /// 初始化后的 RollingBuffer 实例。
    pub fn new(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            capacity,
            cursor: 0,
        }
    }

    /// # Summary
    /// 用一段有序序列的尾部构造缓冲区。
    ///
    /// # Logic
    /// 超出容量时只保留最后 `capacity` 个元素。
    ///
    /// # Arguments
    /// * `items`: 按时间先后排列的元素。
    /// * `capacity`: 固定容量上限。
    ///
    /// # Returns
    /// 填充后的 RollingBuffer 实例。
    pub fn from_tail(items: Vec<T>, capacity: usize) -> Self {
        let skip = items.len().saturating_sub(capacity);
        let mut buffer = Self::new(capacity);
        buffer.data.extend(items.into_iter().skip(skip));
        buffer
    }

    /// # Summary
    /// 向缓冲区推送新元素。
    ///
    /// # Logic
    /// 1. 若未满，则直接 push。
    /// 2. 若已满，则覆盖 cursor 处的最旧元素，并递增（取模）cursor。
    ///
    /// # Arguments
    /// * `item`: 待插入的元素。
    ///
    /// # Returns
    /// 被淘汰的最旧元素；容量为 0 时返回传入的元素本身。
    pub fn push(&mut self, item: T) -> Option<T> {
        if self.capacity == 0 {
            return Some(item);
        }
        if self.data.len() < self.capacity {
            self.data.push(item);
            None
        } else {
            let evicted = std::mem::replace(&mut self.data[self.cursor], item);
            self.cursor = (self.cursor + 1) % self.capacity;
            Some(evicted)
        }
    }

    /// # Summary
    /// 获取缓冲区中的最后一个元素（最新插入的）。
    ///
    /// # Logic
    /// 1. 若未满，返回 Vec 的最后一个。
    /// 2. 若已满，返回 cursor 前一个位置的元素。
    pub fn last(&self) -> Option<&T> {
        if self.data.len() < self.capacity || self.cursor == 0 {
            self.data.last()
        } else {
            self.data.get(self.cursor - 1)
        }
    }

    /// 最旧的元素。
    pub fn first(&self) -> Option<&T> {
        self.data.get(self.cursor)
    }

    /// 按插入顺序遍历。
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        let (newer, older) = self.data.split_at(self.cursor);
        older.iter().chain(newer.iter())
    }

    /// # Summary
    /// 获取按插入顺序排序的完整数据列表。
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

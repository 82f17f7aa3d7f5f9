//! # 容器与容器清单
//!
//! ## 角色定位（Why）
//! - 容器是宿主平台提供的 Cookie/存储隔离分区，由不透明的 `partition id` 标识；
//! - 清单只是宿主状态的镜像，从不具备权威性：每次创建/删除/重命名通知后都要整体重建。
//!
//! ## 契约（What）
//! - [`ContainerRegistry`] 构造后不可变，仓储通过整体替换 `Arc<ContainerRegistry>` 完成刷新；
//! - 默认分区（`"No Container"`）永远存在，且总是第一个写入的条目。

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// 默认分区的用户可见名称。
pub const DEFAULT_CONTAINER_NAME: &str = "No Container";

const DEFAULT_PARTITION_TEXT: &str = "firefox-default";

/// 宿主分配的不透明分区标识。
///
/// 内部使用 `Arc<str>`，在清单、去重表与宿主请求之间克隆时只增加引用计数。
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PartitionId(Arc<str>);

impl PartitionId {
    /// 以任意字符串构造分区标识。
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// 默认分区的保留标识。
    pub fn default_partition() -> Self {
        Self(Arc::from(DEFAULT_PARTITION_TEXT))
    }

    /// 是否为默认分区。
    pub fn is_default(&self) -> bool {
        &*self.0 == DEFAULT_PARTITION_TEXT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PartitionId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// 宿主清单中的一个容器。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Container {
    /// 用户可见且唯一的名称。
    pub name: String,
    /// 宿主分配的分区标识。
    pub partition: PartitionId,
}

impl Container {
    pub fn new(name: impl Into<String>, partition: impl Into<PartitionId>) -> Self {
        Self {
            name: name.into(),
            partition: partition.into(),
        }
    }

    /// 合成的默认分区条目。
    pub fn default_partition() -> Self {
        Self {
            name: DEFAULT_CONTAINER_NAME.to_owned(),
            partition: PartitionId::default_partition(),
        }
    }
}

/// `ContainerRegistry` 维护 `名称 ↔ 分区标识` 的双向映射。
///
/// # 教案式说明
/// - **意图 (Why)**：导航拦截器需要从标签页的分区标识反查当前容器名，规则求值结果又需要从
///   容器名找回分区标识以打开新标签页，两个方向都必须是 O(1) 查询；
/// - **契约 (What)**：
///   - 构造时先写入默认分区，再按顺序写入动态条目；
///   - 同名或同分区的后写条目覆盖先写条目，与宿主枚举顺序保持一致；
///   - 构造完成后只读，可经 `Arc` 在并发读者之间共享；
/// - **风险 (Trade-offs)**：宿主若返回与默认分区同名的容器，会覆盖默认名称的反查结果，
///   这种清单本身就是宿主侧的配置错误，此处不做纠正。
#[derive(Clone, Debug)]
pub struct ContainerRegistry {
    entries: Vec<Container>,
    by_name: HashMap<String, PartitionId>,
    by_partition: HashMap<PartitionId, String>,
}

impl ContainerRegistry {
    /// 以宿主枚举结果构建清单，默认分区总是最先写入。
    pub fn from_containers<I>(containers: I) -> Self
    where
        I: IntoIterator<Item = Container>,
    {
        let mut registry = Self {
            entries: Vec::new(),
            by_name: HashMap::new(),
            by_partition: HashMap::new(),
        };
        registry.insert(Container::default_partition());
        for container in containers {
            registry.insert(container);
        }
        registry
    }

    fn insert(&mut self, container: Container) {
        self.by_name
            .insert(container.name.clone(), container.partition.clone());
        self.by_partition
            .insert(container.partition.clone(), container.name.clone());
        self.entries.push(container);
    }

    /// 按分区标识反查容器名。
    pub fn name_of(&self, partition: &PartitionId) -> Option<&str> {
        self.by_partition.get(partition).map(String::as_str)
    }

    /// 按容器名查找分区标识。
    pub fn partition_of(&self, name: &str) -> Option<&PartitionId> {
        self.by_name.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// 名称是否指向默认分区。
    pub fn is_default_name(name: &str) -> bool {
        name == DEFAULT_CONTAINER_NAME
    }

    /// 条目数量，包含默认分区。
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// 清单至少包含默认分区，因此永不为空。
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// 按写入顺序遍历条目。
    pub fn iter(&self) -> impl Iterator<Item = &Container> {
        self.entries.iter()
    }
}

impl Default for ContainerRegistry {
    fn default() -> Self {
        Self::from_containers(std::iter::empty())
    }
}

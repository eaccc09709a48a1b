//! 键值存储与"最近选择"快照。
//!
//! 页面之间只通过查询参数和这里的存储交换状态。播放进度写入持久存储，
//! 最近选择的剧集写入会话存储，二者都是后写覆盖先写。

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::{
    error::{CatalogError, Result},
    model::catalog::CatalogItem,
    normalize::identifier,
};

/// 同步的字符串键值存储。
pub trait KeyValueStore: Send + Sync {
    /// 读取一个键。
    fn get(&self, key: &str) -> Option<String>;
    /// 写入一个键，覆盖旧值。
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// 删除一个键。
    fn remove(&self, key: &str) -> Result<()>;
}

/// 进程内的存储，进程结束后丢失。相当于浏览器的会话存储。
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: Arc<DashMap<String, String>>,
}

impl MemoryStore {
    /// 创建空存储。
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// 以单个 JSON 文件保存的持久存储。每次写入都会整体落盘。
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: DashMap<String, String>,
}

impl FileStore {
    /// 打开（或新建）指定路径的存储文件。
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let entries = DashMap::new();

        match fs::read_to_string(&path) {
            Ok(content) if !content.trim().is_empty() => {
                let saved: BTreeMap<String, String> = serde_json::from_str(&content)?;
                for (key, value) in saved {
                    entries.insert(key, value);
                }
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("[Storage] {:?} 不存在，将在首次写入时创建。", path);
            }
            Err(e) => return Err(e.into()),
        }

        Ok(Self { path, entries })
    }

    /// 打开用户数据目录下的 `drama-catalog/<name>.json`。
    pub fn in_data_dir(name: &str) -> Result<Self> {
        let mut dir = dirs::data_dir()
            .ok_or_else(|| CatalogError::Storage("无法找到用户数据目录".to_string()))?;
        dir.push("drama-catalog");
        fs::create_dir_all(&dir)?;
        dir.push(format!("{name}.json"));
        Self::open(dir)
    }

    fn persist(&self) -> Result<()> {
        let snapshot: BTreeMap<String, String> = self
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        fs::write(&self.path, serde_json::to_string_pretty(&snapshot)?)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.persist()
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.entries.remove(key).is_some() {
            self.persist()?;
        }
        Ok(())
    }
}

/// 浏览器的 `localStorage` / `sessionStorage`。
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebStorage {
    /// `window.localStorage`，用于播放进度。
    Local,
    /// `window.sessionStorage`，用于最近选择。
    Session,
}

#[cfg(target_arch = "wasm32")]
impl WebStorage {
    fn storage(self) -> Result<web_sys::Storage> {
        let window =
            web_sys::window().ok_or_else(|| CatalogError::Storage("没有 window 对象".to_string()))?;
        let storage = match self {
            WebStorage::Local => window.local_storage(),
            WebStorage::Session => window.session_storage(),
        };
        storage
            .ok()
            .flatten()
            .ok_or_else(|| CatalogError::Storage(format!("{self:?} 存储不可用")))
    }
}

// web_sys::Storage 不是 Send，这里每次调用都重新获取，不跨线程持有。
#[cfg(target_arch = "wasm32")]
impl KeyValueStore for WebStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.storage().ok()?.get_item(key).ok().flatten()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.storage()?
            .set_item(key, value)
            .map_err(|e| CatalogError::Storage(format!("写入 {key} 失败: {e:?}")))
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.storage()?
            .remove_item(key)
            .map_err(|e| CatalogError::Storage(format!("删除 {key} 失败: {e:?}")))
    }
}

/// 最近选择快照在会话存储中的键。
pub const SELECTION_KEY: &str = "selectedDrama";

/// 最近一次选择（或成功加载）的剧集快照。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionSnapshot {
    /// 条目本身。
    pub item: CatalogItem,
    /// 归一化后的 ID。
    pub id: Option<String>,
    /// 保存时间。
    pub saved_at: DateTime<Utc>,
}

/// 读写 [`SelectionSnapshot`]。
#[derive(Clone)]
pub struct SelectionCache {
    store: Arc<dyn KeyValueStore>,
}

impl SelectionCache {
    /// 基于给定的存储创建。
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 保存快照，覆盖旧值。写入失败只记录日志。
    pub fn save(&self, item: &CatalogItem) {
        let snapshot = SelectionSnapshot {
            id: item.id.as_deref().and_then(identifier::normalize_str),
            item: item.clone(),
            saved_at: Utc::now(),
        };

        let result = serde_json::to_string(&snapshot)
            .map_err(CatalogError::from)
            .and_then(|json| self.store.set(SELECTION_KEY, &json));
        if let Err(e) = result {
            tracing::warn!("[Storage] 保存最近选择失败: {}", e);
        }
    }

    /// 读取快照。不存在或无法解析时返回 `None`。
    pub fn load(&self) -> Option<SelectionSnapshot> {
        let raw = self.store.get(SELECTION_KEY)?;
        match serde_json::from_str(&raw) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("[Storage] 最近选择的快照已损坏: {}", e);
                None
            }
        }
    }

    /// 清除快照。
    pub fn clear(&self) -> Result<()> {
        self.store.remove(SELECTION_KEY)
    }
}

//! 会话存储：为同一会话键下的多次调用提供撰写上下文的延续
//!
//! 核心只通过 [`SessionStore::get_or_create`] 访问会话，不负责加锁协调。
//! 同一会话键的并发调用可能交错写入草稿记录，这是已知限制。
//! [`InMemorySessionStore`] 有容量上限，超出时淘汰最久未使用的会话。

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

/// 未提供会话键时使用的默认键
pub const DEFAULT_SESSION_KEY: &str = "energy_session";

/// 每个会话保留的最大草稿数
const MAX_DRAFTS_PER_SESSION: usize = 16;

/// 进程内存储默认保留的会话数
pub const DEFAULT_MAX_SESSIONS: usize = 1024;

/// 一次撰写阶段的产出记录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionDraft {
    pub topic: String,
    pub document: String,
    pub iteration: u32,
    pub recorded_at: DateTime<Utc>,
}

/// 会话元数据
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMetadata {
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub access_count: u64,
    pub total_size: usize,
}

impl Default for SessionMetadata {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionMetadata {
    pub fn new() -> Self {
        Self {
            created_at: Utc::now(),
            last_updated: Utc::now(),
            access_count: 0,
            total_size: 0,
        }
    }
}

#[derive(Debug, Default)]
struct SessionMemory {
    drafts: Vec<SessionDraft>,
    metadata: SessionMetadata,
}

/// 单个会话的执行上下文
#[derive(Debug)]
pub struct SessionContext {
    key: String,
    memory: RwLock<SessionMemory>,
}

impl SessionContext {
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            memory: RwLock::new(SessionMemory::default()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// 记录一次撰写结果，超出上限时丢弃最旧的记录
    pub async fn record_draft(&self, topic: &str, document: &str, iteration: u32) {
        let mut memory = self.memory.write().await;
        memory.drafts.push(SessionDraft {
            topic: topic.to_string(),
            document: document.to_string(),
            iteration,
            recorded_at: Utc::now(),
        });
        if memory.drafts.len() > MAX_DRAFTS_PER_SESSION {
            let overflow = memory.drafts.len() - MAX_DRAFTS_PER_SESSION;
            memory.drafts.drain(..overflow);
        }
        memory.metadata.total_size = memory.drafts.iter().map(|d| d.document.len()).sum();
        memory.metadata.last_updated = Utc::now();
    }

    /// 最近的若干条草稿，按时间从旧到新
    pub async fn recent_drafts(&self, limit: usize) -> Vec<SessionDraft> {
        let mut memory = self.memory.write().await;
        memory.metadata.access_count += 1;
        let skip = memory.drafts.len().saturating_sub(limit);
        memory.drafts[skip..].to_vec()
    }

    pub async fn draft_count(&self) -> usize {
        self.memory.read().await.drafts.len()
    }

    pub async fn metadata(&self) -> SessionMetadata {
        self.memory.read().await.metadata.clone()
    }
}

/// 会话存储
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// 按键恢复会话，不存在时新建
    async fn get_or_create(&self, session_key: &str) -> Arc<SessionContext>;
}

/// 进程内会话存储，按最近使用顺序淘汰
pub struct InMemorySessionStore {
    sessions: Mutex<SessionTable>,
    capacity: usize,
}

#[derive(Default)]
struct SessionTable {
    entries: HashMap<String, StoredSession>,
    clock: u64,
}

struct StoredSession {
    context: Arc<SessionContext>,
    last_access: u64,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_MAX_SESSIONS)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            sessions: Mutex::new(SessionTable::default()),
            capacity: capacity.max(1),
        }
    }

    pub async fn len(&self) -> usize {
        self.sessions.lock().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.lock().await.entries.is_empty()
    }

    pub async fn contains(&self, session_key: &str) -> bool {
        self.sessions.lock().await.entries.contains_key(session_key)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get_or_create(&self, session_key: &str) -> Arc<SessionContext> {
        let mut table = self.sessions.lock().await;
        table.clock += 1;
        let now = table.clock;

        if let Some(stored) = table.entries.get_mut(session_key) {
            stored.last_access = now;
            return stored.context.clone();
        }

        let context = Arc::new(SessionContext::new(session_key));
        table.entries.insert(
            session_key.to_string(),
            StoredSession {
                context: context.clone(),
                last_access: now,
            },
        );

        if table.entries.len() > self.capacity {
            let oldest = table
                .entries
                .iter()
                .min_by_key(|(_, stored)| stored.last_access)
                .map(|(key, _)| key.clone());
            if let Some(key) = oldest {
                table.entries.remove(&key);
                tracing::debug!(session = %key, "🧹 淘汰最久未使用的会话");
            }
        }

        context
    }
}

//! 数据快照持久化
//!
//! 将内存中的数据表保存到本地 JSON 文件，以便服务重启后恢复

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

use crate::config::env::constants::SNAPSHOT_FILE_NAME;

use super::store::Tables;

/// 当前快照格式版本
const SNAPSHOT_VERSION: u32 = 1;

/// 快照文件内容
#[derive(Debug, Serialize, Deserialize)]
struct Snapshot {
    /// 版本号（用于未来格式升级）
    version: u32,
    /// 保存时间
    saved_at: DateTime<Utc>,
    /// 数据表
    tables: Tables,
}

/// 快照文件
#[derive(Clone, Debug)]
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    /// 在数据目录下使用默认文件名
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(SNAPSHOT_FILE_NAME),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 加载快照
    ///
    /// 文件不存在、无法读取或格式不兼容时返回 None
    pub async fn load(&self) -> Option<Tables> {
        if !fs::try_exists(&self.path).await.unwrap_or(false) {
            return None;
        }

        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "Failed to read snapshot file");
                return None;
            }
        };

        match serde_json::from_str::<Snapshot>(&content) {
            Ok(snapshot) if snapshot.version == SNAPSHOT_VERSION => {
                info!(
                    path = %self.path.display(),
                    users = snapshot.tables.users.len(),
                    workouts = snapshot.tables.workouts.len(),
                    saved_at = %snapshot.saved_at,
                    "Loaded data snapshot"
                );
                Some(snapshot.tables)
            }
            Ok(snapshot) => {
                warn!(
                    path = %self.path.display(),
                    version = snapshot.version,
                    "Unsupported snapshot version, ignoring"
                );
                None
            }
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Failed to parse snapshot, ignoring"
                );
                None
            }
        }
    }

    /// 序列化数据表
    pub fn encode(tables: &Tables) -> anyhow::Result<Vec<u8>> {
        let snapshot = SnapshotRef {
            version: SNAPSHOT_VERSION,
            saved_at: Utc::now(),
            tables,
        };
        Ok(serde_json::to_vec(&snapshot)?)
    }

    /// 写入已序列化的快照（原子写入）
    pub async fn write(&self, content: &[u8]) -> anyhow::Result<()> {
        let temp_path = self.path.with_extension("json.tmp");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).await?;
        }

        // 写入临时文件后重命名
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!(path = %self.path.display(), bytes = content.len(), "Saved data snapshot");
        Ok(())
    }

    /// 保存快照
    pub async fn save(&self, tables: &Tables) -> anyhow::Result<()> {
        let content = Self::encode(tables)?;
        self.write(&content).await
    }
}

/// 序列化用的借用视图，避免复制整张表
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    saved_at: DateTime<Utc>,
    tables: &'a Tables,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Muscle;

    #[tokio::test]
    async fn test_save_and_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::in_dir(dir.path());
        assert!(file.load().await.is_none());

        let mut tables = Tables::default();
        tables.muscles.insert(
            1,
            Muscle {
                muscle_id: 1,
                muscle_name: "Quadriceps".into(),
                muscle_group: "Legs".into(),
            },
        );
        tables.seeded = true;
        file.save(&tables).await.unwrap();

        let loaded = file.load().await.unwrap();
        assert!(loaded.seeded);
        assert_eq!(loaded.muscles[&1].muscle_name, "Quadriceps");
        assert!(!file.path().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_corrupt_snapshot_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let file = SnapshotFile::in_dir(dir.path());
        tokio::fs::write(file.path(), "{ not json").await.unwrap();
        assert!(file.load().await.is_none());
    }
}

use crate::auth::{TokenService, UserStore};
use crate::config::ServerConfig;
use crate::services::{RegisterService, TaskService};
use crate::storage::{JsonStore, LegacyImport};
use chrono::{DateTime, Utc};
use error_common::Result;
use mydesk_sync::{AttendanceMap, Profile, RegisterKind};
use std::sync::Arc;
use tracing::info;

/// Office list written on first start
pub const DEFAULT_OFFICES: [&str; 3] = ["General Administration", "Accounts Section", "HR Department"];

/// Main My Desk server state
#[derive(Clone)]
pub struct DeskServer {
    /// Server configuration
    pub config: Arc<ServerConfig>,
    /// Session token signing and validation
    pub tokens: Arc<TokenService>,
    pub users: Arc<UserStore>,
    pub inward: Arc<RegisterService>,
    pub outward: Arc<RegisterService>,
    /// Date (`YYYY-MM-DD`) to attendance record
    pub attendance: Arc<JsonStore<AttendanceMap>>,
    pub tasks: Arc<TaskService>,
    pub profile: Arc<JsonStore<Profile>>,
    pub offices: Arc<JsonStore<Vec<String>>>,
    pub started_at: DateTime<Utc>,
}

impl DeskServer {
    /// Open every collection under the configured directories, seeding
    /// missing files
    pub async fn new(config: ServerConfig) -> Result<Self> {
        let data_dir = config.data_dir.clone();
        tokio::fs::create_dir_all(&data_dir).await?;

        if let Some(legacy_dir) = &config.legacy_base_dir {
            let import = LegacyImport::new(legacy_dir, config.cleanup_legacy);
            import.run(RegisterKind::Inward, &config.inward_dir()).await;
            import.run(RegisterKind::Outward, &config.outward_dir()).await;
        }

        let inward = RegisterService::open(RegisterKind::Inward, config.inward_dir()).await?;
        let outward = RegisterService::open(RegisterKind::Outward, config.outward_dir()).await?;
        let seed_offices: Vec<String> = DEFAULT_OFFICES.iter().map(|o| (*o).to_string()).collect();

        let server = Self {
            tokens: Arc::new(TokenService::new(&config.jwt_secret, config.token_ttl_hours)),
            users: Arc::new(UserStore::open(data_dir.join("users.json")).await?),
            inward: Arc::new(inward),
            outward: Arc::new(outward),
            attendance: Arc::new(JsonStore::open(data_dir.join("attendance.json"), AttendanceMap::new()).await?),
            tasks: Arc::new(TaskService::open(data_dir.join("tasks.json")).await?),
            profile: Arc::new(JsonStore::open(data_dir.join("profile.json"), Profile::default()).await?),
            offices: Arc::new(JsonStore::open(data_dir.join("offices.json"), seed_offices).await?),
            started_at: Utc::now(),
            config: Arc::new(config),
        };

        info!(
            data_dir = %server.config.data_dir.display(),
            inward_dir = %server.config.inward_dir().display(),
            outward_dir = %server.config.outward_dir().display(),
            "Collections ready"
        );
        Ok(server)
    }

    pub fn register(&self, kind: RegisterKind) -> &RegisterService {
        match kind {
            RegisterKind::Inward => &self.inward,
            RegisterKind::Outward => &self.outward,
        }
    }

    pub fn uptime_seconds(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_first_start_seeds_collections() {
        let dir = TempDir::new().unwrap();
        let server = DeskServer::new(ServerConfig::with_data_dir(dir.path())).await.unwrap();

        assert_eq!(server.offices.load().await.unwrap(), DEFAULT_OFFICES.to_vec());
        assert!(server.attendance.load().await.unwrap().is_empty());
        assert!(server.register(RegisterKind::Outward).list().await.unwrap().is_empty());
        for file in ["users.json", "tasks.json", "profile.json", "inward/inward.json", "outward/outward.json"] {
            assert!(dir.path().join(file).exists(), "{file} missing");
        }
    }

    #[tokio::test]
    async fn test_startup_imports_legacy_registers() {
        let dir = TempDir::new().unwrap();
        let legacy = TempDir::new().unwrap();
        let inward = legacy.path().join("Inward");
        tokio::fs::create_dir_all(&inward).await.unwrap();
        let entry = serde_json::json!([{
            "id": "a1", "fileNo": "12/GA", "fromOffice": "HR", "subject": "Old letter",
            "fileUrl": "/files/inward/old.pdf"
        }]);
        tokio::fs::write(inward.join("inward.json"), entry.to_string()).await.unwrap();
        tokio::fs::write(inward.join("old.pdf"), b"%PDF").await.unwrap();

        let config = ServerConfig {
            legacy_base_dir: Some(legacy.path().to_path_buf()),
            cleanup_legacy: true,
            ..ServerConfig::with_data_dir(dir.path())
        };
        let server = DeskServer::new(config).await.unwrap();

        let entries = server.register(RegisterKind::Inward).list().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].file_no, "12/GA");
        assert!(dir.path().join("inward/old.pdf").exists());
        assert!(!inward.exists());
    }
}

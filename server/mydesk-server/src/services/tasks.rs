//! Task list stored in `tasks.json`, oldest first

use crate::error::ApiError;
use crate::storage::JsonStore;
use crate::validation::RequestValidation;
use chrono::Utc;
use mydesk_sync::models::{lenient_opt_string, lenient_or_default, lenient_string};
use mydesk_sync::{Task, TaskPriority, TaskStatus};
use serde::Deserialize;
use serde_json::Value;
use std::path::PathBuf;
use tracing::info;
use uuid::Uuid;

/// Create body of a task; the server assigns id and timestamps
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskInput {
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_string")]
    pub due_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_string")]
    pub description: String,
    /// Empty or unknown values fall back to Medium
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub priority: TaskPriority,
    /// Empty or unknown values fall back to Pending
    #[serde(default, deserialize_with = "lenient_or_default")]
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "lenient_string")]
    pub related_doc_id: String,
}

impl RequestValidation for TaskInput {
    fn validate(&self) -> Result<(), ApiError> {
        validate_present!(self.title, "Missing title/dueDate");
        validate_present!(self.due_date, "Missing title/dueDate");
        Ok(())
    }
}

pub struct TaskService {
    tasks: JsonStore<Vec<Task>>,
}

impl TaskService {
    pub async fn open(path: impl Into<PathBuf>) -> error_common::Result<Self> {
        Ok(Self {
            tasks: JsonStore::open(path, Vec::new()).await?,
        })
    }

    pub async fn list(&self) -> Result<Vec<Task>, ApiError> {
        Ok(self.tasks.load().await?)
    }

    pub async fn create(&self, input: TaskInput) -> Result<Task, ApiError> {
        input.validate()?;
        let now = Utc::now().to_rfc3339();
        let task = Task {
            id: Some(Uuid::new_v4().to_string()),
            title: input.title.unwrap_or_default(),
            description: input.description,
            priority: input.priority,
            status: input.status,
            due_date: input.due_date.unwrap_or_default(),
            related_doc_id: input.related_doc_id,
            created_at: Some(now.clone()),
            updated_at: Some(now),
        };

        let mut locked = self.tasks.lock().await?;
        locked.value.push(task.clone());
        locked.commit().await?;
        info!(task_id = ?task.id, "Task created");
        Ok(task)
    }

    /// Merge `patch` over the stored task; the id is kept and `updatedAt`
    /// refreshed. Fields the task model does not know are dropped.
    pub async fn update(&self, id: &str, patch: Value) -> Result<Task, ApiError> {
        let fields = match patch {
            Value::Object(fields) => fields,
            Value::Null => serde_json::Map::new(),
            _ => return Err(ApiError::bad_request("Expected object")),
        };

        let mut locked = self.tasks.lock().await?;
        let slot = locked
            .value
            .iter_mut()
            .find(|t| t.id.as_deref() == Some(id))
            .ok_or_else(|| ApiError::not_found("Task"))?;

        let mut merged = match serde_json::to_value(&*slot)? {
            Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        merged.extend(fields);
        merged.insert("id".into(), Value::String(id.to_string()));
        merged.insert("updatedAt".into(), Value::String(Utc::now().to_rfc3339()));

        let updated: Task = serde_json::from_value(Value::Object(merged))?;
        *slot = updated.clone();
        locked.commit().await?;
        info!(task_id = id, "Task updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        let mut locked = self.tasks.lock().await?;
        let before = locked.value.len();
        locked.value.retain(|t| t.id.as_deref() != Some(id));
        if locked.value.len() == before {
            return Err(ApiError::not_found("Task"));
        }
        locked.commit().await?;
        info!(task_id = id, "Task deleted");
        Ok(())
    }
}

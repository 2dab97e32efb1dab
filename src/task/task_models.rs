use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    /// Owning account.
    #[serde(rename = "user")]
    pub user_id: Uuid,
}

/// Column values for a task about to be inserted. The owner is supplied
/// separately by the caller's identity.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
}

/// Fields to overwrite on an existing task; `None` keeps the stored value.
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default)]
pub struct TaskChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub completed: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_serializes_owner_as_user() {
        let owner = Uuid::new_v4();
        let task = Task {
            id: Uuid::new_v4(),
            title: "Buy milk".to_string(),
            description: None,
            completed: false,
            created_at: Utc::now(),
            user_id: owner,
        };

        let json = serde_json::to_value(&task).unwrap();
        assert_eq!(json["user"], owner.to_string());
        assert!(json.get("user_id").is_none());
        assert_eq!(json["completed"], false);
        assert!(json["description"].is_null());
    }
}

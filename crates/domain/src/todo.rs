use crate::errors::TodoError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// ToDo の識別子（ULID 文字列）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TodoId(pub String);

impl TodoId {
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    pub fn from_string(id: String) -> Self {
        Self(id)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TodoId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TodoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ToDo レコード
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: TodoId,
    pub title: String,
    pub description: Option<String>,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 作成リクエスト（POST /todos のボディ）
#[derive(Debug, Clone, Deserialize)]
pub struct NewTodo {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub completed: bool,
}

impl NewTodo {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            completed: false,
        }
    }
}

/// 部分更新リクエスト（PUT /todos/{id} のボディ）
///
/// 指定されたフィールドのみ反映する。`description` は `null` を明示すると消去される。
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TodoPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "explicit_null")]
    pub description: Option<Option<String>>,
    #[serde(default)]
    pub completed: Option<bool>,
}

impl TodoPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }
}

/// フィールドが存在すれば `Some`（値が null なら `Some(None)`）
fn explicit_null<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Some)
}

/// 完了状態によるフィルタ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoStatus {
    Completed,
    Pending,
}

impl TodoStatus {
    pub fn matches(self, todo: &Todo) -> bool {
        match self {
            TodoStatus::Completed => todo.completed,
            TodoStatus::Pending => !todo.completed,
        }
    }
}

fn validate_title(title: &str) -> Result<(), TodoError> {
    if title.is_empty() {
        return Err(TodoError::Validation("title must not be empty".to_string()));
    }
    Ok(())
}

impl Todo {
    /// 新しい ToDo を生成する。ID と両タイムスタンプはここで決まる。
    pub fn create(input: NewTodo, now: DateTime<Utc>) -> Result<Self, TodoError> {
        validate_title(&input.title)?;

        Ok(Self {
            id: TodoId::new(),
            title: input.title,
            description: input.description,
            completed: input.completed,
            created_at: now,
            updated_at: now,
        })
    }

    /// 部分更新を適用する。値が変わらなくても `updated_at` は進める。
    ///
    /// 検証に失敗した場合はレコードに一切触れない。
    pub fn apply_patch(&mut self, patch: TodoPatch, now: DateTime<Utc>) -> Result<(), TodoError> {
        if let Some(title) = &patch.title {
            validate_title(title)?;
        }

        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        // 時計が巻き戻っても updated_at は後退させない
        self.updated_at = now.max(self.updated_at);
        Ok(())
    }
}

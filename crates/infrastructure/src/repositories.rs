use chrono::Utc;
use domain::{NewTodo, Todo, TodoError, TodoId, TodoPatch, TodoStatus};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

/// ToDo コレクションの抽象
///
/// 実装はプロセス内で 1 つだけ生成され、`Arc` でハンドラに共有される。
pub trait TodoRepository: Send + Sync {
    /// 全件を挿入順で取得
    fn list(&self) -> Vec<Todo>;
    /// 完了状態で絞り込み（挿入順を維持）
    fn list_by_status(&self, status: TodoStatus) -> Vec<Todo>;
    /// ID で 1 件取得
    fn get(&self, id: &TodoId) -> Result<Todo, TodoError>;
    /// 新規作成して末尾に追加
    fn create(&self, input: NewTodo) -> Result<Todo, TodoError>;
    /// 指定フィールドのみ更新
    fn update(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError>;
    /// 削除
    fn delete(&self, id: &TodoId) -> Result<(), TodoError>;
}

/// メモリ上の ToDo コレクション。プロセス終了とともに破棄される。
#[derive(Default)]
pub struct InMemoryTodoRepository {
    todos: RwLock<Vec<Todo>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }

    // 保持中にパニックしたスレッドがあってもコレクション自体は整合している
    fn read(&self) -> RwLockReadGuard<'_, Vec<Todo>> {
        self.todos.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<Todo>> {
        self.todos.write().unwrap_or_else(|e| e.into_inner())
    }
}

impl TodoRepository for InMemoryTodoRepository {
    fn list(&self) -> Vec<Todo> {
        self.read().clone()
    }

    fn list_by_status(&self, status: TodoStatus) -> Vec<Todo> {
        self.read()
            .iter()
            .filter(|todo| status.matches(todo))
            .cloned()
            .collect()
    }

    fn get(&self, id: &TodoId) -> Result<Todo, TodoError> {
        self.read()
            .iter()
            .find(|todo| &todo.id == id)
            .cloned()
            .ok_or_else(|| TodoError::NotFound(id.to_string()))
    }

    fn create(&self, input: NewTodo) -> Result<Todo, TodoError> {
        let todo = Todo::create(input, Utc::now())?;
        let mut todos = self.write();
        todos.push(todo.clone());
        debug!(todo_id = %todo.id, total = todos.len(), "todo appended");
        Ok(todo)
    }

    fn update(&self, id: &TodoId, patch: TodoPatch) -> Result<Todo, TodoError> {
        let mut todos = self.write();
        let todo = todos
            .iter_mut()
            .find(|todo| &todo.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        todo.apply_patch(patch, Utc::now())?;
        Ok(todo.clone())
    }

    fn delete(&self, id: &TodoId) -> Result<(), TodoError> {
        let mut todos = self.write();
        let index = todos
            .iter()
            .position(|todo| &todo.id == id)
            .ok_or_else(|| TodoError::NotFound(id.to_string()))?;
        todos.remove(index);
        debug!(todo_id = %id, total = todos.len(), "todo removed");
        Ok(())
    }
}

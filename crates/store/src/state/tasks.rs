// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use fleet_core::{Task, TaskId};

pub(super) fn apply_put(state: &mut MaterializedState, task: &Task) {
    if let Some(parent_id) = &task.parent_id {
        let children = state.task_children.entry(parent_id.clone()).or_default();
        if !children.contains(&task.id) {
            children.push(task.id.clone());
        }
    }
    state.tasks.insert(task.id.clone(), task.clone());
}

pub(super) fn apply_deleted(state: &mut MaterializedState, task_id: &str) {
    let id = TaskId::from_string(task_id);
    if let Some(task) = state.tasks.remove(&id) {
        if let Some(parent_id) = &task.parent_id {
            if let Some(siblings) = state.task_children.get_mut(parent_id) {
                siblings.retain(|c| c != &id);
            }
        }
    }
    state.task_children.remove(&id);
}

impl MaterializedState {
    pub fn get_task(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    pub fn direct_children(&self, id: &TaskId) -> Vec<&Task> {
        self.task_children
            .get(id)
            .map(|ids| ids.iter().filter_map(|cid| self.tasks.get(cid)).collect())
            .unwrap_or_default()
    }

    /// Full recursive subtree under `id`, BFS order, `id`'s own row excluded.
    pub fn subtree(&self, id: &TaskId) -> Vec<&Task> {
        let mut out = Vec::new();
        let mut queue: std::collections::VecDeque<TaskId> = std::collections::VecDeque::new();
        queue.push_back(id.clone());
        while let Some(current) = queue.pop_front() {
            if let Some(children) = self.task_children.get(&current) {
                for child_id in children {
                    if let Some(child) = self.tasks.get(child_id) {
                        out.push(child);
                        queue.push_back(child_id.clone());
                    }
                }
            }
        }
        out
    }

    /// Every run id ever created for this task and its subtree, used by the
    /// cascade-delete path (Runs -> Events -> Task, §3 Lifecycles).
    pub fn task_and_subtree_ids(&self, id: &TaskId) -> Vec<TaskId> {
        let mut ids = vec![id.clone()];
        ids.extend(self.subtree(id).into_iter().map(|t| t.id.clone()));
        ids
    }

    pub fn list_tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wal::StoreEvent;

    fn task(id: &str, parent: Option<&str>) -> Task {
        Task::builder()
            .id(TaskId::from_string(id))
            .name(id)
            .parent_id(parent.map(TaskId::from_string))
            .build()
    }

    #[test]
    fn subtree_is_bfs_and_excludes_self() {
        let mut state = MaterializedState::new();
        state.apply_event(&StoreEvent::TaskPut(task("task-root", None)));
        state.apply_event(&StoreEvent::TaskPut(task("task-a", Some("task-root"))));
        state.apply_event(&StoreEvent::TaskPut(task("task-b", Some("task-root"))));
        state.apply_event(&StoreEvent::TaskPut(task("task-a1", Some("task-a"))));

        let root = TaskId::from_string("task-root");
        let names: Vec<_> = state.subtree(&root).iter().map(|t| t.id.to_string()).collect();
        assert_eq!(names.len(), 3);
        assert!(names.contains(&"task-a".to_string()));
        assert!(names.contains(&"task-a1".to_string()));
        assert!(!names.contains(&"task-root".to_string()));
    }

    #[test]
    fn deleted_task_is_removed_from_parent_index() {
        let mut state = MaterializedState::new();
        state.apply_event(&StoreEvent::TaskPut(task("task-root", None)));
        state.apply_event(&StoreEvent::TaskPut(task("task-a", Some("task-root"))));
        state.apply_event(&StoreEvent::TaskDeleted { task_id: "task-a".to_string() });

        let root = TaskId::from_string("task-root");
        assert!(state.direct_children(&root).is_empty());
        assert!(state.get_task(&TaskId::from_string("task-a")).is_none());
    }
}

//! Custom-group synchronizer.
//!
//! Groups are matched across stores by their stable `id` (the same
//! identifier tiles join on), never by display name.

use std::collections::HashSet;

use crate::models::CustomGroup;
use crate::sync::context::{SyncContext, SyncOptions, SyncResult};

pub struct CustomGroupsSync<'a> {
    ctx: &'a SyncContext,
}

impl<'a> CustomGroupsSync<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    pub async fn sync_from_remote(
        &self,
        remote: &[CustomGroup],
        options: &SyncOptions,
    ) -> SyncResult {
        let local_count = match self.ctx.groups.count_custom().await {
            Ok(count) => count,
            Err(e) => return SyncResult::failed("custom groups sync", e),
        };

        if options.force {
            return self.replace_local(remote).await;
        }
        if remote.is_empty() {
            if local_count == 0 {
                return SyncResult::ok(0);
            }
            return self.push_local().await;
        }
        if local_count == 0 {
            return self.replace_local(remote).await;
        }
        self.merge(remote).await
    }

    async fn push_local(&self) -> SyncResult {
        let local = match self.ctx.groups.get_custom_groups().await {
            Ok(groups) => groups,
            Err(e) => return SyncResult::failed("custom groups push", e),
        };

        match self.ctx.push_custom_groups(&local).await {
            Ok(()) => SyncResult::ok(local.len()),
            Err(e) => SyncResult::failed("custom groups push", e),
        }
    }

    /// Wipes user-authored groups and imports the remote slice. Imports are
    /// insert-or-ignore, so a retried replace converges.
    async fn replace_local(&self, remote: &[CustomGroup]) -> SyncResult {
        if let Err(e) = self.ctx.groups.delete_all_custom_groups().await {
            return SyncResult::failed("custom groups replace", e);
        }
        self.ctx.settle().await;

        let (valid, errors) = partition_valid(remote);
        match self.ctx.groups.import_custom_groups(&valid).await {
            Ok(imported) => SyncResult::ok_with_errors(imported, errors),
            Err(e) => SyncResult::failed("custom groups replace", e),
        }
    }

    /// Imports remote groups missing locally. Matched groups keep their
    /// local state; groups carry no field that remote may overwrite. The
    /// merged set is pushed back so both sides converge.
    async fn merge(&self, remote: &[CustomGroup]) -> SyncResult {
        let local = match self.ctx.groups.get_custom_groups().await {
            Ok(groups) => groups,
            Err(e) => return SyncResult::failed("custom groups merge", e),
        };
        let local_ids: HashSet<&str> = local.iter().map(|g| g.id.as_str()).collect();

        let (valid, mut errors) = partition_valid(remote);
        let mut processed = 0;
        for group in &valid {
            if local_ids.contains(group.id.as_str()) {
                processed += 1;
                continue;
            }
            match self.ctx.groups.add(group).await {
                Ok(()) => processed += 1,
                Err(e) => errors.push(format!("import group '{}': {}", group.name, e)),
            }
        }

        let merged = match self.ctx.groups.get_custom_groups().await {
            Ok(groups) => groups,
            Err(e) => return SyncResult::failed("custom groups merge push", e),
        };
        if let Err(e) = self.ctx.push_custom_groups(&merged).await {
            let mut result = SyncResult::failed("custom groups merge push", e);
            result.items_processed = processed;
            result.errors.extend(errors);
            return result;
        }

        SyncResult::ok_with_errors(processed, errors)
    }
}

/// Splits a remote slice into importable groups and per-item errors for
/// groups missing their identity.
fn partition_valid(remote: &[CustomGroup]) -> (Vec<CustomGroup>, Vec<String>) {
    let mut valid = Vec::new();
    let mut errors = Vec::new();
    for group in remote {
        if group.id.trim().is_empty() || group.name.trim().is_empty() {
            tracing::warn!(
                "Skipping remote group with missing id or name (label '{}')",
                group.label
            );
            errors.push(format!(
                "group '{}' is missing id or name",
                if group.label.is_empty() {
                    "?"
                } else {
                    group.label.as_str()
                }
            ));
            continue;
        }
        valid.push(group.clone());
    }
    (valid, errors)
}

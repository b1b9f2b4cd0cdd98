//! Settings synchronizer.

use serde_json::{Map, Value};

use crate::models::settings::sanitize_remote_settings;
use crate::sync::context::{SyncContext, SyncOptions, SyncResult};

pub struct SettingsSync<'a> {
    ctx: &'a SyncContext,
}

impl<'a> SettingsSync<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    /// Applies the remote settings object as a patch, after dropping null
    /// entries and local-only keys. An empty residue is nothing-to-do, not
    /// an error.
    pub async fn sync_from_remote(
        &self,
        remote: &Map<String, Value>,
        _options: &SyncOptions,
    ) -> SyncResult {
        let patch = sanitize_remote_settings(remote);
        if patch.is_empty() {
            return SyncResult::ok(0);
        }

        let applied = patch.len();
        match self.ctx.settings.update_settings(&patch).await {
            Ok(()) => SyncResult::ok(applied),
            Err(e) => SyncResult::failed("settings sync", e),
        }
    }
}

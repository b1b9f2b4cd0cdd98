//! Disabled-defaults synchronizer.
//!
//! Unlike custom content, the disabled-defaults list has no
//! local-wins-on-first-sync behavior: an empty remote list means "nothing
//! disabled" and resets local state.

use crate::sync::context::{SyncContext, SyncOptions, SyncResult};

/// Sanity cap on the applied list. A remote list above this is treated as
/// corrupted and left unapplied rather than allowed to overwhelm local
/// state.
pub const MAX_DISABLED_DEFAULTS: usize = 100;

pub struct DisabledDefaultsSync<'a> {
    ctx: &'a SyncContext,
}

impl<'a> DisabledDefaultsSync<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    pub async fn sync_from_remote(
        &self,
        remote: &[String],
        _options: &SyncOptions,
    ) -> SyncResult {
        if remote.is_empty() {
            return match self.ctx.tiles.clear_disabled_defaults().await {
                Ok(()) => SyncResult::ok(0),
                Err(e) => SyncResult::failed("disabled defaults sync", e),
            };
        }

        if remote.len() > MAX_DISABLED_DEFAULTS {
            tracing::warn!(
                "Remote disabled-defaults list has {} entries (cap {}); leaving local state untouched",
                remote.len(),
                MAX_DISABLED_DEFAULTS
            );
            return SyncResult::ok(0);
        }

        match self.ctx.tiles.set_disabled_defaults(remote).await {
            Ok(()) => SyncResult::ok(remote.len()),
            Err(e) => SyncResult::failed("disabled defaults sync", e),
        }
    }
}

//! Game-board synchronizer.

use crate::models::GameBoard;
use crate::sync::context::{SyncContext, SyncOptions, SyncResult};

pub struct GameBoardsSync<'a> {
    ctx: &'a SyncContext,
}

impl<'a> GameBoardsSync<'a> {
    pub fn new(ctx: &'a SyncContext) -> Self {
        Self { ctx }
    }

    /// Upserts each remote board by title. A bad board is logged and
    /// skipped; the batch continues.
    pub async fn sync_from_remote(
        &self,
        remote: &[GameBoard],
        _options: &SyncOptions,
    ) -> SyncResult {
        let mut errors = Vec::new();
        let mut processed = 0;

        for board in remote {
            if board.title.trim().is_empty() {
                tracing::warn!("Skipping remote board with blank title");
                errors.push("board with blank title skipped".to_string());
                continue;
            }
            match self.ctx.boards.upsert(board).await {
                Ok(_) => processed += 1,
                Err(e) => {
                    tracing::warn!("Failed to upsert board '{}': {}", board.title, e);
                    errors.push(format!("board '{}': {}", board.title, e));
                }
            }
        }

        SyncResult::ok_with_errors(processed, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_db;
    use crate::models::BoardTile;
    use crate::remote::AccountClient;
    use std::time::Duration;
    use tempfile::TempDir;

    async fn setup() -> (SyncContext, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let pool = init_db(Some(temp_dir.path().join("test.db"))).await.unwrap();
        let remote = AccountClient::new("http://127.0.0.1:1", "test-key");
        let ctx = SyncContext::new(pool, remote, Some("u1".to_string()))
            .with_settle_delay(Duration::ZERO);
        (ctx, temp_dir)
    }

    #[tokio::test]
    async fn test_upserts_remote_boards() {
        let (ctx, _temp) = setup().await;

        let remote = vec![
            GameBoard::new("Friday Night").with_tiles(vec![BoardTile::new("Start", "Go")]),
            GameBoard::new("House Party"),
        ];
        let result = GameBoardsSync::new(&ctx)
            .sync_from_remote(&remote, &SyncOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.items_processed, 2);
        assert_eq!(ctx.boards.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_upsert_by_title_updates_existing() {
        let (ctx, _temp) = setup().await;

        ctx.boards.upsert(&GameBoard::new("Friday Night")).await.unwrap();

        let remote = vec![GameBoard::new("Friday Night")
            .with_tiles(vec![BoardTile::new("Start", "Go"), BoardTile::new("End", "Stop")])];
        let result = GameBoardsSync::new(&ctx)
            .sync_from_remote(&remote, &SyncOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(ctx.boards.list().await.unwrap().len(), 1);
        let board = ctx.boards.get_by_title("Friday Night").await.unwrap().unwrap();
        assert_eq!(board.tiles.len(), 2);
    }

    #[tokio::test]
    async fn test_blank_title_isolated() {
        let (ctx, _temp) = setup().await;

        let remote = vec![GameBoard::new(""), GameBoard::new("Good Board")];
        let result = GameBoardsSync::new(&ctx)
            .sync_from_remote(&remote, &SyncOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.items_processed, 1);
        assert_eq!(result.errors.len(), 1);
        assert_eq!(ctx.boards.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_empty_remote_is_noop() {
        let (ctx, _temp) = setup().await;

        ctx.boards.upsert(&GameBoard::new("Keep Me")).await.unwrap();

        let result = GameBoardsSync::new(&ctx)
            .sync_from_remote(&[], &SyncOptions::default())
            .await;

        assert!(result.success);
        assert_eq!(result.items_processed, 0);
        assert_eq!(ctx.boards.list().await.unwrap().len(), 1);
    }
}

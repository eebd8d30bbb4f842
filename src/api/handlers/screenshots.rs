use axum::{
    extract::{Query, State},
    Json,
};
use std::sync::Arc;

use crate::error::{RecorderError, Result};
use crate::models::{ScreenshotQuery, ScreenshotsResponse};

use super::super::state::AppState;

/// Batch fetch of screenshot blobs; unknown ids are left out
pub async fn get_screenshots(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ScreenshotQuery>,
) -> Result<Json<ScreenshotsResponse>> {
    let ids = query.id_list();
    if ids.is_empty() {
        return Err(RecorderError::ValidationError(
            "ids query parameter is required".to_string(),
        ));
    }

    let screenshots = state.control.screenshots(&ids).await?;
    Ok(Json(ScreenshotsResponse { screenshots }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::response::IntoResponse;

    use crate::recording::{RecorderControl, SessionManager};
    use crate::store::{MemoryScreenshotStore, MemoryStore, ScreenshotStore};

    async fn state_with_blob() -> Arc<AppState> {
        let screenshots = Arc::new(MemoryScreenshotStore::new());
        screenshots
            .set("screenshot_a", "data:image/png;base64,AA".to_string())
            .await
            .unwrap();
        let session = Arc::new(SessionManager::new(Arc::new(MemoryStore::new())));
        Arc::new(AppState::new(RecorderControl::new(session, screenshots)))
    }

    fn query(ids: &str) -> Query<ScreenshotQuery> {
        Query(ScreenshotQuery {
            ids: ids.to_string(),
        })
    }

    #[tokio::test]
    async fn test_empty_ids_rejected() {
        let state = state_with_blob().await;
        let err = get_screenshots(State(state), query(" , ")).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_known_ids_returned() {
        let state = state_with_blob().await;
        let Json(found) = get_screenshots(State(state), query("screenshot_a,screenshot_b"))
            .await
            .unwrap();
        assert_eq!(found.screenshots.len(), 1);
        assert_eq!(found.screenshots["screenshot_a"], "data:image/png;base64,AA");
    }
}

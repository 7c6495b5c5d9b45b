use crate::state::ViewState;
use crate::view::ProductCardView;
use futures::future::join_all;
use reqwest::{header, Client, StatusCode};
use std::time::Duration;
use url::Url;

const IMAGE_CHECK_TIMEOUT: Duration = Duration::from_secs(5);

/// Replace images that fail to load with the placeholder.
///
/// Runs right before rendering; the cards built at ingest already carry the
/// placeholder for images the API reported as unavailable.
pub async fn apply_image_fallback(
    http: &Client,
    views: Vec<ProductCardView>,
) -> Vec<ProductCardView> {
    let checks = views.into_iter().map(|view| async move {
        if view.has_placeholder_image() || image_loads(http, &view.image_url).await {
            view
        } else {
            tracing::warn!("Image failed to load, using placeholder: {}", view.image_url);
            view.with_placeholder_image()
        }
    });
    join_all(checks).await
}

/// Copy of `state` ready for display, with broken images swapped out.
pub async fn checked_for_display(http: &Client, state: ViewState) -> ViewState {
    match state {
        ViewState::Results { result, views } => ViewState::Results {
            result,
            views: apply_image_fallback(http, views).await,
        },
        other => other,
    }
}

async fn image_loads(http: &Client, image_url: &str) -> bool {
    let Ok(url) = Url::parse(image_url) else {
        return false;
    };
    let head = http.head(url.clone()).timeout(IMAGE_CHECK_TIMEOUT).send().await;
    let checked = match head {
        // Some image hosts refuse HEAD; ask for the first byte instead.
        Ok(resp)
            if matches!(
                resp.status(),
                StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
            ) =>
        {
            http.get(url)
                .header(header::RANGE, "bytes=0-0")
                .timeout(IMAGE_CHECK_TIMEOUT)
                .send()
                .await
        }
        other => other,
    };
    match checked {
        Ok(resp) => resp.status().is_success(),
        Err(e) => {
            tracing::debug!("Image check failed for {}: {}", image_url, e);
            false
        }
    }
}

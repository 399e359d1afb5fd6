//! Image service: random URL lookup and streaming.

use std::sync::Arc;

use futures_util::TryStreamExt;

use crate::config::SettingsHandle;
use crate::domain::{ImagePool, OpenedImage, RandomSelector, RequestContext};
use crate::error::GatewayError;

/// Media type sent for every image. The pool is homogeneous.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpg";

/// Orchestration layer for both image operations.
///
/// Stateless coordinator: owns a shared reference to the immutable
/// [`ImagePool`], a [`RandomSelector`], and the reloadable diagnostic
/// settings. Handlers on any worker may call it concurrently.
#[derive(Debug, Clone)]
pub struct ImageService {
    pool: Arc<ImagePool>,
    selector: RandomSelector,
    settings: SettingsHandle,
}

impl ImageService {
    /// Creates a new `ImageService`.
    #[must_use]
    pub fn new(pool: Arc<ImagePool>, settings: SettingsHandle) -> Self {
        Self {
            pool,
            selector: RandomSelector::new(),
            settings,
        }
    }

    /// Returns a reference to the inner [`ImagePool`].
    #[must_use]
    pub fn pool(&self) -> &Arc<ImagePool> {
        &self.pool
    }

    /// Returns the reloadable settings handle.
    #[must_use]
    pub fn settings(&self) -> &SettingsHandle {
        &self.settings
    }

    /// Picks a random image and returns its absolute URL as seen by the
    /// caller described by `ctx`.
    ///
    /// Purely local and CPU-bound, so it runs synchronously. Should the
    /// catalog ever move behind a remote call, this becomes `async` and
    /// the handler awaits it; the observable result is the same.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Configuration`] if the pool is empty.
    pub fn random_image_url(&self, ctx: &RequestContext) -> Result<String, GatewayError> {
        let settings = self.settings.current();
        tracing::info!(
            tag = %settings.log_tag,
            profile = %settings.active_profile,
            "random image url requested"
        );

        let name = self.selector.pick(&self.pool)?;
        Ok(ctx.image_url(name))
    }

    /// Opens `name` for streaming.
    ///
    /// Read failures after this point cannot change the response status
    /// any more; they are logged here and end the stream with an error,
    /// which aborts the connection.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::ImageNotFound`] if `name` is not in the pool
    /// and [`GatewayError::Io`] if its source cannot be opened.
    pub async fn stream(&self, name: &str) -> Result<OpenedImage, GatewayError> {
        let image = self.pool.open(name).await?;
        let owned = name.to_string();
        let stream = image.stream.inspect_err(move |e| {
            tracing::error!(image = %owned, error = %e, "image stream aborted");
        });
        Ok(OpenedImage {
            len: image.len,
            stream: Box::pin(stream),
        })
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::config::RuntimeSettings;

    fn service() -> ImageService {
        let Ok(pool) = ImagePool::from_memory([
            ("a.jpg", Bytes::from_static(b"AAAA")),
            ("b.jpg", Bytes::from_static(b"BB")),
        ]) else {
            panic!("valid pool");
        };
        let settings = SettingsHandle::new(RuntimeSettings {
            log_tag: "test".to_string(),
            active_profile: "test".to_string(),
        });
        ImageService::new(Arc::new(pool), settings)
    }

    fn ctx() -> RequestContext {
        RequestContext {
            scheme: "http".to_string(),
            host: "host".to_string(),
            port: 8080,
        }
    }

    #[test]
    fn random_url_points_at_a_pool_member() {
        let service = service();
        let Ok(url) = service.random_image_url(&ctx()) else {
            panic!("url built");
        };
        assert!(
            url == "http://host:8080/images/a.jpg" || url == "http://host:8080/images/b.jpg",
            "unexpected url {url}"
        );
    }

    #[tokio::test]
    async fn stream_returns_exact_bytes() {
        let service = service();
        let Ok(image) = service.stream("a.jpg").await else {
            panic!("image opens");
        };
        assert_eq!(image.len, 4);
        let Ok(chunks) = image.stream.try_collect::<Vec<Bytes>>().await else {
            panic!("stream failed");
        };
        assert_eq!(chunks.concat(), b"AAAA");
    }

    #[tokio::test]
    async fn stream_unknown_is_not_found() {
        let service = service();
        let result = service.stream("does-not-exist.jpg").await;
        assert!(matches!(result, Err(GatewayError::ImageNotFound(_))));
    }
}

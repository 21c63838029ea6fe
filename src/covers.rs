//! Cover resolution for items listed without a cover image.

use std::collections::HashMap;

use futures::future::join_all;
use tracing::debug;

use crate::client::CatalogClient;
use crate::source::VideoSource;
use crate::VideoItem;

impl CatalogClient {
    /// Resolves covers through detail lookups, keyed by `vod_id`.
    ///
    /// Items are processed in chunks of `coverBatchSize`. Lookups within a
    /// chunk run together through the detail limiter; chunks are separated
    /// by `coverBatchDelayMs`. Items without a known source are skipped and
    /// failed lookups are left out, so a missing key means "no cover".
    pub async fn batch_get_video_covers(
        &self,
        videos: &[VideoItem],
        sources: &[VideoSource],
    ) -> HashMap<String, String> {
        let mut covers = HashMap::new();
        let batch_size = self.config().cover_batch_size.max(1);

        for (i, chunk) in videos.chunks(batch_size).enumerate() {
            if i > 0 {
                tokio::time::sleep(self.config().cover_batch_delay()).await;
            }

            let lookups = chunk.iter().map(|video| self.resolve_cover(video, sources));
            covers.extend(join_all(lookups).await.into_iter().flatten());
        }

        covers
    }

    async fn resolve_cover(
        &self,
        video: &VideoItem,
        sources: &[VideoSource],
    ) -> Option<(String, String)> {
        if video.vod_id.is_empty() {
            return None;
        }
        let source_id = video.source_id.as_deref()?;
        let source = sources.iter().find(|s| s.id == source_id)?;

        match self.get_video_detail(source, &video.vod_id).await {
            Ok(detail) => detail
                .cover()
                .map(|cover| (video.vod_id.clone(), cover.to_string())),
            Err(e) => {
                debug!("Cover lookup for {}-{} failed: {}", source.id, video.vod_id, e);
                None
            }
        }
    }
}

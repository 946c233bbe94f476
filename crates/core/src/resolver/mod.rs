//! Request orchestration: cache-aware media resolution.

use std::sync::Arc;
use thiserror::Error;
use url::Url;

use crate::cache::ResultCache;
use crate::extractor::{Extraction, ExtractorError, Extractor, MediaMetadata, OperationKind};

/// A normalized operation result, as stored in the cache.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedMedia {
    Metadata(MediaMetadata),
    AudioUrl(String),
    VideoUrl(String),
}

/// Outcome of one resolve call: the payload plus whether it was served from
/// the cache.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub media: ResolvedMedia,
    pub cached: bool,
}

#[derive(Debug, Error)]
pub enum ResolveError {
    /// The request URL is not a well-formed absolute URL.
    #[error("Invalid URL format.")]
    InvalidUrl,

    /// Extraction ran and failed; the typed outcome is preserved.
    #[error(transparent)]
    Extraction(#[from] ExtractorError),
}

/// Cache key for one operation against one URL. Exact string match by
/// design: no normalization, so URLs differing in query-parameter order or
/// casing occupy distinct entries.
pub fn fingerprint(kind: OperationKind, url: &str) -> String {
    format!("{}:{}", kind, url)
}

/// Orchestrates one logical operation: validate, consult the cache, invoke
/// the extractor on a miss, normalize and cache the result.
///
/// Concurrent identical requests are not coalesced; two simultaneous
/// requests for the same uncached URL will both spawn tool processes. Known
/// limitation, kept to preserve observable behavior.
pub struct MediaResolver {
    cache: Arc<ResultCache<ResolvedMedia>>,
    extractor: Arc<dyn Extractor>,
}

impl MediaResolver {
    pub fn new(cache: Arc<ResultCache<ResolvedMedia>>, extractor: Arc<dyn Extractor>) -> Self {
        Self { cache, extractor }
    }

    /// Resolves one operation against one URL.
    ///
    /// Failures are never written to the cache, so the next identical
    /// request retries extraction.
    pub async fn resolve(
        &self,
        kind: OperationKind,
        raw_url: &str,
    ) -> Result<Resolution, ResolveError> {
        Url::parse(raw_url).map_err(|_| ResolveError::InvalidUrl)?;

        let key = fingerprint(kind, raw_url);
        if let Some(media) = self.cache.get(&key).await {
            tracing::debug!(operation = %kind, "Cache hit");
            return Ok(Resolution {
                media,
                cached: true,
            });
        }

        let extraction = self.extractor.extract(kind, raw_url).await?;
        let media = Self::normalize(kind, extraction)?;

        self.cache.put(key, media.clone()).await;
        tracing::debug!(operation = %kind, "Resolved and cached");

        Ok(Resolution {
            media,
            cached: false,
        })
    }

    /// Maps a successful extraction onto the operation's payload shape.
    fn normalize(
        kind: OperationKind,
        extraction: Extraction,
    ) -> Result<ResolvedMedia, ResolveError> {
        match (kind, extraction) {
            (OperationKind::Metadata, Extraction::Metadata(meta)) => {
                Ok(ResolvedMedia::Metadata(meta))
            }
            (OperationKind::Audio, Extraction::StreamUrl(url)) => {
                Ok(ResolvedMedia::AudioUrl(url))
            }
            (OperationKind::Video, Extraction::StreamUrl(url)) => {
                Ok(ResolvedMedia::VideoUrl(url))
            }
            (kind, _) => Err(ResolveError::Extraction(ExtractorError::ParseFailure {
                reason: format!("extractor returned mismatched payload for {} operation", kind),
            })),
        }
    }
}

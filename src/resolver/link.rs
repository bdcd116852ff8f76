// Share link -> media id resolution
//
// Share links (`https://v.douyin.com/LYDLoga/`) redirect to a page such as
// `https://www.iesdouyin.com/share/video/7049.../?region=CN`. The media id is
// the name of the directory holding the final document.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};
use url::Url;

use super::errors::ResolveError;
use super::http::HttpClient;

#[derive(Debug, Default)]
struct Mapping {
    by_share_url: HashMap<String, String>,
    by_media_id: HashMap<String, String>,
}

/// Process-wide `share url <-> media id` memo. Entries never expire.
#[derive(Debug, Default)]
pub struct LinkMap {
    inner: Mutex<Mapping>,
}

impl LinkMap {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Mapping> {
        // A panic while holding the lock leaves both maps consistent
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record both directions; the first association for either side wins
    pub fn insert(&self, share_url: &str, media_id: &str) {
        let mut mapping = self.lock();
        mapping
            .by_share_url
            .entry(share_url.to_string())
            .or_insert_with(|| media_id.to_string());
        mapping
            .by_media_id
            .entry(media_id.to_string())
            .or_insert_with(|| share_url.to_string());
    }

    pub fn media_id_for(&self, share_url: &str) -> Option<String> {
        self.lock().by_share_url.get(share_url).cloned()
    }

    pub fn share_url_for(&self, media_id: &str) -> Option<String> {
        self.lock().by_media_id.get(media_id).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().by_share_url.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct LinkResolver {
    http: Arc<dyn HttpClient>,
    links: Arc<LinkMap>,
}

impl LinkResolver {
    pub fn new(http: Arc<dyn HttpClient>, links: Arc<LinkMap>) -> Self {
        Self { http, links }
    }

    pub fn links(&self) -> &Arc<LinkMap> {
        &self.links
    }

    pub async fn resolve(&self, share_url: &str) -> Result<String, ResolveError> {
        if let Some(media_id) = self.links.media_id_for(share_url) {
            debug!("[LinkResolver] memo hit {} -> {}", share_url, media_id);
            return Ok(media_id);
        }

        let response = self
            .http
            .get(share_url)
            .await
            .map_err(|e| ResolveError::Resolution {
                url: share_url.to_string(),
                reason: e.to_string(),
            })?;

        let media_id = media_id_from_url(&response.final_url).ok_or_else(|| {
            ResolveError::Resolution {
                url: share_url.to_string(),
                reason: format!("no media id in redirect target `{}`", response.final_url),
            }
        })?;

        info!("[LinkResolver] {} -> {}", share_url, media_id);
        self.links.insert(share_url, &media_id);
        Ok(media_id)
    }
}

/// Base name of the directory that contains the document at `url`
pub fn media_id_from_url(url: &str) -> Option<String> {
    let parsed = Url::parse(url).ok()?;
    let path = parsed.path();
    let dir = &path[..path.rfind('/')?];
    dir.rsplit('/')
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::test_support::StubHttp;

    const SHARE: &str = "https://v.douyin.com/LYDLoga/";
    const TARGET: &str = "https://www.iesdouyin.com/share/video/7049315012954115337/?region=CN&mid=7049";

    #[test]
    fn test_media_id_is_parent_directory() {
        assert_eq!(media_id_from_url(TARGET), Some("7049315012954115337".to_string()));
        assert_eq!(
            media_id_from_url("https://www.iesdouyin.com/share/video/7049/index.html"),
            Some("7049".to_string())
        );
    }

    #[test]
    fn test_media_id_ignores_document_name() {
        // Without a trailing slash the last segment is the document itself
        assert_eq!(
            media_id_from_url("https://www.iesdouyin.com/share/video/7049"),
            Some("video".to_string())
        );
    }

    #[test]
    fn test_media_id_missing() {
        assert_eq!(media_id_from_url("https://www.iesdouyin.com/"), None);
        assert_eq!(media_id_from_url("https://www.iesdouyin.com"), None);
        assert_eq!(media_id_from_url("not a url"), None);
    }

    #[tokio::test]
    async fn test_resolve_memoizes_share_url() {
        let http = Arc::new(StubHttp::new().with_redirect(SHARE, TARGET));
        let resolver = LinkResolver::new(http.clone(), Arc::new(LinkMap::new()));

        let first = resolver.resolve(SHARE).await.unwrap();
        let second = resolver.resolve(SHARE).await.unwrap();

        assert_eq!(first, "7049315012954115337");
        assert_eq!(first, second);
        assert_eq!(http.calls(SHARE), 1);
        assert_eq!(
            resolver.links().share_url_for(&first).as_deref(),
            Some(SHARE)
        );
    }

    #[tokio::test]
    async fn test_resolve_network_failure() {
        let http = Arc::new(StubHttp::new());
        let resolver = LinkResolver::new(http, Arc::new(LinkMap::new()));

        let err = resolver.resolve(SHARE).await.unwrap_err();
        assert!(matches!(err, ResolveError::Resolution { .. }));
        assert!(resolver.links().is_empty());
    }

    #[tokio::test]
    async fn test_resolve_without_path() {
        let http = Arc::new(StubHttp::new().with_redirect(SHARE, "https://www.douyin.com/"));
        let resolver = LinkResolver::new(http, Arc::new(LinkMap::new()));

        assert!(matches!(
            resolver.resolve(SHARE).await,
            Err(ResolveError::Resolution { .. })
        ));
    }

    #[test]
    fn test_first_association_wins() {
        let links = LinkMap::new();
        links.insert("https://v.douyin.com/a/", "1");
        links.insert("https://v.douyin.com/a/", "2");
        links.insert("https://v.douyin.com/b/", "1");

        assert_eq!(links.media_id_for("https://v.douyin.com/a/").as_deref(), Some("1"));
        assert_eq!(links.share_url_for("1").as_deref(), Some("https://v.douyin.com/a/"));
        assert_eq!(links.media_id_for("https://v.douyin.com/b/").as_deref(), Some("1"));
        assert_eq!(links.len(), 2);
    }
}

//! Asynchronous fetching of the five scene resources.
//!
//! Fetches run concurrently, parsing only starts once all of them succeeded.

use crate::emit::SceneGeometry;
use crate::error::{Resource, SceneError, SceneResult};
use crate::scene::{ResourcePaths, SceneConfig, SceneSources, build_scene};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::{debug, info};

/// A place resources are read from.
#[async_trait]
pub trait ResourceStore: Send + Sync {
    /// Returns the full text stored at `location`.
    async fn fetch(&self, resource: Resource, location: &str) -> SceneResult<String>;
}

/// Reads resources from files below a root directory.
#[derive(Clone, Debug)]
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResourceStore for FileStore {
    async fn fetch(&self, resource: Resource, location: &str) -> SceneResult<String> {
        let path = self.root.join(location);
        debug!(%resource, path = %path.display(), "reading resource");
        tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SceneError::Fetch {
                resource,
                location: path.display().to_string(),
                source: Box::new(e),
            })
    }
}

/// Fetches resources over HTTP relative to a base URL.
#[derive(Clone, Debug)]
pub struct HttpStore {
    client: reqwest::Client,
    base: String,
}

impl HttpStore {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base: base.into(),
        }
    }

    fn url(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            return location.to_string();
        }
        format!("{}/{}", self.base.trim_end_matches('/'), location.trim_start_matches('/'))
    }
}

#[async_trait]
impl ResourceStore for HttpStore {
    async fn fetch(&self, resource: Resource, location: &str) -> SceneResult<String> {
        let url = self.url(location);
        debug!(%resource, %url, "requesting resource");
        let fetch_error = |e: reqwest::Error| SceneError::Fetch {
            resource,
            location: url.clone(),
            source: Box::new(e),
        };
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(fetch_error)?;
        response.text().await.map_err(fetch_error)
    }
}

/// Fetches all five resources concurrently, failing on the first error.
pub async fn fetch_sources<S: ResourceStore + ?Sized>(store: &S, paths: &ResourcePaths) -> SceneResult<SceneSources> {
    let (points, edges, cell_vertices, cell_faces, cell_centroids) = tokio::try_join!(
        store.fetch(Resource::Points, paths.location(Resource::Points)),
        store.fetch(Resource::Edges, paths.location(Resource::Edges)),
        store.fetch(Resource::CellVertices, paths.location(Resource::CellVertices)),
        store.fetch(Resource::CellFaceIndices, paths.location(Resource::CellFaceIndices)),
        store.fetch(Resource::CellCentroids, paths.location(Resource::CellCentroids)),
    )?;
    info!("fetched all resources");

    Ok(SceneSources {
        points,
        edges,
        cell_vertices,
        cell_faces,
        cell_centroids,
    })
}

/// Fetches, parses, builds and explodes a scene in one go.
pub async fn load_scene<S: ResourceStore + ?Sized>(store: &S, config: &SceneConfig) -> SceneResult<SceneGeometry> {
    let sources = fetch_sources(store, &config.resources).await?;
    build_scene(&sources, config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_url_join() {
        let store = HttpStore::new("http://localhost:8080/data/");
        assert_eq!(store.url("/a_p.gnu"), "http://localhost:8080/data/a_p.gnu");
        assert_eq!(store.url("https://cdn/x.vol"), "https://cdn/x.vol");
    }

    #[tokio::test]
    async fn test_missing_file_is_fetch_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = fetch_sources(&store, &ResourcePaths::default()).await.unwrap_err();
        assert!(matches!(err, SceneError::Fetch { .. }));
    }

    #[tokio::test]
    async fn test_unreachable_host_is_fetch_error() {
        // Nothing listens on port 1
        let store = HttpStore::new("http://127.0.0.1:1/data");
        let err = store.fetch(Resource::Points, "cubes_p.gnu").await.unwrap_err();
        match err {
            SceneError::Fetch { resource, location, .. } => {
                assert_eq!(resource, Resource::Points);
                assert_eq!(location, "http://127.0.0.1:1/data/cubes_p.gnu");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}

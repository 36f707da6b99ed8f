// Lazy fill of the serve root from the backing stores.
//
// There is no coordination between requests: two misses for the same path
// both fetch and both write, last writer wins. Writes are plain overwrites,
// so a reader racing a writer can see a partial file.
use crate::error::Error;
use crate::store::BackingStore;
use actix_web::web;
use std::path::{Path, PathBuf};

const MEDIA_PREFIX: &str = "/media/";
const IMAGES_PREFIX: &str = "/images/";

/// A request path that is safe to resolve under the serve root.
#[derive(Debug, Clone, PartialEq)]
pub struct AssetPath {
    request: String,
    relative: PathBuf,
}

impl AssetPath {
    /// Normalises the (already percent-decoded) route tail. Empty and `.`
    /// segments are dropped, `..` is refused outright.
    pub fn parse(tail: &str) -> Result<AssetPath, Error> {
        let mut segments = Vec::new();
        for segment in tail.split('/') {
            match segment {
                "" | "." => continue,
                ".." => return Err(Error::InvalidPath(tail.to_string())),
                s if s.contains('\\') || s.contains('\0') => {
                    return Err(Error::InvalidPath(tail.to_string()))
                }
                s => segments.push(s),
            }
        }
        let mut request = format!("/{}", segments.join("/"));
        if tail.ends_with('/') && !segments.is_empty() {
            request.push('/');
        }
        Ok(AssetPath {
            request,
            relative: segments.iter().collect(),
        })
    }

    pub fn request(&self) -> &str {
        &self.request
    }

    pub fn local(&self, root: &Path) -> PathBuf {
        root.join(&self.relative)
    }
}

/// Maps a request path to the key its asset is stored under remotely, or
/// `None` when the path is not eligible for remote fallback.
///
/// `/media/` is stripped, `/images/` is kept as part of the key.
pub fn remote_key(request_path: &str) -> Option<&str> {
    let key = if let Some(rest) = request_path.strip_prefix(MEDIA_PREFIX) {
        rest
    } else if request_path.starts_with(IMAGES_PREFIX) {
        &request_path[1..]
    } else {
        return None;
    };
    if key.is_empty() || key.ends_with('/') {
        return None;
    }
    Some(key)
}

pub struct Populator {
    stores: Vec<BackingStore>,
    client: reqwest::Client,
}

impl Populator {
    pub fn new(stores: Vec<BackingStore>, client: reqwest::Client) -> Populator {
        Populator { stores, client }
    }

    /// Fetches `asset` from the first store that has it and writes it to
    /// `target`. The error of the last store tried is returned when all fail.
    pub async fn populate(&self, asset: &AssetPath, target: &Path) -> Result<(), Error> {
        let key = match remote_key(asset.request()) {
            Some(key) => key,
            None => return Err(Error::NotMedia(asset.request().to_string())),
        };
        let mut last_err = Error::NoBackingStore;
        for store in &self.stores {
            info!("trying {} store for {}", store.name(), asset.request());
            match self.fetch_into(store, key, target).await {
                Ok(()) => {
                    info!("populated {} from {} store", asset.request(), store.name());
                    return Ok(());
                }
                Err(e) => {
                    warn!("{}: {} store: {}", asset.request(), store.name(), e);
                    last_err = e;
                }
            }
        }
        Err(last_err)
    }

    async fn fetch_into(
        &self,
        store: &BackingStore,
        key: &str,
        target: &Path,
    ) -> Result<(), Error> {
        let body = store.fetch(&self.client, key).await?;
        let target = target.to_path_buf();
        web::block(move || write_asset(&target, &body)).await?
    }
}

/// Creates missing parent directories (world writable, minus umask) and
/// overwrites `target` with `body`.
fn write_asset(target: &Path, body: &[u8]) -> Result<(), Error> {
    let wrap = |source: std::io::Error| Error::Write {
        path: target.to_path_buf(),
        source,
    };
    if let Some(parent) = target.parent() {
        create_dirs(parent).map_err(wrap)?;
    }
    std::fs::write(target, body).map_err(wrap)
}

#[cfg(unix)]
fn create_dirs(dir: &Path) -> std::io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    std::fs::DirBuilder::new()
        .recursive(true)
        .mode(0o777)
        .create(dir)
}

#[cfg(not(unix))]
fn create_dirs(dir: &Path) -> std::io::Result<()> {
    std::fs::create_dir_all(dir)
}

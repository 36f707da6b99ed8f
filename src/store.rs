// A backing store is a remote origin holding the canonical copy of every
// media asset. It is only ever read, and only on a local miss.
//
// The store knows how to turn a remote key into a url and how to fetch it.
// Deciding *which* key a request maps to lives in populate.rs.
use crate::config::Config;
use crate::error::Error;
use actix_web::web::Bytes;

#[derive(Debug, Clone)]
pub struct BackingStore {
    name: &'static str,
    base_url: String,
}

impl BackingStore {
    pub fn new(name: &'static str, base_url: &str) -> BackingStore {
        BackingStore {
            name,
            base_url: base_url.to_string(),
        }
    }

    /// The stores to try on a miss, in order. The secondary only counts when
    /// there is a primary.
    pub fn from_config(config: &Config) -> Vec<BackingStore> {
        let mut stores = Vec::new();
        if let Some(backing) = &config.backing {
            stores.push(BackingStore::new("primary", backing));
            if let Some(secondary) = &config.secondary {
                stores.push(BackingStore::new("secondary", secondary));
            }
        }
        stores
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Appends the key's segments to the base url's path. Each segment is
    /// percent-encoded, so `?`, `#` and `%` in a key stay part of the path.
    pub fn url_for(&self, key: &str) -> Result<reqwest::Url, Error> {
        let bad_url = || Error::StoreUrl(self.base_url.clone());
        let mut url = reqwest::Url::parse(&self.base_url).map_err(|_| bad_url())?;
        url.path_segments_mut()
            .map_err(|_| bad_url())?
            .pop_if_empty()
            .extend(key.trim_start_matches('/').split('/'));
        Ok(url)
    }

    /// GET the key. Anything but a 200 with a fully read body is an error.
    pub async fn fetch(&self, client: &reqwest::Client, key: &str) -> Result<Bytes, Error> {
        let url = self.url_for(key)?;
        let resp = match client.get(url.clone()).send().await {
            Ok(resp) => resp,
            Err(source) => {
                return Err(Error::Transport {
                    url: url.to_string(),
                    source,
                })
            }
        };
        if resp.status() != reqwest::StatusCode::OK {
            return Err(Error::Status {
                url: url.to_string(),
                status: resp.status().as_u16(),
            });
        }
        match resp.bytes().await {
            Ok(body) => Ok(body),
            Err(source) => Err(Error::Transport {
                url: url.to_string(),
                source,
            }),
        }
    }
}

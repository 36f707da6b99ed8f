use crate::config::Config;
use crate::error::Error;
use crate::populate::{AssetPath, Populator};
use crate::store::BackingStore;
use actix_files::NamedFile;
use actix_web::{web, HttpRequest, HttpResponse};
use std::path::PathBuf;

/// Serves regular files under a root directory. Range, conditional and HEAD
/// requests are handled by `NamedFile`.
pub struct StaticFiles {
    root: PathBuf,
}

impl StaticFiles {
    pub fn new(root: PathBuf) -> StaticFiles {
        StaticFiles { root }
    }

    pub async fn serve(
        &self,
        req: &HttpRequest,
        asset: &AssetPath,
    ) -> Result<HttpResponse, Error> {
        let path = asset.local(&self.root);
        if !path.is_file() {
            return Err(Error::NotFound(path));
        }
        let file = NamedFile::open_async(&path).await?;
        Ok(file.into_response(req))
    }
}

/// Populates the serve root on a miss, then hands over to `StaticFiles`.
pub struct AssetHandler {
    root: PathBuf,
    populator: Populator,
    files: StaticFiles,
}

impl AssetHandler {
    pub fn new(config: &Config, client: reqwest::Client) -> AssetHandler {
        AssetHandler {
            root: config.serve_root.clone(),
            populator: Populator::new(BackingStore::from_config(config), client),
            files: StaticFiles::new(config.serve_root.clone()),
        }
    }

    pub async fn handle(&self, req: &HttpRequest, tail: &str) -> Result<HttpResponse, Error> {
        let asset = match AssetPath::parse(tail) {
            Ok(asset) => asset,
            Err(e) => {
                warn!("{}", e);
                return Err(e);
            }
        };
        info!("{}", asset.request());

        let local = asset.local(&self.root);
        if !local.exists() {
            if let Err(e) = self.populator.populate(&asset, &local).await {
                warn!("{}: {}", asset.request(), e);
                return Err(e);
            }
        }
        let resp = self.files.serve(req, &asset).await;
        if let Err(e) = &resp {
            warn!("{}: {}", asset.request(), e);
        }
        resp
    }
}

async fn assets(req: HttpRequest, handler: web::Data<AssetHandler>) -> Result<HttpResponse, Error> {
    let tail = req.match_info().query("tail").to_string();
    handler.handle(&req, &tail).await
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/{tail:.*}")
            .route(web::get().to(assets))
            .route(web::head().to(assets)),
    );
}

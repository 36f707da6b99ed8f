// Static file server that lazily fills its document root from up to two
// remote backing stores. Media paths missing on disk are fetched once,
// written under the root and served from disk from then on.
//
// Could be better:
// * no locking around fetch-then-write, so concurrent misses fetch twice
// * no timeout on the remote fetch beyond the client default
#[macro_use]
extern crate log;
use actix_web::middleware::Logger;
use actix_web::{web, App, HttpServer};
use serde::Deserialize;

mod config;
mod error;
mod handler;
mod populate;
mod store;

const USAGE: &str = "
Usage: static-media [options] <path>
       static-media (-h | --help)

Options:
    --backing URL    Backing store to retrieve media
    --secondary URL  Secondary backing store to retrieve media
    --port PORT      Port to listen on [default: 8001]
    -h --help        Show this screen.
";

#[derive(Deserialize, Debug)]
pub struct Args {
    arg_path: String,
    flag_backing: String,
    flag_secondary: String,
    flag_port: u16,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = docopt::Docopt::new(USAGE)
        .and_then(|d| d.deserialize())
        .unwrap_or_else(|e| e.exit());

    let config = match config::Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };
    std::fs::create_dir_all(&config.serve_root)?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("static-media/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(std::io::Error::other)?;
    let assets = web::Data::new(handler::AssetHandler::new(&config, client));

    info!(
        "serving {} on port {}",
        config.serve_root.display(),
        config.port
    );
    let port = config.port;
    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(assets.clone())
            .configure(handler::routes)
    })
    .bind(("0.0.0.0", port))
    .map_err(|e| {
        error!("could not bind port {}: {}", port, e);
        e
    })?
    .run()
    .await
}

use std::{path::PathBuf, time::Instant};

use actix_web::{middleware, web::Data, App, HttpServer};
use anyhow::Context;
use chrono::Local;
use clap::{Parser, Subcommand};

use crate::{
    client::HttpTransitApi,
    gtfs::{stop::StopId, Gtfs},
    map::provider::Surface,
    page::Page,
    service::DataService,
};
mod api;
mod cache;
mod client;
mod config;
mod geo;
mod gtfs;
mod map;
mod page;
mod realtime;
mod service;

#[derive(Parser)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve station, line and realtime data under /api
    Serve {
        /// Directory holding the static GTFS files
        #[arg(long, default_value = "data/gtfs_subway")]
        gtfs_dir: PathBuf,
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:5000")]
        bind: String,
    },
    /// Render the map page against a running backend
    Render {
        /// Base URL of the backend
        #[arg(long, default_value = "http://127.0.0.1:5000")]
        api: String,
        /// Station to click once the stations are loaded
        #[arg(long)]
        station: Option<String>,
        /// Credential for the map provider
        #[arg(long, env = "MAP_API_KEY")]
        map_key: Option<String>,
        /// Draw the line's color and live vehicles
        #[arg(long)]
        detailed: bool,
    },
}

async fn serve(gtfs_dir: PathBuf, bind: String) -> anyhow::Result<()> {
    let now = Instant::now();
    let gtfs = Gtfs::read(&gtfs_dir)
        .with_context(|| format!("Failed to read GTFS from {}", gtfs_dir.display()))?;
    log::info!(
        "Read {} stations and {} routes in {:?}",
        gtfs.stations().len(),
        gtfs.routes().len(),
        now.elapsed()
    );

    let service = Data::new(DataService::new(gtfs));

    log::info!("Listening on {bind}");
    HttpServer::new(move || {
        App::new()
            .wrap(middleware::Logger::default())
            .app_data(service.clone())
            .configure(api::configure)
    })
    .bind(&bind)
    .with_context(|| format!("Failed to bind {bind}"))?
    .run()
    .await?;

    Ok(())
}

async fn render(
    api: String,
    station: Option<String>,
    map_key: Option<String>,
    detailed: bool,
) -> anyhow::Result<()> {
    let api = HttpTransitApi::new(api).detailed(detailed);
    let mut page = Page::new();

    match Surface::initialize(map_key.as_deref()) {
        Ok(surface) => page.provider_ready(surface),
        Err(e) => log::warn!("Map provider unavailable, rendering without a map: {e}"),
    }

    page.mount(&api).await;

    if let Some(station) = station {
        match page.marker_for(&StopId::new(&station)) {
            Some(marker) => page.click(&marker, &api).await,
            None => log::warn!("No marker for station {station}"),
        }
    }

    let view = page.render(Local::now().date_naive());
    log::info!(
        "Rendered {} markers for {} stations and {} of {} routes ({} lines attached)",
        view.map.markers().count(),
        page.stations().len(),
        view.map.lines().count(),
        page.map().routes().len(),
        page.map().provider().map_or(0, Surface::attached)
    );

    println!("{}", view.title);
    println!("{}", view.date);
    println!(
        "Center: {:.4}, {:.4} (zoom {})",
        view.map.center.latitude(),
        view.map.center.longitude(),
        view.map.zoom
    );
    println!("{}", view.map.to_geojson()?);

    Ok(())
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    match args.command {
        Command::Serve { gtfs_dir, bind } => serve(gtfs_dir, bind).await,
        Command::Render {
            api,
            station,
            map_key,
            detailed,
        } => render(api, station, map_key, detailed).await,
    }
}

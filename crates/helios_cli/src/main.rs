mod cli;

use std::net::TcpListener;
use std::path::Path;
use std::sync::Arc;
use std::thread;

use anyhow::{Context, Result};
use clap::Parser;

use helios_core::{RasterBuffer, RenderOptions, WorkerFactory};
use helios_dispatch::{
    serve_connection, Master, RenderClient, RenderClientDescriptor, RowRangeRequest,
    SessionConfig, SessionOutcome, TcpRenderClient,
};
use helios_renderer::{demo_scene, TracerFactory};

fn main() -> Result<()> {
    let args = cli::Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level.into())
        .init();

    match args.command {
        cli::Command::Render(render) => run_render(render),
        cli::Command::Serve(serve) => run_serve(serve),
    }
}

fn run_render(args: cli::RenderArgs) -> Result<()> {
    let options = RenderOptions {
        supersampling: args.supersampling,
        jitter: args.jitter,
        shadows: !args.no_shadows,
        reflections: !args.no_reflections,
        refractions: !args.no_refractions,
        max_depth: args.max_depth,
        point_cloud: args.point_cloud.is_some(),
        seed: args.seed,
    };

    let workers = if args.threads == 0 {
        thread::available_parallelism()
            .map(|n| n.get() as u32)
            .unwrap_or(1)
    } else {
        args.threads
    };

    let (width, height) = (args.width, args.height);
    let factory = Arc::new(TracerFactory::new(
        move || demo_scene(width, height),
        width,
        height,
        options.clone(),
    ));

    let clients: Vec<Box<dyn RenderClient>> = args
        .clients
        .iter()
        .map(|&address| {
            let descriptor = RenderClientDescriptor {
                address,
                timeout_ms: args.client_timeout_ms,
            };
            Box::new(TcpRenderClient::new(descriptor)) as Box<dyn RenderClient>
        })
        .collect();

    let master = Master::new();
    let config = SessionConfig::new(width, height, workers).with_options(options);
    let handle = master.start_render(config, factory, clients)?;
    let result = handle.join()?;

    save_png(&result.raster, &args.output)?;
    log::info!("wrote {}", args.output.display());

    for failure in &result.client_failures {
        log::warn!(
            "client {} failed ({}); {} rows were re-rendered locally",
            failure.label,
            failure.error,
            failure.reassigned_rows
        );
    }
    for fault in &result.worker_faults {
        log::error!("worker {} faulted: {}", fault.ordinal, fault.fault);
    }

    println!(
        "{} in {:.1}s [ {}x{}, mt{}, {} ]",
        match result.outcome {
            SessionOutcome::Completed => "finished",
            SessionOutcome::Cancelled => "cancelled",
        },
        result.elapsed.as_secs_f64(),
        width,
        height,
        workers,
        result.stats
    );

    if let Some(path) = &args.point_cloud {
        let exported = master
            .export_point_cloud(path)
            .with_context(|| format!("exporting point cloud to {}", path.display()))?;
        println!("point cloud: {} samples -> {}", exported, path.display());
    }

    Ok(())
}

fn save_png(raster: &RasterBuffer, path: &Path) -> Result<()> {
    let mut img = image::RgbImage::new(raster.width(), raster.height());
    for y in 0..raster.height() {
        for x in 0..raster.width() {
            let px = raster.get(x, y);
            img.put_pixel(x, y, image::Rgb([px.r, px.g, px.b]));
        }
    }
    img.save(path)
        .with_context(|| format!("writing {}", path.display()))
}

/// Run as a remote render client: a master connects and streams
/// row-range requests; each request is rendered with a fresh renderer
/// built from the request's own size and options.
fn run_serve(args: cli::ServeArgs) -> Result<()> {
    let listener = TcpListener::bind(args.listen)
        .with_context(|| format!("binding {}", args.listen))?;
    log::info!("render client listening on {}", args.listen);

    for stream in listener.incoming() {
        let stream = match stream {
            Ok(stream) => stream,
            Err(e) => {
                log::warn!("accept failed: {e}");
                continue;
            }
        };
        thread::spawn(move || {
            let build = |request: &RowRangeRequest| {
                let factory = TracerFactory::new(
                    {
                        let (w, h) = (request.width, request.height);
                        move || demo_scene(w, h)
                    },
                    request.width,
                    request.height,
                    request.options.clone(),
                );
                factory.build(0)
            };
            if let Err(e) = serve_connection(stream, &build) {
                log::warn!("connection ended with error: {e}");
            }
        });
    }
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use mapshot::{
    BackendConfig, Options,
    projection::CoordTransform,
    render::{CommandRenderer, RenderTarget, render_map},
    resolve,
};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

fn main() -> anyhow::Result<()> {
    let options = Options::parse();

    let level = if options.debug {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    let backend = match &options.backend {
        Some(path) => BackendConfig::from_file(path)
            .with_context(|| format!("Error loading backend {}", path.display()))?,
        None => BackendConfig::default(),
    };

    backend.validate()?;

    let renderer = CommandRenderer::new(&backend);

    let geometry = resolve(&options.to_request(), backend.capabilities(), &backend.layers)?;

    tracing::debug!("scale={:?}", geometry.ground_scale);
    tracing::debug!("scale_factor={}", geometry.scale_factor);
    tracing::debug!(
        "size={},{}",
        geometry.pixel_size.width,
        geometry.pixel_size.height
    );
    tracing::debug!("bbox={}", geometry.bbox);
    tracing::debug!(
        "bbox_wgs84={}",
        geometry.projection.backward_bbox(&geometry.bbox)?
    );

    if options.dry_run {
        println!("{}", serde_json::to_string_pretty(&geometry.report()?)?);

        return Ok(());
    }

    let target = RenderTarget {
        output: options.output.clone(),
        buffer: backend.buffer,
        just_tiles: options.just_tiles,
        wld: options.wld.clone(),
        ozi: options.ozi.clone(),
    };

    render_map(&renderer, &options.style, &geometry, &target)?;

    tracing::info!("Rendered {}", options.output);

    Ok(())
}

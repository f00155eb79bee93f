//! Rendering the resolved geometry through an external renderer, optionally
//! in tiles that are then stitched together.

use crate::{
    backend::BackendConfig,
    bbox::BBox,
    geometry::{PixelSize, ResolvedGeometry},
    georef::{ozi_file, world_file},
    projection::Projection,
    tiles::TileGrid,
};
use anyhow::{Context, bail};
use image::{DynamicImage, ImageFormat, ImageReader, RgbaImage, imageops::replace};
use rayon::iter::{IntoParallelRefIterator, ParallelIterator};
use std::{
    fs::{File, remove_file},
    io::{Write, copy},
    path::{Path, PathBuf},
    process::Command,
};

/// Smallest tile edge in pixels.
const MIN_TILE_SIZE: u32 = 32;

/// What one renderer invocation draws.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderFrame {
    pub bbox: BBox,
    pub size: PixelSize,
    pub scale_factor: f64,
    pub format: String,
    /// Pixels rendered around the frame and cut off, 0 for single images.
    pub buffer: u32,
    /// Target projection definition
    pub srs: String,
}

impl RenderFrame {
    pub fn new(geometry: &ResolvedGeometry, bbox: BBox) -> Self {
        Self {
            bbox,
            size: geometry.pixel_size,
            scale_factor: geometry.scale_factor,
            format: geometry.format.clone(),
            buffer: 0,
            srs: geometry.projection.definition().to_string(),
        }
    }

    pub fn for_tile(&self, tile: &Tile, buffer: u32) -> Self {
        Self {
            bbox: tile.bbox,
            size: tile.size,
            buffer,
            ..self.clone()
        }
    }
}

pub trait Renderer: Sync {
    fn render(&self, style: &Path, frame: &RenderFrame, output: &Path) -> anyhow::Result<()>;
}

/// Runs a configured command line per rendered image.
#[derive(Clone, Debug)]
pub struct CommandRenderer {
    command: Vec<String>,
}

impl CommandRenderer {
    pub fn new(config: &BackendConfig) -> Self {
        Self {
            command: config.command.clone(),
        }
    }

    pub fn arguments(&self, style: &Path, frame: &RenderFrame, output: &Path) -> Vec<String> {
        let bbox = frame.bbox;

        let values = [
            ("style", style.display().to_string()),
            ("output", output.display().to_string()),
            ("format", frame.format.clone()),
            ("width", frame.size.width.to_string()),
            ("height", frame.size.height.to_string()),
            ("minx", bbox.min_x.to_string()),
            ("miny", bbox.min_y.to_string()),
            ("maxx", bbox.max_x.to_string()),
            ("maxy", bbox.max_y.to_string()),
            ("bbox", bbox.to_string()),
            ("scale_factor", frame.scale_factor.to_string()),
            ("buffer", frame.buffer.to_string()),
            ("srs", frame.srs.clone()),
        ];

        self.command
            .iter()
            .map(|arg| {
                values
                    .iter()
                    .fold(arg.clone(), |arg, (name, value)| {
                        arg.replace(&format!("{{{name}}}"), value)
                    })
            })
            .collect()
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, style: &Path, frame: &RenderFrame, output: &Path) -> anyhow::Result<()> {
        let args = self.arguments(style, frame, output);

        let Some((program, args)) = args.split_first() else {
            bail!("Backend command is empty");
        };

        tracing::debug!("Running {program} {}", args.join(" "));

        let status = Command::new(program)
            .args(args)
            .status()
            .with_context(|| format!("Error running renderer {program}"))?;

        if !status.success() {
            bail!("Renderer {program} failed with {status}");
        }

        Ok(())
    }
}

/// One tile of a [`TilePlan`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tile {
    pub row: u32,
    pub column: u32,
    /// Pixel offset in the full image
    pub x: u32,
    pub y: u32,
    pub bbox: BBox,
    pub size: PixelSize,
}

impl Tile {
    /// `{row:02}_{column:02}_{file name}` next to `output`.
    pub fn path(&self, output: &Path) -> PathBuf {
        let name = output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        output.with_file_name(format!("{:02}_{:02}_{name}", self.row, self.column))
    }
}

/// Split of the image into tiles.
#[derive(Clone, Debug, PartialEq)]
pub struct TilePlan {
    /// Bbox grown to the aspect ratio of the image
    pub bbox: BBox,
    /// Projected units per pixel
    pub scale: f64,
    pub size: PixelSize,
    pub tile_size: PixelSize,
    pub count: TileGrid,
}

/// Grow the short side of `bbox` around its center to the aspect ratio of
/// `size`.
pub fn fit_aspect(bbox: &BBox, size: PixelSize) -> BBox {
    if size.width == 0 || size.height == 0 {
        return *bbox;
    }

    let (width, height) = (f64::from(size.width), f64::from(size.height));

    let rdiff = bbox.width() / bbox.height() - width / height;

    if rdiff > 0.0 {
        bbox.with_height(bbox.width() * height / width)
    } else if rdiff < 0.0 {
        bbox.with_width(bbox.height() * width / height)
    } else {
        *bbox
    }
}

impl TilePlan {
    pub fn new(bbox: &BBox, size: PixelSize, grid: TileGrid) -> Self {
        let bbox = fit_aspect(bbox, size);

        let tile_size = PixelSize::new(
            size.width.div_ceil(grid.x).max(MIN_TILE_SIZE),
            size.height.div_ceil(grid.y).max(MIN_TILE_SIZE),
        );

        Self {
            bbox,
            scale: bbox.width() / f64::from(size.width),
            size,
            tile_size,
            count: TileGrid {
                x: size.width.div_ceil(tile_size.width),
                y: size.height.div_ceil(tile_size.height),
            },
        }
    }

    /// Tiles row by row; the last column and row take the remainder.
    pub fn tiles(&self) -> Vec<Tile> {
        let (tile_width, tile_height) = (self.tile_size.width, self.tile_size.height);

        let mut tiles = Vec::with_capacity((self.count.x * self.count.y) as usize);

        for row in 0..self.count.y {
            for column in 0..self.count.x {
                let x = tile_width * column;

                let y = tile_height * row;

                let width = if column + 1 < self.count.x {
                    tile_width
                } else {
                    self.size.width - x
                };

                let height = if row + 1 < self.count.y {
                    tile_height
                } else {
                    self.size.height - y
                };

                let size = PixelSize::new(width, height);

                let bbox = BBox::new(
                    self.bbox.min_x + f64::from(x) * self.scale,
                    self.bbox.max_y - f64::from(y + size.height) * self.scale,
                    self.bbox.min_x + f64::from(x + size.width) * self.scale,
                    self.bbox.max_y - f64::from(y) * self.scale,
                );

                tiles.push(Tile {
                    row,
                    column,
                    x,
                    y,
                    bbox,
                    size,
                });
            }
        }

        tiles
    }
}

/// Where the rendered image and its side files go.
#[derive(Clone, Debug, Default)]
pub struct RenderTarget {
    /// Output path; `-` is stdout.
    pub output: String,
    pub buffer: u32,
    pub just_tiles: bool,
    pub wld: Option<PathBuf>,
    pub ozi: Option<PathBuf>,
}

/// Image encoding for stitching tiles of the given output format.
fn image_format(format: &str) -> Option<ImageFormat> {
    if format.starts_with("png") {
        Some(ImageFormat::Png)
    } else if format.starts_with("jpeg") || format.starts_with("jpg") {
        Some(ImageFormat::Jpeg)
    } else {
        ImageFormat::from_extension(format)
    }
}

/// Paste `tiles` into one image of `size` and save it to `output`.
pub fn stitch(
    tiles: &[(Tile, PathBuf)],
    size: PixelSize,
    output: &Path,
    format: &str,
) -> anyhow::Result<()> {
    let Some(image_format) = image_format(format) else {
        bail!("Cannot join tiles of format {format}");
    };

    let mut canvas = RgbaImage::new(size.width, size.height);

    for (tile, path) in tiles {
        let image = ImageReader::open(path)
            .with_context(|| format!("Error opening tile {}", path.display()))?
            .with_guessed_format()?
            .decode()
            .with_context(|| format!("Error decoding tile {}", path.display()))?;

        replace(&mut canvas, &image.to_rgba8(), i64::from(tile.x), i64::from(tile.y));
    }

    let image = match image_format {
        ImageFormat::Jpeg => DynamicImage::ImageRgb8(DynamicImage::ImageRgba8(canvas).to_rgb8()),
        _ => DynamicImage::ImageRgba8(canvas),
    };

    image
        .save_with_format(output, image_format)
        .with_context(|| format!("Error writing {}", output.display()))
}

/// Write the requested world and OZI files for an image covering `bbox`.
pub fn write_side_files(
    bbox: &BBox,
    size: PixelSize,
    image_name: &str,
    projection: &Projection,
    wld: Option<&Path>,
    ozi: Option<&Path>,
) -> anyhow::Result<()> {
    if let Some(path) = ozi {
        std::fs::write(path, ozi_file(bbox, size, image_name, projection)?)
            .with_context(|| format!("Error writing {}", path.display()))?;
    }

    if let Some(path) = wld {
        std::fs::write(path, world_file(bbox, size))
            .with_context(|| format!("Error writing {}", path.display()))?;
    }

    Ok(())
}

/// Render the whole map described by `geometry`.
pub fn render_map(
    renderer: &dyn Renderer,
    style: &Path,
    geometry: &ResolvedGeometry,
    target: &RenderTarget,
) -> anyhow::Result<()> {
    let size = geometry.pixel_size;

    if !geometry.tiles.is_tiled() {
        let bbox = fit_aspect(&geometry.bbox, size);

        let frame = RenderFrame::new(geometry, bbox);

        if geometry.to_stdout {
            render_to_stdout(renderer, style, &frame)?;
        } else {
            renderer.render(style, &frame, Path::new(&target.output))?;
        }

        return write_side_files(
            &bbox,
            size,
            &target.output,
            &geometry.projection,
            target.wld.as_deref(),
            target.ozi.as_deref(),
        );
    }

    let plan = TilePlan::new(&geometry.bbox, size, geometry.tiles);

    tracing::debug!("tile_count={}", plan.count);

    tracing::debug!("tile_size={},{}", plan.tile_size.width, plan.tile_size.height);

    let frame = RenderFrame::new(geometry, plan.bbox);

    let output = Path::new(&target.output);

    let results: Vec<_> = plan
        .tiles()
        .par_iter()
        .map(|tile| -> anyhow::Result<(Tile, PathBuf)> {
            tracing::debug!("tile={},{}", tile.row, tile.column);

            let path = tile.path(output);

            renderer.render(style, &frame.for_tile(tile, target.buffer), &path)?;

            Ok((*tile, path))
        })
        .collect();

    if let Some(index) = results.iter().position(Result::is_err) {
        for (_, path) in results.iter().flatten() {
            if let Err(err) = remove_file(path) {
                tracing::warn!("Error removing tile {}: {err}", path.display());
            }
        }

        return match results.into_iter().nth(index) {
            Some(Err(err)) => Err(err),
            _ => bail!("Tile rendering failed"),
        };
    }

    let tiles: Vec<_> = results.into_iter().flatten().collect();

    if target.just_tiles {
        for (tile, path) in &tiles {
            write_side_files(
                &tile.bbox,
                tile.size,
                &path.to_string_lossy(),
                &geometry.projection,
                target.wld.is_some().then(|| path.with_extension("wld")).as_deref(),
                target.ozi.is_some().then(|| path.with_extension("map")).as_deref(),
            )?;
        }

        return Ok(());
    }

    stitch(&tiles, size, output, &geometry.format)?;

    for (_, path) in &tiles {
        remove_file(path).with_context(|| format!("Error removing tile {}", path.display()))?;
    }

    write_side_files(
        &plan.bbox,
        size,
        &target.output,
        &geometry.projection,
        target.wld.as_deref(),
        target.ozi.as_deref(),
    )
}

/// Render into a temporary file and copy it to stdout.
fn render_to_stdout(
    renderer: &dyn Renderer,
    style: &Path,
    frame: &RenderFrame,
) -> anyhow::Result<()> {
    let path = std::env::temp_dir().join(format!(
        "mapshot-{}.{}",
        std::process::id(),
        frame.format
    ));

    let result = renderer.render(style, frame, &path).and_then(|()| {
        let mut file = File::open(&path)?;

        let mut stdout = std::io::stdout().lock();

        copy(&mut file, &mut stdout)?;

        stdout.flush()?;

        Ok(())
    });

    if path.exists() {
        remove_file(&path)?;
    }

    result
}

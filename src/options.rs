use crate::{
    bbox::{BBox, Coord},
    geometry::{
        Anchor, ExtentRequest, FitRequest, GeometryRequest, OutputRequest, PhysicalSize,
        ScaleRequest, SizeRequest,
    },
    map_url::parse_map_url,
    tiles::TileGrid,
};
use clap::Parser;
use std::path::PathBuf;

/// Pixel size used for `--url` when nothing else sizes the map.
pub const DEFAULT_URL_SIZE_PX: [u32; 2] = [1280, 1024];

#[derive(Clone, Debug, Parser, PartialEq)]
#[clap(version, about = "Render a map image for a bbox, zoom, scale or paper size")]
pub struct Options {
    /// Style file for the renderer
    pub style: PathBuf,

    /// Resulting image file; `-` writes to stdout
    pub output: String,

    /// Target zoom level
    #[clap(short, long)]
    pub zoom: Option<f64>,

    /// Pixels per inch (alternative to scale)
    #[clap(short, long, visible_alias = "dpi")]
    pub ppi: Option<f64>,

    /// Scale factor (affects ppi)
    #[clap(long, default_value_t = 1.0)]
    pub factor: f64,

    /// Scale as in 1:100000 (specifying ppi is recommended)
    #[clap(short, long)]
    pub scale: Option<f64>,

    /// Bounding box in WGS84
    #[clap(
        short,
        long,
        num_args = 4,
        value_names = ["XMIN", "YMIN", "XMAX", "YMAX"],
        allow_negative_numbers = true
    )]
    pub bbox: Option<Vec<f64>>,

    /// Paper format: `+4` for landscape A4, `-4` for portrait A4, `letter` for
    /// autorotated US Letter
    #[clap(short = 'a', long, allow_hyphen_values = true)]
    pub paper: Option<String>,

    /// Target dimensions in mm (one 0 allowed)
    #[clap(short = 'd', long, num_args = 2, value_names = ["W", "H"])]
    pub size: Option<Vec<f64>>,

    /// Target dimensions in pixels (one 0 allowed)
    #[clap(short = 'x', long, num_args = 2, value_names = ["W", "H"])]
    pub size_px: Option<Vec<u32>>,

    /// Do not swap width and height for bbox
    #[clap(long)]
    pub norotate: bool,

    /// Amount in mm to reduce paper size
    #[clap(short, long)]
    pub margin: Option<f64>,

    /// Center of the image in WGS84
    #[clap(
        short,
        long,
        num_args = 2,
        value_names = ["X", "Y"],
        allow_negative_numbers = true
    )]
    pub center: Option<Vec<f64>>,

    /// Fit layers in the map, comma-separated
    #[clap(long, value_delimiter = ',')]
    pub fit: Vec<String>,

    /// Margin for layers in `--fit`, mm
    #[clap(long, default_value_t = 5.0)]
    pub padding: f64,

    /// EPSG code as 1234 (without prefix "EPSG:") or a PROJ string; default is Web Mercator
    #[clap(short = 'P', long)]
    pub projection: Option<String>,

    /// URL of a map to center on
    #[clap(long)]
    pub url: Option<String>,

    /// Generate OZI map file
    #[clap(long)]
    pub ozi: Option<PathBuf>,

    /// Generate world file
    #[clap(long)]
    pub wld: Option<PathBuf>,

    /// Write N×N (`--tiles N`) or N×M (`--tiles NxM`) tiles, then join them
    #[clap(short, long, default_value = "1")]
    pub tiles: TileGrid,

    /// Do not join tiles, instead write ozi/wld file for each
    #[clap(long)]
    pub just_tiles: bool,

    /// Display calculated values
    #[clap(short = 'v', long)]
    pub debug: bool,

    /// Target file format (by default looks at extension)
    #[clap(short, long)]
    pub format: Option<String>,

    /// Renderer backend configuration, YAML or JSON
    #[clap(long)]
    pub backend: Option<PathBuf>,

    /// Print the resolved geometry as JSON instead of rendering
    #[clap(long)]
    pub dry_run: bool,
}

fn pair<T: Copy>(values: Option<&[T]>) -> Option<[T; 2]> {
    match values? {
        [a, b] => Some([*a, *b]),
        _ => None,
    }
}

impl Options {
    pub fn center(&self) -> Option<Coord> {
        pair(self.center.as_deref()).map(|[x, y]| Coord::new(x, y))
    }

    pub fn bbox(&self) -> Option<BBox> {
        match self.bbox.as_deref()? {
            [x1, y1, x2, y2] => Some(BBox::new(*x1, *y1, *x2, *y2)),
            _ => None,
        }
    }

    /// Geometry request, with `--url` filling in what was not given.
    pub fn to_request(&self) -> GeometryRequest {
        let map_url = self.url.as_deref().map(parse_map_url).unwrap_or_default();

        let zoom = self.zoom.or(map_url.zoom);

        let center = self.center().or(map_url.center);

        let bbox = self.bbox();

        let mut pixels = pair(self.size_px.as_deref());

        if self.url.is_some()
            && self.size.is_none()
            && pixels.is_none()
            && self.paper.is_none()
            && self.fit.is_empty()
            && bbox.is_none()
        {
            pixels = Some(DEFAULT_URL_SIZE_PX);
        }

        let physical = match (&self.paper, pair(self.size.as_deref())) {
            (Some(paper), _) => PhysicalSize::Paper(paper.clone()),
            (None, Some(size)) => PhysicalSize::Millimeters(size),
            (None, None) => PhysicalSize::Unspecified,
        };

        let scale = match (zoom, self.scale) {
            (Some(zoom), _) => ScaleRequest::Zoom(zoom),
            (None, Some(denominator)) => ScaleRequest::Denominator(denominator),
            (None, None) => ScaleRequest::Unspecified,
        };

        let anchor = match (bbox, center) {
            (Some(bbox), center) => Anchor::BBox { bbox, center },
            (None, Some(center)) => Anchor::Center(center),
            (None, None) => Anchor::Unspecified,
        };

        GeometryRequest {
            output: OutputRequest {
                output: self.output.clone(),
                format: self.format.clone(),
                projection: self.projection.clone(),
                ozi: self.ozi.is_some(),
            },
            size: SizeRequest {
                physical,
                pixels,
                margin_mm: self.margin,
                ppi: self.ppi,
                factor: self.factor,
                no_rotate: self.norotate,
            },
            extent: ExtentRequest {
                scale,
                anchor,
                fit: (!self.fit.is_empty()).then(|| FitRequest {
                    layers: self.fit.clone(),
                    padding_mm: self.padding,
                }),
            },
            tiles: self.tiles,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Options {
        Options::try_parse_from(["mapshot"].iter().chain(args)).unwrap()
    }

    #[test]
    fn negative_values_and_hyphen_paper() {
        let options = parse(&[
            "-b", "-8.1", "-49.1", "-8.0", "-49.0", "-a", "-4", "-c", "-8.05", "-49.05",
            "style.xml", "map.png",
        ]);

        assert_eq!(options.bbox(), Some(BBox::new(-8.1, -49.1, -8.0, -49.0)));
        assert_eq!(options.paper.as_deref(), Some("-4"));
        assert_eq!(options.center(), Some(Coord::new(-8.05, -49.05)));
    }

    #[test]
    fn defaults() {
        let options = parse(&["style.xml", "-"]);

        assert_eq!(options.output, "-");
        assert_eq!(options.factor, 1.0);
        assert_eq!(options.padding, 5.0);
        assert_eq!(options.tiles, TileGrid::SINGLE);

        let request = options.to_request();

        assert_eq!(request.extent.scale, ScaleRequest::Unspecified);
        assert_eq!(request.extent.anchor, Anchor::Unspecified);
        assert_eq!(request.size.pixels, None);
        assert_eq!(request.extent.fit, None);
    }

    #[test]
    fn dpi_alias_and_tiles() {
        let options = parse(&["--dpi", "300", "-t", "2x3", "style.xml", "map.png"]);

        assert_eq!(options.ppi, Some(300.0));
        assert_eq!(options.tiles, TileGrid { x: 2, y: 3 });
    }

    #[test]
    fn invalid_tiles_are_rejected() {
        assert!(Options::try_parse_from(["mapshot", "-t", "13", "style.xml", "map.png"]).is_err());
    }

    #[test]
    fn zoom_wins_over_scale() {
        let request = parse(&["-z", "14", "-s", "25000", "style.xml", "map.png"]).to_request();

        assert_eq!(request.extent.scale, ScaleRequest::Zoom(14.0));
    }

    #[test]
    fn url_fills_in_missing_values() {
        let request = parse(&[
            "--url",
            "https://www.openstreetmap.org/#map=14/49.0748/8.0327",
            "style.xml",
            "map.png",
        ])
        .to_request();

        assert_eq!(request.extent.scale, ScaleRequest::Zoom(14.0));
        assert_eq!(request.extent.anchor, Anchor::Center(Coord::new(8.0327, 49.0748)));
        assert_eq!(request.size.pixels, Some(DEFAULT_URL_SIZE_PX));
    }

    #[test]
    fn explicit_values_win_over_url() {
        let request = parse(&[
            "--url",
            "https://www.openstreetmap.org/#map=14/49.0748/8.0327",
            "-z",
            "12",
            "-c",
            "17.1",
            "48.1",
            "-a",
            "a4",
            "style.xml",
            "map.png",
        ])
        .to_request();

        assert_eq!(request.extent.scale, ScaleRequest::Zoom(12.0));
        assert_eq!(request.extent.anchor, Anchor::Center(Coord::new(17.1, 48.1)));
        assert_eq!(request.size.pixels, None);
        assert_eq!(request.size.physical, PhysicalSize::Paper("a4".to_string()));
    }

    #[test]
    fn fit_layers_with_padding() {
        let request = parse(&["--fit", "route,poi", "--padding", "10", "style.xml", "map.png"])
            .to_request();

        assert_eq!(
            request.extent.fit,
            Some(FitRequest {
                layers: vec!["route".to_string(), "poi".to_string()],
                padding_mm: 10.0,
            })
        );
    }

    #[test]
    fn bbox_with_center_keeps_both() {
        let request = parse(&[
            "-b", "8.01", "49.09", "8.05", "49.12", "-c", "8.03", "49.1", "style.xml", "map.png",
        ])
        .to_request();

        assert_eq!(
            request.extent.anchor,
            Anchor::BBox {
                bbox: BBox::new(8.01, 49.09, 8.05, 49.12),
                center: Some(Coord::new(8.03, 49.1)),
            }
        );
    }
}

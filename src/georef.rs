//! Georeferencing side files: world files and OziExplorer map files.

use crate::{
    bbox::BBox,
    error::ConfigurationError,
    geometry::PixelSize,
    projection::CoordTransform,
};
use std::fmt::Write;

/// Six-line world file for an image covering `bbox`.
pub fn world_file(bbox: &BBox, size: PixelSize) -> String {
    let pixel_x_size = bbox.width() / f64::from(size.width);

    let pixel_y_size = bbox.height() / f64::from(size.height);

    [
        pixel_x_size,
        0.0,
        0.0,
        -pixel_y_size,
        bbox.min_x + pixel_x_size * 0.5,
        bbox.max_y - pixel_y_size * 0.5,
    ]
    .iter()
    .fold(String::new(), |mut text, value| {
        let _ = writeln!(text, "{value:.8}");

        text
    })
}

/// Degrees and decimal minutes with hemisphere, e.g. `  49,4.48800,N`.
fn degrees_minutes(value: f64, is_lon: bool) -> String {
    let degrees = value.abs().floor();

    let minutes = (value.abs() - degrees) * 60.0;

    let hemisphere = match (value < 0.0, is_lon) {
        (true, true) => 'W',
        (true, false) => 'S',
        (false, true) => 'E',
        (false, false) => 'N',
    };

    format!("{:4},{minutes:3.5},{hemisphere}", degrees as i64)
}

/// OziExplorer 2.2 map file for an image covering `bbox` (target units).
pub fn ozi_file(
    bbox: &BBox,
    size: PixelSize,
    name: &str,
    transform: &dyn CoordTransform,
) -> Result<String, ConfigurationError> {
    let bbox_wgs84 = transform.backward_bbox(bbox)?;

    let (width, height) = (size.width, size.height);

    let mut text = String::new();

    let _ = write!(
        text,
        "OziExplorer Map Data File Version 2.2\n\
         mapshot\n\
         {name}\n\
         1 ,Map Code,\n\
         WGS 84,WGS 84,   0.0000,   0.0000,WGS 84\n\
         Reserved 1\n\
         Reserved 2\n\
         Magnetic Variation,,,E\n\
         Map Projection,Mercator,PolyCal,No,AutoCalOnly,No,BSBUseWPX,No\n\
         Point01,xy,    0,    0,in, deg,{top},{left}, grid,   ,           ,           ,N\n\
         Point02,xy, {w:4}, {h:4},in, deg,{bottom},{right}, grid,   ,           ,           ,N\n",
        top = degrees_minutes(bbox_wgs84.max_y, false),
        left = degrees_minutes(bbox_wgs84.min_x, true),
        w = i64::from(width) - 1,
        h = i64::from(height) - 1,
        bottom = degrees_minutes(bbox_wgs84.min_y, false),
        right = degrees_minutes(bbox_wgs84.max_x, true),
    );

    for n in 3..31 {
        let _ = writeln!(
            text,
            "Point{n:02},xy,     ,     ,in, deg,    ,        ,N,    ,        ,E, grid,   ,           ,           ,N"
        );
    }

    text.push_str(
        "Projection Setup,,,,,,,,,,\n\
         Map Feature = MF ; Map Comment = MC     These follow if they exist\n\
         Track File = TF      These follow if they exist\n\
         Moving Map Parameters = MM?    These follow if they exist\n\
         MM0,Yes\n\
         MMPNUM,4\n\
         MMPXY,1,0,0\n",
    );

    let _ = writeln!(text, "MMPXY,2,{width},0");
    let _ = writeln!(text, "MMPXY,3,{width},{height}");
    let _ = writeln!(text, "MMPXY,4,0,{height}");

    for (i, (lon, lat)) in [
        (bbox_wgs84.min_x, bbox_wgs84.max_y),
        (bbox_wgs84.max_x, bbox_wgs84.max_y),
        (bbox_wgs84.max_x, bbox_wgs84.min_y),
        (bbox_wgs84.min_x, bbox_wgs84.min_y),
    ]
    .into_iter()
    .enumerate()
    {
        let _ = writeln!(text, "MMPLL,{},{lon:4.6},{lat:4.6}", i + 1);
    }

    let _ = writeln!(
        text,
        "MM1B,{}",
        bbox.width() / f64::from(width) * bbox_wgs84.center().y.to_radians().cos()
    );

    text.push_str("MOP,Map Open Position,0,0\n");

    let _ = writeln!(text, "IWH,Map Image Width/Height,{width},{height}");

    Ok(text)
}

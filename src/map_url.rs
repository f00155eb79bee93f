//! Zoom and center from a web map URL.

use crate::bbox::Coord;
use regex::{Regex, RegexBuilder};
use std::sync::OnceLock;

static FRAGMENT: OnceLock<Regex> = OnceLock::new();
static LAT: OnceLock<Regex> = OnceLock::new();
static LON: OnceLock<Regex> = OnceLock::new();
static ZOOM: OnceLock<Regex> = OnceLock::new();

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct MapUrl {
    pub zoom: Option<f64>,
    /// lon, lat
    pub center: Option<Coord>,
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .unwrap_or_else(|err| unreachable!("invalid pattern {pattern}: {err}"))
}

fn capture(regex: &Regex, url: &str) -> Option<f64> {
    regex
        .captures(url)
        .and_then(|captures| captures.get(1))
        .and_then(|value| value.as_str().parse().ok())
}

/// Recognizes `#zoom/lat/lon` style fragments, else `lat=`, `lon=` and
/// `zoom=` parameters.
pub fn parse_map_url(url: &str) -> MapUrl {
    let fragment = FRAGMENT.get_or_init(|| {
        case_insensitive(r"[#/=]([0-9]{1,2})/(-?[0-9]{1,2}\.[0-9]+)/(-?[0-9]{1,3}\.[0-9]+)")
    });

    if let Some(captures) = fragment.captures(url) {
        let number = |i: usize| captures.get(i).and_then(|m| m.as_str().parse::<f64>().ok());

        return MapUrl {
            zoom: number(1),
            center: number(3).zip(number(2)).map(|(lon, lat)| Coord::new(lon, lat)),
        };
    }

    let lat = capture(
        LAT.get_or_init(|| case_insensitive(r"lat=(-?[0-9]{1,2}\.[0-9]+)")),
        url,
    );

    let lon = capture(
        LON.get_or_init(|| case_insensitive(r"lon=(-?[0-9]{1,3}\.[0-9]+)")),
        url,
    );

    let zoom = capture(
        ZOOM.get_or_init(|| case_insensitive(r"zoom=([0-9]{1,2})")),
        url,
    );

    MapUrl {
        zoom,
        center: lon.zip(lat).map(|(lon, lat)| Coord::new(lon, lat)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn osm_fragment() {
        let url = parse_map_url("https://www.openstreetmap.org/#map=14/49.0748/8.0327");

        assert_eq!(url.zoom, Some(14.0));
        assert_eq!(url.center, Some(Coord::new(8.0327, 49.0748)));
    }

    #[test]
    fn path_style_with_negative_coordinates() {
        let url = parse_map_url("https://example.org/map/9/-33.8688/-151.2093");

        assert_eq!(url.zoom, Some(9.0));
        assert_eq!(url.center, Some(Coord::new(-151.2093, -33.8688)));
    }

    #[test]
    fn query_parameters() {
        let url = parse_map_url("https://example.org/?LAT=48.1486&lon=17.1077&zoom=12");

        assert_eq!(url.zoom, Some(12.0));
        assert_eq!(url.center, Some(Coord::new(17.1077, 48.1486)));
    }

    #[test]
    fn partial_center_is_ignored() {
        let url = parse_map_url("https://example.org/?lat=48.1486&z=3");

        assert_eq!(url, MapUrl::default());
    }
}

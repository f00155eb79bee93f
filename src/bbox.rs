use serde::Serialize;
use std::fmt::{Display, Formatter};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Coord {
    pub x: f64,
    pub y: f64,
}

impl Coord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle; `min_*`/`max_*` are kept ordered by [`BBox::new`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct BBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self {
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    pub fn around(center: Coord, half_width: f64, half_height: f64) -> Self {
        Self::new(
            center.x - half_width,
            center.y - half_height,
            center.x + half_width,
            center.y + half_height,
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }

    pub fn is_portrait(&self) -> bool {
        self.height() > self.width()
    }

    /// SW, SE, NE, NW
    pub fn corners(&self) -> [Coord; 4] {
        [
            Coord::new(self.min_x, self.min_y),
            Coord::new(self.max_x, self.min_y),
            Coord::new(self.max_x, self.max_y),
            Coord::new(self.min_x, self.max_y),
        ]
    }

    pub fn envelope(points: impl IntoIterator<Item = Coord>) -> Option<Self> {
        points.into_iter().fold(None, |bbox: Option<Self>, point| {
            Some(bbox.map_or(
                Self::new(point.x, point.y, point.x, point.y),
                |bbox| Self {
                    min_x: bbox.min_x.min(point.x),
                    min_y: bbox.min_y.min(point.y),
                    max_x: bbox.max_x.max(point.x),
                    max_y: bbox.max_y.max(point.y),
                },
            ))
        })
    }

    pub fn expand_to_include(&self, other: &Self) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn pad(&self, amount: f64) -> Self {
        Self::new(
            self.min_x - amount,
            self.min_y - amount,
            self.max_x + amount,
            self.max_y + amount,
        )
    }

    pub fn with_width(&self, width: f64) -> Self {
        let center = self.center();

        Self::new(
            center.x - width / 2.0,
            self.min_y,
            center.x + width / 2.0,
            self.max_y,
        )
    }

    pub fn with_height(&self, height: f64) -> Self {
        let center = self.center();

        Self::new(
            self.min_x,
            center.y - height / 2.0,
            self.max_x,
            center.y + height / 2.0,
        )
    }
}

impl From<[f64; 4]> for BBox {
    fn from([min_x, min_y, max_x, max_y]: [f64; 4]) -> Self {
        Self::new(min_x, min_y, max_x, max_y)
    }
}

impl From<BBox> for [f64; 4] {
    fn from(bbox: BBox) -> Self {
        [bbox.min_x, bbox.min_y, bbox.max_x, bbox.max_y]
    }
}

impl Display for BBox {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            formatter,
            "{},{},{},{}",
            self.min_x, self.min_y, self.max_x, self.max_y
        )
    }
}

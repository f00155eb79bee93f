//! Extents of map layers, for fitting the map to them.

use crate::{
    bbox::BBox,
    error::ConfigurationError,
    projection::{CoordTransform, Projection, WGS84},
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub trait LayerExtents {
    /// Union of the named layers' envelopes in `target` units; `None` when
    /// no named layer is known.
    fn layer_extent(
        &self,
        names: &[String],
        target: &Projection,
    ) -> Result<Option<BBox>, ConfigurationError>;
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LayerExtent {
    /// Spatial reference of `extent`
    #[serde(default = "default_srs")]
    pub srs: String,

    /// [min_x, min_y, max_x, max_y]
    pub extent: [f64; 4],
}

fn default_srs() -> String {
    WGS84.to_string()
}

impl LayerExtent {
    fn is_geographic(&self) -> bool {
        let srs = self.srs.trim();

        srs == "4326" || srs.eq_ignore_ascii_case(WGS84) || srs.starts_with("+proj=longlat")
    }

    /// Reproject the extent through WGS84 into `target`.
    pub fn reproject(&self, target: &Projection) -> Result<BBox, ConfigurationError> {
        let extent = BBox::from(self.extent);

        let same_srs = if target.is_web_mercator() {
            Projection::is_web_mercator_definition(&self.srs)
        } else {
            target.definition() == Projection::crs_definition(&self.srs)
        };

        if same_srs {
            return Ok(extent);
        }

        let extent_wgs84 = if self.is_geographic() {
            extent
        } else {
            Projection::from_definition(Some(&self.srs))?.backward_bbox(&extent)?
        };

        target.forward_bbox(&extent_wgs84)
    }
}

/// Layer extents listed in the backend configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerTable(pub BTreeMap<String, LayerExtent>);

impl LayerExtents for LayerTable {
    fn layer_extent(
        &self,
        names: &[String],
        target: &Projection,
    ) -> Result<Option<BBox>, ConfigurationError> {
        let mut bbox: Option<BBox> = None;

        for (name, layer) in self.0.iter().filter(|(name, _)| names.contains(name)) {
            let extent = layer.reproject(target)?;

            tracing::debug!("Layer {name} extent {extent}");

            bbox = Some(bbox.map_or(extent, |bbox| bbox.expand_to_include(&extent)));
        }

        Ok(bbox)
    }
}

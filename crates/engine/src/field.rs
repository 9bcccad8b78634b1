//! Scalar fields sampled on a regular grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use assemblage_kernel::{BoundingBox, Point3d};

use crate::error::AggregationError;
use crate::part::Part;

/// A scalar field on a regular grid.
///
/// Values are stored x-fastest: `values[i + nx * (j + ny * k)]` is the sample
/// at `origin + resolution * (i, j, k)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub origin: Point3d,
    pub resolution: f64,
    pub counts: [usize; 3],
    pub values: Vec<f64>,
}

impl Field {
    /// Field from explicit values; their count must match `counts`.
    pub fn new(
        name: impl Into<String>,
        origin: Point3d,
        resolution: f64,
        counts: [usize; 3],
        values: Vec<f64>,
    ) -> Result<Self, AggregationError> {
        let name = name.into();
        let expected = counts[0] * counts[1] * counts[2];
        if values.len() != expected {
            return Err(AggregationError::FieldShape {
                name,
                expected,
                found: values.len(),
            });
        }
        Ok(Self {
            name,
            origin,
            resolution,
            counts,
            values,
        })
    }

    /// Sample `f` at every grid point.
    pub fn from_fn(
        name: impl Into<String>,
        origin: Point3d,
        resolution: f64,
        counts: [usize; 3],
        f: impl Fn(&Point3d) -> f64,
    ) -> Self {
        let mut values = Vec::with_capacity(counts[0] * counts[1] * counts[2]);
        for k in 0..counts[2] {
            for j in 0..counts[1] {
                for i in 0..counts[0] {
                    values.push(f(&grid_point(&origin, resolution, [i, j, k])));
                }
            }
        }
        Self {
            name: name.into(),
            origin,
            resolution,
            counts,
            values,
        }
    }

    fn point_at_index(&self, index: usize) -> Point3d {
        let [nx, ny, _] = self.counts;
        let i = index % nx;
        let j = (index / nx) % ny;
        let k = index / (nx * ny);
        grid_point(&self.origin, self.resolution, [i, j, k])
    }

    /// Box spanned by the grid points.
    pub fn bounding_box(&self) -> BoundingBox {
        let extent = |n: usize| n.saturating_sub(1) as f64 * self.resolution;
        BoundingBox::new(
            self.origin,
            Point3d::new(
                self.origin.x + extent(self.counts[0]),
                self.origin.y + extent(self.counts[1]),
                self.origin.z + extent(self.counts[2]),
            ),
        )
    }

    /// Value of the nearest sample, `None` outside the grid's box.
    pub fn value_at(&self, p: &Point3d) -> Option<f64> {
        if self.values.is_empty() || !self.bounding_box().expanded(1e-9).contains_point(p) {
            return None;
        }
        let cell = |coord: f64, origin: f64, n: usize| {
            let i = ((coord - origin) / self.resolution).round().max(0.0) as usize;
            i.min(n.saturating_sub(1))
        };
        let i = cell(p.x, self.origin.x, self.counts[0]);
        let j = cell(p.y, self.origin.y, self.counts[1]);
        let k = cell(p.z, self.origin.z, self.counts[2]);
        self.values
            .get(i + self.counts[0] * (j + self.counts[1] * k))
            .copied()
    }

    /// Highest-valued grid point accepted by `filter`.
    pub fn highest_point(&self, mut filter: impl FnMut(&Point3d) -> bool) -> Option<Point3d> {
        let mut order: Vec<usize> = (0..self.values.len()).collect();
        order.sort_by(|&a, &b| self.values[b].total_cmp(&self.values[a]));
        order
            .into_iter()
            .map(|i| self.point_at_index(i))
            .find(|p| filter(p))
    }
}

fn grid_point(origin: &Point3d, resolution: f64, [i, j, k]: [usize; 3]) -> Point3d {
    Point3d::new(
        origin.x + i as f64 * resolution,
        origin.y + j as f64 * resolution,
        origin.z + k as f64 * resolution,
    )
}

/// Either one field for every part type, or one field per name selected by
/// each part's `field` tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FieldSource {
    Single(Field),
    Multiple(BTreeMap<String, Field>),
}

impl FieldSource {
    /// Fields keyed by their names.
    pub fn multiple(fields: impl IntoIterator<Item = Field>) -> Self {
        Self::Multiple(fields.into_iter().map(|f| (f.name.clone(), f)).collect())
    }

    /// True when parts pick their field by tag.
    pub fn is_multiple(&self) -> bool {
        matches!(self, Self::Multiple(_))
    }

    /// Field scoring candidates of `part`.
    pub fn field_for(&self, part: &Part) -> Result<&Field, AggregationError> {
        match self {
            Self::Single(field) => Ok(field),
            Self::Multiple(fields) => {
                let name = part.field.as_deref().unwrap_or_default();
                fields.get(name).ok_or_else(|| AggregationError::UnknownField {
                    name: name.to_string(),
                })
            }
        }
    }
}

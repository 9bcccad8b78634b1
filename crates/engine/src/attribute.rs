use serde::{Deserialize, Serialize};

use assemblage_kernel::{Line, Mesh, Plane, Point3d, Transform, Transformable, Vec3};

/// A value attached to a part. Geometric variants move with the part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value")]
pub enum AttributeValue {
    Point(Point3d),
    Vector(Vec3),
    Plane(Plane),
    Line(Line),
    Mesh(Mesh),
    Number(f64),
    Text(String),
}

impl Transformable for AttributeValue {
    fn transform(&self, t: &Transform) -> Self {
        match self {
            Self::Point(p) => Self::Point(p.transform(t)),
            Self::Vector(v) => Self::Vector(v.transform(t)),
            Self::Plane(p) => Self::Plane(p.transform(t)),
            Self::Line(l) => Self::Line(l.transform(t)),
            Self::Mesh(m) => Self::Mesh(m.transform(t)),
            Self::Number(_) | Self::Text(_) => self.clone(),
        }
    }
}

/// Named values carried by a part.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    pub values: Vec<AttributeValue>,
    /// When false the values stay put as the part moves.
    pub transformable: bool,
}

impl Attribute {
    /// Values with `transformable` set follow the part when it moves.
    pub fn new(name: impl Into<String>, values: Vec<AttributeValue>, transformable: bool) -> Self {
        Self {
            name: name.into(),
            values,
            transformable,
        }
    }
}

impl Transformable for Attribute {
    fn transform(&self, t: &Transform) -> Self {
        if !self.transformable {
            return self.clone();
        }
        Self {
            name: self.name.clone(),
            values: self.values.transform(t),
            transformable: true,
        }
    }
}

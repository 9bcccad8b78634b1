use serde::{Deserialize, Serialize};

use assemblage_kernel::{Line, Transform, Transformable};

/// A group of support probes. The group is satisfied when every direction
/// line touches some nearby placed part.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Support {
    pub directions: Vec<Line>,
}

impl Support {
    /// Group of directions that must all hit a neighbour.
    pub fn new(directions: Vec<Line>) -> Self {
        Self { directions }
    }
}

impl Transformable for Support {
    fn transform(&self, t: &Transform) -> Self {
        Self {
            directions: self.directions.transform(t),
        }
    }
}

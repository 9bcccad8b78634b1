pub mod bounds;
pub mod intersection;
pub mod line;
pub mod mesh;
pub mod plane;
pub mod point;
pub mod transform;
pub mod vector;

/// Values that can be carried along by a rigid (or affine) placement.
///
/// Implemented by every geometric value kind and by the engine's composite
/// types, so copying-and-moving a part is a plain recursive call.
pub trait Transformable: Sized {
    /// Return a transformed copy. `self` is left untouched.
    fn transform(&self, t: &transform::Transform) -> Self;
}

impl<T: Transformable> Transformable for Vec<T> {
    fn transform(&self, t: &transform::Transform) -> Self {
        self.iter().map(|item| item.transform(t)).collect()
    }
}

impl<T: Transformable> Transformable for Option<T> {
    fn transform(&self, t: &transform::Transform) -> Self {
        self.as_ref().map(|item| item.transform(t))
    }
}

/// Hierarchical model transform stack with camera and projection
use std::ops::{Deref, DerefMut};

use log::{debug, warn};
use nalgebra::{Matrix4, Point3, Rotation3, Unit, Vector3};

use crate::error::TransformError;
use crate::projection::{Camera, ClipVolume, Projection};

/// Accumulates model transforms and composes them with a view and projection.
///
/// Every composing operation right-multiplies the current matrix, so a new
/// transform is applied in the coordinate space set up by the ones before it.
/// The final matrix is `projection * view * current`, applied to column vectors.
#[derive(Debug, Clone)]
pub struct TransformStack {
    current: Matrix4<f32>,
    stack: Vec<Matrix4<f32>>,
    view: Matrix4<f32>,
    projection: Matrix4<f32>,
}

impl TransformStack {
    pub fn new() -> Self {
        Self {
            current: Matrix4::identity(),
            stack: Vec::new(),
            view: Matrix4::identity(),
            projection: Matrix4::identity(),
        }
    }

    /// Number of saved snapshots
    pub fn depth(&self) -> usize {
        self.stack.len()
    }

    pub fn current(&self) -> &Matrix4<f32> {
        &self.current
    }

    pub fn view(&self) -> &Matrix4<f32> {
        &self.view
    }

    pub fn projection(&self) -> &Matrix4<f32> {
        &self.projection
    }

    /// Save a copy of the current transform
    pub fn push(&mut self) {
        self.stack.push(self.current);
    }

    /// Restore the most recently saved transform
    pub fn pop(&mut self) -> Result<(), TransformError> {
        match self.stack.pop() {
            Some(saved) => {
                self.current = saved;
                Ok(())
            }
            None => {
                warn!("pop on an empty transform stack");
                Err(TransformError::StackUnderflow)
            }
        }
    }

    /// Drop every saved snapshot, keeping the current transform
    pub fn clear(&mut self) {
        self.stack.clear();
    }

    /// Back to the freshly constructed model state; view and projection are kept
    pub fn reset(&mut self) {
        self.stack.clear();
        self.current = Matrix4::identity();
    }

    pub fn translate(&mut self, x: f32, y: f32, z: f32) {
        self.current *= Matrix4::new_translation(&Vector3::new(x, y, z));
    }

    /// Rotate by `angle_degrees` around the axis `(x, y, z)`, which need not be normalized
    pub fn rotate(&mut self, angle_degrees: f32, x: f32, y: f32, z: f32) -> Result<(), TransformError> {
        let axis = Vector3::new(x, y, z);
        if !axis.iter().all(|c| c.is_finite()) {
            warn!("rejected rotation about non-finite axis {:?}", axis);
            return Err(TransformError::InvalidAxis);
        }
        // Largest component scaled to 1 keeps the norm finite and non-zero.
        let largest = axis.amax();
        if largest == 0.0 {
            warn!("rejected rotation about zero-length axis");
            return Err(TransformError::InvalidAxis);
        }
        let axis = Unit::new_normalize(axis / largest);

        let rotation = Rotation3::from_axis_angle(&axis, angle_degrees.to_radians());
        self.current *= rotation.to_homogeneous();
        Ok(())
    }

    /// Non-uniform scale; a zero factor flattens the geometry on that axis
    pub fn scale(&mut self, x: f32, y: f32, z: f32) {
        self.current *= Matrix4::new_nonuniform_scaling(&Vector3::new(x, y, z));
    }

    /// Replace the view matrix with a look-at from `eye` towards `target`
    pub fn set_camera(
        &mut self,
        eye: Point3<f32>,
        target: Point3<f32>,
        up: Vector3<f32>,
    ) -> Result<(), TransformError> {
        self.view = Camera::new(eye, target, up).view_matrix()?;
        debug!("camera set: eye={:?} target={:?}", eye, target);
        Ok(())
    }

    /// Replace the projection matrix
    pub fn set_projection(&mut self, projection: &Projection) -> Result<(), TransformError> {
        self.projection = projection.matrix()?;
        debug!("projection set: {:?}", projection);
        Ok(())
    }

    /// Perspective frustum, as `glFrustum`
    pub fn frustum(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<(), TransformError> {
        self.set_projection(&Projection::Perspective(ClipVolume::new(
            left, right, bottom, top, near, far,
        )))
    }

    /// Orthographic box, as `glOrtho`
    pub fn ortho(
        &mut self,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Result<(), TransformError> {
        self.set_projection(&Projection::Orthographic(ClipVolume::new(
            left, right, bottom, top, near, far,
        )))
    }

    /// Object space to clip space: `projection * view * current`
    pub fn final_matrix(&self) -> Matrix4<f32> {
        self.projection * self.view * self.current
    }

    /// Push now and pop when the returned guard goes out of scope.
    pub fn scope(&mut self) -> StackScope<'_> {
        let entry_depth = self.stack.len();
        let entry_current = self.current;
        self.push();
        StackScope {
            stack: self,
            entry_depth,
            entry_current,
        }
    }

    fn unwind_to(&mut self, depth: usize, current: Matrix4<f32>) {
        if self.stack.len() < depth {
            warn!(
                "transform scope closed at depth {} below its entry depth {}",
                self.stack.len(),
                depth
            );
        }
        self.stack.truncate(depth);
        self.current = current;
    }
}

impl Default for TransformStack {
    fn default() -> Self {
        Self::new()
    }
}

/// A pushed transform that is popped again when dropped.
///
/// Dropping restores both the stack depth and the current transform to what
/// they were when the scope was opened, even if pushes inside the scope were
/// left unmatched or the enclosing block returned early with an error.
///
/// Popping inside the scope below its entry depth is a caller bug. The
/// snapshots popped that way are gone: on drop the current transform is
/// still restored, the depth stays where the extra pops left it, and a
/// warning is logged.
pub struct StackScope<'a> {
    stack: &'a mut TransformStack,
    entry_depth: usize,
    entry_current: Matrix4<f32>,
}

impl Deref for StackScope<'_> {
    type Target = TransformStack;

    fn deref(&self) -> &TransformStack {
        self.stack
    }
}

impl DerefMut for StackScope<'_> {
    fn deref_mut(&mut self) -> &mut TransformStack {
        self.stack
    }
}

impl Drop for StackScope<'_> {
    fn drop(&mut self) {
        self.stack.unwind_to(self.entry_depth, self.entry_current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-5;

    fn apply(stack: &TransformStack, point: Point3<f32>) -> Point3<f32> {
        stack.final_matrix().transform_point(&point)
    }

    fn assert_point(actual: Point3<f32>, x: f32, y: f32, z: f32) {
        assert!(
            (actual - Point3::new(x, y, z)).norm() < EPS,
            "expected ({}, {}, {}), got {:?}",
            x,
            y,
            z,
            actual
        );
    }

    #[test]
    fn test_new_stack_is_identity_and_empty() {
        let stack = TransformStack::new();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &Matrix4::identity());
        assert_eq!(stack.final_matrix(), Matrix4::identity());
    }

    #[test]
    fn test_balanced_push_pop_keeps_final_matrix() {
        let mut stack = TransformStack::new();
        stack.ortho(-4.0, 4.0, -3.0, 3.0, 1.0, 20.0).unwrap();
        stack
            .set_camera(Point3::new(1.0, 2.0, 8.0), Point3::origin(), Vector3::y())
            .unwrap();
        stack.translate(0.5, -1.0, 2.0);
        let before = stack.final_matrix();

        stack.push();
        stack.rotate(45.0, 0.0, 1.0, 0.0).unwrap();
        stack.push();
        stack.scale(2.0, 2.0, 2.0);
        stack.push();
        stack.translate(3.0, 0.0, 0.0);
        for _ in 0..3 {
            stack.pop().unwrap();
        }

        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.final_matrix(), before);
    }

    #[test]
    fn test_pop_reverts_mutation_exactly() {
        let mut stack = TransformStack::new();
        stack.rotate(17.0, 1.0, 2.0, 3.0).unwrap();
        let before = *stack.current();

        stack.push();
        stack.translate(0.1, 0.2, 0.3);
        stack.pop().unwrap();

        assert_eq!(stack.current(), &before);
    }

    #[test]
    fn test_pop_on_empty_stack_underflows() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 2.0, 3.0);
        let before = *stack.current();

        assert_eq!(stack.pop(), Err(TransformError::StackUnderflow));
        assert_eq!(stack.current(), &before);
        assert_eq!(stack.depth(), 0);
    }

    #[test]
    fn test_translate_moves_origin() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 0.0, 0.0);
        assert_point(apply(&stack, Point3::origin()), 1.0, 0.0, 0.0);
    }

    #[test]
    fn test_composition_is_right_to_left() {
        // Rotating first turns the later translation's +X into +Y.
        let mut rotate_first = TransformStack::new();
        rotate_first.rotate(90.0, 0.0, 0.0, 1.0).unwrap();
        rotate_first.translate(1.0, 0.0, 0.0);
        assert_point(apply(&rotate_first, Point3::origin()), 0.0, 1.0, 0.0);

        // Translating first places the origin before the rotation can touch it.
        let mut translate_first = TransformStack::new();
        translate_first.translate(1.0, 0.0, 0.0);
        translate_first.rotate(90.0, 0.0, 0.0, 1.0).unwrap();
        assert_point(apply(&translate_first, Point3::origin()), 1.0, 0.0, 0.0);

        // The rotation still applies to points away from the local origin.
        assert_point(apply(&translate_first, Point3::new(1.0, 0.0, 0.0)), 1.0, 1.0, 0.0);
    }

    #[test]
    fn test_final_matrix_applies_model_then_view_then_projection() {
        let mut stack = TransformStack::new();
        stack.ortho(-10.0, 10.0, -10.0, 10.0, 0.0, 20.0).unwrap();
        stack
            .set_camera(Point3::new(0.0, 0.0, 10.0), Point3::origin(), Vector3::y())
            .unwrap();
        stack.translate(5.0, 0.0, 0.0);

        let expected = stack.projection() * stack.view() * stack.current();
        assert_eq!(stack.final_matrix(), expected);

        // x = 5 lands half way to the right edge; z = 0 sits 10 units in front of the eye.
        assert_point(apply(&stack, Point3::origin()), 0.5, 0.0, 0.0);
    }

    #[test]
    fn test_rotate_normalizes_axis() {
        let mut unit = TransformStack::new();
        unit.rotate(30.0, 0.0, 0.0, 1.0).unwrap();
        let mut long = TransformStack::new();
        long.rotate(30.0, 0.0, 0.0, 7.5).unwrap();

        assert!((unit.current() - long.current()).norm() < EPS);
    }

    #[test]
    fn test_rotate_zero_axis_is_rejected() {
        let mut stack = TransformStack::new();
        stack.scale(2.0, 1.0, 1.0);
        let before = *stack.current();

        assert_eq!(stack.rotate(90.0, 0.0, 0.0, 0.0), Err(TransformError::InvalidAxis));
        assert_eq!(stack.current(), &before);
    }

    #[test]
    fn test_rotate_handles_extreme_axis_lengths() {
        for length in [1e20, f32::MAX, 1e-10, 1e-40] {
            let mut stack = TransformStack::new();
            stack.rotate(90.0, 0.0, 0.0, length).unwrap();
            assert_point(apply(&stack, Point3::new(1.0, 0.0, 0.0)), 0.0, 1.0, 0.0);
        }

        let mut unit = TransformStack::new();
        unit.rotate(40.0, 1.0, 2.0, 3.0).unwrap();
        let mut huge = TransformStack::new();
        huge.rotate(40.0, 1e30, 2e30, 3e30).unwrap();
        assert!((unit.current() - huge.current()).norm() < EPS);
    }

    #[test]
    fn test_rotate_non_finite_axis_is_rejected() {
        let mut stack = TransformStack::new();
        assert_eq!(
            stack.rotate(90.0, f32::INFINITY, 0.0, 0.0),
            Err(TransformError::InvalidAxis)
        );
        assert_eq!(
            stack.rotate(90.0, 0.0, f32::NAN, 1.0),
            Err(TransformError::InvalidAxis)
        );
        assert_eq!(stack.current(), &Matrix4::identity());
    }

    #[test]
    fn test_zero_scale_collapses_axis() {
        let mut stack = TransformStack::new();
        stack.scale(1.0, 0.0, 1.0);
        assert_point(apply(&stack, Point3::new(2.0, 3.0, 4.0)), 2.0, 0.0, 4.0);
    }

    #[test]
    fn test_set_camera_rejects_degenerate_input() {
        let mut stack = TransformStack::new();
        assert_eq!(
            stack.set_camera(Point3::origin(), Point3::origin(), Vector3::y()),
            Err(TransformError::DegenerateCamera)
        );
        assert_eq!(stack.view(), &Matrix4::identity());
    }

    #[test]
    fn test_set_projection_rejects_near_equal_far() {
        let mut stack = TransformStack::new();
        assert_eq!(
            stack.ortho(-1.0, 1.0, -1.0, 1.0, 4.0, 4.0),
            Err(TransformError::InvalidFrustum)
        );
        assert_eq!(
            stack.frustum(-1.0, 1.0, -1.0, 1.0, 4.0, 4.0),
            Err(TransformError::InvalidFrustum)
        );
        assert_eq!(stack.projection(), &Matrix4::identity());
    }

    #[test]
    fn test_scope_pops_on_drop() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 1.0, 1.0);
        let before = *stack.current();

        {
            let mut scope = stack.scope();
            scope.translate(5.0, 0.0, 0.0);
            assert_eq!(scope.depth(), 1);
            {
                let mut inner = scope.scope();
                inner.scale(3.0, 3.0, 3.0);
                assert_eq!(inner.depth(), 2);
            }
            assert_eq!(scope.depth(), 1);
        }

        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &before);
    }

    #[test]
    fn test_scope_restores_on_early_return() {
        fn faulty(stack: &mut TransformStack) -> Result<(), TransformError> {
            let mut scope = stack.scope();
            scope.translate(1.0, 0.0, 0.0);
            scope.push();
            scope.rotate(10.0, 0.0, 0.0, 0.0)?;
            unreachable!()
        }

        let mut stack = TransformStack::new();
        assert_eq!(faulty(&mut stack), Err(TransformError::InvalidAxis));
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &Matrix4::identity());
    }

    #[test]
    fn test_scope_restores_current_after_popping_past_entry() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 0.0, 0.0);
        stack.push();
        stack.scale(2.0, 2.0, 2.0);
        let entry = *stack.current();

        {
            let mut scope = stack.scope();
            scope.translate(0.0, 4.0, 0.0);
            scope.pop().unwrap();
            scope.pop().unwrap();
            scope.rotate(45.0, 0.0, 1.0, 0.0).unwrap();
            assert_eq!(scope.depth(), 0);
        }

        // The popped snapshot cannot come back, but the transform does.
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &entry);
    }

    #[test]
    fn test_clear_and_reset() {
        let mut stack = TransformStack::new();
        stack.translate(1.0, 0.0, 0.0);
        stack.push();
        stack.push();
        let current = *stack.current();

        stack.clear();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &current);

        stack.push();
        stack.reset();
        assert_eq!(stack.depth(), 0);
        assert_eq!(stack.current(), &Matrix4::identity());
    }
}

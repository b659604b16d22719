//! JSON Patch (RFC 6902) applied to typed representations.
//!
//! Documents are parsed as [`json_patch::Patch`]; operations address
//! top-level fields with pointers such as `/title`. Operations run against a
//! working copy; the target is only replaced once every operation succeeded.

use json_patch::{Patch, PatchOperation};
use jsonptr::Pointer;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("the target location '{0}' does not exist")]
    UnknownPath(String),

    #[error("the value for '{path}' is invalid: {reason}")]
    InvalidValue { path: String, reason: String },

    #[error("the current value at '{0}' does not match the tested value")]
    TestFailed(String),
}

/// A representation whose fields can be addressed by patch operations.
pub trait Patchable: Clone {
    type Field: Copy;

    /// Map a decoded pointer token to a field. Matching is expected to be
    /// ASCII case-insensitive.
    fn resolve(token: &str) -> Option<Self::Field>;

    fn read(&self, field: Self::Field) -> Value;

    /// Store `value`, or describe why it does not fit the field.
    fn write(&mut self, field: Self::Field, value: Value) -> Result<(), String>;

    /// Return the field to its default value.
    fn reset(&mut self, field: Self::Field);
}

/// Apply every operation of `patch` to `target`, or none of them.
pub fn apply_patch<T: Patchable>(target: &mut T, patch: &Patch) -> Result<(), PatchError> {
    let mut working = target.clone();
    for operation in &patch.0 {
        apply_operation(&mut working, operation)?;
    }
    *target = working;
    Ok(())
}

fn apply_operation<T: Patchable>(target: &mut T, operation: &PatchOperation) -> Result<(), PatchError> {
    match operation {
        PatchOperation::Add(op) => {
            let field = field_at::<T>(&op.path)?;
            write(target, field, &op.path, op.value.clone())
        }
        PatchOperation::Replace(op) => {
            let field = field_at::<T>(&op.path)?;
            write(target, field, &op.path, op.value.clone())
        }
        PatchOperation::Remove(op) => {
            let field = field_at::<T>(&op.path)?;
            target.reset(field);
            Ok(())
        }
        PatchOperation::Copy(op) => {
            let source = field_at::<T>(&op.from)?;
            let field = field_at::<T>(&op.path)?;
            let value = target.read(source);
            write(target, field, &op.path, value)
        }
        PatchOperation::Move(op) => {
            let source = field_at::<T>(&op.from)?;
            let field = field_at::<T>(&op.path)?;
            let value = target.read(source);
            target.reset(source);
            write(target, field, &op.path, value)
        }
        PatchOperation::Test(op) => {
            let field = field_at::<T>(&op.path)?;
            if target.read(field) == op.value {
                Ok(())
            } else {
                Err(PatchError::TestFailed(op.path.to_string()))
            }
        }
    }
}

fn write<T: Patchable>(target: &mut T, field: T::Field, path: &Pointer, value: Value) -> Result<(), PatchError> {
    target
        .write(field, value)
        .map_err(|reason| PatchError::InvalidValue {
            path: path.to_string(),
            reason,
        })
}

/// Resolve a single-token pointer; the root and nested locations never
/// exist on flat representations.
fn field_at<T: Patchable>(pointer: &Pointer) -> Result<T::Field, PatchError> {
    let unknown = || PatchError::UnknownPath(pointer.to_string());
    let mut tokens = pointer.tokens();
    let (Some(token), None) = (tokens.next(), tokens.next()) else {
        return Err(unknown());
    };
    T::resolve(&token.decoded()).ok_or_else(unknown)
}

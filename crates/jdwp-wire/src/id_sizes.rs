//! Id sizes, retrieved from the VM

use thiserror::Error;

/// Contains the size (in bytes) of every kind of id in use by the target JVM.
///
/// Every size is one of 1, 2, 4 or 8. Until the VM answers an IDSizes command, all sizes are
/// assumed to be 8, the widest legal width.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct IdSizes {
    field_id_size: usize,
    method_id_size: usize,
    object_id_size: usize,
    reference_type_id_size: usize,
    frame_id_size: usize,
}

/// A negotiated id size that the codec cannot represent
#[derive(Debug, Error, PartialEq, Eq)]
#[error("{kind} id size {size} is not one of 1, 2, 4 or 8")]
pub struct InvalidIdSizeError {
    kind: &'static str,
    size: i32,
}

fn checked(kind: &'static str, size: i32) -> Result<usize, InvalidIdSizeError> {
    match size {
        1 | 2 | 4 | 8 => Ok(size as usize),
        _ => Err(InvalidIdSizeError { kind, size }),
    }
}

impl IdSizes {
    /// Creates a new id sizes object, validating every width
    pub fn new(
        field_id_size: i32,
        method_id_size: i32,
        object_id_size: i32,
        reference_type_id_size: i32,
        frame_id_size: i32,
    ) -> Result<Self, InvalidIdSizeError> {
        Ok(Self {
            field_id_size: checked("field", field_id_size)?,
            method_id_size: checked("method", method_id_size)?,
            object_id_size: checked("object", object_id_size)?,
            reference_type_id_size: checked("reference type", reference_type_id_size)?,
            frame_id_size: checked("frame", frame_id_size)?,
        })
    }

    /// Id sizes where every kind of id has the same width
    pub fn uniform(size: i32) -> Result<Self, InvalidIdSizeError> {
        Self::new(size, size, size, size, size)
    }

    /// Gets the size (in bytes) of field ids
    pub fn field_id_size(&self) -> usize {
        self.field_id_size
    }

    /// Gets the size (in bytes) of method ids
    pub fn method_id_size(&self) -> usize {
        self.method_id_size
    }

    /// Gets the size (in bytes) of object ids
    pub fn object_id_size(&self) -> usize {
        self.object_id_size
    }

    /// Gets the size (in bytes) of reference type ids
    pub fn reference_type_id_size(&self) -> usize {
        self.reference_type_id_size
    }

    /// Gets the size (in bytes) of frame ids
    pub fn frame_id_size(&self) -> usize {
        self.frame_id_size
    }
}

impl Default for IdSizes {
    fn default() -> Self {
        Self {
            field_id_size: 8,
            method_id_size: 8,
            object_id_size: 8,
            reference_type_id_size: 8,
            frame_id_size: 8,
        }
    }
}

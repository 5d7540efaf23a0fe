//! Output-layer descriptors for detector tensors.
//!
//! `LayerInfo` is a borrowed view of one output tensor produced by the
//! inference engine: a name, a dimension vector and an optional typed buffer.
//! The buffer is never copied; the parser reads it in place for one frame.

use crate::util::{DetParseError, DetParseResult};

pub mod unpack;

/// Element type of an output layer buffer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 32-bit IEEE float.
    Float,
    /// 8-bit signed integer.
    Int8,
    /// 32-bit signed integer.
    Int32,
}

/// Typed borrowed buffer of an output layer.
#[derive(Clone, Copy, Debug)]
pub enum LayerData<'a> {
    Float(&'a [f32]),
    Int8(&'a [i8]),
    Int32(&'a [i32]),
}

impl<'a> LayerData<'a> {
    /// Returns the element type tag of the buffer.
    pub fn data_type(&self) -> DataType {
        match self {
            LayerData::Float(_) => DataType::Float,
            LayerData::Int8(_) => DataType::Int8,
            LayerData::Int32(_) => DataType::Int32,
        }
    }

    /// Returns the number of elements in the buffer.
    pub fn len(&self) -> usize {
        match self {
            LayerData::Float(data) => data.len(),
            LayerData::Int8(data) => data.len(),
            LayerData::Int32(data) => data.len(),
        }
    }

    /// Returns true if the buffer holds no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the buffer as `f32` elements.
    pub fn as_f32(&self, index: usize) -> DetParseResult<&'a [f32]> {
        match *self {
            LayerData::Float(data) => Ok(data),
            other => Err(DetParseError::LayerTypeMismatch {
                index,
                expected: DataType::Float,
                got: other.data_type(),
            }),
        }
    }

    /// Returns the buffer as `i32` elements.
    pub fn as_i32(&self, index: usize) -> DetParseResult<&'a [i32]> {
        match *self {
            LayerData::Int32(data) => Ok(data),
            other => Err(DetParseError::LayerTypeMismatch {
                index,
                expected: DataType::Int32,
                got: other.data_type(),
            }),
        }
    }
}

/// Borrowed descriptor of one model output layer.
#[derive(Clone, Copy, Debug)]
pub struct LayerInfo<'a> {
    name: &'a str,
    dims: &'a [usize],
    data: Option<LayerData<'a>>,
}

impl<'a> LayerInfo<'a> {
    /// Creates a layer descriptor with a buffer.
    pub fn new(name: &'a str, dims: &'a [usize], data: LayerData<'a>) -> Self {
        Self {
            name,
            dims,
            data: Some(data),
        }
    }

    /// Creates a layer descriptor whose buffer is not available this frame.
    pub fn without_data(name: &'a str, dims: &'a [usize]) -> Self {
        Self {
            name,
            dims,
            data: None,
        }
    }

    /// Returns the layer name as reported by the engine.
    pub fn name(&self) -> &'a str {
        self.name
    }

    /// Returns the inferred dimensions, excluding the batch axis.
    pub fn dims(&self) -> &'a [usize] {
        self.dims
    }

    /// Returns the typed buffer, if present.
    pub fn data(&self) -> Option<LayerData<'a>> {
        self.data
    }

    /// Returns the element type tag, if a buffer is present.
    pub fn data_type(&self) -> Option<DataType> {
        self.data.as_ref().map(LayerData::data_type)
    }

    /// Returns the first dimension, or zero for a scalar layer.
    pub fn leading_dim(&self) -> usize {
        self.dims.first().copied().unwrap_or(0)
    }

    /// Returns the element count implied by the dimension vector.
    pub fn num_elements(&self) -> Option<usize> {
        if self.dims.is_empty() {
            return Some(0);
        }
        self.dims
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
    }
}

/// Width and height of an image plane in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    /// Creates a frame size.
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Network input geometry; boxes are decoded in this pixel space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NetworkInfo {
    pub width: u32,
    pub height: u32,
}

impl NetworkInfo {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns the network input plane size.
    pub fn frame_size(&self) -> FrameSize {
        FrameSize::new(self.width, self.height)
    }
}

use std::fmt;

/// Element type of a scalar or tensor value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    Bool,
    U8,
    I8,
    I16,
    I32,
    I64,
    F16,
    F32,
    F64,
}

impl DType {
    /// The ONNX `TensorProto.DataType` code for this element type.
    pub fn onnx_elem(self) -> i64 {
        match self {
            DType::F32 => 1,
            DType::U8 => 2,
            DType::I8 => 3,
            DType::I16 => 5,
            DType::I32 => 6,
            DType::I64 => 7,
            DType::Bool => 9,
            DType::F16 => 10,
            DType::F64 => 11,
        }
    }

    /// Inverse of [`DType::onnx_elem`]. Returns `None` for codes IRIS graphs never carry.
    pub fn from_onnx_elem(code: i64) -> Option<DType> {
        let dtype = match code {
            1 => DType::F32,
            2 => DType::U8,
            3 => DType::I8,
            5 => DType::I16,
            6 => DType::I32,
            7 => DType::I64,
            9 => DType::Bool,
            10 => DType::F16,
            11 => DType::F64,
            _ => return None,
        };
        Some(dtype)
    }

    pub fn is_integer(self) -> bool {
        matches!(self, DType::U8 | DType::I8 | DType::I16 | DType::I32 | DType::I64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DType::Bool => "bool",
            DType::U8 => "u8",
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::F16 => "f16",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        f.write_str(s)
    }
}

/// A single tensor dimension.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    Literal(u64),
    Symbolic(String),
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Dim::Literal(n) => write!(f, "{}", n),
            Dim::Symbolic(s) => f.write_str(s),
        }
    }
}

/// Tensor shape. An empty shape is a rank-0 tensor.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(pub Vec<Dim>);

impl Shape {
    pub fn scalar() -> Self {
        Shape(Vec::new())
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, dim) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", dim)?;
        }
        f.write_str("]")
    }
}

/// Declared type of a graph value.
///
/// `Infer` is the placeholder upstream passes leave on values whose type was
/// never resolved (typically loop-carried block inputs).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IrType {
    Infer,
    Scalar(DType),
    Tensor { dtype: DType, shape: Shape },
}

impl IrType {
    /// The integer type ONNX expects for a loop iteration counter: a rank-0 `i64` tensor.
    pub fn loop_counter() -> Self {
        IrType::Tensor {
            dtype: DType::I64,
            shape: Shape::scalar(),
        }
    }

    pub fn dtype(&self) -> Option<DType> {
        match self {
            IrType::Scalar(dtype) | IrType::Tensor { dtype, .. } => Some(*dtype),
            IrType::Infer => None,
        }
    }

    /// Scalar `bool` and tensors with a `bool` element type both qualify.
    pub fn is_bool(&self) -> bool {
        self.dtype() == Some(DType::Bool)
    }

    pub fn is_integer(&self) -> bool {
        self.dtype().is_some_and(DType::is_integer)
    }

    /// Same kind and shape with the element type replaced. `Infer` becomes a scalar.
    pub fn with_dtype(&self, dtype: DType) -> Self {
        match self {
            IrType::Tensor { shape, .. } => IrType::Tensor {
                dtype,
                shape: shape.clone(),
            },
            IrType::Scalar(_) | IrType::Infer => IrType::Scalar(dtype),
        }
    }
}

impl fmt::Display for IrType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IrType::Infer => f.write_str("?"),
            IrType::Scalar(dtype) => write!(f, "{}", dtype),
            IrType::Tensor { dtype, shape } => write!(f, "tensor<{}, {}>", dtype, shape),
        }
    }
}

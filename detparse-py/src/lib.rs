//! Python bindings for the detparse detection post-processing library.
//!
//! Raw detector outputs go in as numpy arrays; filtered, suppressed objects
//! come back as `Detection` instances.

use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use detparse::{
    ClassThresholds, DegenerateBoxPolicy, DetParseError, Detection as RustDetection,
    DetectionParser, FrameSize, LayerData, LayerInfo, NetworkInfo, NoopObserver,
    ParseConfig as RustParseConfig, SizeFilter,
};

/// Convert a DetParseError to a Python exception.
fn to_py_err(err: DetParseError) -> PyErr {
    if err.is_structural() {
        PyRuntimeError::new_err(err.to_string())
    } else {
        PyValueError::new_err(err.to_string())
    }
}

/// A detected object in network (or source) pixel space.
#[pyclass]
#[derive(Clone)]
pub struct Detection {
    /// Left edge, clamped into the frame.
    #[pyo3(get)]
    pub left: f32,
    /// Top edge, clamped into the frame.
    #[pyo3(get)]
    pub top: f32,
    #[pyo3(get)]
    pub width: f32,
    #[pyo3(get)]
    pub height: f32,
    #[pyo3(get)]
    pub confidence: f32,
    #[pyo3(get)]
    pub class_id: usize,
}

#[pymethods]
impl Detection {
    fn __repr__(&self) -> String {
        format!(
            "Detection(class_id={}, confidence={:.4}, left={:.2}, top={:.2}, width={:.2}, height={:.2})",
            self.class_id, self.confidence, self.left, self.top, self.width, self.height
        )
    }
}

impl From<RustDetection> for Detection {
    fn from(d: RustDetection) -> Self {
        Self {
            left: d.left,
            top: d.top,
            width: d.width,
            height: d.height,
            confidence: d.confidence,
            class_id: d.class_id,
        }
    }
}

impl From<&Detection> for RustDetection {
    fn from(d: &Detection) -> Self {
        Self {
            left: d.left,
            top: d.top,
            width: d.width,
            height: d.height,
            confidence: d.confidence,
            class_id: d.class_id,
        }
    }
}

/// Configuration for detection parsing.
#[pyclass]
#[derive(Clone)]
pub struct ParseConfig {
    inner: RustParseConfig,
}

#[pymethods]
impl ParseConfig {
    /// Create a new ParseConfig.
    ///
    /// Args:
    ///     num_classes: Number of detector classes (default: 3)
    ///     thresholds: Per-class confidence thresholds, or a single float for
    ///         every class (default: 0.25)
    ///     iou_threshold: Same-class IoU suppression cutoff (default: 0.3)
    ///     size_filter: Reject implausibly small or large boxes (default: False)
    ///     degenerate: "keep", "drop" or "normalize" (default: "keep")
    ///     parallel: Suppress classes in parallel (default: False)
    #[new]
    #[pyo3(signature = (
        num_classes = 3,
        thresholds = None,
        iou_threshold = 0.3,
        size_filter = false,
        degenerate = "keep",
        parallel = false
    ))]
    fn new(
        num_classes: usize,
        thresholds: Option<Vec<f32>>,
        iou_threshold: f32,
        size_filter: bool,
        degenerate: &str,
        parallel: bool,
    ) -> PyResult<Self> {
        let thresholds = match thresholds.as_deref() {
            None => ClassThresholds::uniform(num_classes, detparse::config::DEFAULT_CONF_THRESHOLD),
            Some([single]) => ClassThresholds::uniform(num_classes, *single),
            Some(values) => ClassThresholds::new(values.to_vec()),
        };
        let degenerate = match degenerate.to_lowercase().as_str() {
            "keep" => DegenerateBoxPolicy::Keep,
            "drop" => DegenerateBoxPolicy::Drop,
            "normalize" => DegenerateBoxPolicy::Normalize,
            _ => {
                return Err(PyValueError::new_err(
                    "degenerate must be 'keep', 'drop' or 'normalize'",
                ))
            }
        };
        let inner = RustParseConfig {
            num_classes,
            thresholds,
            iou_threshold,
            size_filter: SizeFilter {
                enabled: size_filter,
                ..SizeFilter::default()
            },
            degenerate,
            parallel,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Validate the configuration.
    fn validate(&self) -> PyResult<()> {
        self.inner.validate().map_err(to_py_err)
    }

    #[getter]
    fn thresholds(&self) -> Vec<f32> {
        self.inner.thresholds.as_slice().to_vec()
    }

    fn __repr__(&self) -> String {
        format!(
            "ParseConfig(num_classes={}, thresholds={:?}, iou_threshold={}, parallel={})",
            self.inner.num_classes,
            self.inner.thresholds.as_slice(),
            self.inner.iou_threshold,
            self.inner.parallel
        )
    }
}

/// Filter and suppress one frame of raw detector output.
///
/// Args:
///     dets: float32 array of shape (N, 5) holding x0, y0, x1, y1, score
///     labels: int32 array of shape (N,) holding class labels
///     network_width: Network input width in pixels
///     network_height: Network input height in pixels
///     config: ParseConfig (default: ParseConfig())
///
/// Returns:
///     List of Detection objects grouped by ascending class, best first
#[pyfunction]
#[pyo3(signature = (dets, labels, network_width, network_height, config = None))]
fn parse_detections(
    dets: PyReadonlyArray2<'_, f32>,
    labels: PyReadonlyArray1<'_, i32>,
    network_width: u32,
    network_height: u32,
    config: Option<ParseConfig>,
) -> PyResult<Vec<Detection>> {
    let shape = dets.shape();
    if shape[1] != detparse::lowlevel::DET_ROW_STRIDE {
        return Err(PyValueError::new_err("dets must have shape (N, 5)"));
    }
    let det_dims = [shape[0], shape[1]];
    let label_dims = [labels.shape()[0]];
    let det_data = dets.as_slice()?;
    let label_data = labels.as_slice()?;

    let layers = [
        LayerInfo::new("dets", &det_dims, LayerData::Float(det_data)),
        LayerInfo::new("labels", &label_dims, LayerData::Int32(label_data)),
    ];
    let cfg = config.map(|c| c.inner).unwrap_or_default();
    let parser = DetectionParser::new(cfg)
        .map_err(to_py_err)?
        .with_observer(NoopObserver);
    let objects = parser
        .parse(&layers, NetworkInfo::new(network_width, network_height))
        .map_err(to_py_err)?;
    Ok(objects.into_iter().map(Detection::from).collect())
}

/// Map detections from network space into the source frame.
///
/// Args:
///     detections: Detections returned by parse_detections
///     network_width, network_height: Network input size
///     source_width, source_height: Source frame size
#[pyfunction]
fn rescale_to_source(
    detections: Vec<Detection>,
    network_width: u32,
    network_height: u32,
    source_width: u32,
    source_height: u32,
) -> PyResult<Vec<Detection>> {
    let dets: Vec<RustDetection> = detections.iter().map(RustDetection::from).collect();
    let scaled = detparse::rescale_to_source(
        &dets,
        NetworkInfo::new(network_width, network_height),
        FrameSize::new(source_width, source_height),
    )
    .map_err(to_py_err)?;
    Ok(scaled.into_iter().map(Detection::from).collect())
}

/// Python module for detection post-processing.
#[pymodule]
fn _detparse(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Detection>()?;
    m.add_class::<ParseConfig>()?;
    m.add_function(wrap_pyfunction!(parse_detections, m)?)?;
    m.add_function(wrap_pyfunction!(rescale_to_source, m)?)?;
    Ok(())
}

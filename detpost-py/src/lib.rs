//! Python bindings for detpost.
//!
//! Arrays cross the boundary as contiguous `float32` numpy arrays. Entry
//! points that accept either one image or a batch return an array of the
//! same rank as their input.

use numpy::{
    IxDyn, PyArray1, PyArrayDyn, PyArrayMethods, PyReadonlyArray1, PyReadonlyArray2,
    PyReadonlyArrayDyn, PyUntypedArrayMethods,
};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use detpost::{
    anchors_from_view, BBox, Batch, BatchView, DeltaNorm, DetPostError, MatrixView,
    PixelConvention, SelectConfig,
};

/// Convert a DetPostError to a Python exception.
fn to_py_err(err: DetPostError) -> PyErr {
    PyValueError::new_err(err.to_string())
}

fn convention(pixel_offset: u8) -> PyResult<PixelConvention> {
    match pixel_offset {
        0 => Ok(PixelConvention::Continuous),
        1 => Ok(PixelConvention::Inclusive),
        _ => Err(PyValueError::new_err("pixel_offset must be 0 or 1")),
    }
}

fn read_anchors(anchors: &PyReadonlyArray2<'_, f32>) -> PyResult<Vec<BBox>> {
    let shape = anchors.shape();
    let view = MatrixView::from_slice(anchors.as_slice()?, shape[0], shape[1]).map_err(to_py_err)?;
    anchors_from_view(view).map_err(to_py_err)
}

fn read_boxes(boxes: &PyReadonlyArray2<'_, f32>) -> PyResult<Vec<BBox>> {
    if boxes.shape()[1] == 0 && boxes.shape()[0] == 0 {
        return Ok(Vec::new());
    }
    read_anchors(boxes)
}

/// A 2D or 3D input seen as a batch, remembering whether it was 2D.
fn as_batch<'a>(array: &'a PyReadonlyArrayDyn<'_, f32>) -> PyResult<(BatchView<'a>, bool)> {
    let data = array.as_slice()?;
    match *array.shape() {
        [rows, cols] => {
            let view = MatrixView::from_slice(data, rows, cols).map_err(to_py_err)?;
            Ok((BatchView::single(view), true))
        }
        [batch, rows, cols] => {
            let view = BatchView::from_slice(data, batch, rows, cols).map_err(to_py_err)?;
            Ok((view, false))
        }
        _ => Err(PyValueError::new_err("expected a 2D or 3D array")),
    }
}

fn to_numpy<'py>(py: Python<'py>, batch: Batch, single: bool) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
    let (n, rows, cols) = batch.shape();
    let shape: Vec<usize> = if single {
        vec![rows, cols]
    } else {
        vec![n, rows, cols]
    };
    PyArray1::from_vec(py, batch.into_vec()).reshape(IxDyn(&shape))
}

/// Decode regression deltas against anchors.
///
/// Args:
///     anchors: (A, 4) float32 array of anchor corners
///     deltas: (A, 4+) or (N, A, 4+) float32 array; only the first 4 columns are read
///     mean: per-coordinate mean (default: [0, 0, 0, 0])
///     std: per-coordinate std (default: [0.1, 0.1, 0.2, 0.2])
///
/// Returns:
///     Decoded boxes, (A, 4) or (N, A, 4) matching the input rank
#[pyfunction]
#[pyo3(signature = (anchors, deltas, mean = None, std = None))]
fn decode<'py>(
    py: Python<'py>,
    anchors: PyReadonlyArray2<'py, f32>,
    deltas: PyReadonlyArrayDyn<'py, f32>,
    mean: Option<[f32; 4]>,
    std: Option<[f32; 4]>,
) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
    let defaults = DeltaNorm::default();
    let norm = DeltaNorm {
        mean: mean.unwrap_or(defaults.mean),
        std: std.unwrap_or(defaults.std),
    };
    norm.validate().map_err(to_py_err)?;

    let anchors = read_anchors(&anchors)?;
    let (batch, single) = as_batch(&deltas)?;
    let decoded = detpost::decode(&anchors, batch, &norm).map_err(to_py_err)?;
    to_numpy(py, decoded, single)
}

/// Decode, Top-K, NMS with confidence cut, and zero-pad raw network output.
///
/// Args:
///     raw: (A, 4+C) or (N, A, 4+C) float32 array of deltas followed by class scores
///     anchors: (A, 4) float32 array of anchor corners
///     top_k: Top-K budget, or None to keep every anchor (default: 100)
///     iou_thres: NMS IoU threshold, or None to skip NMS (default: 0.5)
///     conf_thres: Minimum class score after NMS, or None (default: 0.5)
///     parallel: Process images of a batch in parallel (default: False)
///
/// Returns:
///     Zero-padded detections with the same rank as `raw`
#[pyfunction]
#[pyo3(signature = (raw, anchors, top_k = Some(100), iou_thres = Some(0.5), conf_thres = Some(0.5), parallel = false))]
fn select_candidates<'py>(
    py: Python<'py>,
    raw: PyReadonlyArrayDyn<'py, f32>,
    anchors: PyReadonlyArray2<'py, f32>,
    top_k: Option<usize>,
    iou_thres: Option<f32>,
    conf_thres: Option<f32>,
    parallel: bool,
) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
    let cfg = SelectConfig {
        top_k,
        iou_thres,
        conf_thres,
        parallel,
        ..SelectConfig::default()
    };
    let anchors = read_anchors(&anchors)?;
    let (batch, single) = as_batch(&raw)?;
    let out = detpost::select_candidates_batch(batch, &anchors, &cfg).map_err(to_py_err)?;
    to_numpy(py, out, single)
}

/// Pairwise IoU matrix.
///
/// Args:
///     boxes_a: (M, 4) float32 array
///     boxes_b: (N, 4) float32 array
///     pixel_offset: 1 for inclusive pixel extents, 0 otherwise (default: 0)
///
/// Returns:
///     (M, N) float32 IoU matrix
#[pyfunction]
#[pyo3(signature = (boxes_a, boxes_b, pixel_offset = 0))]
fn iou<'py>(
    py: Python<'py>,
    boxes_a: PyReadonlyArray2<'py, f32>,
    boxes_b: PyReadonlyArray2<'py, f32>,
    pixel_offset: u8,
) -> PyResult<Bound<'py, PyArrayDyn<f32>>> {
    let convention = convention(pixel_offset)?;
    let a = read_boxes(&boxes_a)?;
    let b = read_boxes(&boxes_b)?;
    let matrix = detpost::iou_matrix(&a, &b, convention);
    let shape = [matrix.rows(), matrix.cols()];
    PyArray1::from_vec(py, matrix.into_vec()).reshape(IxDyn(&shape))
}

/// Greedy non-maximum suppression.
///
/// Args:
///     boxes: (N, 4) float32 array
///     scores: (N,) float32 array
///     iou_thres: Overlap above which lower scored boxes are dropped (default: 0.5)
///     pixel_offset: 1 for inclusive pixel extents, 0 otherwise (default: 1)
///
/// Returns:
///     Kept indices, best first
#[pyfunction]
#[pyo3(signature = (boxes, scores, iou_thres = 0.5, pixel_offset = 1))]
fn nms(
    boxes: PyReadonlyArray2<'_, f32>,
    scores: PyReadonlyArray1<'_, f32>,
    iou_thres: f32,
    pixel_offset: u8,
) -> PyResult<Vec<usize>> {
    let convention = convention(pixel_offset)?;
    let boxes = read_boxes(&boxes)?;
    detpost::nms(&boxes, scores.as_slice()?, iou_thres, convention).map_err(to_py_err)
}

/// Indices of the `k` highest scores, best first.
#[pyfunction]
fn top_k(scores: PyReadonlyArray1<'_, f32>, k: usize) -> PyResult<Vec<usize>> {
    Ok(detpost::top_k(scores.as_slice()?, k))
}

/// Recall of predictions against ground truth.
///
/// Args:
///     ground_truth: (G, 5+C) or (N, G, 5+C) float32 array; all-zero rows are ignored
///     predictions: (P, 5+C) or (N, P, 5+C) float32 array; all-zero rows are ignored
///     iou_thres: IoU a match must exceed (default: 0.5)
///     pixel_offset: 1 for inclusive pixel extents, 0 otherwise (default: 0)
///
/// Raises:
///     ValueError: when there are no ground-truth boxes
#[pyfunction]
#[pyo3(signature = (ground_truth, predictions, iou_thres = 0.5, pixel_offset = 0))]
fn recall(
    ground_truth: PyReadonlyArrayDyn<'_, f32>,
    predictions: PyReadonlyArrayDyn<'_, f32>,
    iou_thres: f32,
    pixel_offset: u8,
) -> PyResult<f32> {
    let convention = convention(pixel_offset)?;
    let (gt, _) = as_batch(&ground_truth)?;
    let (preds, _) = as_batch(&predictions)?;
    detpost::recall(gt, preds, iou_thres, convention).map_err(to_py_err)
}

/// Python module for detpost.
#[pymodule]
fn _detpost(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_function(wrap_pyfunction!(decode, m)?)?;
    m.add_function(wrap_pyfunction!(select_candidates, m)?)?;
    m.add_function(wrap_pyfunction!(iou, m)?)?;
    m.add_function(wrap_pyfunction!(nms, m)?)?;
    m.add_function(wrap_pyfunction!(top_k, m)?)?;
    m.add_function(wrap_pyfunction!(recall, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

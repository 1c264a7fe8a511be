use clap::Parser;
use detpost::{
    anchors_from_view, recall, select_detections_batch, BBox, Batch, BatchView, DeltaNorm,
    Detections, Matrix, MatrixView, PixelConvention, SelectConfig,
};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Detection post-processing CLI (JSON config driven)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print the JSON schema and exit.
    #[arg(long)]
    print_schema: bool,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output for the selection and recall stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ConventionConfig {
    Continuous,
    Inclusive,
}

impl From<ConventionConfig> for PixelConvention {
    fn from(value: ConventionConfig) -> Self {
        match value {
            ConventionConfig::Continuous => PixelConvention::Continuous,
            ConventionConfig::Inclusive => PixelConvention::Inclusive,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SelectConfigJson {
    top_k: Option<usize>,
    iou_thres: Option<f32>,
    conf_thres: Option<f32>,
    delta_mean: [f32; 4],
    delta_std: [f32; 4],
    nms_convention: ConventionConfig,
    parallel: bool,
}

impl Default for SelectConfigJson {
    fn default() -> Self {
        let cfg = SelectConfig::default();
        Self {
            top_k: cfg.top_k,
            iou_thres: cfg.iou_thres,
            conf_thres: cfg.conf_thres,
            delta_mean: cfg.norm.mean,
            delta_std: cfg.norm.std,
            nms_convention: ConventionConfig::Inclusive,
            parallel: cfg.parallel,
        }
    }
}

impl From<SelectConfigJson> for SelectConfig {
    fn from(value: SelectConfigJson) -> Self {
        Self {
            top_k: value.top_k,
            iou_thres: value.iou_thres,
            conf_thres: value.conf_thres,
            norm: DeltaNorm {
                mean: value.delta_mean,
                std: value.delta_std,
            },
            nms_convention: value.nms_convention.into(),
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct RecallConfigJson {
    iou_thres: f32,
    convention: ConventionConfig,
}

impl Default for RecallConfigJson {
    fn default() -> Self {
        Self {
            iou_thres: 0.5,
            convention: ConventionConfig::Continuous,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    anchors_path: String,
    predictions_path: String,
    ground_truth_path: Option<String>,
    output_path: Option<String>,
    select: SelectConfigJson,
    recall: RecallConfigJson,
}

/// A JSON array of one image `(rows, cols)` or a batch `(batch, rows, cols)`.
#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
enum ArrayJson {
    Batch(Vec<Vec<Vec<f32>>>),
    Single(Vec<Vec<f32>>),
}

/// Contiguous copy of an [`ArrayJson`].
struct Dense {
    data: Vec<f32>,
    batch: usize,
    rows: usize,
    cols: usize,
    single: bool,
}

impl Dense {
    fn view(&self) -> Result<BatchView<'_>, Box<dyn Error>> {
        let view = BatchView::from_slice(&self.data, self.batch, self.rows, self.cols)?;
        Ok(view)
    }
}

fn push_rows(
    what: &str,
    rows: Vec<Vec<f32>>,
    cols: usize,
    out: &mut Vec<f32>,
) -> Result<(), Box<dyn Error>> {
    for row in rows {
        if row.len() != cols {
            return Err(format!("{what}: ragged rows ({} vs {cols} values)", row.len()).into());
        }
        out.extend(row);
    }
    Ok(())
}

fn first_cols(rows: &[Vec<f32>]) -> usize {
    rows.first().map_or(0, Vec::len)
}

impl ArrayJson {
    fn into_dense(self, what: &str) -> Result<Dense, Box<dyn Error>> {
        match self {
            ArrayJson::Single(rows) => {
                let (n_rows, cols) = (rows.len(), first_cols(&rows));
                let mut data = Vec::with_capacity(n_rows * cols);
                push_rows(what, rows, cols, &mut data)?;
                Ok(Dense {
                    data,
                    batch: 1,
                    rows: n_rows,
                    cols,
                    single: true,
                })
            }
            ArrayJson::Batch(images) => {
                let n_rows = images.first().map_or(0, Vec::len);
                let cols = images
                    .iter()
                    .find(|image| !image.is_empty())
                    .map_or(0, |image| first_cols(image));
                let batch = images.len();
                let mut data = Vec::with_capacity(batch * n_rows * cols);
                for image in images {
                    if image.len() != n_rows {
                        return Err(format!(
                            "{what}: images carry {} and {n_rows} rows",
                            image.len()
                        )
                        .into());
                    }
                    push_rows(what, image, cols, &mut data)?;
                }
                Ok(Dense {
                    data,
                    batch,
                    rows: n_rows,
                    cols,
                    single: false,
                })
            }
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    kept: Vec<usize>,
    detections: ArrayJson,
    #[serde(skip_serializing_if = "Option::is_none")]
    recall: Option<f32>,
}

fn matrix_rows(matrix: &Matrix) -> Vec<Vec<f32>> {
    matrix.view().iter_rows().map(<[f32]>::to_vec).collect()
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    Ok(serde_json::from_str(&text)?)
}

fn load_anchors(path: &Path) -> Result<Vec<BBox>, Box<dyn Error>> {
    let rows: Vec<Vec<f32>> = read_json(path)?;
    if rows.is_empty() {
        return Ok(Vec::new());
    }
    let cols = first_cols(&rows);
    let mut data = Vec::with_capacity(rows.len() * cols);
    let n_rows = rows.len();
    push_rows("anchors", rows, cols, &mut data)?;
    let view = MatrixView::from_slice(&data, n_rows, cols)?;
    Ok(anchors_from_view(view)?)
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detpost=info".parse()?))
            .with_target(false)
            .init();
    }

    if cli.print_schema {
        println!("{SCHEMA_JSON}");
        return Ok(());
    }
    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.anchors_path.is_empty() || config.predictions_path.is_empty() {
        return Err("anchors_path and predictions_path must be set in the config".into());
    }

    let anchors = load_anchors(Path::new(&config.anchors_path))?;
    let raw =
        read_json::<ArrayJson>(Path::new(&config.predictions_path))?.into_dense("predictions")?;
    let select_cfg: SelectConfig = config.select.into();

    let per_image = select_detections_batch(raw.view()?, &anchors, &select_cfg)?;
    let kept: Vec<usize> = per_image.iter().map(Detections::len).collect();
    let padded: Vec<Matrix> = per_image.iter().map(Detections::to_padded).collect();
    tracing::info!(
        images = per_image.len(),
        kept = kept.iter().sum::<usize>(),
        "selection finished"
    );

    let recall_value = match &config.ground_truth_path {
        Some(path) => {
            let gt = read_json::<ArrayJson>(Path::new(path))?.into_dense("ground truth")?;
            let preds = Batch::stack(
                padded.clone(),
                select_cfg.output_rows(anchors.len()),
                raw.cols,
            )?;
            let value = recall(
                gt.view()?,
                preds.view(),
                config.recall.iou_thres,
                config.recall.convention.into(),
            )?;
            tracing::info!(recall = value, "recall computed");
            Some(value)
        }
        None => None,
    };

    let detections = if raw.single {
        ArrayJson::Single(padded.first().map(matrix_rows).unwrap_or_default())
    } else {
        ArrayJson::Batch(padded.iter().map(matrix_rows).collect())
    };
    let output = Output {
        kept,
        detections,
        recall: recall_value,
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

use clap::Parser;
use detparse::{
    rescale_to_source, ClassThresholds, DegenerateBoxPolicy, Detection, DetectionParser,
    FrameSize, LayerData, LayerInfo, NetworkInfo, ParseConfig, SizeFilter,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "Detection post-processing replay (JSON config driven)")]
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
    /// Enable tracing output for per-frame diagnostics.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DegenerateConfig {
    Keep,
    Drop,
    Normalize,
}

impl From<DegenerateConfig> for DegenerateBoxPolicy {
    fn from(value: DegenerateConfig) -> Self {
        match value {
            DegenerateConfig::Keep => DegenerateBoxPolicy::Keep,
            DegenerateConfig::Drop => DegenerateBoxPolicy::Drop,
            DegenerateConfig::Normalize => DegenerateBoxPolicy::Normalize,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SizeFilterJson {
    enabled: bool,
    min_fraction: f32,
    max_fraction: f32,
    small_box_min_score: f32,
}

impl Default for SizeFilterJson {
    fn default() -> Self {
        let cfg = SizeFilter::default();
        Self {
            enabled: cfg.enabled,
            min_fraction: cfg.min_fraction,
            max_fraction: cfg.max_fraction,
            small_box_min_score: cfg.small_box_min_score,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ParseConfigJson {
    num_classes: usize,
    /// One entry per class; a single entry is broadcast to every class.
    thresholds: Vec<f32>,
    iou_threshold: f32,
    size_filter: SizeFilterJson,
    degenerate: DegenerateConfig,
    parallel: bool,
}

impl Default for ParseConfigJson {
    fn default() -> Self {
        let cfg = ParseConfig::default();
        Self {
            num_classes: cfg.num_classes,
            thresholds: cfg.thresholds.as_slice().to_vec(),
            iou_threshold: cfg.iou_threshold,
            size_filter: SizeFilterJson::default(),
            degenerate: DegenerateConfig::Keep,
            parallel: cfg.parallel,
        }
    }
}

impl ParseConfigJson {
    fn into_config(self) -> ParseConfig {
        let thresholds = match self.thresholds.as_slice() {
            [single] => ClassThresholds::uniform(self.num_classes, *single),
            _ => ClassThresholds::new(self.thresholds),
        };
        ParseConfig {
            num_classes: self.num_classes,
            thresholds,
            iou_threshold: self.iou_threshold,
            size_filter: SizeFilter {
                enabled: self.size_filter.enabled,
                min_fraction: self.size_filter.min_fraction,
                max_fraction: self.size_filter.max_fraction,
                small_box_min_score: self.size_filter.small_box_min_score,
            },
            degenerate: self.degenerate.into(),
            parallel: self.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SizeJson {
    width: u32,
    height: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    frame_path: String,
    output_path: Option<String>,
    /// Source frame size; when set, objects are rescaled from network space.
    source: Option<SizeJson>,
    parse: ParseConfigJson,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DataTypeJson {
    Float,
    Int8,
    Int32,
}

#[derive(Debug, Deserialize)]
struct LayerJson {
    name: String,
    data_type: DataTypeJson,
    dims: Vec<usize>,
    #[serde(default)]
    data: Option<Vec<f64>>,
}

#[derive(Debug, Deserialize)]
struct FrameJson {
    network: SizeJson,
    layers: Vec<LayerJson>,
}

enum OwnedBuffer {
    Float(Vec<f32>),
    Int8(Vec<i8>),
    Int32(Vec<i32>),
}

impl OwnedBuffer {
    fn from_layer(layer: &LayerJson) -> Option<Self> {
        let data = layer.data.as_ref()?;
        Some(match layer.data_type {
            DataTypeJson::Float => Self::Float(data.iter().map(|&v| v as f32).collect()),
            DataTypeJson::Int8 => Self::Int8(data.iter().map(|&v| v as i8).collect()),
            DataTypeJson::Int32 => Self::Int32(data.iter().map(|&v| v as i32).collect()),
        })
    }

    fn view(&self) -> LayerData<'_> {
        match self {
            Self::Float(v) => LayerData::Float(v),
            Self::Int8(v) => LayerData::Int8(v),
            Self::Int32(v) => LayerData::Int32(v),
        }
    }
}

#[derive(Debug, Serialize)]
struct ObjectRecord {
    class_id: usize,
    confidence: f32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

impl From<Detection> for ObjectRecord {
    fn from(value: Detection) -> Self {
        Self {
            class_id: value.class_id,
            confidence: value.confidence,
            left: value.left,
            top: value.top,
            width: value.width,
            height: value.height,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    count: usize,
    objects: Vec<ObjectRecord>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env().add_directive("detparse=debug".parse()?))
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
    if config.frame_path.is_empty() {
        return Err("frame_path must be set in the config".into());
    }

    let frame_text = fs::read_to_string(&config.frame_path)?;
    let frame: FrameJson = serde_json::from_str(&frame_text)?;
    let buffers: Vec<Option<OwnedBuffer>> = frame.layers.iter().map(OwnedBuffer::from_layer).collect();
    let layers: Vec<LayerInfo<'_>> = frame
        .layers
        .iter()
        .zip(&buffers)
        .map(|(layer, buffer)| match buffer {
            Some(buffer) => LayerInfo::new(&layer.name, &layer.dims, buffer.view()),
            None => LayerInfo::without_data(&layer.name, &layer.dims),
        })
        .collect();

    let network = NetworkInfo::new(frame.network.width, frame.network.height);
    let parser = DetectionParser::new(config.parse.into_config())?;
    let mut objects = parser.parse(&layers, network)?;
    if let Some(source) = &config.source {
        objects = rescale_to_source(&objects, network, FrameSize::new(source.width, source.height))?;
    }
    tracing::info!(objects = objects.len(), "frame parsed");

    let output = Output {
        count: objects.len(),
        objects: objects.into_iter().map(ObjectRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

use clap::Parser;
use detpost::io::{draw_detections, image_size, load_font, load_rgb_image, save_image};
use detpost::{
    DetectConfig, Detection, Detector, ImageSize, LabelTable, ModelSpec, SuppressionMode,
};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const SCHEMA_JSON: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.schema.json"));
const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

const OVERLAY_COLOR: [u8; 3] = [255, 255, 255];
const OVERLAY_THICKNESS: u32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about = "detpost CLI (JSON config driven)")]
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
    /// Enable tracing output for the pipeline stages.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum SuppressionConfig {
    ClassAgnostic,
    PerClass,
}

impl From<SuppressionConfig> for SuppressionMode {
    fn from(value: SuppressionConfig) -> Self {
        match value {
            SuppressionConfig::ClassAgnostic => SuppressionMode::ClassAgnostic,
            SuppressionConfig::PerClass => SuppressionMode::PerClass,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct DetectConfigJson {
    min_score: f32,
    iou_threshold: f32,
    max_results: usize,
    suppression: SuppressionConfig,
    parallel: bool,
}

impl Default for DetectConfigJson {
    fn default() -> Self {
        let cfg = DetectConfig::default();
        Self {
            min_score: cfg.min_score,
            iou_threshold: cfg.iou_threshold,
            max_results: cfg.max_results,
            suppression: SuppressionConfig::ClassAgnostic,
            parallel: cfg.parallel,
        }
    }
}

impl From<DetectConfigJson> for DetectConfig {
    fn from(value: DetectConfigJson) -> Self {
        Self {
            min_score: value.min_score,
            iou_threshold: value.iou_threshold,
            max_results: value.max_results,
            suppression: value.suppression.into(),
            parallel: value.parallel,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct Config {
    tensor_path: String,
    tensor_shape: Option<Vec<usize>>,
    input_size: usize,
    image_path: Option<String>,
    dest_width: Option<u32>,
    dest_height: Option<u32>,
    labels_path: Option<String>,
    output_path: Option<String>,
    output_image: Option<String>,
    font_path: Option<String>,
    detect: DetectConfigJson,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tensor_path: String::new(),
            tensor_shape: None,
            input_size: 0,
            image_path: None,
            dest_width: None,
            dest_height: None,
            labels_path: None,
            output_path: None,
            output_image: None,
            font_path: None,
            detect: DetectConfigJson::default(),
        }
    }
}

#[derive(Debug, Serialize)]
struct DetectionRecord {
    id: usize,
    score: f32,
    class_id: u32,
    label: String,
    bbox: [i32; 4],
    bbox_raw: [f32; 4],
}

impl From<Detection> for DetectionRecord {
    fn from(value: Detection) -> Self {
        Self {
            id: value.id,
            score: value.score,
            class_id: value.class_id,
            label: value.label,
            bbox: value.bbox,
            bbox_raw: value.bbox_raw,
        }
    }
}

#[derive(Debug, Serialize)]
struct Output {
    width: u32,
    height: u32,
    detections: Vec<DetectionRecord>,
}

/// Reads a tensor as a JSON number array, or as raw little-endian `f32`
/// values when the file ends in `.bin`.
fn read_tensor(path: &Path) -> Result<Vec<f32>, Box<dyn std::error::Error>> {
    if path.extension().is_some_and(|ext| ext == "bin") {
        let bytes = fs::read(path)?;
        if bytes.len() % 4 != 0 {
            return Err(format!("{} is not a whole number of f32 values", path.display()).into());
        }
        return Ok(bytes
            .chunks_exact(4)
            .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
            .collect());
    }
    let text = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn dest_size(config: &Config) -> Result<ImageSize, Box<dyn std::error::Error>> {
    match (config.dest_width, config.dest_height, &config.image_path) {
        (Some(width), Some(height), _) => Ok(ImageSize::new(width, height)?),
        (None, None, Some(path)) => Ok(image_size(path)?),
        _ => Err("set both dest_width and dest_height, or image_path".into()),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
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
    if config.tensor_path.is_empty() {
        return Err("tensor_path must be set in the config".into());
    }
    if config.input_size == 0 {
        return Err("input_size must be at least 1".into());
    }

    let labels = match &config.labels_path {
        Some(path) => LabelTable::from_lines(&fs::read_to_string(path)?),
        None => LabelTable::coco(),
    };
    let model = ModelSpec {
        input_size: config.input_size,
        num_classes: labels.len(),
    };
    let dest = dest_size(&config)?;
    let raw = read_tensor(Path::new(&config.tensor_path))?;

    let Config {
        tensor_shape,
        image_path,
        output_path,
        output_image,
        font_path,
        detect,
        ..
    } = config;
    let detector = Detector::new(model, labels)?.with_config(detect.into())?;
    let detections = match tensor_shape {
        Some(shape) => detector.detect_shaped(raw, &shape, dest)?,
        None => detector.detect(raw, dest)?,
    };
    tracing::info!(count = detections.len(), "detections");

    if let Some(out_path) = &output_image {
        let src = image_path
            .as_deref()
            .ok_or("output_image requires image_path")?;
        let font = font_path.as_deref().map(load_font).transpose()?;
        let mut img = load_rgb_image(src)?;
        draw_detections(
            &mut img,
            &detections,
            OVERLAY_COLOR,
            OVERLAY_THICKNESS,
            font.as_ref(),
        );
        save_image(&img, out_path)?;
        tracing::info!(path = %out_path, "overlay written");
    }

    let output = Output {
        width: dest.width(),
        height: dest.height(),
        detections: detections.into_iter().map(DetectionRecord::from).collect(),
    };
    let json = serde_json::to_string_pretty(&output)?;

    match output_path {
        Some(path) => fs::write(path, json)?,
        None => println!("{json}"),
    }

    Ok(())
}

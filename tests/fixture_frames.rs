use detparse::{
    ClassThresholds, DetectionParser, LayerData, LayerInfo, NetworkInfo, NoopObserver, ParseConfig,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum DataTypeJson {
    Float,
    Int32,
}

#[derive(Debug, Deserialize)]
struct LayerJson {
    name: String,
    data_type: DataTypeJson,
    dims: Vec<usize>,
    data: Vec<f64>,
}

#[derive(Debug, Deserialize)]
struct NetworkJson {
    width: u32,
    height: u32,
}

#[derive(Debug, Deserialize)]
struct ExpectedJson {
    class_id: usize,
    confidence: f32,
    left: f32,
    top: f32,
    width: f32,
    height: f32,
}

#[derive(Debug, Deserialize)]
struct FixtureJson {
    network: NetworkJson,
    thresholds: Vec<f32>,
    layers: Vec<LayerJson>,
    expected: Vec<ExpectedJson>,
}

enum OwnedData {
    Float(Vec<f32>),
    Int32(Vec<i32>),
}

fn owned_data(layer: &LayerJson) -> OwnedData {
    match layer.data_type {
        DataTypeJson::Float => OwnedData::Float(layer.data.iter().map(|&v| v as f32).collect()),
        DataTypeJson::Int32 => OwnedData::Int32(layer.data.iter().map(|&v| v as i32).collect()),
    }
}

fn run_fixture(text: &str) {
    let fixture: FixtureJson = serde_json::from_str(text).unwrap();
    let buffers: Vec<OwnedData> = fixture.layers.iter().map(owned_data).collect();
    let layers: Vec<LayerInfo<'_>> = fixture
        .layers
        .iter()
        .zip(&buffers)
        .map(|(layer, data)| {
            let data = match data {
                OwnedData::Float(v) => LayerData::Float(v),
                OwnedData::Int32(v) => LayerData::Int32(v),
            };
            LayerInfo::new(&layer.name, &layer.dims, data)
        })
        .collect();

    let cfg = ParseConfig {
        num_classes: fixture.thresholds.len(),
        thresholds: ClassThresholds::new(fixture.thresholds.clone()),
        ..ParseConfig::default()
    };
    let parser = DetectionParser::new(cfg)
        .unwrap()
        .with_observer(NoopObserver);
    let network = NetworkInfo::new(fixture.network.width, fixture.network.height);
    let objects = parser.parse(&layers, network).unwrap();

    assert_eq!(objects.len(), fixture.expected.len());
    let tol = 1e-4;
    for (got, want) in objects.iter().zip(&fixture.expected) {
        assert_eq!(got.class_id, want.class_id);
        assert!((got.confidence - want.confidence).abs() <= tol);
        assert!((got.left - want.left).abs() <= tol, "{got:?} vs {want:?}");
        assert!((got.top - want.top).abs() <= tol, "{got:?} vs {want:?}");
        assert!((got.width - want.width).abs() <= tol, "{got:?} vs {want:?}");
        assert!((got.height - want.height).abs() <= tol, "{got:?} vs {want:?}");
    }
}

#[test]
fn three_class_frame_matches_expected_objects() {
    run_fixture(include_str!("data/frame_three_classes.json"));
}

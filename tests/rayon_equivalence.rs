#![cfg(feature = "rayon")]

use detparse::{DetectionParser, LayerData, LayerInfo, NetworkInfo, NoopObserver, ParseConfig};

fn make_frame(rows: usize, num_classes: usize) -> (Vec<f32>, Vec<i32>) {
    let mut dets = Vec::with_capacity(rows * 5);
    let mut labels = Vec::with_capacity(rows);
    for i in 0..rows {
        let cell = (i % 37) as f32;
        let x0 = (cell * 17.0) % 600.0;
        let y0 = (cell * 29.0) % 600.0;
        let jitter = ((i * 7) % 11) as f32;
        let score = (((i * 13) % 100) as f32) / 100.0;
        dets.extend_from_slice(&[x0 + jitter, y0, x0 + 40.0 + jitter, y0 + 60.0, score]);
        labels.push((i % (num_classes + 1)) as i32);
    }
    (dets, labels)
}

#[test]
fn parallel_matches_sequential() {
    let num_classes = 8;
    let rows = 2000;
    let (dets, labels) = make_frame(rows, num_classes);
    let det_dims = [rows, 5];
    let label_dims = [rows];
    let layers = [
        LayerInfo::new("dets", &det_dims, LayerData::Float(&dets)),
        LayerInfo::new("labels", &label_dims, LayerData::Int32(&labels)),
    ];
    let network = NetworkInfo::new(640, 640);

    let base_cfg = ParseConfig::with_uniform_threshold(num_classes, 0.2);
    let seq_cfg = ParseConfig {
        parallel: false,
        ..base_cfg.clone()
    };
    let par_cfg = ParseConfig {
        parallel: true,
        ..base_cfg
    };

    let seq = DetectionParser::new(seq_cfg)
        .unwrap()
        .with_observer(NoopObserver)
        .parse(&layers, network)
        .unwrap();
    let par = DetectionParser::new(par_cfg)
        .unwrap()
        .with_observer(NoopObserver)
        .parse(&layers, network)
        .unwrap();

    assert!(!seq.is_empty());
    assert_eq!(seq, par);
}

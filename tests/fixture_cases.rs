//! Selection checked against hand-computed JSON fixtures.

use detpost::{select_candidates, BBox, MatrixView, SelectConfig};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

const TOLERANCE: f32 = 1e-4;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SelectJson {
    top_k: Option<usize>,
    iou_thres: Option<f32>,
    conf_thres: Option<f32>,
}

#[derive(Debug, Deserialize)]
struct Case {
    case_id: String,
    anchors: Vec<[f32; 4]>,
    raw: Vec<Vec<f32>>,
    #[serde(default)]
    select: SelectJson,
    expected: Vec<Vec<f32>>,
}

#[derive(Debug, Deserialize)]
struct Fixture {
    cases: Vec<Case>,
}

fn load_fixture() -> Fixture {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/data/selection_cases.json");
    let text = fs::read_to_string(&path).expect("fixture file");
    serde_json::from_str(&text).expect("valid fixture json")
}

#[test]
fn selection_matches_fixtures() {
    let fixture = load_fixture();
    assert!(!fixture.cases.is_empty());

    for case in fixture.cases {
        let anchors: Vec<BBox> = case
            .anchors
            .iter()
            .map(|a| BBox::new(a[0], a[1], a[2], a[3]))
            .collect();
        let cols = case.raw[0].len();
        let flat: Vec<f32> = case.raw.iter().flatten().copied().collect();
        let view = MatrixView::from_slice(&flat, case.raw.len(), cols).unwrap();
        let cfg = SelectConfig {
            top_k: case.select.top_k,
            iou_thres: case.select.iou_thres,
            conf_thres: case.select.conf_thres,
            ..SelectConfig::default()
        };

        let out = select_candidates(view, &anchors, &cfg).unwrap();
        assert_eq!(out.rows(), case.expected.len(), "{}: row count", case.case_id);
        for (r, expected) in case.expected.iter().enumerate() {
            let got = out.row(r).unwrap();
            assert_eq!(got.len(), expected.len(), "{}: row {r} width", case.case_id);
            for (g, e) in got.iter().zip(expected) {
                assert!(
                    (g - e).abs() <= TOLERANCE,
                    "{}: row {r} got {got:?} expected {expected:?}",
                    case.case_id
                );
            }
        }
    }
}

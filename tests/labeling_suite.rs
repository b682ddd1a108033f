use maplabel::config::{DuplicateRule, OverlappingRule, PointPlacement, SplineType};
use maplabel::{
    AreaDrawing, BoundingBox, DrawOperation, Feature, LabelCanvas, LabelEngine,
    LabelError, LabelFont, LabelStyleConfig, LabelingCandidate, MonospaceMeasurer,
    ScreenTransform, Shape, SimpleCandidate, SvgCanvas, TextDrawing, TextSize, Vertex,
};

fn begin(extent: BoundingBox) -> SvgCanvas {
    let mut canvas = SvgCanvas::new(MonospaceMeasurer::new(10.0, 4.0), 100.0, 100.0);
    canvas.begin_drawing(extent);
    canvas
}

fn view() -> BoundingBox {
    BoundingBox::new(0.0, 0.0, 20.0, 20.0)
}

fn point(id: &str, x: f64, y: f64, name: &str) -> Feature {
    Feature::from_shape(id, &Shape::Point(Vertex::new(x, y))).with_column("name", name)
}

fn line(id: &str, points: &[(f64, f64)], name: &str) -> Feature {
    let vertices = points.iter().map(|&(x, y)| Vertex::new(x, y)).collect();
    Feature::from_shape(id, &Shape::Line(vertices)).with_column("name", name)
}

fn engine(configure: impl FnOnce(&mut LabelStyleConfig)) -> LabelEngine {
    let mut config = LabelStyleConfig::new("name");
    configure(&mut config);
    LabelEngine::new(config)
}

fn draw(
    engine: &mut LabelEngine,
    features: &[Feature],
    canvas: &mut dyn LabelCanvas,
) -> Vec<LabelingCandidate> {
    engine
        .draw_features(features, canvas, &mut Vec::new(), &mut Vec::new())
        .expect("draw pass failed")
}

/// Deterministic pseudo-random stream for dense fixtures.
struct Lcg(u64);

impl Lcg {
    fn next_f64(&mut self) -> f64 {
        self.0 = self
            .0
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        (self.0 >> 11) as f64 / (1u64 << 53) as f64
    }
}

#[test]
fn center_right_point_lands_right_of_its_screen_position() {
    let mut canvas = begin(view());
    let mut engine = engine(|c| c.labeling.point_placement = PointPlacement::CenterRight);
    let placed = draw(&mut engine, &[point("p", 10.0, 10.0, "A")], &mut canvas);
    assert_eq!(placed.len(), 1);
    let bbox = placed[0].bounding_box().expect("polygon");
    assert_eq!((bbox.min_x, bbox.min_y), (50.0, 48.0));
    assert_eq!((bbox.max_x, bbox.max_y), (60.0, 52.0));

    let texts: Vec<_> = canvas.text_operations().collect();
    assert_eq!(texts.len(), 1);
    match texts[0] {
        DrawOperation::Text { text, position, .. } => {
            assert_eq!(text, "A");
            assert_eq!(*position, Vertex::new(55.0, 50.0));
        }
        other => panic!("unexpected operation {other:?}"),
    }
}

#[test]
fn one_duplicate_per_quadrant_suppresses_same_quadrant_repeat() {
    let mut engine = engine(|c| {
        c.labeling.duplicate_rule = DuplicateRule::OneDuplicatePerQuadrant;
        c.labeling.point_placement = PointPlacement::Center;
    });
    // Screen (20, 20) and (30, 30): both in the upper-left quadrant.
    let same = [point("a", 4.0, 16.0, "DUP"), point("b", 6.0, 14.0, "DUP")];
    let mut canvas = begin(view());
    assert_eq!(draw(&mut engine, &same, &mut canvas).len(), 1);

    // Screen (20, 20) and (80, 80): different quadrants.
    let apart = [point("a", 4.0, 16.0, "DUP"), point("c", 16.0, 4.0, "DUP")];
    let mut canvas = begin(view());
    assert_eq!(draw(&mut engine, &apart, &mut canvas).len(), 2);
}

#[test]
fn line_label_longer_than_segment_ratio_is_not_emitted() {
    let mut engine = engine(|c| c.labeling.text_line_segment_ratio = 0.5);
    // 8 world units at 5 px per unit: a 40 px segment for a 30 px label.
    let features = [line("l", &[(4.0, 10.0), (12.0, 10.0)], "ABC")];
    let mut canvas = begin(view());
    assert!(draw(&mut engine, &features, &mut canvas).is_empty());
    assert!(canvas.operations().is_empty());

    let mut relaxed = engine_with_ratio(1.0);
    let mut canvas = begin(view());
    assert_eq!(draw(&mut relaxed, &features, &mut canvas).len(), 1);
}

fn engine_with_ratio(ratio: f64) -> LabelEngine {
    engine(|c| c.labeling.text_line_segment_ratio = ratio)
}

#[test]
fn accepted_labels_never_overlap() {
    let mut rng = Lcg(7);
    let names = ["Alpha", "Bravo", "Charlie", "Delta", "Echo", "Fox"];
    let features: Vec<Feature> = (0..200)
        .map(|i| {
            let x = rng.next_f64() * 20.0;
            let y = rng.next_f64() * 20.0;
            point(&format!("p{i}"), x, y, &format!("{}{}", names[i % names.len()], i))
        })
        .collect();
    let mut engine = engine(|c| c.labeling.best_placement = true);
    let mut canvas = begin(view());
    let placed = draw(&mut engine, &features, &mut canvas);
    assert!(!placed.is_empty());
    assert!(placed.len() < features.len(), "dense input should be thinned");
    for (i, a) in placed.iter().enumerate() {
        let a_box = a.bounding_box().expect("polygon");
        for b in &placed[i + 1..] {
            let b_box = b.bounding_box().expect("polygon");
            assert!(
                !a_box.intersects(&b_box),
                "{} overlaps {}",
                a.original_text,
                b.original_text
            );
        }
    }
}

#[test]
fn no_duplicates_never_accepts_the_same_text_twice() {
    let mut rng = Lcg(11);
    let names = ["Oak", "Elm", "Ash"];
    let features: Vec<Feature> = (0..60)
        .map(|i| {
            let x = rng.next_f64() * 20.0;
            let y = rng.next_f64() * 20.0;
            point(&format!("p{i}"), x, y, names[i % names.len()])
        })
        .collect();
    let mut engine = engine(|c| c.labeling.overlapping_rule = OverlappingRule::Unlimited);
    let mut canvas = begin(view());
    let placed = draw(&mut engine, &features, &mut canvas);
    let mut texts: Vec<&str> = placed.iter().map(|c| c.original_text.as_str()).collect();
    texts.sort_unstable();
    assert_eq!(texts, vec!["Ash", "Elm", "Oak"]);
}

#[test]
fn unlimited_duplicates_and_overlaps_accept_everything() {
    let features = [point("a", 10.0, 10.0, "Same"), point("b", 10.0, 10.0, "Same")];
    let mut engine = engine(|c| {
        c.labeling.duplicate_rule = DuplicateRule::UnlimitedDuplicates;
        c.labeling.overlapping_rule = OverlappingRule::Unlimited;
    });
    let mut canvas = begin(view());
    assert_eq!(draw(&mut engine, &features, &mut canvas).len(), 2);
}

#[test]
fn grid_filter_is_deterministic() {
    let mut rng = Lcg(3);
    let features: Vec<Feature> = (0..80)
        .map(|i| {
            let x = rng.next_f64() * 18.0;
            let y = rng.next_f64() * 18.0;
            line(&format!("l{i}"), &[(x, y), (x + 2.0, y + 1.0)], "Road")
        })
        .collect();
    let engine = engine(|c| c.labeling.grid_size = 20.0);
    let canvas = begin(view());
    let first: Vec<&str> = engine
        .filter_features(&features, &canvas)
        .expect("filter")
        .into_iter()
        .map(|f| f.id.as_str())
        .collect();
    assert!(!first.is_empty());
    assert!(first.len() < features.len());
    for _ in 0..3 {
        let again: Vec<&str> = engine
            .filter_features(&features, &canvas)
            .expect("filter")
            .into_iter()
            .map(|f| f.id.as_str())
            .collect();
        assert_eq!(again, first);
    }
}

#[test]
fn transform_round_trips_world_points() {
    let transform =
        ScreenTransform::new(BoundingBox::new(-120.5, 30.25, 80.0, 95.0), 800.0, 600.0, 96.0);
    for (x, y) in [(0.0, 50.0), (-120.5, 95.0), (80.0, 30.25), (12.345, 67.89)] {
        let world = Vertex::new(x, y);
        let back = transform.screen_to_world(transform.world_to_screen(world));
        assert!((back.x - x).abs() < 1e-9 && (back.y - y).abs() < 1e-9, "{world:?} -> {back:?}");
    }
}

#[test]
fn recorded_positions_keep_line_labels_still_while_panning() {
    let road = line("r", &[(-100.0, 10.0), (100.0, 10.0)], "Road");
    let mut engine = engine(|_| {});

    let mut first_canvas = begin(view());
    let first = draw(&mut engine, std::slice::from_ref(&road), &mut first_canvas);
    assert_eq!(first.len(), 1);
    assert_eq!(first[0].center, Vertex::new(50.0, 50.0));

    // Pan two world units east: 10 px at this scale.
    let panned = BoundingBox::new(2.0, 0.0, 22.0, 20.0);
    let mut second_canvas = begin(panned);
    let second = draw(&mut engine, std::slice::from_ref(&road), &mut second_canvas);
    assert_eq!(second.len(), 1);
    assert_eq!(
        first[0].collision_polygon.len(),
        second[0].collision_polygon.len()
    );
    for (a, b) in first[0]
        .collision_polygon
        .iter()
        .zip(&second[0].collision_polygon)
    {
        assert!((b.x - (a.x - 10.0)).abs() < 1e-9, "{a:?} vs {b:?}");
        assert!((b.y - a.y).abs() < 1e-9, "{a:?} vs {b:?}");
    }

    engine.clear_positions();
    let mut third_canvas = begin(panned);
    let third = draw(&mut engine, std::slice::from_ref(&road), &mut third_canvas);
    assert_eq!(third[0].center, Vertex::new(50.0, 50.0));
}

#[test]
fn best_placement_moves_colliding_point_label() {
    // Screen (50, 50) and (50, 52): upper-centre boxes collide.
    let features = [point("a", 10.0, 10.0, "A"), point("b", 10.0, 9.6, "B")];

    let mut strict = engine(|_| {});
    let mut canvas = begin(view());
    assert_eq!(draw(&mut strict, &features, &mut canvas).len(), 1);

    let mut searching = engine(|c| c.labeling.best_placement = true);
    let mut canvas = begin(view());
    let placed = draw(&mut searching, &features, &mut canvas);
    assert_eq!(placed.len(), 2);
    let moved = placed[1].bounding_box().expect("polygon");
    assert!((moved.min_y - 52.0).abs() < 1e-6, "expected lower-centre, got {moved:?}");
}

#[test]
fn drawing_outside_scope_fails_fast() {
    let mut canvas = SvgCanvas::new(MonospaceMeasurer::new(10.0, 4.0), 100.0, 100.0);
    let mut engine = engine(|_| {});
    let err = engine
        .draw_features(
            &[point("a", 1.0, 1.0, "A")],
            &mut canvas,
            &mut Vec::new(),
            &mut Vec::new(),
        )
        .unwrap_err();
    assert_eq!(err, LabelError::NotDrawing);
}

#[test]
fn cancelled_canvas_places_nothing() {
    let mut canvas = begin(view());
    canvas.cancel();
    let mut engine = engine(|_| {});
    let placed = draw(&mut engine, &[point("a", 10.0, 10.0, "A")], &mut canvas);
    assert!(placed.is_empty());
}

/// Cancels itself after a fixed number of text draws.
struct CancelAfter {
    inner: SvgCanvas,
    remaining: usize,
}

impl LabelCanvas for CancelAfter {
    fn measure_text(&mut self, text: &str, font: &LabelFont) -> TextSize {
        self.inner.measure_text(text, font)
    }

    fn draw_text(&mut self, drawing: TextDrawing<'_>) {
        self.inner.draw_text(drawing);
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.inner.cancel();
        }
    }

    fn draw_area(&mut self, drawing: AreaDrawing<'_>) {
        self.inner.draw_area(drawing);
    }

    fn current_world_extent(&self) -> BoundingBox {
        self.inner.current_world_extent()
    }

    fn width(&self) -> f64 {
        self.inner.width()
    }

    fn height(&self) -> f64 {
        self.inner.height()
    }

    fn is_drawing(&self) -> bool {
        self.inner.is_drawing()
    }

    fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }
}

#[test]
fn cancellation_stops_between_features() {
    let mut canvas = CancelAfter {
        inner: begin(view()),
        remaining: 1,
    };
    let features = [
        point("a", 2.0, 2.0, "A"),
        point("b", 10.0, 10.0, "B"),
        point("c", 18.0, 18.0, "C"),
    ];
    let mut engine = engine(|c| {
        c.stacked.push(LabelStyleConfig::new("name"));
    });
    let placed = draw(&mut engine, &features, &mut canvas);
    assert_eq!(placed.len(), 1, "stacked styles must not run after cancel");
    assert_eq!(canvas.inner.text_operations().count(), 1);
}

#[test]
fn numeric_format_errors_propagate() {
    let mut engine = engine(|c| c.labeling.numeric_format = Some("#,##0".to_string()));
    let mut canvas = begin(view());
    let err = engine
        .draw_features(
            &[point("a", 10.0, 10.0, "not a number")],
            &mut canvas,
            &mut Vec::new(),
            &mut Vec::new(),
        )
        .unwrap_err();
    assert!(matches!(err, LabelError::NumericFormat { .. }), "got {err:?}");
}

#[test]
fn malformed_geometry_is_a_hard_failure() {
    let mut bytes = maplabel::wkb::encode(
        &Shape::Point(Vertex::new(1.0, 1.0)),
        maplabel::geometry::ByteOrder::LittleEndian,
    );
    bytes.truncate(bytes.len() - 3);
    let broken = Feature::new("bad", bytes).with_column("name", "A");
    let mut engine = engine(|_| {});
    let mut canvas = begin(view());
    let err = engine
        .draw_features(&[broken], &mut canvas, &mut Vec::new(), &mut Vec::new())
        .unwrap_err();
    assert!(
        matches!(err, LabelError::UnexpectedEndOfBuffer { .. }),
        "got {err:?}"
    );
}

#[test]
fn features_without_text_are_skipped() {
    let features = [
        point("a", 10.0, 10.0, "   "),
        Feature::from_shape("b", &Shape::Point(Vertex::new(5.0, 5.0))),
    ];
    let mut engine = engine(|_| {});
    let mut canvas = begin(view());
    assert!(draw(&mut engine, &features, &mut canvas).is_empty());
}

#[test]
fn overlap_is_checked_across_layers_but_duplicates_per_layer() {
    let mut roads = engine(|_| {});
    let mut places = engine(|_| {});
    let mut canvas = begin(view());
    let mut all_layers: Vec<SimpleCandidate> = Vec::new();

    let mut road_layer = Vec::new();
    let first = roads
        .draw_features(
            &[point("a", 10.0, 10.0, "Same")],
            &mut canvas,
            &mut road_layer,
            &mut all_layers,
        )
        .expect("first layer");
    assert_eq!(first.len(), 1);

    let mut place_layer = Vec::new();
    let second = places
        .draw_features(
            &[point("b", 10.0, 10.0, "Other"), point("c", 2.0, 2.0, "Same")],
            &mut canvas,
            &mut place_layer,
            &mut all_layers,
        )
        .expect("second layer");
    let texts: Vec<&str> = second.iter().map(|c| c.original_text.as_str()).collect();
    assert_eq!(texts, vec!["Same"]);
    assert_eq!(all_layers.len(), 2);
}

#[test]
fn spline_labels_follow_a_bent_line() {
    let features = [line(
        "r",
        &[(2.0, 10.0), (6.0, 12.0), (10.0, 10.0), (14.0, 12.0), (18.0, 10.0)],
        "River",
    )];
    let mut engine = engine(|c| c.labeling.spline_type = SplineType::Standard);
    let mut canvas = begin(view());
    let placed = draw(&mut engine, &features, &mut canvas);
    assert_eq!(placed.len(), 1);
    let runs: Vec<&str> = placed[0]
        .label_informations
        .iter()
        .map(|info| info.text.as_str())
        .collect();
    assert_eq!(runs, vec!["R", "i", "v", "e", "r"]);
    assert_eq!(canvas.text_operations().count(), 5);
    let svg = canvas.end_drawing();
    assert!(svg.contains("rotate("), "spline characters should be rotated");
}

#[test]
fn labels_outside_the_canvas_are_suppressed() {
    let far = [point("a", 50.0, 50.0, "Far")];
    let mut engine = engine(|_| {});
    let mut canvas = begin(view());
    assert!(draw(&mut engine, &far, &mut canvas).is_empty());

    let mut keep = engine_keeping_outside();
    let mut canvas = begin(view());
    assert_eq!(draw(&mut keep, &far, &mut canvas).len(), 1);
}

fn engine_keeping_outside() -> LabelEngine {
    engine(|c| c.labeling.suppress_outside_canvas = false)
}

#[test]
fn json_config_drives_a_pass() {
    let config = LabelStyleConfig::from_json_str(
        r#"{ "textColumn": "[name] [ref]", "pointPlacement": "CenterRight", "xOffset": 2 }"#,
    )
    .expect("config");
    let mut engine = LabelEngine::new(config);
    let feature = point("a", 10.0, 10.0, "Main").with_column("ref", "1");
    let mut canvas = begin(view());
    let placed = draw(&mut engine, &[feature], &mut canvas);
    assert_eq!(placed[0].original_text, "Main 1");
    let bbox = placed[0].bounding_box().expect("polygon");
    assert_eq!((bbox.min_x, bbox.min_y), (52.0, 48.0));
}

#[test]
fn polygon_labels_wrap_inside_wide_text() {
    let square = Shape::Polygon(maplabel::Polygon::new(
        vec![
            Vertex::new(4.0, 4.0),
            Vertex::new(16.0, 4.0),
            Vertex::new(16.0, 16.0),
            Vertex::new(4.0, 16.0),
            Vertex::new(4.0, 4.0),
        ],
        Vec::new(),
    ));
    let park = Feature::from_shape("park", &square).with_column("name", "Green Lake Park");
    let mut engine = engine(|c| c.labeling.allow_line_carriage = true);
    let mut canvas = begin(view());
    let placed = draw(&mut engine, &[park], &mut canvas);
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].label_informations.len(), 3);
    assert_eq!(placed[0].center, Vertex::new(50.0, 50.0));
}


use root_dash::models::{CategoryColors, Rgb8, SeriesTable, Totals};
use root_dash::viz::{
    self, AxisScale, FilePresenter, HAlign, LinePlotStyle, Mark, MemoryPresenter, NullPresenter,
    Palette, util::palette_color,
};
use tempfile::tempdir;

fn table() -> SeriesTable {
    SeriesTable::new(
        vec![2018, 2019, 2020, 2021],
        vec![
            ("A".into(), vec![1.0, 2.0, 3.0, 4.0]),
            ("B".into(), vec![0.0, 1.0, 1.0, 2.0]),
            ("C".into(), vec![5.0, 3.0, 2.0, 1.0]),
        ],
    )
    .unwrap()
}

fn line_points<'a>(fig: &'a viz::Figure, label: &str) -> &'a [(f64, f64)] {
    fig.layers
        .iter()
        .filter(|l| l.label == label)
        .find_map(|l| match &l.mark {
            Mark::Line { points, .. } => Some(points.as_slice()),
            _ => None,
        })
        .expect("line layer")
}

#[test]
fn identical_calls_give_identical_figures() {
    let t = table();
    let totals = t.row_totals();
    let style = LinePlotStyle::default();
    let a = viz::build_lineplot(&t, Some(&totals), None, false, &style).unwrap();
    let b = viz::build_lineplot(&t, Some(&totals), None, false, &style).unwrap();
    assert_eq!(a.series_colors(), b.series_colors());
    assert_eq!(a.legend_labels(), b.legend_labels());
    assert_eq!(a.y_range, b.y_range);
    assert_eq!(a, b);
}

#[test]
fn default_colors_follow_palette_order() {
    let t = table();
    let fig = viz::build_lineplot(&t, None, None, false, &LinePlotStyle::default()).unwrap();
    let colors: Vec<Rgb8> = fig.series_colors().into_iter().map(|(_, c)| c).collect();
    let expected: Vec<Rgb8> = (0..3).map(|i| palette_color(Palette::Deep, i)).collect();
    assert_eq!(colors, expected);
}

#[test]
fn explicit_colors_are_used_and_must_cover_categories() {
    let t = table();
    let mut colors: CategoryColors = [
        ("A".to_string(), "#ff0000".parse::<Rgb8>().unwrap()),
        ("B".to_string(), "#00ff00".parse::<Rgb8>().unwrap()),
    ]
    .into_iter()
    .collect();
    let style = LinePlotStyle {
        category_colors: Some(colors.clone()),
        ..LinePlotStyle::default()
    };
    let e = viz::build_lineplot(&t, None, None, false, &style).unwrap_err();
    assert!(e.is_validation());

    colors.insert("C", Rgb8::new(0, 0, 255));
    let style = LinePlotStyle {
        category_colors: Some(colors),
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&t, None, None, false, &style).unwrap();
    assert_eq!(fig.series_colors()[2], ("C", Rgb8::new(0, 0, 255)));
}

#[test]
fn cumulative_draws_running_sums_without_touching_input() {
    let t = SeriesTable::new(
        vec![1, 2, 3],
        vec![
            ("A".into(), vec![1.0, 2.0, 3.0]),
            ("B".into(), vec![0.0, 1.0, 1.0]),
        ],
    )
    .unwrap();
    let totals = t.row_totals();
    let fig = viz::build_lineplot(&t, Some(&totals), None, true, &LinePlotStyle::default()).unwrap();
    let ys = |label| -> Vec<f64> { line_points(&fig, label).iter().map(|p| p.1).collect() };
    assert_eq!(ys("A"), vec![1.0, 3.0, 6.0]);
    assert_eq!(ys("B"), vec![0.0, 1.0, 2.0]);
    assert_eq!(ys("Total"), vec![1.0, 4.0, 8.0]);
    assert_eq!(t.column("A").unwrap(), &[1.0, 2.0, 3.0]);
}

#[test]
fn totals_length_mismatch_is_rejected() {
    let t = table();
    let short = Totals::new(vec![1.0, 2.0]).unwrap();
    let mut presenter = MemoryPresenter::new();
    let e = viz::render_lineplot(&t, Some(&short), None, false, &LinePlotStyle::default(), &mut presenter)
        .unwrap_err();
    assert!(e.is_validation());
    assert!(presenter.svgs.is_empty());
}

#[test]
fn unknown_category_and_empty_table_are_rejected() {
    let t = table();
    let style = LinePlotStyle::default();
    let e = viz::build_lineplot(&t, None, Some(&["Z".to_string()]), false, &style).unwrap_err();
    assert!(e.is_validation());

    let empty = SeriesTable::new(vec![], vec![("A".into(), vec![])]).unwrap();
    assert!(viz::build_lineplot(&empty, None, None, false, &style).unwrap_err().is_validation());
}

#[test]
fn legend_has_categories_then_total_and_grows_columns() {
    let t = table();
    let totals = t.row_totals();
    let fig = viz::build_lineplot(&t, Some(&totals), None, false, &LinePlotStyle::default()).unwrap();
    assert_eq!(fig.legend_labels(), vec!["A", "B", "C", "Total"]);
    assert_eq!(fig.legend.as_ref().unwrap().columns, 1);

    let keys = vec![1, 2];
    let many: Vec<(String, Vec<f64>)> = (0..9).map(|i| (format!("cat{i}"), vec![1.0, 2.0])).collect();
    let wide = SeriesTable::new(keys, many).unwrap();
    let fig = viz::build_lineplot(&wide, None, None, false, &LinePlotStyle::default()).unwrap();
    assert_eq!(fig.legend.as_ref().unwrap().columns, 3);

    let style = LinePlotStyle {
        include_legend: false,
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&t, Some(&totals), None, false, &style).unwrap();
    assert!(fig.legend_labels().is_empty());
}

#[test]
fn explicit_spacing_and_limits_drive_ticks() {
    let t = table();
    let style = LinePlotStyle {
        y_lim: Some((0.0, 10.5)),
        ytick_spacing: Some(2.0),
        xtick_spacing: Some(2.0),
        x_lim: Some((2018.0, 2022.0)),
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&t, None, None, false, &style).unwrap();
    assert_eq!(fig.y_range, (0.0, 10.5));
    assert_eq!(fig.y_ticks, vec![0.0, 2.0, 4.0, 6.0, 8.0, 10.0]);
    assert_eq!(fig.x_ticks, vec![2018.0, 2020.0]);

    let bad = LinePlotStyle {
        ytick_spacing: Some(0.0),
        ..LinePlotStyle::default()
    };
    assert!(viz::build_lineplot(&t, None, None, false, &bad).unwrap_err().is_validation());
}

#[test]
fn default_x_ticks_are_one_per_key() {
    let fig = viz::build_lineplot(&table(), None, None, false, &LinePlotStyle::default()).unwrap();
    assert_eq!(fig.x_ticks, vec![2018.0, 2019.0, 2020.0, 2021.0]);
}

#[test]
fn log_scale_needs_positive_data() {
    let zeros = SeriesTable::new(vec![1, 2], vec![("A".into(), vec![0.0, 0.0])]).unwrap();
    let style = LinePlotStyle {
        y_scale: AxisScale::Log,
        ..LinePlotStyle::default()
    };
    let e = viz::build_lineplot(&zeros, None, None, false, &style).unwrap_err();
    assert!(e.is_domain());

    let fig = viz::build_lineplot(&table(), None, None, false, &style).unwrap();
    assert!(fig.y_range.0 > 0.0);
    assert!(!fig.y_ticks.is_empty());
}

#[test]
fn annotations_sit_at_last_values() {
    let style = LinePlotStyle {
        include_annotations: true,
        annotations_ha: HAlign::Right,
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&table(), None, None, false, &style).unwrap();
    let ys: Vec<(String, f64)> = fig.annotations.iter().map(|a| (a.text.clone(), a.y)).collect();
    assert_eq!(
        ys,
        vec![("A".to_string(), 4.0), ("B".to_string(), 2.0), ("C".to_string(), 1.0)]
    );
    assert!(fig.annotations.iter().all(|a| a.offset_px < 0.0));
}

#[test]
fn presenters_receive_rendered_figure() {
    let t = table();
    let totals = t.row_totals();
    let style = LinePlotStyle {
        x_label: Some("Year".into()),
        y_label: Some("Count".into()),
        include_annotations: true,
        ..LinePlotStyle::default()
    };

    let mut memory = MemoryPresenter::new();
    viz::render_lineplot(&t, Some(&totals), None, false, &style, &mut memory).unwrap();
    let svg = memory.last().unwrap();
    assert!(svg.starts_with("<svg"));
    assert!(svg.contains("Total"));

    viz::render_lineplot(&t, Some(&totals), None, false, &style, &mut NullPresenter).unwrap();

    let dir = tempdir().unwrap();
    for name in ["chart.svg", "chart.png"] {
        let path = dir.path().join(name);
        let mut file = FilePresenter::new(&path);
        viz::render_lineplot(&t, Some(&totals), None, true, &style, &mut file).unwrap();
        assert!(std::fs::metadata(&path).unwrap().len() > 0, "{name} has content");
    }
}

#[test]
fn log_scale_renders_to_svg() {
    let style = LinePlotStyle {
        y_scale: AxisScale::Log,
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&table(), None, None, false, &style).unwrap();
    assert!(!fig.to_svg().unwrap().is_empty());
}

#[test]
fn log_scale_within_one_decade_still_has_ticks() {
    let narrow = SeriesTable::new(vec![1, 2, 3, 4], vec![("A".into(), vec![2.0, 3.0, 5.0, 8.0])]).unwrap();
    let style = LinePlotStyle {
        y_scale: AxisScale::Log,
        ..LinePlotStyle::default()
    };
    let fig = viz::build_lineplot(&narrow, None, None, false, &style).unwrap();
    assert!(fig.y_ticks.len() >= 2, "{:?}", fig.y_ticks);
    let (lo, hi) = fig.y_range;
    assert!(fig.y_ticks.iter().all(|t| *t >= lo && *t <= hi));
    assert!(fig.to_svg().unwrap().contains("<svg"));
}

#[test]
fn totals_line_is_black_and_half_transparent() {
    let t = table();
    let totals = t.row_totals();
    let fig = viz::build_lineplot(&t, Some(&totals), None, false, &LinePlotStyle::default()).unwrap();
    let total = fig.layers.iter().find(|l| l.label == "Total").expect("total layer");
    assert_eq!(total.color, Rgb8::BLACK);
    match &total.mark {
        Mark::Line { alpha, .. } => assert_eq!(*alpha, 0.5),
        other => panic!("unexpected mark {other:?}"),
    }
}

use root_dash::Frame;
use root_dash::transform::{
    AggregateSpec, CategoryOrder, Filters, Recategorization, SearchFilter, aggregate,
    filter_frame, recategorize,
};
use std::collections::{BTreeMap, BTreeSet};

const RECORDS: &str = "\
year,field,citations,title
2019,Astrophysics,12,Galaxy rotation curves
2019,Biology,3,Gene regulation
2020,Astrophysics,5,Dark energy survey
2020,Chemistry,8,Organic catalysts
2020,Biology,1,Cell membranes
2021,Astrophysics,2,Exoplanet atmospheres
2021,Geology,4,Plate tectonics
";

fn frame() -> Frame {
    Frame::from_reader(RECORDS.as_bytes()).unwrap()
}

#[test]
fn search_is_case_insensitive() {
    let filters = Filters {
        search: Some(SearchFilter {
            column: "title".into(),
            pattern: "dark|GALAXY".into(),
        }),
        ..Filters::default()
    };
    let out = filter_frame(&frame(), &filters).unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn categorical_and_numerical_filters_combine() {
    let mut categorical = BTreeMap::new();
    categorical.insert(
        "field".to_string(),
        BTreeSet::from(["Astrophysics".to_string(), "Biology".to_string()]),
    );
    let mut numerical = BTreeMap::new();
    numerical.insert("citations".to_string(), (2.0, 5.0));
    let filters = Filters {
        search: None,
        categorical,
        numerical,
    };
    let out = filter_frame(&frame(), &filters).unwrap();
    let titles: Vec<&str> = out.column("title").unwrap().collect();
    assert_eq!(
        titles,
        vec!["Gene regulation", "Dark energy survey", "Exoplanet atmospheres"]
    );
}

#[test]
fn invalid_search_and_unknown_columns_are_validation_errors() {
    let filters = Filters {
        search: Some(SearchFilter {
            column: "title".into(),
            pattern: "(unclosed".into(),
        }),
        ..Filters::default()
    };
    assert!(filter_frame(&frame(), &filters).unwrap_err().is_validation());
    assert!(
        aggregate(&frame(), &AggregateSpec::count("year", "nope"))
            .unwrap_err()
            .is_validation()
    );
}

#[test]
fn recategorize_then_aggregate() {
    let recat = Recategorization {
        source_column: "field".into(),
        target_column: "area".into(),
        mapping: BTreeMap::from([
            ("Astrophysics".to_string(), "Physical".to_string()),
            ("Chemistry".to_string(), "Physical".to_string()),
            ("Biology".to_string(), "Life".to_string()),
        ]),
        fallback: Some("Other".into()),
        combine_below: None,
    };
    let frame = recategorize(&frame(), &recat).unwrap();
    let spec = AggregateSpec {
        order: CategoryOrder::Sorted,
        ..AggregateSpec::count("year", "area")
    };
    let (table, totals) = aggregate(&frame, &spec).unwrap();
    assert_eq!(table.categories(), &["Life", "Other", "Physical"]);
    assert_eq!(table.column("Physical").unwrap(), &[1.0, 2.0, 1.0]);
    assert_eq!(table.column("Other").unwrap(), &[0.0, 0.0, 1.0]);
    assert_eq!(totals.values(), &[2.0, 3.0, 2.0]);
}

#[test]
fn rare_categories_fold_into_other() {
    let recat = Recategorization {
        source_column: "field".into(),
        target_column: "field".into(),
        mapping: BTreeMap::new(),
        fallback: None,
        combine_below: Some(2),
    };
    let frame = recategorize(&frame(), &recat).unwrap();
    let (table, _) = aggregate(&frame, &AggregateSpec::count("year", "field")).unwrap();
    assert_eq!(table.categories(), &["Astrophysics", "Biology", "Other"]);
    assert_eq!(table.column("Other").unwrap(), &[0.0, 1.0, 1.0]);
}

#[test]
fn summed_and_cumulative_totals() {
    let (table, totals) =
        aggregate(&frame(), &AggregateSpec::sum("year", "field", "citations")).unwrap();
    assert_eq!(totals.values(), &[15.0, 14.0, 6.0]);
    assert_eq!(totals.cumulative().values(), &[15.0, 29.0, 35.0]);
    assert_eq!(table.cumulative().column("Astrophysics").unwrap(), &[12.0, 17.0, 19.0]);
}

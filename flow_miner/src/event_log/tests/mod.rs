use crate::{
    event_log::import_xes::{import_xes_file, import_xes_slice, XESImportOptions},
    frequency::FrequencyAnalysis,
    utils::test_utils::get_test_data_path,
};

#[test]
fn test_order_handling_import() {
    let x = include_bytes!("./test_data/order_handling.xes");
    let log = import_xes_slice(x, false, &XESImportOptions::default()).unwrap();
    assert_eq!(log.len(), 5);
    assert_eq!(log.num_events(), 25);
    // Trace-level and global `concept:name` values are not activities
    assert!(!log.activities().contains("__INVALID__"));
    assert!(!log.activities().contains("1"));
    assert_eq!(log.activities().len(), 6);
    assert_eq!(
        log.traces()[2],
        vec![
            "register order",
            "check stock",
            "check credit",
            "reject order",
            "archive order"
        ]
    );
}

#[test]
fn test_order_handling_frequencies() {
    let path = get_test_data_path().join("order_handling.xes");
    let log = import_xes_file(path, &XESImportOptions::default()).unwrap();
    let freq = FrequencyAnalysis::from_log(&log);
    assert_eq!(freq.activity_frequency("register order"), 5);
    assert_eq!(freq.activity_frequency("ship order"), 3);
    assert_eq!(freq.activity_frequency("reject order"), 2);
    assert_eq!(freq.transition_frequency("register order", "check stock"), 2);
    assert_eq!(freq.transition_frequency("register order", "check credit"), 3);
    assert_eq!(freq.transition_frequency("check stock", "check credit"), 2);
    assert_eq!(freq.transition_frequency("check credit", "check stock"), 3);
    assert_eq!(freq.transition_frequency("archive order", "register order"), 0);
}

//! Fixtures for tests

use crate::capacity::PropertyRecord;
use crate::filter::GeographyScope;
use crate::table::Table;
use log::{Level, LevelFilter, Log, Metadata, Record};
use rstest::fixture;
use std::sync::{Mutex, Once};

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!(
            $result.unwrap_err().chain().next().unwrap().to_string(),
            $msg
        );
    };
}
pub(crate) use assert_error;

/// Log messages recorded by [`CaptureLogger`]
static CAPTURED_LOGS: Mutex<Vec<(Level, String)>> = Mutex::new(Vec::new());

/// A logger which records messages so that tests can check them
struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _metadata: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        CAPTURED_LOGS
            .lock()
            .unwrap()
            .push((record.level(), record.args().to_string()));
    }

    fn flush(&self) {}
}

/// Start recording log messages.
///
/// Tests run in parallel, so messages from other tests may also be recorded.
pub fn capture_logs() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        log::set_logger(&CaptureLogger).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Whether a message was logged at the given level since [`capture_logs`] was first called
pub fn was_logged(level: Level, msg: &str) -> bool {
    CAPTURED_LOGS
        .lock()
        .unwrap()
        .iter()
        .any(|(l, m)| *l == level && m == msg)
}

#[fixture]
pub fn scope() -> GeographyScope {
    GeographyScope::new(["USA"])
}

fn property_record(
    child_object: &str,
    property: &str,
    scenario: &str,
    child_class: &str,
    value: f64,
) -> PropertyRecord {
    PropertyRecord {
        child_object: child_object.into(),
        property: property.into(),
        scenario: scenario.into(),
        child_class: child_class.into(),
        value,
    }
}

#[fixture]
pub fn property_records() -> Vec<PropertyRecord> {
    vec![
        property_record("Hydro|AF-DZA", "Max Capacity", "", "Generator", 100.0),
        property_record("Hydro|AF-DZA", "Max Units Built", "Base", "Generator", 20.0),
        property_record(
            "Wind|Onshore|NA-USA-CA",
            "Max Capacity",
            "",
            "Generator",
            50.0,
        ),
        property_record(
            "Wind|Onshore|NA-USA-CA",
            "Max Units Built",
            "Base Scenario",
            "Generator",
            10.0,
        ),
        // Not the base scenario
        property_record("Solar|PV|EU-GBR", "Max Capacity", "", "Generator", 10.0),
        property_record("Solar|PV|EU-GBR", "Max Units Built", "High", "Generator", 5.0),
        // Not a family whose capacity is limited
        property_record("Gas|EU-GBR", "Max Capacity", "", "Generator", 10.0),
        property_record("Gas|EU-GBR", "Max Units Built", "Base", "Generator", 5.0),
        // Not a generator
        property_record("Hydro|AS-IND-NO", "Max Capacity", "", "Battery", 10.0),
        property_record("Hydro|AS-IND-NO", "Max Units Built", "Base", "Generator", 5.0),
    ]
}

#[fixture]
pub fn residual_capacity_table() -> Table {
    let mut table = Table::new(["REGION", "TECHNOLOGY", "YEAR", "VALUE"]);
    for (tech, year, value) in [
        ("PWRHYDDZAXX01", "2015", "1.23456"),
        ("PWRHYDDZAXX01", "2020", "5"),
        ("PWRWONUSACA01", "2015", "10"),
        ("PWRCOAUSAXX01", "2015", "3"),
        ("PWRSPVGBRXX01", "2015", "4"),
        ("MINCOAUSA", "2015", "1"),
    ] {
        table.push_row(vec!["GLOBAL".into(), tech.into(), year.into(), value.into()]);
    }

    table
}

use lazy_static::lazy_static;
use std::collections::HashMap;
use std::sync::Mutex;

/// What has happened to a named fake pin, kept here so it outlives the pin itself.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PinRecord {
    pub high: Option<bool>,
    pub writes: usize,
    pub dropped: bool,
    pub fail_writes: bool,
}

lazy_static! {
    static ref PIN_RECORDS: Mutex<HashMap<&'static str, PinRecord>> = Mutex::new(HashMap::new());
}

pub fn reset_named_record(name: &'static str) {
    let mut map = PIN_RECORDS.lock().unwrap();
    map.insert(name, PinRecord::default());
}

pub fn record_named_write(name: &'static str, high: bool) {
    let mut map = PIN_RECORDS.lock().unwrap();
    let record = map.entry(name).or_default();
    record.high = Some(high);
    record.writes += 1;
}

pub fn set_named_fail_writes(name: &'static str, fail: bool) {
    let mut map = PIN_RECORDS.lock().unwrap();
    map.entry(name).or_default().fail_writes = fail;
}

pub fn record_named_drop(name: &'static str) {
    let mut map = PIN_RECORDS.lock().unwrap();
    map.entry(name).or_default().dropped = true;
}

pub fn get_named_record(name: &str) -> PinRecord {
    let map = PIN_RECORDS.lock().unwrap();
    map.get(name).copied().unwrap_or_default()
}

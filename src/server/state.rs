use crate::location::LocationArbiter;
use crate::records::BurialRecord;
use std::sync::Mutex;

pub struct AppState {
    pub records: Vec<BurialRecord>,
    pub arbiter: Mutex<LocationArbiter>,
}

#![allow(dead_code)]

use camino::{Utf8Path, Utf8PathBuf};
use decontam::progress::LoadProgress;

pub fn data_path(relative: &str) -> Utf8PathBuf {
    Utf8Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests/data")
        .join(relative)
}

/// Progress sink recording every report.
#[derive(Debug, Default)]
pub struct Recorder {
    pub total: Option<usize>,
    pub loaded: Vec<(usize, String)>,
    pub finished: bool,
}

impl LoadProgress for Recorder {
    fn begin(&mut self, total: usize, _label: &str) {
        self.total = Some(total);
    }

    fn advance(&mut self, done: usize, name: &str) {
        self.loaded.push((done, name.to_string()));
    }

    fn finish(&mut self) {
        self.finished = true;
    }
}

use std::io;
use w1_thermostat::ds18b20::RawSource;

pub const NOT_READY: &str = "3d 01 4b 46 7f ff 0c 10 3f : crc=3f NO\n\
                             3d 01 4b 46 7f ff 0c 10 3f t=85000\n";
pub const READY: &str = "3d 01 4b 46 7f ff 0c 10 3f : crc=3f YES\n\
                         3d 01 4b 46 7f ff 0c 10 3f t=23875\n";

pub enum FakeRead {
    Text(&'static str),
    Missing,
}

/// Replays scripted reads in order, repeating the last one once the script runs out.
pub struct ScriptedSource {
    reads: Vec<FakeRead>,
    count: usize,
}

impl ScriptedSource {
    pub fn new(reads: Vec<FakeRead>) -> ScriptedSource {
        assert!(!reads.is_empty(), "Must provide at least one read.");
        ScriptedSource { reads, count: 0 }
    }

    pub fn always(text: &'static str) -> ScriptedSource {
        ScriptedSource::new(vec![FakeRead::Text(text)])
    }

    /// How many times the source has been read.
    pub fn count(&self) -> usize {
        self.count
    }
}

impl RawSource for ScriptedSource {
    fn read_raw(&mut self) -> io::Result<String> {
        let index = self.count.min(self.reads.len() - 1);
        self.count += 1;
        match &self.reads[index] {
            FakeRead::Text(text) => Ok(text.to_string()),
            FakeRead::Missing => Err(io::Error::new(
                io::ErrorKind::NotFound,
                "No such file or directory",
            )),
        }
    }
}

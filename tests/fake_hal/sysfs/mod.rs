use std::fs;
use std::path::{Path, PathBuf};

/// A throwaway directory laid out like the 1-Wire and GPIO sysfs trees.
pub struct TempTree {
    root: PathBuf,
}

impl TempTree {
    /// `name` must be unique across the test binary, since tests run in parallel.
    pub fn new(name: &str) -> TempTree {
        let root = std::env::temp_dir().join(format!(
            "w1-thermostat-{}-{}",
            std::process::id(),
            name
        ));
        let _ = fs::remove_dir_all(&root);
        fs::create_dir_all(root.join("devices")).unwrap();
        fs::create_dir_all(root.join("gpio")).unwrap();
        TempTree { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn devices_dir(&self) -> PathBuf {
        self.root.join("devices")
    }

    pub fn gpio_root(&self) -> PathBuf {
        self.root.join("gpio")
    }

    /// Adds a device directory with the given `w1_slave` contents.
    pub fn add_sensor(&self, name: &str, text: &str) -> PathBuf {
        let dir = self.devices_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("w1_slave"), text).unwrap();
        dir
    }

    /// Adds a device directory with no `w1_slave` file, like the bus master entry.
    pub fn add_device_dir(&self, name: &str) -> PathBuf {
        let dir = self.devices_dir().join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    pub fn remove_sensor(&self, name: &str) {
        fs::remove_dir_all(self.devices_dir().join(name)).unwrap();
    }

    /// Stands in for the kernel creating `gpioN` once the pin is exported.
    pub fn add_gpio(&self, number: u32) {
        let dir = self.gpio_root().join(format!("gpio{}", number));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("direction"), "in").unwrap();
        fs::write(dir.join("value"), "0").unwrap();
    }

    pub fn gpio_file(&self, number: u32, file: &str) -> String {
        fs::read_to_string(self.gpio_root().join(format!("gpio{}", number)).join(file)).unwrap()
    }

    /// Contents of a file directly under the GPIO root, e.g. `export`, or "" if absent.
    pub fn gpio_control(&self, file: &str) -> String {
        fs::read_to_string(self.gpio_root().join(file)).unwrap_or_default()
    }
}

impl Drop for TempTree {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.root);
    }
}

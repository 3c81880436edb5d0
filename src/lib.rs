/// Blocking delay for the standard library.
pub mod delay;
/// Locates the DS18B20 device directory exposed by the Linux 1-Wire subsystem.
pub mod discovery;
/// Reads and parses temperatures from a DS18B20 through its `w1_slave` file.
///
/// Refer to [this datasheet](https://datasheets.maximintegrated.com/en/ds/DS18B20.pdf) for more
/// information about the sensor.
pub mod ds18b20;
/// Output pins driven through the Linux sysfs GPIO interface.
pub mod gpio;
/// YAML configuration for the poller binary.
pub mod config;
/// One poll cycle: read the sensor, then feed the result to the controller.
pub mod poller;
/// Maps a temperature to output pin levels with a fixed threshold.
pub mod threshold;

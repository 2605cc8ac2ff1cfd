#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")] // hide console window on Windows in release

mod config;
mod data_provider;
mod location_provider;
mod nmea_location_provider;
mod orientation;
mod readout;
mod serial_data_provider;
mod ui;

use tokio::time::Duration;

fn main() {
    env_logger::init();

    let rt = tokio::runtime::Runtime::new().expect("Unable to create Runtime");
    let _enter = rt.enter();

    std::thread::spawn(move || {
        rt.block_on(async {
            loop {
                tokio::time::sleep(Duration::from_secs(3600)).await;
            }
        })
    });

    let config = config::AppConfig::load_or_default();

    let (sensors, accel_rx, mag_rx) = serial_data_provider::SerialDataProvider::new(&config);
    let (location, fix_rx) = location_provider::select_provider(&config);

    ui::init(sensors, location, accel_rx, mag_rx, fix_rx).unwrap();
}

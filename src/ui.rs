use std::sync::mpsc::Receiver;

use chrono::Local;
use eframe::egui::{self};

use crate::data_provider::{AccelData, DataProviderUi, LocationFix, MagData};
use crate::location_provider::LocationProvider;
use crate::readout::LatestReadings;
use crate::serial_data_provider::SerialDataProvider;

pub fn init(
    sensors: Box<SerialDataProvider>,
    location: Option<Box<dyn LocationProvider>>,
    accel_rx: Receiver<AccelData>,
    mag_rx: Receiver<MagData>,
    fix_rx: Receiver<Option<LocationFix>>,
) -> eframe::Result {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default().with_inner_size([480.0, 640.0]),
        ..Default::default()
    };
    eframe::run_native(
        "Sensor Readout",
        options,
        Box::new(|_cc| {
            Ok(Box::new(MyApp::new(
                sensors, location, accel_rx, mag_rx, fix_rx,
            )))
        }),
    )
}

struct MyApp {
    accel_rx: Receiver<AccelData>,
    mag_rx: Receiver<MagData>,
    fix_rx: Receiver<Option<LocationFix>>,
    readings: LatestReadings,
    sensors: Box<SerialDataProvider>,
    location: Option<Box<dyn LocationProvider>>,
    paused: bool,
}

impl MyApp {
    pub fn new(
        sensors: Box<SerialDataProvider>,
        location: Option<Box<dyn LocationProvider>>,
        accel_rx: Receiver<AccelData>,
        mag_rx: Receiver<MagData>,
        fix_rx: Receiver<Option<LocationFix>>,
    ) -> Self {
        let readings = LatestReadings::new(location.as_ref().map(|p| p.name()));

        Self {
            accel_rx,
            mag_rx,
            fix_rx,
            readings,
            sensors,
            location,
            paused: true, // the first frame performs the initial registration
        }
    }

    fn resume(&mut self) {
        self.sensors.resume();
        if let Some(location) = &mut self.location {
            location.request_updates();
        }
        self.paused = false;
    }

    fn pause(&mut self) {
        self.sensors.pause();
        if let Some(location) = &mut self.location {
            location.remove_updates();
        }
        self.paused = true;
    }
}

impl eframe::App for MyApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        // a minimized window is the closest desktop equivalent of going to
        // the background: nothing is subscribed while out of sight
        let minimized = ctx.input(|i| i.viewport().minimized.unwrap_or(false));
        if minimized && !self.paused {
            self.pause();
        } else if !minimized && self.paused {
            self.resume();
        }

        while let Ok(msg) = self.accel_rx.try_recv() {
            self.readings.apply_accel(msg.lin_acc, Local::now());
        }

        while let Ok(msg) = self.mag_rx.try_recv() {
            self.readings.apply_mag(msg.field, Local::now());
        }

        while let Ok(fix) = self.fix_rx.try_recv() {
            self.readings.apply_fix(fix, Local::now());
        }

        egui::SidePanel::left("left_panel").show(ctx, |ui| {
            ui.heading("Data Sources");
            ui.separator();

            self.sensors.show(ui);
            ui.separator();

            match &mut self.location {
                Some(location) => location.show(ui),
                None => {
                    ui.heading("Location");
                    ui.label("no provider available");
                }
            }
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Accelerometer");
            ui.label(self.readings.accel_text());
            ui.small(self.readings.accel_last_updated());
            ui.separator();

            ui.heading("Location");
            ui.label(self.readings.provider_text());
            ui.label(self.readings.location_text());
            ui.small(self.readings.location_last_updated());
            ui.separator();

            ui.heading("Orientation");
            ui.label(self.readings.orientation_text());
            ui.small(self.readings.orientation_last_updated());
        });

        ctx.request_repaint();
    }
}

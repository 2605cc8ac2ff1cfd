use crate::config::AppConfig;
use crate::data_provider::*;
use bytes::BytesMut;
use core::str;
use eframe::egui;
use futures::prelude::*;
use log::{info, warn};
use nalgebra::{vector, Vector3};
use std::sync::mpsc::{Receiver, Sender};
use stream_cancel::StreamExt;
use tokio_serial::{SerialPort, SerialPortBuilderExt};
use tokio_util::codec::Decoder;

const BAUDRATES: [u32; 9] = [
    4800, 9600, 19200, 38400, 57600, 115200, 230400, 460800, 921600,
];

pub struct SerialDataProvider {
    accel_tx: Sender<AccelData>,
    mag_tx: Sender<MagData>,
    serial_port_info: Option<tokio_serial::SerialPortInfo>,
    baud_rate: u32,
    config: AppConfig,
    active: bool,
    status: String,
    trigger: Option<stream_cancel::Trigger>,
}

impl SerialDataProvider {
    pub fn new(config: &AppConfig) -> (Box<Self>, Receiver<AccelData>, Receiver<MagData>) {
        let (accel_tx, accel_rx) = std::sync::mpsc::channel();
        let (mag_tx, mag_rx) = std::sync::mpsc::channel();

        // preselect the port of the last run, if it is still around
        let serial_port_info = config.sensor_port.as_ref().and_then(|name| {
            tokio_serial::available_ports()
                .ok()?
                .into_iter()
                .find(|p| &p.port_name == name)
        });

        (
            Box::new(Self {
                accel_tx,
                mag_tx,
                serial_port_info,
                baud_rate: config.sensor_baud,
                config: config.clone(),
                active: false,
                status: String::new(),
                trigger: None,
            }),
            accel_rx,
            mag_rx,
        )
    }

    // (re)subscribe to the accelerometer and magnetometer stream; a no-op
    // unless the user has opened the port
    pub fn resume(&mut self) {
        if !self.active || self.trigger.is_some() {
            return;
        }
        let Some(serial_port_info) = &self.serial_port_info else {
            return;
        };

        match tokio_serial::new(&serial_port_info.port_name, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .flow_control(tokio_serial::FlowControl::None)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
        {
            Ok(mut port) => {
                // dtr: required for Arduinos to send data
                if let Err(e) = port.write_data_terminal_ready(true) {
                    warn!("dtr on {}: {e}", serial_port_info.port_name);
                }
                info!("open serial port: {}", serial_port_info.port_name);
                self.status.clear();

                let (trigger, tripwire) = stream_cancel::Tripwire::new();
                self.trigger = Some(trigger);

                let reader = LineCodec.framed(port);

                let accel_tx = self.accel_tx.clone();
                let mag_tx = self.mag_tx.clone();

                tokio::spawn(async move {
                    let mut incoming = reader.take_until_if(tripwire);

                    while let Some(line) = incoming.next().await {
                        match line {
                            Ok(line) => match parse_sensor_line(&line) {
                                Some(SensorLine::Accel(lin_acc)) => {
                                    accel_tx.send(AccelData { lin_acc }).ok();
                                }
                                Some(SensorLine::Mag(field)) => {
                                    mag_tx.send(MagData { field }).ok();
                                }
                                None => {}
                            },
                            Err(e) => warn!("sensor stream: {e}"),
                        }
                    }
                    info!("sensor stream closed");
                });
            }
            Err(e) => {
                warn!("open {} failed: {e}", serial_port_info.port_name);
                self.status = format!("open failed: {e}");
            }
        }
    }

    // drop the stream; the port is reopened on the next resume
    pub fn pause(&mut self) {
        if self.trigger.take().is_some() {
            info!("sensor stream unsubscribed");
        }
    }

    fn remember_settings(&mut self) {
        self.config.sensor_port = self.serial_port_info.as_ref().map(|p| p.port_name.clone());
        self.config.sensor_baud = self.baud_rate;
        if let Err(e) = self.config.save(&AppConfig::path()) {
            warn!("saving settings: {e}");
        }
    }
}

impl DataProviderUi for SerialDataProvider {
    fn show(&mut self, ui: &mut eframe::egui::Ui) {
        ui.heading("Sensors");
        if self.active {
            ui.label(format!(
                "'{}' 8-N-1",
                self.serial_port_info.as_ref().map_or("", |p| &p.port_name)
            ));
        } else {
            egui::ComboBox::new("sensor_ports", "Port")
                .selected_text(self.serial_port_info.as_ref().map_or("", |p| &p.port_name))
                .show_ui(ui, |ui| {
                    for port in tokio_serial::available_ports().unwrap_or_default() {
                        // remove /dev/ttySx.
                        if port.port_name.contains("/dev/ttyS") {
                            continue;
                        }

                        let port_name = port.port_name.clone();
                        ui.selectable_value(
                            &mut self.serial_port_info,
                            Some(port),
                            port_name.clone(),
                        );
                    }
                });
        }

        egui::ComboBox::new("sensor_baudrates", "Baud rate")
            .selected_text(format!("{}", self.baud_rate))
            .show_ui(ui, |ui| {
                for baudrate in BAUDRATES {
                    ui.selectable_value(&mut self.baud_rate, baudrate, format!("{baudrate}"));
                }
            });

        if self.serial_port_info.is_some() {
            if self.active {
                if ui.button("Close").clicked() {
                    self.active = false;
                    self.pause();
                }
            } else if ui.button("Open").clicked() {
                self.active = true;
                self.remember_settings();
                self.resume();
            }
        }

        if !self.status.is_empty() {
            ui.label(&self.status);
        }
    }
}

#[derive(Debug, PartialEq)]
enum SensorLine {
    Accel(Vector3<f64>),
    Mag(Vector3<f64>),
}

fn parse_sensor_line(line: &str) -> Option<SensorLine> {
    let line = line.trim_end();

    let mut x = 0.0;
    let mut y = 0.0;
    let mut z = 0.0;

    if scanf::sscanf!(line, "acc {} {} {}", x, y, z).is_ok() {
        return Some(SensorLine::Accel(vector![x, y, z]));
    }
    if scanf::sscanf!(line, "mag {} {} {}", x, y, z).is_ok() {
        return Some(SensorLine::Mag(vector![x, y, z]));
    }

    None
}

struct LineCodec;

impl Decoder for LineCodec {
    type Item = String;
    type Error = std::io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let newline = src.as_ref().iter().position(|b| *b == b'\n');
        if let Some(n) = newline {
            let line = src.split_to(n + 1);
            let line = match str::from_utf8(line.as_ref()) {
                Ok(s) => s.to_string(),
                // a decode error ends the framed stream, garbage at a
                // mismatched baud rate must not take the subscription down
                Err(_) => {
                    warn!("sensor stream: line is not utf-8");
                    String::from_utf8_lossy(line.as_ref()).into_owned()
                }
            };
            return Ok(Some(line));
        }
        Ok(None)
    }
}

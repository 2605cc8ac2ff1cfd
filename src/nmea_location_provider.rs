use std::sync::mpsc::Sender;

use eframe::egui;
use futures::prelude::*;
use log::{info, warn};
use nmea0183::{ParseResult, Parser};
use stream_cancel::StreamExt;
use tokio_serial::SerialPortBuilderExt;
use tokio_util::codec::{BytesCodec, Decoder};

use crate::config::AppConfig;
use crate::data_provider::{DataProviderUi, LocationFix};
use crate::location_provider::{Accuracy, LocationProvider};

// NMEA 0183 receiver on a serial port, e.g. a u-blox NEO-6M
pub struct NmeaLocationProvider {
    fix_tx: Sender<Option<LocationFix>>,
    port_name: Option<String>,
    baud_rate: u32,
    status: String,
    trigger: Option<stream_cancel::Trigger>,
}

impl NmeaLocationProvider {
    pub fn new(config: &AppConfig, fix_tx: Sender<Option<LocationFix>>) -> Self {
        Self {
            fix_tx,
            port_name: config.gps_port.clone(),
            baud_rate: config.gps_baud,
            status: String::new(),
            trigger: None,
        }
    }
}

// GGA with a fix carries a position, GGA without one is an explicit "cannot
// locate" report; nothing else in the stream reaches the screen
fn fix_from(result: ParseResult) -> Option<Option<LocationFix>> {
    match result {
        ParseResult::GGA(Some(gga)) => Some(Some(LocationFix {
            latitude: gga.latitude.as_f64(),
            longitude: gga.longitude.as_f64(),
        })),
        ParseResult::GGA(None) => Some(None),
        _ => None,
    }
}

impl LocationProvider for NmeaLocationProvider {
    fn name(&self) -> &'static str {
        "gps"
    }

    fn accuracy(&self) -> Accuracy {
        Accuracy::Fine
    }

    fn is_enabled(&self) -> bool {
        match &self.port_name {
            Some(name) => tokio_serial::available_ports()
                .map(|ports| ports.iter().any(|p| &p.port_name == name))
                .unwrap_or(false),
            None => false,
        }
    }

    fn request_updates(&mut self) {
        if self.trigger.is_some() {
            return;
        }
        let Some(port_name) = self.port_name.clone() else {
            return;
        };

        match tokio_serial::new(&port_name, self.baud_rate)
            .data_bits(tokio_serial::DataBits::Eight)
            .flow_control(tokio_serial::FlowControl::None)
            .parity(tokio_serial::Parity::None)
            .stop_bits(tokio_serial::StopBits::One)
            .open_native_async()
        {
            Ok(port) => {
                info!("location updates from '{port_name}'");
                self.status.clear();

                let (trigger, tripwire) = stream_cancel::Tripwire::new();
                self.trigger = Some(trigger);

                let reader = BytesCodec::new().framed(port);

                let fix_tx = self.fix_tx.clone();
                tokio::spawn(async move {
                    let mut parser = Parser::new();
                    let mut incoming = reader.take_until_if(tripwire);

                    while let Some(chunk) = incoming.next().await {
                        match chunk {
                            Ok(bytes) => {
                                for byte in bytes {
                                    match parser.parse_from_byte(byte) {
                                        Some(Ok(result)) => {
                                            if let Some(report) = fix_from(result) {
                                                fix_tx.send(report).ok();
                                            }
                                        }
                                        Some(Err(e)) => warn!("nmea: {e}"),
                                        None => {}
                                    }
                                }
                            }
                            Err(e) => warn!("gps stream: {e}"),
                        }
                    }
                    info!("gps stream closed");
                });
            }
            Err(e) => {
                warn!("open {port_name} failed: {e}");
                self.status = format!("open failed: {e}");
            }
        }
    }

    fn remove_updates(&mut self) {
        if self.trigger.take().is_some() {
            info!("location updates removed");
        }
    }
}

impl DataProviderUi for NmeaLocationProvider {
    fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading("GPS");
        match &self.port_name {
            Some(port_name) => {
                ui.label(format!("'{}' @ {}", port_name, self.baud_rate));
            }
            None => {
                ui.label("no port configured");
            }
        }

        if !self.status.is_empty() {
            ui.label(&self.status);
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    // every location report the parser produces for the given bytes
    fn reports(sentence: &[u8]) -> Vec<Option<LocationFix>> {
        let mut parser = Parser::new();
        let mut out = vec![];

        for byte in sentence.iter().copied() {
            if let Some(Ok(result)) = parser.parse_from_byte(byte) {
                if let Some(report) = fix_from(result) {
                    out.push(report);
                }
            }
        }

        out
    }

    #[test]
    fn gga_with_fix_reports_a_position() {
        let out = reports(b"$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n");

        assert_eq!(out.len(), 1);
        let fix = out[0].expect("fix");
        assert!((fix.latitude - 48.1173).abs() < 1e-4);
        assert!((fix.longitude - 11.5166).abs() < 1e-4);
    }

    #[test]
    fn combined_talker_gga_works_too() {
        let out = reports(b"$GNGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*59\r\n");

        assert_eq!(out.len(), 1);
        assert!(out[0].is_some());
    }

    #[test]
    fn gga_without_fix_reports_unable_to_locate() {
        let out = reports(b"$GPGGA,002905.799,,,,,0,00,,,M,,M,,*71\r\n");

        assert_eq!(out, vec![None]);
    }

    #[test]
    fn other_sentences_report_nothing() {
        let out = reports(
            b"$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
        );

        assert!(out.is_empty());
    }

    #[test]
    fn garbage_reports_nothing() {
        assert!(reports(b"acc 1.0 2.0 3.0\r\n").is_empty());
        assert!(reports(b"$GPGGA,borked*00\r\n").is_empty());
    }
}

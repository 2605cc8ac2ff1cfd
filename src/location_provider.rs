use std::sync::mpsc::{Receiver, Sender};

use eframe::egui;
use log::info;
use tokio::time::Duration;

use crate::config::AppConfig;
use crate::data_provider::{DataProviderUi, LocationFix};
use crate::nmea_location_provider::NmeaLocationProvider;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Accuracy {
    Coarse,
    Fine,
}

#[derive(Debug, Clone, Copy)]
pub struct Criteria {
    pub accuracy: Accuracy,
}

pub trait LocationProvider: DataProviderUi {
    fn name(&self) -> &'static str;
    fn accuracy(&self) -> Accuracy;
    fn is_enabled(&self) -> bool;
    fn request_updates(&mut self);
    fn remove_updates(&mut self);
}

// providers that meet the wanted accuracy rank above ones that merely come
// close, ties go to the first registered
pub fn best_provider(
    providers: Vec<Box<dyn LocationProvider>>,
    criteria: Criteria,
    enabled_only: bool,
) -> Option<Box<dyn LocationProvider>> {
    let mut best: Option<Box<dyn LocationProvider>> = None;

    for provider in providers {
        if enabled_only && !provider.is_enabled() {
            continue;
        }
        let better = match &best {
            Some(current) => rank(provider.as_ref(), criteria) > rank(current.as_ref(), criteria),
            None => true,
        };
        if better {
            best = Some(provider);
        }
    }

    best
}

fn rank(provider: &dyn LocationProvider, criteria: Criteria) -> (bool, Accuracy) {
    (provider.accuracy() >= criteria.accuracy, provider.accuracy())
}

// all providers report into the single fix channel; which of them feeds it
// is decided here, once, at startup
pub fn select_provider(
    config: &AppConfig,
) -> (Option<Box<dyn LocationProvider>>, Receiver<Option<LocationFix>>) {
    let (fix_tx, fix_rx) = std::sync::mpsc::channel();

    let providers: Vec<Box<dyn LocationProvider>> = vec![
        Box::new(NmeaLocationProvider::new(config, fix_tx.clone())),
        Box::new(ManualLocationProvider::new(config, fix_tx)),
    ];

    let best = best_provider(
        providers,
        Criteria {
            accuracy: Accuracy::Fine,
        },
        true,
    );
    match &best {
        Some(provider) => info!("location provider: {}", provider.name()),
        None => info!("no enabled location provider"),
    }

    (best, fix_rx)
}

// fixed position from the config file, reported once a second
pub struct ManualLocationProvider {
    fix_tx: Sender<Option<LocationFix>>,
    location: Option<LocationFix>,
    trigger: Option<stream_cancel::Trigger>,
}

impl ManualLocationProvider {
    pub fn new(config: &AppConfig, fix_tx: Sender<Option<LocationFix>>) -> Self {
        Self {
            fix_tx,
            location: config.manual_location.map(|m| LocationFix {
                latitude: m.latitude,
                longitude: m.longitude,
            }),
            trigger: None,
        }
    }
}

impl LocationProvider for ManualLocationProvider {
    fn name(&self) -> &'static str {
        "manual"
    }

    fn accuracy(&self) -> Accuracy {
        Accuracy::Coarse
    }

    fn is_enabled(&self) -> bool {
        self.location.is_some()
    }

    fn request_updates(&mut self) {
        if self.trigger.is_some() {
            return;
        }
        let Some(fix) = self.location else {
            return;
        };

        let (trigger, tripwire) = stream_cancel::Tripwire::new();
        self.trigger = Some(trigger);

        let fix_tx = self.fix_tx.clone();
        tokio::spawn(async move {
            tokio::pin!(tripwire);
            let mut tick = tokio::time::interval(Duration::from_secs(1));
            loop {
                tokio::select! {
                    _ = &mut tripwire => break,
                    _ = tick.tick() => {
                        fix_tx.send(Some(fix)).ok();
                    }
                }
            }
            info!("manual location updates stopped");
        });
    }

    fn remove_updates(&mut self) {
        self.trigger.take();
    }
}

impl DataProviderUi for ManualLocationProvider {
    fn show(&mut self, ui: &mut egui::Ui) {
        ui.heading("Manual Location");
        match self.location {
            Some(fix) => {
                ui.label(format!("{:.4}, {:.4}", fix.latitude, fix.longitude));
            }
            None => {
                ui.label("not configured");
            }
        }
    }
}

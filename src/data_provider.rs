use eframe::egui;
use nalgebra::Vector3;

#[derive(Debug, Clone, Copy)]
pub struct AccelData {
    pub lin_acc: Vector3<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct MagData {
    pub field: Vector3<f64>,
}

// location channels carry Option<LocationFix>; None means the source
// currently cannot locate
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocationFix {
    pub latitude: f64,
    pub longitude: f64,
}

pub trait DataProviderUi {
    fn show(&mut self, ui: &mut egui::Ui);
}

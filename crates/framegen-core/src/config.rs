//! Site, material and load settings shared by the graph builder.

use serde::{Deserialize, Serialize};

/// Concrete material parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialSettings {
    /// Display name of the concrete grade.
    #[serde(default = "default_material_name")]
    pub name: String,
    /// Elastic modulus in MPa.
    #[serde(default = "default_e_modulus")]
    pub e_modulus_mpa: f64,
    /// Axial compressive design strength fc in MPa.
    #[serde(default = "default_fc")]
    pub fc_mpa: f64,
    /// Unit weight in kN/m^3.
    #[serde(default = "default_unit_weight")]
    pub unit_weight_kn_m3: f64,
}

fn default_material_name() -> String {
    "C30/37".to_string()
}

fn default_e_modulus() -> f64 {
    30_000.0
}

fn default_fc() -> f64 {
    14.3
}

fn default_unit_weight() -> f64 {
    26.0
}

impl Default for MaterialSettings {
    fn default() -> Self {
        Self {
            name: default_material_name(),
            e_modulus_mpa: default_e_modulus(),
            fc_mpa: default_fc(),
            unit_weight_kn_m3: default_unit_weight(),
        }
    }
}

/// Response-spectrum seismic site parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeismicSettings {
    /// Peak ground acceleration in units of g.
    #[serde(default = "default_pga_g")]
    pub pga_g: f64,
    /// Site characteristic period Tg in seconds.
    #[serde(default = "default_tg")]
    pub characteristic_period_s: f64,
    /// Modal damping ratio.
    #[serde(default = "default_damping")]
    pub damping_ratio: f64,
    /// Gravitational acceleration in m/s^2.
    #[serde(default = "default_gravity")]
    pub gravity_ms2: f64,
}

fn default_pga_g() -> f64 {
    0.16
}

fn default_tg() -> f64 {
    0.45
}

fn default_damping() -> f64 {
    0.05
}

fn default_gravity() -> f64 {
    9.80665
}

impl Default for SeismicSettings {
    fn default() -> Self {
        Self {
            pga_g: default_pga_g(),
            characteristic_period_s: default_tg(),
            damping_ratio: default_damping(),
            gravity_ms2: default_gravity(),
        }
    }
}

impl SeismicSettings {
    /// Peak ground acceleration converted to m/s^2.
    pub fn pga_ms2(&self) -> f64 {
        self.pga_g * self.gravity_ms2
    }
}

/// Uniform surface loads applied to every floor plate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadSettings {
    /// Superimposed dead load in kN/m^2.
    #[serde(default = "default_dead")]
    pub dead_kn_m2: f64,
    /// Live load in kN/m^2.
    #[serde(default = "default_live")]
    pub live_kn_m2: f64,
}

fn default_dead() -> f64 {
    5.0
}

fn default_live() -> f64 {
    2.0
}

impl Default for LoadSettings {
    fn default() -> Self {
        Self {
            dead_kn_m2: default_dead(),
            live_kn_m2: default_live(),
        }
    }
}

/// Complete site configuration consumed by the graph builder and sampler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    /// Concrete material parameters.
    #[serde(default)]
    pub materials: MaterialSettings,
    /// Seismic site parameters.
    #[serde(default)]
    pub seismic: SeismicSettings,
    /// Floor surface loads.
    #[serde(default)]
    pub loads: LoadSettings,
    /// Uniform story height in metres.
    #[serde(default = "default_story_height")]
    pub story_height_m: f64,
}

fn default_story_height() -> f64 {
    3.0
}

impl Default for SiteSettings {
    fn default() -> Self {
        Self {
            materials: MaterialSettings::default(),
            seismic: SeismicSettings::default(),
            loads: LoadSettings::default(),
            story_height_m: default_story_height(),
        }
    }
}

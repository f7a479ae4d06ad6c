//! Parser voor XML-presets met instancing-instellingen.
//!
//! Een preset beschrijft alleen wat afwijkt van de standaardwaarden:
//!
//! ```xml
//! <instancer>
//!   <instancing mode="distance" spacing="2.5" max-count="40" start="0" end="1" offset="0"/>
//!   <orientation mode="chain" local-axis="x">
//!     <local-rotation x="0" y="0" z="90"/>
//!   </orientation>
//!   <offsets><local-scale x="1" y="1" z="1"/></offsets>
//!   <handles enabled="true" count="2">
//!     <handle parameter="0.25" angle="45"/>
//!   </handles>
//!   <ramp channel="scale" amplitude="0.5" random="0.1">
//!     <axis x="1" y="1" z="1"/>
//!     <point position="0" value="0" interpolation="smooth"/>
//!   </ramp>
//! </instancer>
//! ```
//!
//! Hoeken in presets staan in graden; ze worden bij het inlezen omgezet naar
//! radialen. De rotatieramp blijft in graden.

use std::num::ParseFloatError;

use quick_xml::de::from_str;
use serde::Deserialize;
use thiserror::Error;

use crate::geom::Vec3;
use crate::instancing::{
    DistributionMode, DynamicAmplitude, Handle, InstancerSettings, LocalAxis, OrientationMode,
    Ramp, RampChannel, RampInterpolation, RampPoint,
};

/// Result type voor het parsen van presets.
pub type PresetResult<T> = Result<T, PresetError>;

/// Beschrijft fouten tijdens het parsen van een preset.
#[derive(Debug, Error)]
pub enum PresetError {
    /// Het XML-document kon niet gede-serialiseerd worden.
    #[error("XML parsefout: {0}")]
    Xml(#[from] quick_xml::DeError),
    /// Het document heeft geen `<instancer>` root.
    #[error("onbekend presetformaat: geen <instancer> root gevonden")]
    MissingRoot,
    /// Een attribuut bevat een onbekende naam.
    #[error("onbekende waarde '{value}' voor {field}")]
    UnknownName { field: &'static str, value: String },
    /// Een `<ramp>` verwijst naar een onbekend kanaal.
    #[error("onbekend rampkanaal: {0}")]
    UnknownChannel(String),
    /// Fout tijdens het converteren van numerieke waarden.
    #[error("ongeldige numerieke waarde: {0}")]
    Number(#[from] ParseFloatError),
}

/// Leest een preset en legt die over de standaardinstellingen.
pub fn parse_str(input: &str) -> PresetResult<InstancerSettings> {
    let trimmed = strip_xml_preamble(input);
    let prefix = trimmed.chars().take(10).collect::<String>().to_lowercase();
    if !prefix.starts_with("<instancer") {
        return Err(PresetError::MissingRoot);
    }

    let document: PresetDocument = from_str(input)?;
    log::debug!(
        "Parsed preset with {} ramp(s), {} handle(s)",
        document.ramps.len(),
        document.handles.as_ref().map_or(0, |h| h.handles.len())
    );

    let mut settings = InstancerSettings::default();
    if let Some(instancing) = document.instancing {
        instancing.apply(&mut settings)?;
    }
    if let Some(orientation) = document.orientation {
        orientation.apply(&mut settings)?;
    }
    if let Some(offsets) = document.offsets {
        offsets.apply(&mut settings);
    }
    if let Some(handles) = document.handles {
        handles.apply(&mut settings);
    }
    for ramp in document.ramps {
        ramp.apply(&mut settings)?;
    }

    Ok(settings)
}

fn strip_xml_preamble(input: &str) -> &str {
    let trimmed = input.trim_start_matches(|c: char| c == '\u{feff}' || c.is_whitespace());
    if let Some(rest) = trimmed.strip_prefix("<?xml") {
        if let Some(idx) = rest.find("?>") {
            return rest[idx + 2..].trim_start();
        }
    }
    trimmed
}

fn lookup<T>(field: &'static str, value: &str, parse: impl Fn(&str) -> Option<T>) -> PresetResult<T> {
    parse(value).ok_or_else(|| PresetError::UnknownName {
        field,
        value: value.to_owned(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct PresetDocument {
    #[serde(default)]
    instancing: Option<InstancingElement>,
    #[serde(default)]
    orientation: Option<OrientationElement>,
    #[serde(default)]
    offsets: Option<OffsetsElement>,
    #[serde(default)]
    handles: Option<HandlesElement>,
    #[serde(default, rename = "ramp")]
    ramps: Vec<RampElement>,
}

#[derive(Debug, Default, Deserialize)]
struct VectorElement {
    #[serde(default, rename = "@x")]
    x: Option<f64>,
    #[serde(default, rename = "@y")]
    y: Option<f64>,
    #[serde(default, rename = "@z")]
    z: Option<f64>,
}

impl VectorElement {
    fn over(&self, base: Vec3) -> Vec3 {
        Vec3::new(
            self.x.unwrap_or(base.x),
            self.y.unwrap_or(base.y),
            self.z.unwrap_or(base.z),
        )
    }

    fn degrees_over(&self, base: Vec3) -> Vec3 {
        Vec3::new(
            self.x.map_or(base.x, f64::to_radians),
            self.y.map_or(base.y, f64::to_radians),
            self.z.map_or(base.z, f64::to_radians),
        )
    }
}

#[derive(Debug, Deserialize)]
struct InstancingElement {
    #[serde(default, rename = "@mode")]
    mode: Option<String>,
    #[serde(default, rename = "@count")]
    count: Option<usize>,
    #[serde(default, rename = "@spacing")]
    spacing: Option<f64>,
    #[serde(default, rename = "@max-count")]
    max_count: Option<usize>,
    #[serde(default, rename = "@start")]
    start: Option<f64>,
    #[serde(default, rename = "@end")]
    end: Option<f64>,
    #[serde(default, rename = "@offset")]
    offset: Option<f64>,
}

impl InstancingElement {
    fn apply(self, settings: &mut InstancerSettings) -> PresetResult<()> {
        let options = &mut settings.instancing;
        if let Some(mode) = self.mode {
            options.mode = lookup("instancing mode", &mode, DistributionMode::from_name)?;
        }
        options.count = self.count.unwrap_or(options.count);
        options.spacing = self.spacing.unwrap_or(options.spacing);
        options.max_count_by_spacing = self.max_count.unwrap_or(options.max_count_by_spacing);
        options.curve_start = self.start.unwrap_or(options.curve_start);
        options.curve_end = self.end.unwrap_or(options.curve_end);
        options.distance_offset = self.offset.unwrap_or(options.distance_offset);
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct OrientationElement {
    #[serde(default, rename = "@mode")]
    mode: Option<String>,
    #[serde(default, rename = "@local-axis")]
    local_axis: Option<String>,
    #[serde(default, rename = "local-rotation")]
    local_rotation: Option<VectorElement>,
    #[serde(default, rename = "global-rotation")]
    global_rotation: Option<VectorElement>,
}

impl OrientationElement {
    fn apply(self, settings: &mut InstancerSettings) -> PresetResult<()> {
        let options = &mut settings.orientation;
        if let Some(mode) = self.mode {
            options.mode = lookup("orientation mode", &mode, OrientationMode::from_name)?;
        }
        if let Some(axis) = self.local_axis {
            options.local_axis = lookup("local axis", &axis, LocalAxis::from_name)?;
        }
        if let Some(rotation) = self.local_rotation {
            options.local_rotation_offset = rotation.degrees_over(options.local_rotation_offset);
        }
        if let Some(rotation) = self.global_rotation {
            options.global_rotation_offset = rotation.degrees_over(options.global_rotation_offset);
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct OffsetsElement {
    #[serde(default, rename = "local-translation")]
    local_translation: Option<VectorElement>,
    #[serde(default, rename = "global-translation")]
    global_translation: Option<VectorElement>,
    #[serde(default, rename = "local-scale")]
    local_scale: Option<VectorElement>,
}

impl OffsetsElement {
    fn apply(self, settings: &mut InstancerSettings) {
        let offsets = &mut settings.offsets;
        if let Some(v) = self.local_translation {
            offsets.local_translation = v.over(offsets.local_translation);
        }
        if let Some(v) = self.global_translation {
            offsets.global_translation = v.over(offsets.global_translation);
        }
        if let Some(v) = self.local_scale {
            offsets.local_scale = v.over(offsets.local_scale);
        }
    }
}

#[derive(Debug, Deserialize)]
struct HandlesElement {
    #[serde(default, rename = "@enabled")]
    enabled: Option<bool>,
    #[serde(default, rename = "@count")]
    count: Option<usize>,
    #[serde(default, rename = "handle")]
    handles: Vec<HandleElement>,
}

impl HandlesElement {
    fn apply(self, settings: &mut InstancerSettings) {
        let track = &mut settings.handles;
        track.enabled = self.enabled.unwrap_or(true);
        track.count = self.count;
        track.handles = self
            .handles
            .into_iter()
            .map(|h| Handle::new(h.parameter, h.angle.to_radians()))
            .collect();
    }
}

#[derive(Debug, Deserialize)]
struct HandleElement {
    #[serde(rename = "@parameter")]
    parameter: f64,
    #[serde(rename = "@angle")]
    angle: f64,
}

#[derive(Debug, Deserialize)]
struct RampElement {
    #[serde(rename = "@channel")]
    channel: String,
    #[serde(default, rename = "@offset")]
    offset: Option<f64>,
    #[serde(default, rename = "@repeat")]
    repeat: Option<f64>,
    #[serde(default, rename = "@amplitude")]
    amplitude: Option<f64>,
    #[serde(default, rename = "@random")]
    random: Option<f64>,
    #[serde(default)]
    axis: Option<VectorElement>,
    #[serde(default, rename = "point")]
    points: Vec<RampPointElement>,
    #[serde(default)]
    amplitudes: Option<AmplitudesElement>,
}

impl RampElement {
    fn apply(self, settings: &mut InstancerSettings) -> PresetResult<()> {
        let channel: &mut RampChannel = match self.channel.trim().to_ascii_lowercase().as_str() {
            "position" => &mut settings.ramps.position,
            "rotation" => &mut settings.ramps.rotation,
            "scale" => &mut settings.ramps.scale,
            _ => return Err(PresetError::UnknownChannel(self.channel)),
        };

        channel.offset = self.offset.unwrap_or(channel.offset);
        channel.repeat = self.repeat.unwrap_or(channel.repeat);
        channel.amplitude = self.amplitude.unwrap_or(channel.amplitude);
        channel.random_amplitude = self.random.unwrap_or(channel.random_amplitude);
        if let Some(axis) = self.axis {
            channel.axis = axis.over(channel.axis);
        }

        if !self.points.is_empty() {
            let points = self
                .points
                .into_iter()
                .map(|p| -> PresetResult<RampPoint> {
                    let interpolation = match p.interpolation {
                        Some(name) => lookup("ramp interpolation", &name, RampInterpolation::from_name)?,
                        None => RampInterpolation::default(),
                    };
                    Ok(RampPoint::new(p.position, p.value, interpolation))
                })
                .collect::<PresetResult<Vec<_>>>()?;
            channel.ramp = Ramp::new(points);
        }

        if let Some(amplitudes) = self.amplitudes {
            let values = amplitudes
                .values
                .split(|c: char| c.is_whitespace() || c == ',')
                .filter(|token| !token.is_empty())
                .map(str::parse::<f64>)
                .collect::<Result<Vec<_>, _>>()?;
            channel.dynamic_amplitude = Some(DynamicAmplitude::Values(values));
        }

        Ok(())
    }
}

#[derive(Debug, Deserialize)]
struct RampPointElement {
    #[serde(rename = "@position")]
    position: f64,
    #[serde(rename = "@value")]
    value: f64,
    #[serde(default, rename = "@interpolation")]
    interpolation: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AmplitudesElement {
    #[serde(default, rename = "$text")]
    values: String,
}

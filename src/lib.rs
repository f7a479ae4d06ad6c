#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;
pub mod instancing;
pub mod parse;

use std::fmt;

use geom::{ArcLengthCurve, Circle3, CurveError, CurveQuery, Point3, Polyline3, Quat, Vec3};
use instancing::{InstancerSettings, InstancingResult, SourceSnapshot};
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

/// Public entry point for consumers.
///
/// Houdt een momentopname van curve, bronobject en instellingen bij. Elke
/// aanroep van [`Instancer::evaluate`] rekent alles opnieuw uit.
#[wasm_bindgen]
pub struct Instancer {
    curve: Option<Box<dyn CurveQuery>>,
    source: Option<SourceSnapshot>,
    settings: InstancerSettings,
}

#[wasm_bindgen]
impl Instancer {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Instancer {
        Instancer {
            curve: None,
            source: Some(SourceSnapshot::default()),
            settings: InstancerSettings::default(),
        }
    }

    /// Stel een polyline in als curve. `points` bevat x, y, z per punt.
    #[wasm_bindgen]
    pub fn set_polyline_curve(&mut self, points: &[f64], closed: bool) -> Result<(), JsValue> {
        let polyline = Polyline3::from_flat(points, closed).map_err(to_js_error)?;
        debug_log!(
            "polyline met {} punten ingesteld (gesloten: {closed})",
            polyline.points().len()
        );
        self.curve = Some(Box::new(ArcLengthCurve::new(polyline)));
        Ok(())
    }

    /// Stel een cirkel in als (gesloten) curve.
    #[wasm_bindgen]
    pub fn set_circle_curve(&mut self, center: &[f64], normal: &[f64], radius: f64) -> Result<(), JsValue> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(to_js_error(CurveError::InvalidRadius(radius)));
        }
        let center = vec3_from_slice(center, "middelpunt")?;
        let normal = vec3_from_slice(normal, "normaal")?;
        let circle = Circle3::new(Point3::new(center.x, center.y, center.z), normal, radius);
        self.curve = Some(Box::new(ArcLengthCurve::new(circle)));
        Ok(())
    }

    /// Verwijder de curve; evaluaties leveren daarna geen instanties op.
    #[wasm_bindgen]
    pub fn clear_curve(&mut self) {
        self.curve = None;
    }

    /// Stel de wereldrotatie (w, x, y, z) en het pivot van het bronobject in.
    #[wasm_bindgen]
    pub fn set_source(&mut self, rotation: &[f64], pivot: &[f64]) -> Result<(), JsValue> {
        let [w, x, y, z] = rotation else {
            return Err(js_error("rotatie moet precies vier waarden (w, x, y, z) bevatten"));
        };
        let rotation = Quat::new(*w, *x, *y, *z);
        if !rotation.norm().is_finite() {
            return Err(js_error("rotatie moet uit eindige getallen bestaan"));
        }
        let pivot = vec3_from_slice(pivot, "pivot")?;
        self.source = Some(SourceSnapshot {
            rotation: rotation.normalized(),
            pivot,
        });
        Ok(())
    }

    /// Verwijder het bronobject; evaluaties leveren daarna geen instanties op.
    #[wasm_bindgen]
    pub fn clear_source(&mut self) {
        self.source = None;
    }

    /// Laad instellingen uit een XML-preset.
    #[wasm_bindgen]
    pub fn load_preset(&mut self, xml: &str) -> Result<(), JsValue> {
        let settings = parse::preset_xml::parse_str(xml).map_err(to_js_error)?;
        debug_log!("preset geladen: {:?}", settings.instancing);
        self.settings = settings;
        Ok(())
    }

    /// Vervang de instellingen door een JS-object (camelCase velden).
    #[wasm_bindgen]
    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        let settings: InstancerSettings =
            serde_wasm_bindgen::from_value(settings).map_err(|err| JsError::new(&err.to_string()))?;
        self.settings = settings;
        Ok(())
    }

    /// Haal de huidige instellingen op.
    #[wasm_bindgen]
    pub fn get_settings(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.settings).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Evalueer alle instanties en geef resultaten plus diagnostiek terug.
    #[wasm_bindgen]
    pub fn evaluate(&self) -> Result<JsValue, JsValue> {
        let result = self.run();
        serde_wasm_bindgen::to_value(&result).map_err(|err| JsError::new(&err.to_string()).into())
    }
}

impl Default for Instancer {
    fn default() -> Self {
        Self::new()
    }
}

impl Instancer {
    fn run(&self) -> InstancingResult {
        instancing::evaluate(self.curve.as_deref(), &self.settings, self.source.as_ref())
    }
}

fn vec3_from_slice(values: &[f64], label: &str) -> Result<Vec3, JsValue> {
    match values {
        [x, y, z] if x.is_finite() && y.is_finite() && z.is_finite() => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(js_error(&format!("{label} moet drie eindige getallen bevatten"))),
    }
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

//! Filter parameters and filter-chain assembly.
//!
//! UI sliders run over `0..=100`; each [`FilterParam`] maps that range
//! linearly onto its own `eq` domain. [`FilterState`] is the snapshot the
//! render pipeline consumes, [`filter_chain`] turns it into ordered
//! filter-graph fragments and [`filter_args`] into the `-vf` argv tail.

use serde::{Deserialize, Serialize};

/// Slider range shared by all parameters.
pub const SLIDER_MIN: f64 = 0.0;
pub const SLIDER_MAX: f64 = 100.0;

/// Two slider values closer than this are considered equal.
const SLIDER_EPSILON: f64 = 1e-6;

/// Numeric `eq` parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterParam {
    Contrast,
    Brightness,
    Saturation,
    Gamma,
}

/// Domain bounds and neutral value of a parameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParamDomain {
    pub min: f64,
    pub max: f64,
    pub default: f64,
}

impl FilterParam {
    /// Order of the `key=value` pairs inside the `eq` fragment.
    pub const EQ_ORDER: [FilterParam; 4] = [
        FilterParam::Brightness,
        FilterParam::Contrast,
        FilterParam::Saturation,
        FilterParam::Gamma,
    ];

    pub fn all() -> &'static [FilterParam] {
        &[
            FilterParam::Contrast,
            FilterParam::Brightness,
            FilterParam::Saturation,
            FilterParam::Gamma,
        ]
    }

    /// `eq` option name
    pub fn key(self) -> &'static str {
        match self {
            FilterParam::Contrast => "contrast",
            FilterParam::Brightness => "brightness",
            FilterParam::Saturation => "saturation",
            FilterParam::Gamma => "gamma",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::all()
            .iter()
            .copied()
            .find(|p| p.key().eq_ignore_ascii_case(key))
    }

    pub fn domain(self) -> ParamDomain {
        match self {
            FilterParam::Contrast => ParamDomain { min: 0.5, max: 2.0, default: 1.0 },
            FilterParam::Brightness => ParamDomain { min: -0.2, max: 0.3, default: 0.0 },
            FilterParam::Saturation => ParamDomain { min: 0.0, max: 3.0, default: 1.0 },
            FilterParam::Gamma => ParamDomain { min: 0.6, max: 3.0, default: 1.0 },
        }
    }

    /// Map a domain value onto the slider range.
    pub fn to_slider(self, value: f64) -> f64 {
        let d = self.domain();
        (value - d.min) / (d.max - d.min) * SLIDER_MAX
    }

    /// Map a slider value onto the parameter's domain.
    pub fn to_domain(self, slider: f64) -> f64 {
        let d = self.domain();
        slider / SLIDER_MAX * (d.max - d.min) + d.min
    }

    pub fn default_slider(self) -> f64 {
        self.to_slider(self.domain().default)
    }

    fn index(self) -> usize {
        match self {
            FilterParam::Contrast => 0,
            FilterParam::Brightness => 1,
            FilterParam::Saturation => 2,
            FilterParam::Gamma => 3,
        }
    }
}

impl std::fmt::Display for FilterParam {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// User-editable filter settings.
///
/// Only changed through the setters below; the pipeline works on clones.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    /// Slider values indexed by `FilterParam::index`
    sliders: [f64; 4],
    custom_expression: String,
    lut3d_path: String,
}

impl Default for FilterState {
    fn default() -> Self {
        let mut sliders = [0.0; 4];
        for &param in FilterParam::all() {
            sliders[param.index()] = param.default_slider();
        }
        Self {
            sliders,
            custom_expression: String::new(),
            lut3d_path: String::new(),
        }
    }
}

impl FilterState {
    pub fn slider(&self, param: FilterParam) -> f64 {
        self.sliders[param.index()]
    }

    /// Domain value for the current slider position.
    pub fn value(&self, param: FilterParam) -> f64 {
        param.to_domain(self.slider(param))
    }

    /// Set a slider value, clamped to `0..=100`.
    pub fn set_slider(&mut self, param: FilterParam, slider: f64) {
        self.sliders[param.index()] = slider.clamp(SLIDER_MIN, SLIDER_MAX);
    }

    /// Set a parameter by domain value (clamped to the domain).
    pub fn set_value(&mut self, param: FilterParam, value: f64) {
        let d = param.domain();
        self.sliders[param.index()] = param.to_slider(value.clamp(d.min, d.max));
    }

    pub fn custom_expression(&self) -> &str {
        &self.custom_expression
    }

    pub fn lut3d_path(&self) -> &str {
        &self.lut3d_path
    }

    pub fn set_custom_expression(&mut self, expr: impl Into<String>) {
        self.custom_expression = expr.into();
    }

    pub fn set_lut3d_path(&mut self, path: impl Into<String>) {
        self.lut3d_path = path.into();
    }

    /// Restore all parameters to neutral and drop custom/LUT filters.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// True if any numeric parameter is away from its neutral value.
    pub fn has_eq_changes(&self) -> bool {
        FilterParam::all()
            .iter()
            .any(|&p| (self.slider(p) - p.default_slider()).abs() > SLIDER_EPSILON)
    }

    /// `eq=brightness=..:contrast=..:saturation=..:gamma=..`, or `None` when neutral.
    pub fn eq_fragment(&self) -> Option<String> {
        if !self.has_eq_changes() {
            return None;
        }
        let pairs: Vec<String> = FilterParam::EQ_ORDER
            .iter()
            .map(|&p| format!("{}={}", p.key(), format_eq_value(self.value(p))))
            .collect();
        Some(format!("eq={}", pairs.join(":")))
    }
}

/// Three decimals, without a `-0.000` artefact.
fn format_eq_value(value: f64) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    let rounded = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{rounded:.3}")
}

/// Ordered filter fragments: custom expression, `lut3d`, `eq`. Empty parts are omitted.
pub fn filter_chain(state: &FilterState) -> Vec<String> {
    let mut chain = Vec::with_capacity(3);

    let custom = state.custom_expression.trim();
    if !custom.is_empty() {
        chain.push(custom.to_string());
    }

    let lut = state.lut3d_path.trim();
    if !lut.is_empty() {
        chain.push(format!("lut3d={lut}"));
    }

    if let Some(eq) = state.eq_fragment() {
        chain.push(eq);
    }

    chain
}

/// `-vf <chain>` for a non-empty chain, nothing otherwise (ffmpeg rejects an empty `-vf`).
pub fn filter_args(state: &FilterState) -> Vec<String> {
    let chain = filter_chain(state);
    if chain.is_empty() {
        Vec::new()
    } else {
        vec!["-vf".to_string(), chain.join(", ")]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slider_domain_roundtrip() {
        for &param in FilterParam::all() {
            let mut v = 0.0;
            while v <= 100.0 {
                let back = param.to_slider(param.to_domain(v));
                assert!((back - v).abs() < 1e-3, "{param}: {v} -> {back}");
                v += 0.5;
            }
        }
    }

    #[test]
    fn test_domain_slider_roundtrip() {
        for &param in FilterParam::all() {
            let d = param.domain();
            for i in 0..=50 {
                let v = d.min + (d.max - d.min) * i as f64 / 50.0;
                let back = param.to_domain(param.to_slider(v));
                assert!((back - v).abs() < 1e-9, "{param}: {v} -> {back}");
            }
            let neutral = param.to_domain(param.default_slider());
            assert!((neutral - d.default).abs() < 1e-9, "{param}: neutral {neutral}");
        }
    }

    #[test]
    fn test_default_slider_positions() {
        assert!((FilterParam::Contrast.default_slider() - 100.0 / 3.0).abs() < 1e-9);
        assert!((FilterParam::Brightness.default_slider() - 40.0).abs() < 1e-9);
        assert!((FilterParam::Saturation.default_slider() - 100.0 / 3.0).abs() < 1e-9);
        assert!((FilterParam::Gamma.default_slider() - 100.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn test_default_state_has_empty_chain() {
        let state = FilterState::default();
        assert!(filter_chain(&state).is_empty());
        assert!(filter_args(&state).is_empty());
    }

    #[test]
    fn test_text_fields_read_back_through_getters() {
        let mut state = FilterState::default();
        assert_eq!(state.custom_expression(), "");
        state.set_custom_expression("negate");
        state.set_lut3d_path("/luts/a.cube");
        assert_eq!(state.custom_expression(), "negate");
        assert_eq!(state.lut3d_path(), "/luts/a.cube");
        state.reset();
        assert_eq!(state.lut3d_path(), "");
    }

    #[test]
    fn test_custom_expression_alone() {
        let mut state = FilterState::default();
        state.set_custom_expression("  eq=saturation=1.2 ");
        assert_eq!(filter_chain(&state), vec!["eq=saturation=1.2".to_string()]);
        assert_eq!(
            filter_args(&state),
            vec!["-vf".to_string(), "eq=saturation=1.2".to_string()]
        );
    }

    #[test]
    fn test_chain_order_custom_lut_eq() {
        let mut state = FilterState::default();
        state.set_slider(FilterParam::Contrast, 100.0);
        state.set_lut3d_path(" /luts/film.cube ");
        state.set_custom_expression("hflip");

        let chain = filter_chain(&state);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain[0], "hflip");
        assert_eq!(chain[1], "lut3d=/luts/film.cube");
        assert_eq!(
            chain[2],
            "eq=brightness=0.000:contrast=2.000:saturation=1.000:gamma=1.000"
        );
        assert_eq!(
            filter_args(&state)[1],
            "hflip, lut3d=/luts/film.cube, eq=brightness=0.000:contrast=2.000:saturation=1.000:gamma=1.000"
        );
    }

    #[test]
    fn test_whitespace_only_parts_are_omitted() {
        let mut state = FilterState::default();
        state.set_custom_expression("   ");
        state.set_lut3d_path("\t");
        assert!(filter_chain(&state).is_empty());
    }

    #[test]
    fn test_eq_emitted_only_when_changed() {
        let mut state = FilterState::default();
        assert!(state.eq_fragment().is_none());

        state.set_slider(FilterParam::Gamma, 0.0);
        assert_eq!(
            state.eq_fragment().as_deref(),
            Some("eq=brightness=0.000:contrast=1.000:saturation=1.000:gamma=0.600")
        );

        // Back to neutral: fragment disappears again
        state.set_value(FilterParam::Gamma, 1.0);
        assert!(state.eq_fragment().is_none());
    }

    #[test]
    fn test_brightness_values_rounded() {
        let mut state = FilterState::default();
        state.set_slider(FilterParam::Brightness, 0.0);
        let eq = state.eq_fragment().unwrap();
        assert!(eq.starts_with("eq=brightness=-0.200:"), "{eq}");

        state.set_slider(FilterParam::Brightness, 33.3333);
        let eq = state.eq_fragment().unwrap();
        assert!(eq.starts_with("eq=brightness=-0.033:"), "{eq}");
    }

    #[test]
    fn test_setters_clamp() {
        let mut state = FilterState::default();
        state.set_slider(FilterParam::Saturation, 150.0);
        assert_eq!(state.slider(FilterParam::Saturation), 100.0);
        state.set_value(FilterParam::Contrast, -5.0);
        assert_eq!(state.value(FilterParam::Contrast), 0.5);
    }

    #[test]
    fn test_reset_restores_defaults() {
        let mut state = FilterState::default();
        state.set_slider(FilterParam::Contrast, 80.0);
        state.set_custom_expression("negate");
        state.set_lut3d_path("a.cube");
        state.reset();
        assert_eq!(state, FilterState::default());
    }

    #[test]
    fn test_param_from_key() {
        assert_eq!(FilterParam::from_key("gamma"), Some(FilterParam::Gamma));
        assert_eq!(FilterParam::from_key("Contrast"), Some(FilterParam::Contrast));
        assert_eq!(FilterParam::from_key("hue"), None);
    }
}

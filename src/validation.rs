//! Validation System - Rule/Policy Separation
//!
//! Rules inspect print settings and produce structured violations.
//! Errors block an export at the input boundary, warnings are advisory.

use serde::{Deserialize, Serialize};

use crate::compositor::quiet_zone_px;
use crate::dimensions::CanvasLimits;
use crate::print::{PrintSettings, MAX_USER_DPI, MIN_USER_DPI};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ViolationSeverity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationViolation {
    pub rule: String,
    pub severity: ViolationSeverity,
    pub message: String,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub remediation: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    pub violations: Vec<ValidationViolation>,
    pub canvas: [u64; 2],
}

impl ValidationResult {
    pub fn has_errors(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Error)
    }

    pub fn has_warnings(&self) -> bool {
        self.violations.iter().any(|v| v.severity == ViolationSeverity::Warning)
    }
}

pub trait ValidationRule {
    fn name(&self) -> &'static str;
    fn validate(&self, settings: &PrintSettings) -> Vec<ValidationViolation>;
}

// --- Concrete Rules ---

pub struct DpiRangeRule;

impl ValidationRule for DpiRangeRule {
    fn name(&self) -> &'static str { "dpi_range" }

    fn validate(&self, settings: &PrintSettings) -> Vec<ValidationViolation> {
        if (MIN_USER_DPI..=MAX_USER_DPI).contains(&settings.dpi) {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "Resolution outside the supported range".to_string(),
            expected: Some(format!("{}-{} dpi", MIN_USER_DPI, MAX_USER_DPI)),
            actual: Some(format!("{} dpi", settings.dpi)),
            remediation: vec![format!(
                "Choose a resolution between {} and {} dpi",
                MIN_USER_DPI, MAX_USER_DPI
            )],
        }]
    }
}

pub struct PhysicalSizeRule;

impl ValidationRule for PhysicalSizeRule {
    fn name(&self) -> &'static str { "physical_size" }

    fn validate(&self, settings: &PrintSettings) -> Vec<ValidationViolation> {
        if settings.size.is_valid() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "Label size must be positive".to_string(),
            expected: Some("width and height > 0 cm".to_string()),
            actual: Some(format!("{}x{} cm", settings.size.width_cm, settings.size.height_cm)),
            remediation: vec!["Provide a finite, positive label size".to_string()],
        }]
    }
}

/// Catches canvases the rasterizer would refuse to allocate
pub struct CanvasBudgetRule {
    pub limits: CanvasLimits,
}

impl ValidationRule for CanvasBudgetRule {
    fn name(&self) -> &'static str { "canvas_budget" }

    fn validate(&self, settings: &PrintSettings) -> Vec<ValidationViolation> {
        if !settings.size.is_valid() || settings.dpi == 0 {
            return vec![];
        }
        let canvas = settings.canvas();
        if self.limits.check(canvas).is_some() {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Error,
            message: "Canvas exceeds raster limits".to_string(),
            expected: Some(format!(
                "sides <= {} px, area <= {} px",
                self.limits.max_side, self.limits.max_area
            )),
            actual: Some(format!("{}x{} px", canvas.width, canvas.height)),
            remediation: vec![
                "Lower the resolution".to_string(),
                "Reduce the label size".to_string(),
            ],
        }]
    }
}

pub struct QuietZoneRule;

impl ValidationRule for QuietZoneRule {
    fn name(&self) -> &'static str { "quiet_zone" }

    fn validate(&self, settings: &PrintSettings) -> Vec<ValidationViolation> {
        let canvas = settings.canvas();
        let (Ok(w), Ok(h)) = (u32::try_from(canvas.width), u32::try_from(canvas.height)) else {
            return vec![];
        };
        if w == 0 || h == 0 || quiet_zone_px(w, h) > 0 {
            return vec![];
        }
        vec![ValidationViolation {
            rule: self.name().to_string(),
            severity: ViolationSeverity::Warning,
            message: "Canvas too small for a quiet zone; symbol may not scan".to_string(),
            expected: Some("at least 13 px on the shorter side".to_string()),
            actual: Some(format!("{}x{} px", w, h)),
            remediation: vec!["Increase the resolution or label size".to_string()],
        }]
    }
}

/// Validator orchestrates rules and applies policy
pub struct Validator {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl Validator {
    pub fn new() -> Self {
        Self::with_limits(CanvasLimits::default())
    }

    pub fn with_limits(limits: CanvasLimits) -> Self {
        Self {
            rules: vec![
                Box::new(DpiRangeRule),
                Box::new(PhysicalSizeRule),
                Box::new(CanvasBudgetRule { limits }),
                Box::new(QuietZoneRule),
            ],
        }
    }

    pub fn validate(&self, settings: &PrintSettings) -> ValidationResult {
        let mut violations = vec![];
        for rule in &self.rules {
            violations.extend(rule.validate(settings));
        }

        let canvas = settings.canvas();
        let valid = !violations.iter().any(|v| v.severity == ViolationSeverity::Error);
        ValidationResult {
            valid,
            violations,
            canvas: [canvas.width, canvas.height],
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

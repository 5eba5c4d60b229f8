// Typed filter plan
//
// A plan is a linear chain of fragments from the primary video stream to a sink
// label. Fragments stay typed until `to_filter_complex`, which is the only place
// that knows ffmpeg's textual syntax and quoting rules.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{BotError, Result};
use crate::metadata::VideoDimensions;
use crate::settings::{Placement, TextSettings};
use super::positions::{self, adapt, AnchorExpr, ExprDialect};

/// Label produced by the text-draw fragment
pub const LABEL_TEXT: &str = "base";
/// Label produced by the watermark scale fragment
pub const LABEL_WATERMARK: &str = "wm";
/// Label produced by the overlay fragment
pub const LABEL_OVERLAY: &str = "v";

/// A stream reference inside the filter graph.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum StreamLabel {
    /// Video stream of the n-th `-i` input
    InputVideo(usize),
    /// Intermediate label defined by a fragment
    Named(String),
}

impl StreamLabel {
    pub fn named(name: &str) -> Self {
        Self::Named(name.to_string())
    }

    /// Form used inside a filtergraph: `[0:v]`, `[base]`
    pub fn graph_ref(&self) -> String {
        match self {
            Self::InputVideo(i) => format!("[{}:v]", i),
            Self::Named(name) => format!("[{}]", name),
        }
    }

    /// Form used with `-map`: `0:v`, `[base]`
    pub fn map_arg(&self) -> String {
        match self {
            Self::InputVideo(i) => format!("{}:v", i),
            Self::Named(name) => format!("[{}]", name),
        }
    }
}

impl fmt::Display for StreamLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.graph_ref())
    }
}

/// What a fragment does, with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    DrawText {
        font_file: PathBuf,
        /// Raw user text; escaped during serialization
        text: String,
        color: String,
        font_size: u32,
        x: String,
        y: String,
    },
    Scale {
        width: u32,
        height: u32,
    },
    Overlay {
        x: String,
        y: String,
    },
}

impl FilterKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::DrawText { .. } => "drawtext",
            Self::Scale { .. } => "scale",
            Self::Overlay { .. } => "overlay",
        }
    }

    fn to_filter_string(&self) -> String {
        match self {
            Self::DrawText { font_file, text, color, font_size, x, y } => format!(
                "drawtext=fontfile={font}:expansion=none:text='{text}':fontcolor={color}:fontsize={size}:x={x}:y={y}",
                font = font_file.to_string_lossy(),
                text = escape_drawtext(text),
                color = color,
                size = font_size,
                x = x,
                y = y,
            ),
            Self::Scale { width, height } => format!("scale={}:{}", width, height),
            Self::Overlay { x, y } => format!("overlay={}:{}", x, y),
        }
    }
}

/// One step of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterFragment {
    pub inputs: Vec<StreamLabel>,
    pub kind: FilterKind,
    pub output: StreamLabel,
}

impl FilterFragment {
    fn to_graph_string(&self) -> String {
        let inputs: String = self.inputs.iter().map(StreamLabel::graph_ref).collect();
        format!("{}{}{}", inputs, self.kind.to_filter_string(), self.output.graph_ref())
    }
}

/// Ordered fragments plus the label mapped to the output video.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterPlan {
    /// Number of `-i` inputs the plan may reference
    pub input_count: usize,
    pub fragments: Vec<FilterFragment>,
    pub sink: StreamLabel,
}

impl FilterPlan {
    /// Plan that maps the primary video stream straight through.
    pub fn passthrough(input_count: usize) -> Self {
        Self {
            input_count,
            fragments: Vec::new(),
            sink: StreamLabel::InputVideo(0),
        }
    }

    pub fn is_passthrough(&self) -> bool {
        self.fragments.is_empty()
    }

    /// Check that the plan is a single chain over labels it defines itself.
    ///
    /// Every input must be an existing `-i` stream or a label defined by an
    /// earlier fragment, and each may be consumed once. Every defined label
    /// other than the sink must be consumed.
    pub fn validate(&self) -> Result<()> {
        let mut defined: HashSet<&StreamLabel> = HashSet::new();
        let mut consumed: HashSet<&StreamLabel> = HashSet::new();

        for (i, fragment) in self.fragments.iter().enumerate() {
            for input in &fragment.inputs {
                match input {
                    StreamLabel::InputVideo(idx) if *idx >= self.input_count => {
                        return Err(plan_error(format!(
                            "fragment {} ({}) references input {} but only {} inputs exist",
                            i, fragment.kind.name(), idx, self.input_count
                        )));
                    }
                    StreamLabel::Named(_) if !defined.contains(input) => {
                        return Err(plan_error(format!(
                            "fragment {} ({}) references undefined label {}",
                            i, fragment.kind.name(), input
                        )));
                    }
                    _ => {}
                }
                if !consumed.insert(input) {
                    return Err(plan_error(format!(
                        "fragment {} ({}) consumes {} a second time",
                        i, fragment.kind.name(), input
                    )));
                }
            }

            match &fragment.output {
                StreamLabel::InputVideo(_) => {
                    return Err(plan_error(format!(
                        "fragment {} ({}) writes to an input stream",
                        i, fragment.kind.name()
                    )));
                }
                label if !defined.insert(label) => {
                    return Err(plan_error(format!(
                        "fragment {} ({}) redefines label {}",
                        i, fragment.kind.name(), label
                    )));
                }
                _ => {}
            }
        }

        match &self.sink {
            StreamLabel::InputVideo(0) if self.fragments.is_empty() => {}
            StreamLabel::InputVideo(_) => {
                return Err(plan_error(format!("sink {} is not the passthrough stream", self.sink)));
            }
            sink if !defined.contains(sink) => {
                return Err(plan_error(format!("sink {} is never defined", sink)));
            }
            sink if consumed.contains(sink) => {
                return Err(plan_error(format!("sink {} is consumed inside the graph", sink)));
            }
            _ => {}
        }

        let dangling: Vec<String> = defined
            .iter()
            .filter(|label| **label != &self.sink && !consumed.contains(*label))
            .map(|label| label.to_string())
            .collect();
        if !dangling.is_empty() {
            return Err(plan_error(format!("labels never consumed: {}", dangling.join(", "))));
        }

        Ok(())
    }

    /// Serialize fragments into a `-filter_complex` expression.
    /// None for a passthrough plan.
    pub fn to_filter_complex(&self) -> Option<String> {
        if self.fragments.is_empty() {
            return None;
        }
        let parts: Vec<String> = self.fragments.iter().map(FilterFragment::to_graph_string).collect();
        Some(parts.join(";"))
    }
}

fn plan_error(msg: String) -> BotError {
    BotError::FilterPlan(msg)
}

/// Escape text for a single-quoted drawtext value.
/// Backslashes are doubled first so a trailing `\` cannot swallow the closing quote.
pub fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Target watermark size: `scale_percent` of each video dimension, at least 1px.
pub fn watermark_size(dims: VideoDimensions, scale_percent: u32) -> (u32, u32) {
    let scale = |side: u32| -> u32 {
        let px = u64::from(side) * u64::from(scale_percent) / 100;
        u32::try_from(px).unwrap_or(u32::MAX).max(1)
    };
    (scale(dims.width), scale(dims.height))
}

/// Everything the builder needs for one job.
#[derive(Debug, Clone)]
pub struct PlanInputs<'a> {
    pub dimensions: VideoDimensions,
    pub placement: &'a Placement,
    pub text: &'a TextSettings,
    pub watermark_image: Option<&'a Path>,
    pub font_file: &'a Path,
}

impl PlanInputs<'_> {
    /// Number of `-i` inputs the job will pass to ffmpeg.
    pub fn input_count(&self) -> usize {
        if self.watermark_image.is_some() { 2 } else { 1 }
    }
}

/// Build the filter plan for a job.
pub fn build_plan(inputs: &PlanInputs<'_>) -> Result<FilterPlan> {
    let position = positions::position_for(inputs.placement.anchor);
    build_plan_at(inputs, position)
}

/// Build the filter plan with an explicit position expression pair.
pub fn build_plan_at(inputs: &PlanInputs<'_>, position: AnchorExpr) -> Result<FilterPlan> {
    let mut plan = FilterPlan::passthrough(inputs.input_count());
    let mut current = StreamLabel::InputVideo(0);

    if inputs.text.is_active() {
        let output = StreamLabel::named(LABEL_TEXT);
        plan.fragments.push(FilterFragment {
            inputs: vec![current],
            kind: FilterKind::DrawText {
                font_file: inputs.font_file.to_path_buf(),
                text: inputs.text.text.clone(),
                color: inputs.text.color.clone(),
                font_size: inputs.text.font_size,
                x: adapt(position.x, ExprDialect::DrawText),
                y: adapt(position.y_or_default(), ExprDialect::DrawText),
            },
            output: output.clone(),
        });
        current = output;
    }

    if inputs.watermark_image.is_some() {
        let (width, height) = watermark_size(inputs.dimensions, inputs.placement.scale_percent);
        let wm = StreamLabel::named(LABEL_WATERMARK);
        plan.fragments.push(FilterFragment {
            inputs: vec![StreamLabel::InputVideo(1)],
            kind: FilterKind::Scale { width, height },
            output: wm.clone(),
        });

        let output = StreamLabel::named(LABEL_OVERLAY);
        plan.fragments.push(FilterFragment {
            inputs: vec![current, wm],
            kind: FilterKind::Overlay {
                x: adapt(position.x, ExprDialect::Overlay),
                y: adapt(position.y_or_default(), ExprDialect::Overlay),
            },
            output: output.clone(),
        });
        current = output;
    }

    plan.sink = current;
    plan.validate()?;
    Ok(plan)
}

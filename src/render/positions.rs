// Anchor position table
//
// Expressions are written with a neutral vocabulary:
//   w, h            size of the thing being placed (text box or scaled image)
//   main_w, main_h  size of the base video
// `adapt` rewrites them for the filter that consumes them.

use crate::constants::FALLBACK_Y_EXPR;
use crate::settings::Anchor;

/// x/y placement expressions for one anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnchorExpr {
    pub x: &'static str,
    pub y: Option<&'static str>,
}

impl AnchorExpr {
    /// y expression, or a fixed offset from the top when none is given.
    pub fn y_or_default(&self) -> &'static str {
        self.y.unwrap_or(FALLBACK_Y_EXPR)
    }
}

/// Which filter an expression is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExprDialect {
    /// drawtext: own size is text_w/text_h, w/h mean the video
    DrawText,
    /// overlay: own size is w/h (overlay_w/overlay_h), base is main_w/main_h
    Overlay,
}

const fn expr(x: &'static str, y: &'static str) -> AnchorExpr {
    AnchorExpr { x, y: Some(y) }
}

/// Position for an anchor.
pub fn position_for(anchor: Anchor) -> AnchorExpr {
    match anchor {
        Anchor::TopLeft => expr("10", "10"),
        Anchor::TopCenter => expr("(main_w-w)/2", "10"),
        Anchor::TopRight => expr("main_w-w-10", "10"),
        Anchor::MiddleLeft => expr("10", "(main_h-h)/2"),
        Anchor::MiddleCenter => expr("(main_w-w)/2", "(main_h-h)/2"),
        Anchor::MiddleRight => expr("main_w-w-10", "(main_h-h)/2"),
        Anchor::BottomLeft => expr("10", "main_h-h-10"),
        Anchor::BottomCenter => expr("(main_w-w)/2", "main_h-h-10"),
        Anchor::BottomRight => expr("main_w-w-10", "main_h-h-10"),
    }
}

/// Rename the own-size variables for the target filter.
/// Only whole identifiers are rewritten, so `main_w` is left alone.
pub fn adapt(expr: &str, dialect: ExprDialect) -> String {
    let (own_w, own_h) = match dialect {
        ExprDialect::DrawText => ("text_w", "text_h"),
        ExprDialect::Overlay => return expr.to_string(),
    };

    let mut out = String::with_capacity(expr.len() + 8);
    let mut ident = String::new();

    let flush = |ident: &mut String, out: &mut String| {
        match ident.as_str() {
            "w" => out.push_str(own_w),
            "h" => out.push_str(own_h),
            other => out.push_str(other),
        }
        ident.clear();
    };

    for c in expr.chars() {
        if c.is_ascii_alphanumeric() || c == '_' {
            ident.push(c);
        } else {
            flush(&mut ident, &mut out);
            out.push(c);
        }
    }
    flush(&mut ident, &mut out);

    out
}

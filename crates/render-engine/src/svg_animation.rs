//! CSS reveal animation embedded into rendered SVGs.
//!
//! Nodes fade in one after another, edges draw in once every node is
//! visible, and dotted (optional) integrations keep pulsing afterwards.
//! Timings derive from the reveal script so a longer script staggers
//! further.

use wfgen_artifact_model::reveal::RevealScript;
use wfgen_common::error::{WfgenError, WfgenResult};

use crate::static_render::VECTOR_STAGE;

const NODE_FADE_MS: u32 = 800;
const NODE_STAGGER_MS: u32 = 300;
const EDGE_DRAW_MS: u32 = 1500;
const OPTIONAL_EDGE_OFFSET_MS: u32 = 400;
const PULSE_MS: u32 = 2000;
const CLUSTER_FADE_MS: u32 = 500;
const CLUSTER_STAGGER_MS: u32 = 200;
const CLUSTER_LABELS: u32 = 4;

fn css_secs(ms: u32) -> String {
    format!("{}s", f64::from(ms) / 1000.0)
}

/// Build the `<style>` block for `script`.
pub fn animation_styles(script: &RevealScript) -> String {
    let node_count = script.distinct_nodes().len().max(1) as u32;
    let edge_delay = node_count * NODE_STAGGER_MS;
    let optional_delay = edge_delay + OPTIONAL_EDGE_OFFSET_MS;

    let mut css = String::from("\n  <style>\n");

    css.push_str(&format!(
        "    .node {{\n      opacity: 0;\n      animation: fadeIn {} ease-out forwards;\n    }}\n\n",
        css_secs(NODE_FADE_MS)
    ));
    for i in 0..node_count {
        css.push_str(&format!(
            "    .node:nth-of-type({}) {{ animation-delay: {}; }}\n",
            i + 1,
            css_secs(i * NODE_STAGGER_MS)
        ));
    }

    css.push_str(&format!(
        "\n    .edgePath path {{\n      stroke-dasharray: 1000;\n      stroke-dashoffset: 1000;\n      \
         animation: drawLine {} ease-out forwards;\n      animation-delay: {};\n    }}\n",
        css_secs(EDGE_DRAW_MS),
        css_secs(edge_delay)
    ));

    let mut sources: Vec<&str> = Vec::new();
    for (from, _) in script.optional_edges() {
        if !sources.contains(&from) {
            sources.push(from);
        }
    }
    if !sources.is_empty() {
        let selectors = sources
            .iter()
            .map(|from| format!("    .edgePath.LS-{from} path"))
            .collect::<Vec<_>>()
            .join(",\n");
        css.push_str(&format!(
            "\n{selectors} {{\n      animation: drawLine {} ease-out forwards, pulse {} ease-in-out infinite;\n      \
             animation-delay: {}, {};\n    }}\n",
            css_secs(EDGE_DRAW_MS),
            css_secs(PULSE_MS),
            css_secs(optional_delay),
            css_secs(optional_delay + EDGE_DRAW_MS)
        ));
    }

    css.push_str(
        "
    @keyframes fadeIn {
      from {
        opacity: 0;
        transform: translateY(10px);
      }
      to {
        opacity: 1;
        transform: translateY(0);
      }
    }

    @keyframes drawLine {
      to {
        stroke-dashoffset: 0;
      }
    }

    @keyframes pulse {
      0%, 100% {
        opacity: 1;
      }
      50% {
        opacity: 0.6;
      }
    }
",
    );

    css.push_str(&format!(
        "\n    .cluster-label {{\n      opacity: 0;\n      animation: fadeIn {} ease-out forwards;\n    }}\n\n",
        css_secs(CLUSTER_FADE_MS)
    ));
    for i in 0..CLUSTER_LABELS {
        css.push_str(&format!(
            "    .cluster-label:nth-of-type({}) {{ animation-delay: {}; }}\n",
            i + 1,
            css_secs(i * CLUSTER_STAGGER_MS)
        ));
    }

    css.push_str("  </style>");
    css
}

/// Insert the animation styles immediately after the opening `<svg ...>` tag.
///
/// Fails when the document has no `<svg` element.
pub fn inject_animation(svg: &str, script: &RevealScript) -> WfgenResult<String> {
    let tag_end = opening_tag_end(svg).ok_or_else(|| {
        WfgenError::stage(VECTOR_STAGE, "rendered output has no opening <svg> tag")
    })?;

    let styles = animation_styles(script);
    let mut out = String::with_capacity(svg.len() + styles.len());
    out.push_str(&svg[..tag_end]);
    out.push_str(&styles);
    out.push_str(&svg[tag_end..]);
    Ok(out)
}

/// Byte offset just past the `>` closing the first `<svg` tag.
fn opening_tag_end(svg: &str) -> Option<usize> {
    let mut offset = 0;
    while let Some(found) = svg[offset..].find("<svg") {
        let start = offset + found;
        let after = start + "<svg".len();
        match svg[after..].chars().next() {
            Some(c) if c.is_whitespace() || c == '>' => {
                return svg[after..].find('>').map(|end| after + end + 1);
            }
            _ => offset = after,
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use wfgen_artifact_model::reveal::RevealStep;

    const RENDERED: &str =
        r#"<svg id="my-svg" width="100%" xmlns="http://www.w3.org/2000/svg"><g class="node"></g></svg>"#;

    #[test]
    fn test_styles_follow_opening_tag() {
        let out = inject_animation(RENDERED, &RevealScript::default_workflow()).unwrap();
        let tag = r#"<svg id="my-svg" width="100%" xmlns="http://www.w3.org/2000/svg">"#;
        assert!(out.starts_with(tag));
        assert!(out[tag.len()..].trim_start().starts_with("<style>"));
        assert!(out.ends_with(r#"</style><g class="node"></g></svg>"#));
    }

    #[test]
    fn test_default_script_timings() {
        let css = animation_styles(&RevealScript::default_workflow());
        assert!(css.contains(".node:nth-of-type(1) { animation-delay: 0s; }"));
        assert!(css.contains(".node:nth-of-type(6) { animation-delay: 1.5s; }"));
        assert!(!css.contains("nth-of-type(7)"));
        assert!(css.contains("animation-delay: 1.8s;"));
        assert!(css.contains(".edgePath.LS-MCP path,\n    .edgePath.LS-D path {"));
        assert!(css.contains("animation-delay: 2.2s, 3.7s;"));
        assert!(css.contains("@keyframes fadeIn"));
        assert!(css.contains("@keyframes drawLine"));
        assert!(css.contains("@keyframes pulse"));
        assert!(css.contains(".cluster-label:nth-of-type(4) { animation-delay: 0.6s; }"));
    }

    #[test]
    fn test_delay_rules_sit_on_their_own_lines() {
        let css = animation_styles(&RevealScript::default_workflow());
        let node_rules = css
            .lines()
            .filter(|l| l.trim_start().starts_with(".node:nth-of-type("))
            .count();
        assert_eq!(node_rules, 6);
        let cluster_rules = css
            .lines()
            .filter(|l| l.trim_start().starts_with(".cluster-label:nth-of-type("))
            .count();
        assert_eq!(cluster_rules, 4);
        assert!(css.starts_with("\n  <style>\n    .node {"));
        assert!(css.ends_with("animation-delay: 0.6s; }\n  </style>"));
    }

    #[test]
    fn test_no_pulse_without_optional_edges() {
        let script = RevealScript::new(vec![RevealStep::new(["A", "B"], ["A-->B"])]).unwrap();
        let css = animation_styles(&script);
        assert!(!css.contains(".edgePath.LS-"));
        assert!(css.contains("animation-delay: 0.6s;"));
    }

    #[test]
    fn test_missing_svg_tag_is_error() {
        let err = inject_animation("<html></html>", &RevealScript::default_workflow()).unwrap_err();
        assert!(matches!(err, WfgenError::StageProduction { .. }));
    }

    #[test]
    fn test_skips_lookalike_tags() {
        let doc = "<?xml version=\"1.0\"?><svgdoc/><svg viewBox=\"0 0 1 1\"></svg>";
        let end = opening_tag_end(doc).unwrap();
        assert_eq!(&doc[..end], "<?xml version=\"1.0\"?><svgdoc/><svg viewBox=\"0 0 1 1\">");
    }

    #[test]
    fn test_only_first_svg_tag_is_touched() {
        let nested = "<svg><svg></svg></svg>";
        let out = inject_animation(nested, &RevealScript::default_workflow()).unwrap();
        assert_eq!(out.matches("<style>").count(), 1);
        assert!(out.ends_with("</style><svg></svg></svg>"));
    }
}

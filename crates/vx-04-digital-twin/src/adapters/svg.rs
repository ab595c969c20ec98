//! Top-down SVG view of the twin.
//!
//! Vehicles are drawn as labelled circles and links as translucent red
//! lines, with world y pointing up.

use shared_types::{ImageSize, WorldBounds, WorldPoint};
use std::collections::HashMap;

use crate::domain::TwinSnapshot;

const VEHICLE_RADIUS_PX: f64 = 4.0;

struct Viewport {
    bounds: WorldBounds,
    size: ImageSize,
}

impl Viewport {
    fn to_screen(&self, p: &WorldPoint) -> (f64, f64) {
        let nx = (p.x - self.bounds.xmin) / self.bounds.width();
        let ny = (p.y - self.bounds.ymin) / self.bounds.height();
        (nx * self.size.max_x(), (1.0 - ny) * self.size.max_y())
    }
}

/// Render a snapshot; `bounds` must be valid.
pub fn render_svg(snapshot: &TwinSnapshot, bounds: &WorldBounds, size: ImageSize) -> String {
    let view = Viewport {
        bounds: *bounds,
        size,
    };
    let mut svg = String::with_capacity(256 + snapshot.nodes.len() * 160);

    svg.push_str(&format!(
        "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{w}\" height=\"{h}\" viewBox=\"0 0 {w} {h}\">\n",
        w = size.width,
        h = size.height
    ));
    svg.push_str("<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n");
    svg.push_str(&format!(
        "<text x=\"8\" y=\"18\" font-family=\"sans-serif\" font-size=\"14\">Live V2X Digital Twin, step {} ({} vehicles, {} links)</text>\n",
        snapshot.step,
        snapshot.nodes.len(),
        snapshot.links.len()
    ));

    let positions: HashMap<_, _> = snapshot
        .nodes
        .iter()
        .map(|n| (&n.id, view.to_screen(&n.position)))
        .collect();

    svg.push_str("<g stroke=\"red\" stroke-opacity=\"0.3\" stroke-width=\"1\">\n");
    for link in &snapshot.links {
        let (Some(&(x1, y1)), Some(&(x2, y2))) = (positions.get(&link.a), positions.get(&link.b))
        else {
            continue;
        };
        svg.push_str(&format!(
            "<line x1=\"{x1:.1}\" y1=\"{y1:.1}\" x2=\"{x2:.1}\" y2=\"{y2:.1}\"/>\n"
        ));
    }
    svg.push_str("</g>\n");

    svg.push_str("<g font-family=\"sans-serif\" font-size=\"7\">\n");
    for node in &snapshot.nodes {
        let (x, y) = view.to_screen(&node.position);
        svg.push_str(&format!(
            "<circle cx=\"{x:.1}\" cy=\"{y:.1}\" r=\"{VEHICLE_RADIUS_PX}\" fill=\"blue\"/><text x=\"{tx:.1}\" y=\"{y:.1}\">{label}</text>\n",
            tx = x + VEHICLE_RADIUS_PX + 1.0,
            label = escape(node.id.as_str())
        ));
    }
    svg.push_str("</g>\n</svg>\n");
    svg
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

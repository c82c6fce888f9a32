//! DrawingML image extraction.
//!
//! A `drawing` element wraps either an `inline` or an `anchor` container.
//! Both carry an extent in EMU, a `docPr` with alt text, and a `blip`
//! whose `embed` relationship points at the image part. An unresolvable
//! embed drops the drawing with one warning rather than failing the
//! parse.

use super::package::Package;
use super::units::{angle_units_to_degrees, crop_fraction, emu_to_px};
use super::xml::XmlElement;
use crate::ast::{CropRect, Image, ImagePosition, PositionMode, Resource, ResourceKind, WrapMode};
use crate::parser::ParseReport;

/// Extract an image from a `drawing` element. Returns the image and the
/// resource entry for its package part, or `None` when the drawing is
/// not a resolvable picture.
pub fn parse_drawing(
    drawing: &XmlElement,
    package: &Package,
    report: &mut ParseReport,
) -> Option<(Image, Resource)> {
    let (container, mode) = if let Some(inline) = drawing.child("inline") {
        (inline, PositionMode::Inline)
    } else if let Some(anchor) = drawing.child("anchor") {
        (anchor, PositionMode::Anchor)
    } else {
        return None;
    };

    let blip = container.first_descendant("blip")?;
    let Some(embed_id) = blip.attr("embed").or_else(|| blip.attr("link")) else {
        report.add_warning("drawing has a blip with no embed relationship, dropped".to_string());
        return None;
    };
    let Some(rel) = package.relationship(embed_id) else {
        report.add_warning(format!(
            "drawing references unknown relationship {embed_id}, dropped"
        ));
        return None;
    };

    let mut image = Image::new(rel.target.clone());

    if let Some(extent) = container.child("extent") {
        image.width = attr_i64(extent, "cx").map(emu_to_px);
        image.height = attr_i64(extent, "cy").map(emu_to_px);
    }

    if let Some(doc_pr) = container.child("docPr") {
        let alt = doc_pr
            .attr("descr")
            .filter(|d| !d.is_empty())
            .or_else(|| doc_pr.attr("name").filter(|n| !n.is_empty()));
        image.alt = alt.map(str::to_string);
    }

    if let Some(src_rect) = container.first_descendant("srcRect") {
        let crop = CropRect {
            left: attr_i64(src_rect, "l").map(crop_fraction).unwrap_or(0.0),
            top: attr_i64(src_rect, "t").map(crop_fraction).unwrap_or(0.0),
            right: attr_i64(src_rect, "r").map(crop_fraction).unwrap_or(0.0),
            bottom: attr_i64(src_rect, "b").map(crop_fraction).unwrap_or(0.0),
        };
        if crop != CropRect::default() {
            image.crop = Some(crop);
        }
    }

    if let Some(xfrm) = container.first_descendant("xfrm") {
        image.rotation = attr_i64(xfrm, "rot")
            .map(angle_units_to_degrees)
            .filter(|deg| *deg != 0.0);
    }

    image.position = Some(match mode {
        PositionMode::Inline => ImagePosition {
            mode,
            ..ImagePosition::default()
        },
        PositionMode::Anchor => anchor_position(container),
    });

    let resource = Resource {
        id: rel.id.clone(),
        path: rel.target.clone(),
        kind: ResourceKind::Image,
        content_type: content_type_for(&rel.target),
    };
    Some((image, resource))
}

fn anchor_position(anchor: &XmlElement) -> ImagePosition {
    let offset = |name: &str| {
        anchor
            .child(name)
            .and_then(|pos| pos.child("posOffset"))
            .and_then(|off| off.text().trim().parse::<i64>().ok())
            .map(emu_to_px)
    };
    let wrap = if anchor.child("wrapSquare").is_some() {
        Some(WrapMode::Square)
    } else if anchor.child("wrapTight").is_some() {
        Some(WrapMode::Tight)
    } else if anchor.child("wrapTopAndBottom").is_some() {
        Some(WrapMode::TopAndBottom)
    } else if anchor.child("wrapNone").is_some() {
        Some(WrapMode::None)
    } else {
        None
    };
    ImagePosition {
        mode: PositionMode::Anchor,
        offset_x: offset("positionH"),
        offset_y: offset("positionV"),
        wrap,
        behind_text: attr_flag(anchor, "behindDoc"),
        allow_overlap: attr_flag(anchor, "allowOverlap"),
    }
}

fn attr_i64(element: &XmlElement, name: &str) -> Option<i64> {
    element.attr(name).and_then(|v| v.parse().ok())
}

fn attr_flag(element: &XmlElement, name: &str) -> bool {
    matches!(element.attr(name), Some("1") | Some("true"))
}

fn content_type_for(path: &str) -> Option<String> {
    let ext = path.rsplit('.').next()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "svg" => "image/svg+xml",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => return None,
    };
    Some(mime.to_string())
}

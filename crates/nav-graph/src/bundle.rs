//! Shapefile bundle decoding.
//!
//! A bundle is either a loose `.shp` geometry file (no attribute table:
//! degraded mode, every attribute defaults) or a `.zip` archive holding the
//! geometry member plus an optional same-base-name `.dbf` attribute member.
//! `.shx` index members are ignored: records are read sequentially, so the
//! offset index adds nothing.
//!
//! Geometry mapping:
//! - polyline features yield their **first** sub-line as the segment path
//!   (multi-part geometries are collapsed, a documented data-loss point);
//! - point features yield a single coordinate for POI node construction;
//! - all other shape kinds are skipped with a warning, never aborting the
//!   run.
//!
//! Shapefile axis order is `(x, y)` = `(lon, lat)`; everything downstream
//! uses `GeoPoint { lat, lon }`.

use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::Path;

use shapefile::dbase::{self, FieldValue};
use shapefile::{Shape, ShapeReader};
use zip::ZipArchive;

use nav_core::{GeoPoint, NavError, NavResult};

use crate::attrs::{AttrValue, Attributes};
use crate::builder::{Feature, FeatureGeometry};

// ── Public entry point ────────────────────────────────────────────────────────

/// Decode a bundle into the feature list the builder consumes.
///
/// # Errors
///
/// - [`NavError::InvalidData`] for an unsupported file type, an archive with
///   no `.shp` member, or undecodable geometry/attribute bytes.
/// - [`NavError::Io`] when the bundle itself cannot be opened.
pub fn read_bundle(path: &Path) -> NavResult<Vec<Feature>> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    match ext.as_deref() {
        Some("shp") => read_loose_geometry(path),
        Some("zip") => read_archive(path),
        _ => Err(NavError::InvalidData(format!(
            "unsupported file type: {} (expected .shp or .zip)",
            path.display()
        ))),
    }
}

// ── Loose geometry file (degraded mode) ───────────────────────────────────────

fn read_loose_geometry(path: &Path) -> NavResult<Vec<Feature>> {
    let file = File::open(path)?;
    let shapes = read_shapes(BufReader::new(file), &path.display().to_string())?;

    log::info!(
        "loaded {} features from {} without an attribute table (degraded mode)",
        shapes.len(),
        path.display()
    );
    Ok(assemble(shapes, None))
}

// ── Zip bundle ────────────────────────────────────────────────────────────────

fn read_archive(path: &Path) -> NavResult<Vec<Feature>> {
    let file = File::open(path)?;
    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(|e| {
        NavError::InvalidData(format!("invalid zip archive {}: {e}", path.display()))
    })?;

    let names: Vec<String> = archive.file_names().map(str::to_owned).collect();

    let shp_name = names
        .iter()
        .find(|n| has_extension(n, "shp"))
        .cloned()
        .ok_or_else(|| {
            NavError::InvalidData(format!(
                "archive {} contains no geometry (.shp) member",
                path.display()
            ))
        })?;

    let dbf_name = names
        .iter()
        .find(|n| {
            has_extension(n, "dbf") && base_name(n).eq_ignore_ascii_case(base_name(&shp_name))
        })
        .cloned();

    let shp_bytes = read_member(&mut archive, &shp_name)?;
    let shapes = read_shapes(Cursor::new(shp_bytes), &shp_name)?;

    let records = match &dbf_name {
        Some(name) => {
            let bytes = read_member(&mut archive, name)?;
            let records = dbase::Reader::new(Cursor::new(bytes))
                .map_err(|e| {
                    NavError::InvalidData(format!("undecodable attribute member {name}: {e}"))
                })?
                .read()
                .map_err(|e| {
                    NavError::InvalidData(format!("undecodable attribute member {name}: {e}"))
                })?;
            Some(records)
        }
        None => None,
    };

    log::info!(
        "loaded {} features from {} (geometry {}, attributes {})",
        shapes.len(),
        path.display(),
        shp_name,
        dbf_name.as_deref().unwrap_or("absent (degraded mode)"),
    );
    Ok(assemble(shapes, records))
}

fn read_member<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> NavResult<Vec<u8>> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| NavError::InvalidData(format!("unreadable archive member {name}: {e}")))?;
    let mut buf = Vec::with_capacity(entry.size() as usize);
    entry.read_to_end(&mut buf)?;
    Ok(buf)
}

fn has_extension(name: &str, ext: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// Member name without its final extension, for same-base matching.
fn base_name(name: &str) -> &str {
    name.rsplit_once('.').map_or(name, |(base, _)| base)
}

// ── Shape and record conversion ───────────────────────────────────────────────

fn read_shapes<R: Read + Seek>(source: R, label: &str) -> NavResult<Vec<Shape>> {
    ShapeReader::new(source)
        .map_err(|e| NavError::InvalidData(format!("undecodable geometry {label}: {e}")))?
        .read()
        .map_err(|e| NavError::InvalidData(format!("undecodable geometry {label}: {e}")))
}

/// Pair each shape with its attribute record (records run parallel to
/// shapes in a bundle).  Shapes with unsupported geometry are dropped, but
/// their record is still consumed so later features stay aligned.
fn assemble(shapes: Vec<Shape>, records: Option<Vec<dbase::Record>>) -> Vec<Feature> {
    let mut records = records.map(Vec::into_iter);
    let mut features = Vec::with_capacity(shapes.len());

    for shape in shapes {
        let attrs = match records.as_mut().and_then(Iterator::next) {
            Some(record) => convert_record(record),
            None => Attributes::empty(),
        };
        match shape_geometry(shape) {
            Some(geometry) => features.push(Feature { geometry, attrs }),
            None => log::warn!("skipping feature with unsupported geometry kind"),
        }
    }
    features
}

fn convert_record(record: dbase::Record) -> Attributes {
    record
        .into_iter()
        .filter_map(|(name, value)| convert_field(value).map(|v| (name, v)))
        .collect()
}

fn convert_field(value: FieldValue) -> Option<AttrValue> {
    match value {
        FieldValue::Character(Some(s)) => Some(AttrValue::Text(s)),
        FieldValue::Memo(s) => Some(AttrValue::Text(s)),
        FieldValue::Numeric(Some(n)) => Some(AttrValue::Number(n)),
        FieldValue::Float(Some(f)) => Some(AttrValue::Number(f64::from(f))),
        FieldValue::Integer(i) => Some(AttrValue::Number(f64::from(i))),
        FieldValue::Double(d) => Some(AttrValue::Number(d)),
        FieldValue::Currency(c) => Some(AttrValue::Number(c)),
        FieldValue::Logical(Some(b)) => Some(AttrValue::Flag(b)),
        _ => None,
    }
}

pub(crate) fn shape_geometry(shape: Shape) -> Option<FeatureGeometry> {
    match shape {
        Shape::Polyline(line) => {
            note_dropped_parts(line.parts().len());
            line.parts()
                .first()
                .map(|part| line_path(part.iter().map(|p| GeoPoint::new(p.y, p.x))))
        }
        Shape::PolylineM(line) => {
            note_dropped_parts(line.parts().len());
            line.parts()
                .first()
                .map(|part| line_path(part.iter().map(|p| GeoPoint::new(p.y, p.x))))
        }
        Shape::PolylineZ(line) => {
            note_dropped_parts(line.parts().len());
            line.parts()
                .first()
                .map(|part| line_path(part.iter().map(|p| GeoPoint::with_alt(p.y, p.x, p.z))))
        }
        Shape::Point(p) => Some(FeatureGeometry::Point(GeoPoint::new(p.y, p.x))),
        Shape::PointM(p) => Some(FeatureGeometry::Point(GeoPoint::new(p.y, p.x))),
        Shape::PointZ(p) => Some(FeatureGeometry::Point(GeoPoint::with_alt(p.y, p.x, p.z))),
        _ => None,
    }
}

fn line_path(points: impl Iterator<Item = GeoPoint>) -> FeatureGeometry {
    FeatureGeometry::Line(points.collect())
}

fn note_dropped_parts(parts: usize) {
    if parts > 1 {
        log::debug!(
            "multi-part polyline collapsed to its first sub-line ({} parts dropped)",
            parts - 1
        );
    }
}

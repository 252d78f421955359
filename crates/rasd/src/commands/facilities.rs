//! Facility command handlers.
//!
//! Every invocation restores the stored facilities onto a headless map
//! surface, applies one operation, and lets the store persist the result.

use std::fmt::Write as _;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tabled::Tabled;

use rasd_core::model::format_area;
use rasd_core::{
    DrawingModeController, DrawingOutcome, Facility, FacilityManager, FacilityStore,
    HeadlessSurface, LatLng, MapEvent, MapOutcome,
};

use crate::cli::{FacilitiesArgs, FacilitiesCommand, GlobalOpts, ShapeKind};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::notify::TerminalNotifier;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct FacilityRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    kind: String,
    #[tabled(rename = "Area")]
    area: String,
    #[tabled(rename = "Perimeter")]
    perimeter: String,
    #[tabled(rename = "Center")]
    center: String,
}

impl From<&Facility> for FacilityRow {
    fn from(f: &Facility) -> Self {
        Self {
            id: f.id.to_string(),
            name: f.name.clone(),
            kind: f.kind.to_string(),
            area: format_area(f.area()),
            perimeter: format!("{:.1} m", f.perimeter()),
            center: f.center().to_string(),
        }
    }
}

fn detail(f: &Facility) -> String {
    let mut out = String::new();
    let dims = f.dimensions();
    let _ = writeln!(out, "ID:          {}", f.id);
    let _ = writeln!(out, "Name:        {}", f.name);
    let _ = writeln!(out, "Type:        {}", f.kind);
    if let Some(created) = created_at(f) {
        let _ = writeln!(out, "Created:     {}", created.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    let _ = writeln!(out, "Center:      {}", f.center());
    let _ = writeln!(out, "Size:        {:.1} m × {:.1} m", dims.width, dims.height);
    let _ = writeln!(out, "Area:        {}", format_area(f.area()));
    let _ = writeln!(out, "Perimeter:   {:.1} m", f.perimeter());
    let _ = writeln!(out, "Vertices:");
    for point in &f.coordinates {
        let _ = writeln!(out, "  {point}");
    }
    out.trim_end().to_owned()
}

/// Ids are creation timestamps in milliseconds.
fn created_at(f: &Facility) -> Option<DateTime<Utc>> {
    i64::try_from(f.id.get())
        .ok()
        .and_then(DateTime::from_timestamp_millis)
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: FacilitiesArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let mut manager = open_manager(cfg, global);

    match args.command {
        FacilitiesCommand::List => {
            let all: Vec<Facility> = manager.store().iter().cloned().collect();
            print_list(&all, global);
            Ok(())
        }

        FacilitiesCommand::Show { id } => {
            let id = util::parse_facility_id(&id)?;
            let facility = manager
                .store()
                .get(id)
                .ok_or_else(|| util::facility_not_found(id))?;
            print_single(facility, global);
            Ok(())
        }

        FacilitiesCommand::Add { kind, points, name } => {
            let facility = draw(&mut manager, kind, &points, name.as_deref())?;
            print_single(&facility, global);
            Ok(())
        }

        FacilitiesCommand::Rename { id, name } => {
            let id = util::parse_facility_id(&id)?;
            if manager.store().get(id).is_none() {
                return Err(util::facility_not_found(id));
            }
            if !manager.rename(id, &name) {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: "must not be empty".into(),
                });
            }
            Ok(())
        }

        FacilitiesCommand::Delete { id } => {
            let id = util::parse_facility_id(&id)?;
            if manager.store().get(id).is_none() {
                return Err(util::facility_not_found(id));
            }
            util::ensure_confirmable("facilities delete", global.yes)?;
            manager.request_delete(id);
            Ok(())
        }

        FacilitiesCommand::Clear => {
            util::ensure_confirmable("facilities clear", global.yes)?;
            manager.request_clear();
            Ok(())
        }

        FacilitiesCommand::Export { file } => {
            let json = manager.store().export_json()?;
            match file {
                Some(path) => {
                    std::fs::write(&path, format!("{json}\n"))?;
                    if !global.quiet {
                        eprintln!(
                            "Exported {} facilities to {}",
                            manager.store().len(),
                            path.display()
                        );
                    }
                }
                None => output::print_output(&json, global.quiet),
            }
            Ok(())
        }

        FacilitiesCommand::Seed => {
            let created = manager.store_mut().seed_samples();
            print_list(&created, global);
            Ok(())
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────

fn open_manager(cfg: &Config, global: &GlobalOpts) -> FacilityManager {
    let surface = Arc::new(HeadlessSurface::new());
    let storage = config::open_storage(global, cfg);
    let notifier = Arc::new(TerminalNotifier::new(
        global.quiet,
        global.yes,
        output::should_color(&global.color),
    ));

    let store = FacilityStore::new(surface.clone(), storage).with_styles(cfg.styles.clone());
    let drawing = DrawingModeController::new(surface);
    let mut manager = FacilityManager::from_parts(store, drawing, notifier);
    let loaded = manager.load();
    tracing::debug!(loaded, "facilities restored");
    manager
}

/// Replay the points as map clicks through the drawing controller.
/// Nothing is created unless every input is valid.
fn draw(
    manager: &mut FacilityManager,
    kind: ShapeKind,
    points: &[(f64, f64)],
    name: Option<&str>,
) -> Result<Facility, CliError> {
    let (activate, label, count_ok) = match kind {
        ShapeKind::Rectangle => (MapEvent::ActivateRectangle, "rectangle needs exactly 2", points.len() == 2),
        ShapeKind::Polygon => (MapEvent::ActivatePolygon, "polygon needs at least 3", points.len() >= 3),
    };
    if !count_ok {
        return Err(CliError::Validation {
            field: "point".into(),
            reason: format!("a {label} points, got {}", points.len()),
        });
    }

    manager.handle(activate);
    if let Some(name) = name {
        if let Err(e) = manager.drawing_mut().name_pending(name) {
            manager.handle(MapEvent::Cancel);
            return Err(CliError::Validation {
                field: "name".into(),
                reason: e.to_string(),
            });
        }
    }
    let mut outcome = MapOutcome::Ignored;
    for &point in points {
        outcome = manager.handle(MapEvent::Click(LatLng::from(point)));
    }
    if matches!(kind, ShapeKind::Polygon) {
        outcome = manager.handle(MapEvent::Finish);
    }

    match outcome {
        MapOutcome::Drawing(DrawingOutcome::Completed(facility)) => Ok(facility),
        other => {
            manager.handle(MapEvent::Cancel);
            Err(CliError::Validation {
                field: "point".into(),
                reason: format!("drawing did not complete ({other:?})"),
            })
        }
    }
}

fn print_list(facilities: &[Facility], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        facilities,
        |f| FacilityRow::from(f),
        |f| f.id.to_string(),
    );
    output::print_output(&out, global.quiet);
}

fn print_single(facility: &Facility, global: &GlobalOpts) {
    let out = output::render_single(&global.output, facility, detail, |f| f.id.to_string());
    output::print_output(&out, global.quiet);
}

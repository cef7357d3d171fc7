use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use serde::Serialize;

use keel_engine::{
    ArchiveStore, AxisOrigin, DialogLayoutSource, HeadlessSurface, PositioningFrame, Rect,
    RenderSurface, ResourceNamespace, ScalingMode, SceneEntity, ScriptHost, Size,
};

#[derive(Parser, Debug)]
#[command(about = "Inspect keel resource archives and dialog layouts", version)]
struct Args {
    /// Directory containing KRSR archives (recursively scanned)
    #[arg(long, value_name = "DIR")]
    archive_root: PathBuf,

    /// Print the archive manifest as JSON
    #[arg(long)]
    manifest_json: bool,

    /// Build the dialog layout for this resource id and dump it as JSON
    #[arg(long, value_name = "ID")]
    dump_dialog: Option<i64>,

    /// Namespace scope for --dump-dialog (may repeat; default: universal)
    #[arg(long = "namespace", value_name = "NAME")]
    namespaces: Vec<String>,

    /// Compile attached element scripts while building the layout
    #[arg(long)]
    compile_scripts: bool,

    /// Viewport size used to resolve real-space frames
    #[arg(long, value_name = "WxH", default_value = "1280x720")]
    viewport: String,
}

#[derive(Debug, Serialize)]
struct ManifestEntry<'a> {
    archive: &'a str,
    type_code: &'a str,
    id: i64,
    name: Option<&'a str>,
    namespace: Option<&'a str>,
    size: usize,
}

#[derive(Debug, Serialize)]
struct ElementDump<'a> {
    index: usize,
    kind: keel_formats::ElementKind,
    value: &'a str,
    source_frame: Rect,
    real_frame: Rect,
    has_script: bool,
}

#[derive(Debug, Serialize)]
struct LayoutDump<'a> {
    descriptor: String,
    mode: &'static str,
    frame: Rect,
    elements: Vec<ElementDump<'a>>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    let mut store = ArchiveStore::new();
    let imported = store
        .import_directory(&args.archive_root)
        .with_context(|| format!("importing archives from {}", args.archive_root.display()))?;
    eprintln!(
        "[keel_engine] info: imported {imported} resources from {} archive(s)",
        store.archive_sources().len()
    );

    if args.manifest_json {
        let manifest: Vec<ManifestEntry> = store
            .records()
            .map(|(archive, record)| ManifestEntry {
                archive,
                type_code: &record.type_code,
                id: record.id,
                name: record.name.as_deref(),
                namespace: record.namespace.as_deref(),
                size: record.data.len(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&manifest)?);
    }

    if let Some(id) = args.dump_dialog {
        let viewport = parse_viewport(&args.viewport)?;
        dump_dialog(&store, id, &args.namespaces, args.compile_scripts, viewport)?;
    }

    Ok(())
}

fn dump_dialog(
    store: &ArchiveStore,
    id: i64,
    namespaces: &[String],
    compile_scripts: bool,
    viewport: Size,
) -> Result<()> {
    let namespace = if namespaces.is_empty() {
        ResourceNamespace::universal()
    } else {
        ResourceNamespace::new(namespaces.iter().cloned())
    };
    let descriptor = namespace.identified_resource(id);

    let host = compile_scripts.then(ScriptHost::new);
    let layout = DialogLayoutSource::from_descriptor(&descriptor, store, host.as_ref())
        .with_context(|| format!("building dialog layout for {descriptor}"))?;

    let mut positioning = PositioningFrame::new(
        layout.size(),
        AxisOrigin::Center,
        ScalingMode::Normal,
    )?;
    positioning.set_target_origin(layout.frame().origin);
    let surface = HeadlessSurface::new(viewport);

    let elements = layout
        .elements()
        .iter()
        .enumerate()
        .map(|(index, element)| {
            let center = keel_engine::Point::new(
                layout.frame().origin.x
                    + element.frame.origin.x
                    + element.frame.size.width / 2.0,
                layout.frame().origin.y
                    + element.frame.origin.y
                    + element.frame.size.height / 2.0,
            );
            let probe = SceneEntity::new(element.kind, &element.value, center, element.frame.size);
            ElementDump {
                index,
                kind: element.kind,
                value: &element.value,
                source_frame: element.frame,
                real_frame: positioning.position_scene_entity(&probe, surface.window_size()),
                has_script: element.script.is_some(),
            }
        })
        .collect();

    let dump = LayoutDump {
        descriptor: descriptor.describe(),
        mode: match layout.mode() {
            keel_engine::PresentationMode::SceneEntity => "scene_entity",
            keel_engine::PresentationMode::ImmediateUi => "immediate_ui",
        },
        frame: layout.frame(),
        elements,
    };
    println!("{}", serde_json::to_string_pretty(&dump)?);
    Ok(())
}

fn parse_viewport(raw: &str) -> Result<Size> {
    let Some((width, height)) = raw.split_once('x') else {
        bail!("viewport must look like 1280x720, got {raw}");
    };
    let width: f64 = width.parse().context("viewport width")?;
    let height: f64 = height.parse().context("viewport height")?;
    if width <= 0.0 || height <= 0.0 {
        bail!("viewport dimensions must be positive, got {raw}");
    }
    Ok(Size::new(width, height))
}

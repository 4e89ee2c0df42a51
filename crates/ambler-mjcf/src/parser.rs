//! MJCF XML parser implementation.

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};

use crate::error::MjcfError;
use crate::types::{
    ActuatorSpec, BodySpec, GeomKind, GeomSpec, JointSpec, JointType, KeyframeSpec, MeshAsset,
    SceneSpec, SiteSpec,
};

/// Named in-memory binary assets (mesh files etc.) supplied alongside a
/// scene description instead of reading them from disk.
pub type AssetMap = HashMap<String, Vec<u8>>;

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse a scene file from disk. Mesh asset references are resolved against
/// `assets` first, then against the directory containing the scene file.
pub fn parse_file(
    path: impl AsRef<Path>,
    assets: Option<&AssetMap>,
) -> Result<SceneSpec, MjcfError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| MjcfError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let spec = parse_inner(&content)?;
    resolve_assets(&spec, assets, path.parent())?;
    Ok(spec)
}

/// Parse a scene from an XML string. Mesh asset references must resolve in
/// `assets`; there is no filesystem fallback.
pub fn parse_string(xml: &str, assets: Option<&AssetMap>) -> Result<SceneSpec, MjcfError> {
    let spec = parse_inner(xml)?;
    resolve_assets(&spec, assets, None)?;
    Ok(spec)
}

// ---------------------------------------------------------------------------
// Asset resolution
// ---------------------------------------------------------------------------

/// Every referenced mesh file must exist in the asset map or on disk.
/// A dangling reference is a fatal construction error.
fn resolve_assets(
    spec: &SceneSpec,
    assets: Option<&AssetMap>,
    base_dir: Option<&Path>,
) -> Result<(), MjcfError> {
    for mesh in &spec.meshes {
        let in_map = assets.is_some_and(|m| m.contains_key(&mesh.file));
        let on_disk = base_dir.is_some_and(|d| d.join(&mesh.file).exists());
        if !in_map && !on_disk {
            return Err(MjcfError::MissingAsset(mesh.file.clone()));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Parser state
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ParseState {
    in_worldbody: bool,
    in_asset: bool,
    in_keyframe: bool,
    in_actuator: bool,
    /// Indices into `SceneSpec::bodies` for the open `<body>` elements.
    body_stack: Vec<usize>,
}

fn parse_inner(xml: &str) -> Result<SceneSpec, MjcfError> {
    let mut reader = Reader::from_reader(xml.as_bytes());
    reader.config_mut().trim_text(true);

    let mut spec = SceneSpec::default();
    let mut state = ParseState::default();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => handle_element(&mut spec, &mut state, &e, false)?,
            Ok(Event::Empty(e)) => handle_element(&mut spec, &mut state, &e, true)?,
            Ok(Event::End(e)) => {
                match e.name().as_ref() {
                    b"body" if state.in_worldbody => {
                        state.body_stack.pop();
                    }
                    b"worldbody" => state.in_worldbody = false,
                    b"asset" => state.in_asset = false,
                    b"keyframe" => state.in_keyframe = false,
                    b"actuator" => state.in_actuator = false,
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(MjcfError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }

    Ok(spec)
}

/// Dispatch one opening element. `self_closing` distinguishes `<body/>`
/// (no children, nothing pushed) from `<body>` (opens a nesting level).
fn handle_element(
    spec: &mut SceneSpec,
    state: &mut ParseState,
    e: &BytesStart,
    self_closing: bool,
) -> Result<(), MjcfError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).to_string();

    match tag.as_str() {
        "mujoco" => {
            if let Some(name) = opt_attr(e, "model")? {
                spec.name = name;
            }
        }
        "option" => {
            if let Some(ts) = opt_attr(e, "timestep")? {
                spec.timestep = parse_float(&tag, "timestep", &ts)?;
            }
            if let Some(g) = opt_attr(e, "gravity")? {
                spec.gravity = parse_vec3(&tag, "gravity", &g)?;
            }
        }
        "asset" => state.in_asset = true,
        "mesh" if state.in_asset => {
            let file = req_attr(e, "mesh", "file")?;
            let name = match opt_attr(e, "name")? {
                Some(n) => n,
                None => file_stem(&file),
            };
            spec.meshes.push(MeshAsset { name, file });
        }
        "worldbody" => state.in_worldbody = true,
        "body" if state.in_worldbody => {
            let body = BodySpec {
                name: opt_attr(e, "name")?,
                parent: state.body_stack.last().copied(),
                pos: opt_vec3(e, &tag, "pos")?.unwrap_or([0.0; 3]),
                quat: opt_vec4(e, &tag, "quat")?.unwrap_or([1.0, 0.0, 0.0, 0.0]),
                joints: Vec::new(),
                geoms: Vec::new(),
                sites: Vec::new(),
            };
            spec.bodies.push(body);
            if !self_closing {
                state.body_stack.push(spec.bodies.len() - 1);
            }
        }
        "freejoint" if state.in_worldbody => {
            let joint = JointSpec {
                name: opt_attr(e, "name")?,
                kind: JointType::Free,
                ..JointSpec::default()
            };
            current_body(spec, state, &tag)?.joints.push(joint);
        }
        "joint" if state.in_worldbody => {
            let kind = match opt_attr(e, "type")? {
                Some(t) => JointType::from_mjcf(&t)?,
                None => JointType::Hinge,
            };
            let joint = JointSpec {
                name: opt_attr(e, "name")?,
                kind,
                pos: opt_vec3(e, &tag, "pos")?.unwrap_or([0.0; 3]),
                axis: opt_vec3(e, &tag, "axis")?.unwrap_or([0.0, 0.0, 1.0]),
                range: opt_vec2(e, &tag, "range")?,
            };
            current_body(spec, state, &tag)?.joints.push(joint);
        }
        "geom" if state.in_worldbody => {
            let kind = match opt_attr(e, "type")? {
                Some(t) => GeomKind::from_mjcf(&t)?,
                None => GeomKind::Sphere,
            };
            let geom = GeomSpec {
                name: opt_attr(e, "name")?,
                kind,
                size: opt_sizes(e, &tag)?,
                pos: opt_vec3(e, &tag, "pos")?.unwrap_or([0.0; 3]),
                quat: opt_vec4(e, &tag, "quat")?.unwrap_or([1.0, 0.0, 0.0, 0.0]),
                group: opt_group(e, &tag)?,
                mesh: opt_attr(e, "mesh")?,
            };
            match state.body_stack.last() {
                Some(&i) => spec.bodies[i].geoms.push(geom),
                None => spec.world_geoms.push(geom),
            }
        }
        "site" if state.in_worldbody => {
            let site = SiteSpec {
                name: req_attr(e, "site", "name")?,
                pos: opt_vec3(e, &tag, "pos")?.unwrap_or([0.0; 3]),
                quat: opt_vec4(e, &tag, "quat")?.unwrap_or([1.0, 0.0, 0.0, 0.0]),
            };
            match state.body_stack.last() {
                Some(&i) => spec.bodies[i].sites.push(site),
                None => spec.world_sites.push(site),
            }
        }
        "keyframe" => state.in_keyframe = true,
        "key" if state.in_keyframe => {
            spec.keyframes.push(KeyframeSpec {
                name: opt_attr(e, "name")?,
                qpos: opt_floats(e, &tag, "qpos")?,
                qvel: opt_floats(e, &tag, "qvel")?,
                ctrl: opt_floats(e, &tag, "ctrl")?,
            });
        }
        "actuator" => state.in_actuator = true,
        "motor" | "position" | "velocity" if state.in_actuator => {
            spec.actuators.push(ActuatorSpec {
                name: opt_attr(e, "name")?,
                joint: req_attr(e, &tag, "joint")?,
            });
        }
        _ => {}
    }

    Ok(())
}

fn current_body<'a>(
    spec: &'a mut SceneSpec,
    state: &ParseState,
    tag: &str,
) -> Result<&'a mut BodySpec, MjcfError> {
    match state.body_stack.last() {
        Some(&i) => Ok(&mut spec.bodies[i]),
        None => Err(MjcfError::Parse(format!("<{tag}> outside of a <body>"))),
    }
}

// ---------------------------------------------------------------------------
// Attribute helpers
// ---------------------------------------------------------------------------

fn opt_attr(e: &BytesStart, name: &str) -> Result<Option<String>, MjcfError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|err| MjcfError::Parse(err.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = attr
                .unescape_value()
                .map_err(|err| MjcfError::Parse(err.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}

fn req_attr(e: &BytesStart, tag: &str, name: &str) -> Result<String, MjcfError> {
    opt_attr(e, name)?.ok_or_else(|| MjcfError::MissingAttribute {
        tag: tag.into(),
        attr: name.into(),
    })
}

fn parse_float(tag: &str, attr: &str, value: &str) -> Result<f64, MjcfError> {
    value.trim().parse().map_err(|_| MjcfError::BadAttribute {
        tag: tag.into(),
        attr: attr.into(),
        value: value.into(),
    })
}

fn parse_floats(tag: &str, attr: &str, value: &str) -> Result<Vec<f64>, MjcfError> {
    value
        .split_whitespace()
        .map(|tok| {
            tok.parse().map_err(|_| MjcfError::BadAttribute {
                tag: tag.into(),
                attr: attr.into(),
                value: value.into(),
            })
        })
        .collect()
}

fn parse_vec3(tag: &str, attr: &str, value: &str) -> Result<[f64; 3], MjcfError> {
    let v = parse_floats(tag, attr, value)?;
    v.try_into().map_err(|_| MjcfError::BadAttribute {
        tag: tag.into(),
        attr: attr.into(),
        value: value.into(),
    })
}

fn opt_vec2(e: &BytesStart, tag: &str, name: &str) -> Result<Option<[f64; 2]>, MjcfError> {
    match opt_attr(e, name)? {
        Some(v) => {
            let parsed = parse_floats(tag, name, &v)?;
            let arr: [f64; 2] = parsed.try_into().map_err(|_| MjcfError::BadAttribute {
                tag: tag.into(),
                attr: name.into(),
                value: v,
            })?;
            Ok(Some(arr))
        }
        None => Ok(None),
    }
}

fn opt_vec3(e: &BytesStart, tag: &str, name: &str) -> Result<Option<[f64; 3]>, MjcfError> {
    match opt_attr(e, name)? {
        Some(v) => parse_vec3(tag, name, &v).map(Some),
        None => Ok(None),
    }
}

fn opt_vec4(e: &BytesStart, tag: &str, name: &str) -> Result<Option<[f64; 4]>, MjcfError> {
    match opt_attr(e, name)? {
        Some(v) => {
            let parsed = parse_floats(tag, name, &v)?;
            let arr: [f64; 4] = parsed.try_into().map_err(|_| MjcfError::BadAttribute {
                tag: tag.into(),
                attr: name.into(),
                value: v,
            })?;
            Ok(Some(arr))
        }
        None => Ok(None),
    }
}

fn opt_group(e: &BytesStart, tag: &str) -> Result<u8, MjcfError> {
    match opt_attr(e, "group")? {
        Some(v) => {
            let group: u8 = v.trim().parse().map_err(|_| MjcfError::BadAttribute {
                tag: tag.into(),
                attr: "group".into(),
                value: v.clone(),
            })?;
            if group > 5 {
                return Err(MjcfError::BadAttribute {
                    tag: tag.into(),
                    attr: "group".into(),
                    value: v,
                });
            }
            Ok(group)
        }
        None => Ok(0),
    }
}

/// `size` may carry 1-3 components depending on geom type; pad with zeros.
fn opt_sizes(e: &BytesStart, tag: &str) -> Result<[f64; 3], MjcfError> {
    match opt_attr(e, "size")? {
        Some(v) => {
            let parsed = parse_floats(tag, "size", &v)?;
            if parsed.is_empty() || parsed.len() > 3 {
                return Err(MjcfError::BadAttribute {
                    tag: tag.into(),
                    attr: "size".into(),
                    value: v,
                });
            }
            let mut size = [0.0; 3];
            size[..parsed.len()].copy_from_slice(&parsed);
            Ok(size)
        }
        None => Ok([0.0; 3]),
    }
}

fn opt_floats(e: &BytesStart, tag: &str, name: &str) -> Result<Vec<f64>, MjcfError> {
    match opt_attr(e, name)? {
        Some(v) => parse_floats(tag, name, &v),
        None => Ok(Vec::new()),
    }
}

fn file_stem(file: &str) -> String {
    Path::new(file)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| file.to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

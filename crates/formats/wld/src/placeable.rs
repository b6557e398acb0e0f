//! Resolves placed objects to the meshes they instance.
//!
//! An objects file lists 0x15 locations, each naming a model. The model is
//! looked up by name, usually in a separate `_obj` file:
//!
//! ```text
//! 0x15 --name--> 0x14 --references[0]--> 0x2D --> 0x36
//! ```
//!
//! Animated models reference a skeleton instead of a 0x2D and do not
//! resolve.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::fragments::{Fragment, Mesh, ObjectLocation};
use crate::wld::WldDocument;

/// One placed instance of a static model.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct Placeable<'a> {
    /// Fragment id of the object location.
    pub id: usize,
    pub model: String,
    pub position: [f32; 3],
    /// Degrees, stored order.
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
    /// Fragment id of the mesh, in the document the model was found in.
    pub mesh_id: usize,
    #[serde(skip)]
    pub mesh: &'a Mesh,
}

/// Why a placed object has no mesh.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, serde::Serialize)]
pub enum PlaceableError {
    #[error("object {id}: model name reference {name_ref} is invalid")]
    InvalidModelName { id: usize, name_ref: i32 },

    #[error("object {id}: model {model} not found")]
    ModelNotFound { id: usize, model: String },

    #[error("object {id}: model {model} has no mesh reference")]
    NoMeshReference { id: usize, model: String },

    #[error("object {id}: model {model}: reference {reference} does not resolve to any fragment")]
    UnresolvedReference { id: usize, model: String, reference: i32 },

    #[error("object {id}: model {model}: reference {reference} is a {found} fragment, expected {expected}")]
    UnexpectedFragment {
        id: usize,
        model: String,
        reference: i32,
        expected: &'static str,
        found: &'static str,
    },
}

impl PlaceableError {
    fn with_id(mut self, object: usize) -> Self {
        match &mut self {
            Self::InvalidModelName { id, .. }
            | Self::ModelNotFound { id, .. }
            | Self::NoMeshReference { id, .. }
            | Self::UnresolvedReference { id, .. }
            | Self::UnexpectedFragment { id, .. } => *id = object,
        }
        self
    }
}

pub type PlaceableResolution<'a> = Result<Placeable<'a>, PlaceableError>;

/// Every placed object of a document, resolved or not.
#[derive(Debug, Clone, serde::Serialize)]
pub struct PlaceableTable<'a> {
    pub objects: Vec<PlaceableResolution<'a>>,
}

impl<'a> PlaceableTable<'a> {
    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn placed(&self) -> impl Iterator<Item = &Placeable<'a>> {
        self.objects.iter().filter_map(|o| o.as_ref().ok())
    }

    pub fn errors(&self) -> impl Iterator<Item = &PlaceableError> {
        self.objects.iter().filter_map(|o| o.as_ref().err())
    }

    /// Distinct model names among the resolved objects.
    pub fn models(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.placed().map(|p| p.model.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        names
    }
}

/// The mesh a model name resolved to.
#[derive(Clone, Copy)]
struct ModelMesh<'a> {
    mesh_id: usize,
    mesh: &'a Mesh,
}

/// Walks a document's object locations to the meshes they place.
pub struct PlaceableBuilder<'a> {
    locations: &'a WldDocument,
    models: Vec<&'a WldDocument>,
}

impl<'a> PlaceableBuilder<'a> {
    /// Models are looked up in `locations` itself until
    /// [`with_models`](Self::with_models) adds another document.
    pub fn new(locations: &'a WldDocument) -> Self {
        Self {
            locations,
            models: Vec::new(),
        }
    }

    /// Add a document to search for models. Documents are searched in the
    /// order they were added; the first one naming the model wins.
    pub fn with_models(mut self, doc: &'a WldDocument) -> Self {
        self.models.push(doc);
        self
    }

    pub fn build(&self) -> PlaceableTable<'a> {
        let mut cache: BTreeMap<String, Result<ModelMesh<'a>, PlaceableError>> = BTreeMap::new();
        let mut objects = Vec::new();

        for (fragment, location) in self.locations.object_locations() {
            let resolution = match self.locations.get_name(location.model_ref) {
                Ok(model) => {
                    let found = cache
                        .entry(model.clone())
                        .or_insert_with(|| self.resolve_model(fragment.id, &model))
                        .clone();
                    found
                        .map(|m| placeable(fragment, location, model, m))
                        .map_err(|e| e.with_id(fragment.id))
                }
                Err(_) => Err(PlaceableError::InvalidModelName {
                    id: fragment.id,
                    name_ref: location.model_ref,
                }),
            };
            objects.push(resolution);
        }

        let table = PlaceableTable { objects };
        debug!(
            objects = table.len(),
            placed = table.placed().count(),
            models = cache.len(),
            "resolved placeables"
        );
        for err in table.errors() {
            warn!("{err}");
        }
        table
    }

    fn model_documents(&self) -> &[&'a WldDocument] {
        if self.models.is_empty() {
            std::slice::from_ref(&self.locations)
        } else {
            &self.models
        }
    }

    fn resolve_model(&self, id: usize, model: &str) -> Result<ModelMesh<'a>, PlaceableError> {
        let (doc, model_fragment) = self
            .model_documents()
            .iter()
            .find_map(|&doc| doc.find_by_name(model).map(|f| (doc, f)))
            .ok_or_else(|| PlaceableError::ModelNotFound {
                id,
                model: model.to_string(),
            })?;

        let unresolved = |reference| PlaceableError::UnresolvedReference {
            id,
            model: model.to_string(),
            reference,
        };
        let unexpected = |reference, expected, found: &Fragment| PlaceableError::UnexpectedFragment {
            id,
            model: model.to_string(),
            reference,
            expected,
            found: found.type_name(),
        };

        let Some(model_ref) = model_fragment.as_model_reference() else {
            return Err(unexpected(model_fragment.reference(), "model reference", model_fragment));
        };
        let reference = model_ref.mesh_reference().ok_or_else(|| PlaceableError::NoMeshReference {
            id,
            model: model.to_string(),
        })?;

        let target = doc.get_fragment(reference).ok_or_else(|| unresolved(reference))?;
        let Some(mesh_ref) = target.as_mesh_reference() else {
            return Err(unexpected(reference, "mesh reference", target));
        };
        let mesh_fragment = doc
            .get_fragment(mesh_ref.reference)
            .ok_or_else(|| unresolved(mesh_ref.reference))?;
        let Some(mesh) = mesh_fragment.as_mesh() else {
            return Err(unexpected(mesh_ref.reference, "mesh", mesh_fragment));
        };
        Ok(ModelMesh {
            mesh_id: mesh_fragment.id,
            mesh,
        })
    }
}

fn placeable<'a>(fragment: &Fragment, location: &ObjectLocation, model: String, m: ModelMesh<'a>) -> Placeable<'a> {
    Placeable {
        id: fragment.id,
        model,
        position: location.position,
        rotation: location.rotation_degrees(),
        scale: location.effective_scale(),
        mesh_id: m.mesh_id,
        mesh: m.mesh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fragments::{MeshReference, ModelReference, PolygonRun};
    use crate::version::WldVersion;
    use crate::writer::WldWriter;

    fn model(references: Vec<i32>) -> ModelReference {
        ModelReference {
            flags: 0,
            fragment1: 0,
            fragment2: 0,
            params1: None,
            params2: None,
            entries: vec![],
            references,
        }
    }

    fn location(model_ref: i32, x: f32) -> ObjectLocation {
        ObjectLocation {
            model_ref,
            flags: 0x2E,
            fragment1: 0,
            position: [x, 0.0, 0.0],
            rotation: [0.0, 0.0, 128.0],
            scale: [0.0, 2.0, 1.0],
            color_reference: None,
            params2: None,
        }
    }

    fn mesh() -> Mesh {
        Mesh {
            flags: 0,
            references: [0; 4],
            center: [0.0; 3],
            params2: [0; 3],
            max_distance: 0.0,
            min: [0.0; 3],
            max: [0.0; 3],
            vertex_tex_count: 0,
            size9: 0,
            scale_exponent: 0,
            vertices: vec![[0.0; 3]; 3],
            uvs: vec![],
            normals: vec![],
            colors: vec![],
            triangles: vec![[0, 1, 2]],
            opaque: vec![],
            polygon_runs: vec![PolygonRun { count: 1, slot: 0 }],
        }
    }

    /// A model file holding `TREE_ACTORDEF` and an animated `BIRD_ACTORDEF`.
    fn models() -> WldDocument {
        let mut w = WldWriter::new(WldVersion::V1);
        let tree = w.name("TREE_ACTORDEF");
        let bird = w.name("BIRD_ACTORDEF");
        let mesh = w.mesh(0, &mesh());
        let mesh_ref = w.mesh_reference(0, &MeshReference { reference: mesh, flags: 0 });
        w.model_reference(tree, &model(vec![mesh_ref]));
        let skeleton = w.fragment(0x11, 0, &[0; 8]);
        w.model_reference(bird, &model(vec![skeleton]));
        WldDocument::parse(&w.finish()).unwrap()
    }

    fn objects(names: &[&str]) -> WldDocument {
        let mut w = WldWriter::new(WldVersion::V1);
        for (i, name) in names.iter().enumerate() {
            let name_ref = w.name(name);
            w.object_location(0, &location(name_ref, i as f32));
        }
        WldDocument::parse(&w.finish()).unwrap()
    }

    #[test]
    fn static_model_resolves_to_mesh() {
        let models = models();
        let objects = objects(&["TREE_ACTORDEF", "TREE_ACTORDEF"]);
        let table = PlaceableBuilder::new(&objects).with_models(&models).build();

        assert_eq!(table.len(), 2);
        let placed: Vec<_> = table.placed().collect();
        assert_eq!(placed[1].id, 1);
        assert_eq!(placed[1].position, [1.0, 0.0, 0.0]);
        assert_eq!(placed[1].rotation, [0.0, 0.0, 90.0]);
        assert_eq!(placed[1].scale, [2.0, 2.0, 1.0]);
        assert_eq!(placed[0].mesh_id, 0);
        assert_eq!(placed[0].mesh.triangles.len(), 1);
        assert_eq!(table.models(), ["TREE_ACTORDEF"]);
    }

    #[test]
    fn failures_are_isolated_per_object() {
        let models = models();
        let objects = objects(&["BIRD_ACTORDEF", "ROCK_ACTORDEF", "TREE_ACTORDEF", "ROCK_ACTORDEF"]);
        let table = PlaceableBuilder::new(&objects).with_models(&models).build();

        assert!(matches!(
            &table.objects[0],
            Err(PlaceableError::UnexpectedFragment { id: 0, expected: "mesh reference", .. })
        ));
        assert_eq!(
            table.objects[1],
            Err(PlaceableError::ModelNotFound {
                id: 1,
                model: "ROCK_ACTORDEF".into()
            })
        );
        assert!(table.objects[2].is_ok());
        // cached failure reported against the later object
        assert!(matches!(&table.objects[3], Err(PlaceableError::ModelNotFound { id: 3, .. })));
        assert_eq!(table.errors().count(), 3);
    }

    #[test]
    fn models_default_to_the_same_document() {
        let mut w = WldWriter::new(WldVersion::V1);
        let tree = w.name("TREE_ACTORDEF");
        let mesh = w.mesh(0, &mesh());
        let mesh_ref = w.mesh_reference(0, &MeshReference { reference: mesh, flags: 0 });
        w.model_reference(tree, &model(vec![mesh_ref]));
        w.object_location(0, &location(tree, 0.0));
        w.object_location(0, &location(-9999, 0.0));
        let doc = WldDocument::parse(&w.finish()).unwrap();

        let table = PlaceableBuilder::new(&doc).build();
        assert_eq!(table.placed().count(), 1);
        assert!(matches!(
            table.objects[1],
            Err(PlaceableError::InvalidModelName { id: 4, name_ref: -9999 })
        ));
    }

    #[test]
    fn model_without_references() {
        let mut w = WldWriter::new(WldVersion::V1);
        let empty = w.name("EMPTY_ACTORDEF");
        w.model_reference(empty, &model(vec![]));
        w.object_location(0, &location(empty, 0.0));
        let doc = WldDocument::parse(&w.finish()).unwrap();

        let table = PlaceableBuilder::new(&doc).build();
        assert!(matches!(table.objects[0], Err(PlaceableError::NoMeshReference { id: 1, .. })));
    }
}

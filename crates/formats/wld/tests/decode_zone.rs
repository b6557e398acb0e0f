use s3d::{Archive, ArchiveWriter};
use wld::fragments::texture_reference::VISIBLE;
use wld::fragments::{
    BitmapInfo, BitmapInfoReference, Mesh, MeshReference, ModelReference, ObjectLocation, PolygonRun, TextureList,
    TextureReference,
};
use wld::{
    AssetGraphBuilder, DecodeOptions, Error, FragmentKind, PlaceableBuilder, PlaceableError, SpriteSource, WldDocument,
    WldVersion, WldWriter,
};

/// Bitmap names → bitmap info → bitmap info reference → material → texture list.
fn minimal_zone() -> Vec<u8> {
    let mut w = WldWriter::new(WldVersion::V1);
    let tex_name = w.name("TEX1.BMP");
    let names = w.bitmap_names(tex_name, &["TEX1.BMP"]);
    let info = w.bitmap_info(
        0,
        &BitmapInfo {
            flags: 0,
            params1: None,
            params2: None,
            references: vec![names],
        },
    );
    let info_ref = w.bitmap_info_reference(0, &BitmapInfoReference { reference: info, flags: 0 });
    let material = w.texture_reference(
        0,
        &TextureReference {
            flags: 0,
            params1: VISIBLE,
            params2: 0,
            params3: [0.0; 2],
            reference: info_ref,
        },
    );
    w.texture_list(
        0,
        &TextureList {
            flags: 0,
            references: vec![material],
        },
    );
    w.finish()
}

fn triangle_mesh(runs: Vec<PolygonRun>) -> Mesh {
    Mesh {
        flags: 0,
        references: [1, 0, 0, 0],
        center: [0.0; 3],
        params2: [0; 3],
        max_distance: 1.0,
        min: [0.0; 3],
        max: [1.0; 3],
        vertex_tex_count: 0,
        size9: 0,
        scale_exponent: 0,
        vertices: vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
        uvs: vec![[0.0, 0.5], [1.0, 0.5], [0.0, 1.0]],
        normals: vec![],
        colors: vec![],
        triangles: vec![[0, 1, 2], [2, 1, 0]],
        opaque: vec![],
        polygon_runs: runs,
    }
}

#[test]
fn header_fields() {
    let data = minimal_zone();
    assert_eq!(&data[..4], &[0x02, 0x3D, 0x50, 0x54]);
    let doc = WldDocument::parse(&data).unwrap();
    assert_eq!(doc.version(), WldVersion::V1);
    assert_eq!(doc.len(), 5);
    assert_eq!(doc.header().max_fragment, 5);
}

#[test]
fn fragment_table_is_dense_and_ordered() {
    let doc = WldDocument::parse(&minimal_zone()).unwrap();
    let ids: Vec<usize> = doc.fragments().iter().map(|f| f.id).collect();
    assert_eq!(ids, [0, 1, 2, 3, 4]);
    assert!(doc.fragments().windows(2).all(|w| w[0].offset < w[1].offset));
    for i in 0..doc.len() {
        assert_eq!(doc.get_fragment(i as i32 + 1).unwrap().id, i);
    }
    let kinds: Vec<_> = doc.fragments().iter().map(|f| f.kind().unwrap()).collect();
    assert_eq!(
        kinds,
        [
            FragmentKind::BitmapNames,
            FragmentKind::BitmapInfo,
            FragmentKind::BitmapInfoReference,
            FragmentKind::TextureReference,
            FragmentKind::TextureList,
        ]
    );
}

#[test]
fn empty_name_for_every_document() {
    let doc = WldDocument::parse(&minimal_zone()).unwrap();
    assert_eq!(doc.get_name(0).unwrap(), "");
    assert_eq!(doc.get_name(-1).unwrap(), "TEX1.BMP");
}

#[test]
fn slot_zero_resolves_to_tex1() {
    let doc = WldDocument::parse(&minimal_zone()).unwrap();
    let table = AssetGraphBuilder::new(&doc).build().unwrap();
    assert_eq!(table.list_id, 4);
    let sprite = table.get(0).unwrap();
    assert_eq!(sprite.frames, ["tex1"]);
    assert_eq!(sprite.anim_delay, None);
    assert_eq!(sprite.source, SpriteSource::Chain);
}

#[test]
fn archive_end_to_end() {
    let mut aw = ArchiveWriter::new();
    aw.add("zone.wld", minimal_zone());
    aw.add("TEX1.BMP", b"BM".to_vec());
    let bytes = aw.finish().unwrap();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, &bytes).unwrap();
    let archive = Archive::open(file.path()).unwrap();

    let doc = WldDocument::from_archive(&archive, "ZONE.WLD").unwrap();
    let table = AssetGraphBuilder::new(&doc).with_archive(&archive).build().unwrap();
    assert_eq!(table.get(0).unwrap().frames, ["tex1"]);
}

#[test]
fn negative_reference_resolves_by_name_offset() {
    let mut w = WldWriter::new(WldVersion::V1);
    let first = w.name("FIRST");
    let target = w.name("TARGET");
    // Fragments whose ids sit near the magnitude of the name offset.
    for _ in 0..10 {
        w.fragment(0x22, first, &[]);
    }
    let a = w.bitmap_names(target, &["A.BMP"]);
    let b = w.texture_reference(
        0,
        &TextureReference {
            flags: 0,
            params1: VISIBLE,
            params2: 0,
            params3: [0.0; 2],
            reference: target + 1,
        },
    );
    let doc = WldDocument::parse(&w.finish()).unwrap();

    let b = doc.get_fragment(b).unwrap().as_texture_reference().unwrap();
    let found = doc.get_fragment(b.reference).unwrap();
    assert_eq!(found.reference(), a);
    assert_eq!(found.name_ref, target);
    assert_eq!(doc.get_name(found.name_ref).unwrap(), "TARGET");
}

#[test]
fn mesh_runs_cover_triangles() {
    let mut w = WldWriter::new(WldVersion::V2);
    w.mesh(
        0,
        &triangle_mesh(vec![PolygonRun { count: 1, slot: 0 }, PolygonRun { count: 1, slot: 1 }]),
    );
    let doc = WldDocument::parse(&w.finish()).unwrap();

    let (fragment, mesh) = doc.meshes().next().unwrap();
    assert_eq!(fragment.id, 0);
    let covered: usize = mesh.polygon_runs.iter().map(|r| r.count as usize).sum();
    assert_eq!(covered, mesh.triangles.len());
    assert!(mesh.validate_runs(fragment.id).is_ok());
    // v2 stores V negated; decoding restores it.
    assert_eq!(mesh.uvs[0], [0.0, 0.5]);
}

#[test]
fn mesh_run_mismatch_is_detected() {
    let mut w = WldWriter::new(WldVersion::V1);
    w.mesh(0, &triangle_mesh(vec![PolygonRun { count: 3, slot: 0 }]));
    let data = w.finish();

    let doc = WldDocument::parse(&data).unwrap();
    let (fragment, mesh) = doc.meshes().next().unwrap();
    assert!(matches!(
        mesh.validate_runs(fragment.id),
        Err(Error::PolygonRunMismatch { covered: 3, decoded: 2, .. })
    ));

    let strict = DecodeOptions::from_flags(&["strict"]);
    assert!(matches!(
        WldDocument::parse_with(&data, &strict),
        Err(Error::PolygonRunMismatch { id: 0, .. })
    ));
}

#[test]
fn truncated_file_fails_the_load() {
    let data = minimal_zone();
    let cut = &data[..data.len() - 2];
    assert!(matches!(
        WldDocument::parse(cut),
        Err(Error::TruncatedFragment { id: 4, .. })
    ));
}

#[test]
fn stray_version_bit_is_v1() {
    let mut data = minimal_zone();
    data[4] |= 1;
    assert_eq!(WldDocument::parse(&data).unwrap().version(), WldVersion::V1);
    data[6] = 0x7F;
    assert!(matches!(
        WldDocument::parse(&data),
        Err(Error::UnsupportedVersion { .. })
    ));
}

fn write_archive(files: &[(&str, Vec<u8>)]) -> tempfile::NamedTempFile {
    let mut aw = ArchiveWriter::new();
    for (name, data) in files {
        aw.add(name, data.clone());
    }
    let mut file = tempfile::NamedTempFile::new().unwrap();
    std::io::Write::write_all(&mut file, &aw.finish().unwrap()).unwrap();
    file
}

/// `_obj` file: one static model, one animated.
fn object_models() -> Vec<u8> {
    let mut w = WldWriter::new(WldVersion::V1);
    let tree = w.name("TREE_ACTORDEF");
    let bird = w.name("BIRD_ACTORDEF");
    let mesh = w.mesh(0, &triangle_mesh(vec![PolygonRun { count: 2, slot: 0 }]));
    let mesh_ref = w.mesh_reference(0, &MeshReference { reference: mesh, flags: 0 });
    let skeleton = w.fragment(0x11, 0, &[0; 8]);
    for (name, target) in [(tree, mesh_ref), (bird, skeleton)] {
        w.model_reference(
            name,
            &ModelReference {
                flags: 0,
                fragment1: 0,
                fragment2: 0,
                params1: None,
                params2: None,
                entries: vec![vec![(0, 1e30)]],
                references: vec![target],
            },
        );
    }
    w.finish()
}

/// Objects file placing the tree twice and the bird once.
fn object_locations() -> Vec<u8> {
    let mut w = WldWriter::new(WldVersion::V1);
    let tree = w.name("TREE_ACTORDEF");
    let bird = w.name("BIRD_ACTORDEF");
    for (model_ref, x) in [(tree, 100.0), (bird, 0.0), (tree, -50.0)] {
        w.object_location(
            0,
            &ObjectLocation {
                model_ref,
                flags: 0x2E,
                fragment1: 0,
                position: [x, 20.0, 3.0],
                rotation: [256.0, 0.0, 0.0],
                scale: [0.0, 1.0, 1.0],
                color_reference: Some(0),
                params2: Some(0),
            },
        );
    }
    w.finish()
}

#[test]
fn placeables_resolve_across_archives() {
    let zone = write_archive(&[("objects.wld", object_locations())]);
    let obj = write_archive(&[("zone_obj.wld", object_models())]);
    let locations = WldDocument::open(zone.path(), "objects.wld").unwrap();
    let models = WldDocument::open(obj.path(), "zone_obj.wld").unwrap();
    assert_eq!(locations.object_locations().count(), 3);

    let table = PlaceableBuilder::new(&locations).with_models(&models).build();
    assert_eq!(table.len(), 3);
    let placed: Vec<_> = table.placed().collect();
    assert_eq!(placed.len(), 2);
    assert_eq!(placed[0].model, "TREE_ACTORDEF");
    assert_eq!(placed[0].position, [100.0, 20.0, 3.0]);
    assert_eq!(placed[0].rotation, [180.0, 0.0, 0.0]);
    assert_eq!(placed[0].scale, [1.0, 1.0, 1.0]);
    assert_eq!(placed[1].id, 2);
    assert_eq!(placed[0].mesh_id, placed[1].mesh_id);
    assert_eq!(placed[0].mesh.triangles.len(), 2);

    // animated models reference a skeleton track, not a mesh reference
    assert!(matches!(
        &table.objects[1],
        Err(PlaceableError::UnexpectedFragment { id: 1, expected: "mesh reference", found: "skeleton track set reference", .. })
    ));
}

#[test]
fn placeables_without_models_document() {
    let locations = WldDocument::parse(&object_locations()).unwrap();
    let table = PlaceableBuilder::new(&locations).build();
    assert_eq!(table.placed().count(), 0);
    assert!(table.errors().all(|e| matches!(e, PlaceableError::ModelNotFound { .. })));
}

#[test]
fn open_reports_archive_errors() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        WldDocument::open(dir.path().join("missing.s3d"), "zone.wld"),
        Err(Error::Archive(s3d::Error::Io(_)))
    ));

    let zone = write_archive(&[("zone.wld", minimal_zone())]);
    assert!(matches!(
        WldDocument::open(zone.path(), "other.wld"),
        Err(Error::FileNotFound { .. })
    ));
    assert_eq!(WldDocument::open(zone.path(), "zone.wld").unwrap().len(), 5);
}

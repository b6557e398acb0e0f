use s3d::Archive;
use wld::{AssetGraphBuilder, FragmentKind, PlaceableBuilder, WldDocument};

fn load_archive(name: &str) -> Option<Archive> {
    let path = format!("{}/eq/{name}", env!("HOME"));
    let data = std::fs::read(path).ok()?;
    Some(Archive::parse(&data).expect("failed to parse archive"))
}

#[test]
fn decode_gfaydark_zone() {
    let Some(archive) = load_archive("gfaydark.s3d") else {
        eprintln!("skipping: eq/gfaydark.s3d not found");
        return;
    };
    let doc = WldDocument::from_archive(&archive, "gfaydark.wld").expect("failed to decode gfaydark.wld");
    assert_eq!(doc.len(), doc.header().max_fragment as usize);
    assert!(doc.fragments_of(FragmentKind::Mesh).count() > 0);

    for (fragment, mesh) in doc.meshes() {
        assert!(mesh.validate_runs(fragment.id).is_ok(), "mesh {} run mismatch", fragment.id);
    }

    let table = AssetGraphBuilder::new(&doc)
        .with_archive(&archive)
        .build()
        .expect("zone has a texture list");
    assert!(table.sprites().count() > 0);
}

#[test]
fn decode_objects_file() {
    let Some(archive) = load_archive("gfaydark_obj.s3d") else {
        eprintln!("skipping: eq/gfaydark_obj.s3d not found");
        return;
    };
    let doc = WldDocument::from_archive(&archive, "gfaydark_obj.wld").expect("failed to decode objects");
    assert!(doc.type_counts().values().sum::<usize>() == doc.len());
}

#[test]
fn place_gfaydark_objects() {
    let (Some(zone), Some(obj)) = (load_archive("gfaydark.s3d"), load_archive("gfaydark_obj.s3d")) else {
        eprintln!("skipping: eq/gfaydark.s3d or eq/gfaydark_obj.s3d not found");
        return;
    };
    let locations = WldDocument::from_archive(&zone, "objects.wld").expect("failed to decode objects.wld");
    let models = WldDocument::from_archive(&obj, "gfaydark_obj.wld").expect("failed to decode models");
    let table = PlaceableBuilder::new(&locations).with_models(&models).build();
    assert_eq!(table.len(), locations.object_locations().count());
    assert!(table.placed().count() > 0);
}

//! Container-level decode and encode tests over hand-built files.

use proptest::prelude::*;
use xfbin::chunks::{float_count, Camera, Clump, Coord, Material};
use xfbin::{
    ChunkData, ChunkIdentity, ChunkKind, ChunkRegistry, ChunkTable, Error, PageMarker, Xfbin,
};
use xfbin_common::{BinaryReader, BinaryWriter};

const CLUMP_PATH: &str = "c/1nrt/max/1nrtbod1.max";

/// A record as laid out on disk: page-local slot and payload.
struct RawRecord {
    local: u32,
    payload: Vec<u8>,
}

fn record(local: u32, payload: Vec<u8>) -> RawRecord {
    RawRecord { local, payload }
}

fn pool_index(pool: &mut Vec<String>, value: &str) -> u32 {
    match pool.iter().position(|entry| entry == value) {
        Some(index) => index as u32,
        None => {
            pool.push(value.to_owned());
            (pool.len() - 1) as u32
        }
    }
}

/// Build a complete file from chunk maps, an index list and records.
fn raw_file(
    identities: &[(&str, &str, &str)],
    indices: &[u32],
    references: &[(&str, u32)],
    records: &[RawRecord],
) -> Vec<u8> {
    let (mut types, mut paths, mut names) = (Vec::new(), Vec::new(), Vec::new());
    let maps: Vec<[u32; 3]> = identities
        .iter()
        .map(|(type_name, path, name)| {
            [
                pool_index(&mut types, type_name),
                pool_index(&mut paths, path),
                pool_index(&mut names, name),
            ]
        })
        .collect();
    let refs: Vec<[u32; 2]> = references
        .iter()
        .map(|(name, map)| [pool_index(&mut names, name), *map])
        .collect();

    let mut pools = BinaryWriter::new();
    let mut table = BinaryWriter::new();
    for pool in [&types, &paths, &names] {
        let start = pools.position();
        for entry in pool {
            pools.write_cstring(entry);
        }
        table.write_u32(pool.len() as u32);
        table.write_u32((pools.position() - start) as u32);
    }
    table.write_u32(maps.len() as u32);
    table.write_u32(maps.len() as u32 * 12);
    table.write_u32(indices.len() as u32);
    table.write_u32(refs.len() as u32);
    table.write_bytes(pools.as_bytes());
    table.align(4);
    for map in &maps {
        table.write_u32_slice(map);
    }
    for reference in &refs {
        table.write_u32_slice(reference);
    }
    table.write_u32_slice(indices);

    let mut out = BinaryWriter::new();
    out.write_bytes(b"NUCC");
    out.write_u32(0x79);
    out.write_zeros(8);
    out.write_u32((table.position() - refs.len() * 8) as u32);
    out.write_u32(3);
    out.write_u16(0x79);
    out.write_u16(0);
    out.write_bytes(table.as_bytes());
    for record in records {
        out.write_u32(record.payload.len() as u32);
        out.write_u32(record.local);
        out.write_u16(0x79);
        out.write_u16(0);
        out.write_bytes(&record.payload);
    }
    out.into_bytes()
}

fn marker(page_size: u32, reference_size: u32) -> Vec<u8> {
    let mut out = BinaryWriter::new();
    out.write_u32(page_size);
    out.write_u32(reference_size);
    out.into_bytes()
}

fn clump_payload(parents: &[i16], coords: &[u32]) -> Vec<u8> {
    let mut out = BinaryWriter::new();
    out.write_u32(0);
    out.write_u16(parents.len() as u16);
    out.write_u16(0);
    out.write_i16_slice(parents);
    out.write_u32_slice(coords);
    out.write_u16(0);
    out.write_u16(0);
    out.write_u32(0);
    out.into_bytes()
}

/// One page holding a clump with two coords, the second parented to the first.
fn clump_file(parents: &[i16]) -> Vec<u8> {
    raw_file(
        &[
            ("nuccChunkNull", "", ""),
            ("nuccChunkClump", CLUMP_PATH, "1nrtbod1"),
            ("nuccChunkCoord", CLUMP_PATH, "root"),
            ("nuccChunkCoord", CLUMP_PATH, "spine"),
            ("nuccChunkPage", "", "Page0"),
            ("nuccChunkIndex", "", "index"),
        ],
        &[0, 1, 2, 3, 4, 5],
        &[],
        &[
            record(0, Vec::new()),
            record(0, Vec::new()),
            record(1, clump_payload(parents, &[2, 3])),
            record(4, marker(6, 0)),
        ],
    )
}

fn coord_identity(name: &str) -> ChunkIdentity {
    ChunkIdentity::new("nuccChunkCoord", CLUMP_PATH, name)
}

fn decoded_clump(xfbin: &Xfbin) -> &Clump {
    let id = xfbin.chunks_by_kind(ChunkKind::Clump)[0];
    match &xfbin.chunk(id).unwrap().data {
        Some(ChunkData::Clump(clump)) => clump,
        other => panic!("expected a clump, got {other:?}"),
    }
}

#[test]
fn test_clump_page_decodes_tree() {
    let xfbin = Xfbin::decode(&clump_file(&[-1, 0])).unwrap();
    assert_eq!(xfbin.pages.len(), 1);

    let clump = decoded_clump(&xfbin);
    assert_eq!(clump.nodes.len(), 2);
    assert_eq!(clump.root_nodes, vec![0]);
    assert_eq!(clump.nodes[0].children, vec![1]);
    assert_eq!(clump.nodes[1].parent, Some(0));

    let root = xfbin.find(&coord_identity("root")).unwrap();
    let spine = xfbin.find(&coord_identity("spine")).unwrap();
    assert_eq!(clump.coords().collect::<Vec<_>>(), vec![root, spine]);
    clump.validate().unwrap();
}

#[test]
fn test_clump_page_reencodes_identically() {
    let bytes = clump_file(&[-1, 0]);
    let xfbin = Xfbin::decode(&bytes).unwrap();
    assert_eq!(xfbin.encode().unwrap(), bytes);
}

#[test]
fn test_chunk_table_pools() {
    let bytes = clump_file(&[-1, 0]);
    let mut reader = BinaryReader::new(&bytes[28..]);
    let table = ChunkTable::read(&mut reader).unwrap();

    assert_eq!(table.paths, vec!["".to_owned(), CLUMP_PATH.to_owned()]);
    assert_eq!(
        table.props(1).unwrap(),
        ("nuccChunkClump", CLUMP_PATH, "1nrtbod1")
    );
    assert_eq!(table.props(3).unwrap(), ("nuccChunkCoord", CLUMP_PATH, "spine"));
    assert!(matches!(
        table.props(6),
        Err(Error::ChunkMapIndexOutOfBounds { index: 6, len: 6 })
    ));
}

#[test]
fn test_corrupt_payload_is_kept_raw() {
    // Each coord names the other as its parent.
    let bytes = clump_file(&[1, 0]);
    let (xfbin, report) = Xfbin::decode_with_report(&bytes, &ChunkRegistry::standard()).unwrap();

    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].page, 0);
    assert!(matches!(report.failures[0].error, Error::InvalidClumpTree(_)));

    let id = xfbin
        .find(&ChunkIdentity::new("nuccChunkClump", CLUMP_PATH, "1nrtbod1"))
        .unwrap();
    assert_eq!(
        xfbin.chunk(id).unwrap().data,
        Some(ChunkData::Opaque(clump_payload(&[1, 0], &[2, 3])))
    );

    // The raw payload still indexes the original slice, so it must come back unchanged.
    assert_eq!(xfbin.encode().unwrap(), bytes);
}

#[test]
fn test_opaque_types_keep_their_slots() {
    let bytes = raw_file(
        &[
            ("nuccChunkNull", "", ""),
            ("nuccChunkFoo", "effects/1nrt.foo", "foo"),
            ("nuccChunkCoord", CLUMP_PATH, "root"),
            ("nuccChunkPage", "", "Page0"),
            ("nuccChunkIndex", "", "index"),
        ],
        &[0, 1, 2, 3, 4],
        &[],
        &[
            record(0, Vec::new()),
            record(0, Vec::new()),
            record(1, vec![0, 0, 0, 2, 0xAB, 0xCD]),
            record(3, marker(5, 0)),
        ],
    );

    let xfbin = Xfbin::decode(&bytes).unwrap();
    let foo = xfbin.chunks_by_kind(ChunkKind::Unknown)[0];
    assert_eq!(
        xfbin.chunk(foo).unwrap().data,
        Some(ChunkData::Opaque(vec![0, 0, 0, 2, 0xAB, 0xCD]))
    );
    assert_eq!(xfbin.encode().unwrap(), bytes);

    let mut registry = ChunkRegistry::standard();
    registry.register_opaque("nuccChunkFoo");
    let (xfbin, report) = Xfbin::decode_with_report(&bytes, &registry).unwrap();
    assert!(report.is_clean());
    let foo = xfbin.chunks_by_kind(ChunkKind::Binary)[0];
    assert!(matches!(xfbin.chunk(foo).unwrap().data, Some(ChunkData::Binary(_))));
    assert_eq!(xfbin.encode().unwrap(), bytes);
}

#[test]
fn test_local_index_out_of_bounds() {
    let bytes = raw_file(
        &[
            ("nuccChunkNull", "", ""),
            ("nuccChunkPage", "", "Page0"),
            ("nuccChunkIndex", "", "index"),
        ],
        &[0, 1, 2],
        &[],
        &[record(0, Vec::new()), record(9, marker(3, 0))],
    );
    assert!(matches!(
        Xfbin::decode(&bytes),
        Err(Error::ChunkIndexOutOfBounds { index: 9, len: 3 })
    ));
}

#[test]
fn test_rejects_cpk_and_bad_magic() {
    let mut cpk = b"CPK ".to_vec();
    cpk.resize(64, 0);
    assert!(matches!(Xfbin::decode(&cpk), Err(Error::CpkCompressed)));

    let mut bytes = clump_file(&[-1, 0]);
    bytes[..4].copy_from_slice(b"NUXX");
    assert!(matches!(
        Xfbin::decode(&bytes),
        Err(Error::InvalidMagic(magic)) if &magic == b"NUXX"
    ));

    assert!(Xfbin::decode(&[]).is_err());
}

fn material_identity() -> ChunkIdentity {
    ChunkIdentity::new("nuccChunkMaterial", CLUMP_PATH, "1nrtbod1_mat")
}

/// A container built through the API: a clump page and a camera page.
fn built_container() -> Xfbin {
    let mut xfbin = Xfbin::new();
    let root = xfbin.add_chunk(coord_identity("root"), ChunkData::Coord(Coord::default()));
    let spine = xfbin.add_chunk(
        coord_identity("spine"),
        ChunkData::Coord(Coord {
            position: [0.0, 12.5, 0.0],
            ..Coord::default()
        }),
    );

    let mut clump = Clump::default();
    let root_node = clump.add_coord(root, None).unwrap();
    clump.add_coord(spine, Some(root_node)).unwrap();
    let clump = xfbin.add_chunk(
        ChunkIdentity::new("nuccChunkClump", CLUMP_PATH, "1nrtbod1"),
        ChunkData::Clump(clump),
    );

    let material = xfbin.add_chunk(
        material_identity(),
        ChunkData::Material(Material {
            format: 0x50,
            floats: vec![0.5, 1.0, 2.0],
            ..Material::default()
        }),
    );
    let camera = xfbin.add_chunk(
        ChunkIdentity::new("nuccChunkCamera", "c/1nrt/cam.max", "cam01"),
        ChunkData::Camera(Camera {
            field00: 0,
            fov: 45.0,
        }),
    );

    let page = xfbin.add_chunk_page(clump);
    for id in [root, spine, material] {
        xfbin.pages[page].add_chunk(id);
    }
    xfbin.add_chunk_page(camera);
    xfbin
}

#[test]
fn test_material_float_count() {
    assert_eq!(float_count(0x50), 3);
    assert_eq!(float_count(0x01), 4);
    assert_eq!(float_count(0x00), 0);
}

#[test]
fn test_built_container_round_trip() {
    let xfbin = built_container();
    let bytes = xfbin.encode().unwrap();
    let decoded = Xfbin::decode(&bytes).unwrap();

    assert_eq!(decoded.pages.len(), 2);
    assert_eq!(decoded.encode().unwrap(), bytes);

    let material = decoded.find(&material_identity()).unwrap();
    match &decoded.chunk(material).unwrap().data {
        Some(ChunkData::Material(material)) => {
            assert_eq!(material.floats, vec![0.5, 1.0, 2.0]);
        }
        other => panic!("expected a material, got {other:?}"),
    }

    let spine = decoded.find(&coord_identity("spine")).unwrap();
    match &decoded.chunk(spine).unwrap().data {
        Some(ChunkData::Coord(coord)) => assert_eq!(coord.position, [0.0, 12.5, 0.0]),
        other => panic!("expected a coord, got {other:?}"),
    }

    let clump = decoded_clump(&decoded);
    assert_eq!(clump.root_nodes, vec![0]);
    assert_eq!(clump.nodes[0].children, vec![1]);
}

#[test]
fn test_page_markers_count_slots() {
    let bytes = built_container().encode().unwrap();
    let decoded = Xfbin::decode(&bytes).unwrap();

    // Null, clump, two coords, material, page, index; then null, camera, page, index.
    let sizes: Vec<usize> = decoded
        .pages
        .iter()
        .map(|page| page.initial_chunks.len())
        .collect();
    assert_eq!(sizes, vec![7, 4]);

    // Both pages share one marker chunk, which holds the last page's counts.
    let marker = decoded.chunks_by_kind(ChunkKind::Page)[0];
    assert_eq!(
        decoded.chunk(marker).unwrap().data,
        Some(ChunkData::Page(PageMarker {
            page_size: 4,
            reference_size: 0
        }))
    );
}

#[test]
fn test_shared_chunk_is_stored_once() {
    let mut xfbin = Xfbin::new();
    let root = xfbin.add_chunk(coord_identity("root"), ChunkData::Coord(Coord::default()));
    let camera = xfbin.add_chunk(
        ChunkIdentity::new("nuccChunkCamera", "c/1nrt/cam.max", "cam01"),
        ChunkData::Camera(Camera {
            field00: 1,
            fov: 60.0,
        }),
    );
    xfbin.add_chunk_page(root);
    let second = xfbin.add_chunk_page(camera);
    xfbin.pages[second].add_chunk(root);

    let bytes = xfbin.encode().unwrap();
    let decoded = Xfbin::decode(&bytes).unwrap();
    let root = decoded.find(&coord_identity("root")).unwrap();
    assert!(decoded.pages[0].contains(root));
    assert!(decoded.pages[1].contains(root));
    assert_eq!(decoded.chunks_by_kind(ChunkKind::Coord), vec![root, root]);

    // Markers and the coord are shared; only the camera adds a map.
    let mut reader = BinaryReader::new(&bytes[28..]);
    let table = ChunkTable::read(&mut reader).unwrap();
    assert_eq!(table.maps.len(), 5);
    assert_eq!(table.indices.len(), 9);
}

#[test]
fn test_dangling_handle_fails_encode() {
    let donor = built_container();
    let foreign = donor.chunks_by_kind(ChunkKind::Camera)[0];

    let mut xfbin = Xfbin::new();
    xfbin.add_chunk_page(foreign);
    assert!(matches!(xfbin.encode(), Err(Error::DanglingChunk(_))));
}

#[test]
fn test_invalid_material_fails_encode() {
    let mut xfbin = Xfbin::new();
    let material = xfbin.add_chunk(
        material_identity(),
        ChunkData::Material(Material {
            format: 0x50,
            floats: vec![1.0],
            ..Material::default()
        }),
    );
    xfbin.add_chunk_page(material);
    assert!(matches!(
        xfbin.encode(),
        Err(Error::MaterialFloatCount {
            format: 0x50,
            expected: 3,
            actual: 1
        })
    ));
}

#[test]
fn test_import_page_matches_decoded_page() {
    let bytes = clump_file(&[-1, 0]);
    let xfbin = Xfbin::decode(&bytes).unwrap();

    let mut page = xfbin.pages[0].clone();
    page.cleanup(xfbin.arena());
    let chunk_maps: Vec<ChunkIdentity> = page
        .initial_chunks
        .iter()
        .map(|&id| xfbin.chunk(id).unwrap().identity.clone())
        .collect();
    let chunks: Vec<(ChunkIdentity, Vec<u8>)> = page
        .iter()
        .map(|id| {
            (
                xfbin.chunk(id).unwrap().identity.clone(),
                xfbin.encode_chunk_payload(&page, id).unwrap(),
            )
        })
        .collect();

    let mut imported = Xfbin::new();
    let index = imported
        .import_page(&ChunkRegistry::standard(), &chunk_maps, &[], &chunks)
        .unwrap();
    assert_eq!(index, 0);
    assert_eq!(decoded_clump(&imported).nodes.len(), 2);
    assert_eq!(imported.encode().unwrap(), bytes);
}

#[test]
fn test_add_clump_page_collects_coords() {
    let mut xfbin = built_container();
    let clump = xfbin.chunks_by_kind(ChunkKind::Clump)[0];

    let index = xfbin.add_clump_page(clump).unwrap();
    assert_eq!(xfbin.pages.len(), 2);
    assert_eq!(index, 1);

    let root = xfbin.find(&coord_identity("root")).unwrap();
    let spine = xfbin.find(&coord_identity("spine")).unwrap();
    assert_eq!(xfbin.pages[index].chunks, vec![root, spine, clump]);
    assert_eq!(xfbin.pages_by_kind(ChunkKind::Camera), vec![0]);

    let camera = xfbin.chunks_by_kind(ChunkKind::Camera)[0];
    assert!(xfbin.add_clump_page(camera).is_err());
}

fn coord_payload() -> Vec<u8> {
    let mut out = BinaryWriter::new();
    out.write_f32_slice(&[0.0; 6]);
    out.write_f32_slice(&[1.0; 4]);
    out.write_u16(0);
    out.into_bytes()
}

/// Two coord pages; the second names the first page's coord in its reference section.
fn referencing_file() -> Vec<u8> {
    raw_file(
        &[
            ("nuccChunkNull", "", ""),
            ("nuccChunkCoord", CLUMP_PATH, "root"),
            ("nuccChunkPage", "", "Page0"),
            ("nuccChunkIndex", "", "index"),
            ("nuccChunkCoord", CLUMP_PATH, "spine"),
        ],
        &[0, 1, 2, 3, 0, 4, 2, 3],
        &[("root_ref", 1)],
        &[
            record(0, Vec::new()),
            record(0, Vec::new()),
            record(1, coord_payload()),
            record(2, marker(4, 0)),
            record(0, Vec::new()),
            record(1, coord_payload()),
            record(2, marker(4, 1)),
        ],
    )
}

#[test]
fn test_reference_across_pages() {
    let bytes = referencing_file();
    let mut reader = BinaryReader::new(&bytes[28..]);
    let table = ChunkTable::read(&mut reader).unwrap();
    assert_eq!(table.names.last().map(String::as_str), Some("root_ref"));

    let xfbin = Xfbin::decode(&bytes).unwrap();
    assert_eq!(xfbin.pages.len(), 2);
    assert!(xfbin.pages[0].references.is_empty());

    let root = xfbin.find(&coord_identity("root")).unwrap();
    let spine = xfbin.find(&coord_identity("spine")).unwrap();
    assert_eq!(xfbin.pages[1].references.len(), 1);
    assert_eq!(xfbin.pages[1].references[0].name, "root_ref");
    assert_eq!(xfbin.pages[1].references[0].chunk, root);
    assert!(xfbin.pages[1].chunks.contains(&spine));
    assert!(!xfbin.pages[1].chunks.contains(&root));

    assert_eq!(xfbin.encode().unwrap(), bytes);
}

proptest! {
    #[test]
    fn prop_coord_transforms_survive(
        position in prop::array::uniform3(-1000.0f32..1000.0),
        rotation in prop::array::uniform3(-360.0f32..360.0),
        scale in prop::array::uniform3(0.0f32..10.0),
    ) {
        let coord = Coord { position, rotation, scale, ..Coord::default() };
        let mut xfbin = Xfbin::new();
        let id = xfbin.add_chunk(coord_identity("root"), ChunkData::Coord(coord));
        xfbin.add_chunk_page(id);

        let decoded = Xfbin::decode(&xfbin.encode().unwrap()).unwrap();
        let id = decoded.find(&coord_identity("root")).unwrap();
        prop_assert_eq!(&decoded.chunk(id).unwrap().data, &Some(ChunkData::Coord(coord)));
    }
}

//! Skeletons and the models attached to them.
//!
//! ```text
//! u32 field00
//! u16 coord count, u8 flag0, u8 flag1
//! i16 parent[coord count]        clump-local coord index, -1 for roots
//! u32 coord[coord count]         page-local index
//! u16 model count, u8 flag0, u8 flag1
//! u32 padding
//! u32 model[model count]         page-local index
//! model groups until a count of -1 or the end of the payload:
//!   i16 count, u8 flag0, u8 flag1, i8 unk[4], i32 model[count]
//! ```

use xfbin_common::{BinaryReader, BinaryWriter};

use super::{read_chunk_ids, write_chunk_ids, ChunkCodec};
use crate::error::{count_u16, Error};
use crate::{ChunkId, ChunkKind, DecodeScope, EncodeScope, Result};

/// Count value that ends the model group list.
const GROUP_TERMINATOR: i16 = -1;

/// One coord in the clump's hierarchy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoordNode {
    pub coord: ChunkId,
    /// Index of the parent in [`Clump::nodes`].
    pub parent: Option<usize>,
    /// Indices of the children in [`Clump::nodes`].
    pub children: Vec<usize>,
}

/// A set of alternative models, e.g. LODs or outfit variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClumpModelGroup {
    pub flags: [u8; 2],
    pub unk: [i8; 4],
    /// `None` entries are stored as `-1`.
    pub models: Vec<Option<ChunkId>>,
}

impl Default for ClumpModelGroup {
    fn default() -> Self {
        Self {
            flags: [0; 2],
            unk: [0x7F, 0x7F, -1, -1],
            models: Vec::new(),
        }
    }
}

/// A skeleton: a forest of coord nodes plus its models.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clump {
    pub field00: u32,
    pub coord_flags: [u8; 2],
    /// Nodes in wire order.
    pub nodes: Vec<CoordNode>,
    pub root_nodes: Vec<usize>,
    pub model_flags: [u8; 2],
    pub model_padding: u32,
    pub models: Vec<ChunkId>,
    pub model_groups: Vec<ClumpModelGroup>,
    /// Whether the group list ends with an explicit `-1` count.
    pub has_terminator: bool,
}

impl Clump {
    /// Append a coord under `parent` and return its node index.
    pub fn add_coord(&mut self, coord: ChunkId, parent: Option<usize>) -> Result<usize> {
        let index = self.nodes.len();
        match parent {
            Some(parent) => self
                .nodes
                .get_mut(parent)
                .ok_or_else(|| Error::InvalidClumpTree(format!("parent {parent} does not exist")))?
                .children
                .push(index),
            None => self.root_nodes.push(index),
        }
        self.nodes.push(CoordNode {
            coord,
            parent,
            children: Vec::new(),
        });
        Ok(index)
    }

    /// Coord chunks in node order.
    pub fn coords(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.nodes.iter().map(|node| node.coord)
    }

    /// Node index of a coord chunk.
    pub fn node_of(&self, coord: ChunkId) -> Option<usize> {
        self.nodes.iter().position(|node| node.coord == coord)
    }

    /// Models referenced by the model groups, skipping empty slots.
    pub fn group_models(&self) -> impl Iterator<Item = ChunkId> + '_ {
        self.model_groups
            .iter()
            .flat_map(|group| group.models.iter().flatten().copied())
    }

    /// Build nodes and roots from a parent index array.
    fn build_tree(&mut self, coords: Vec<ChunkId>, parents: &[i16]) -> Result<()> {
        let count = coords.len();
        self.nodes = coords
            .into_iter()
            .map(|coord| CoordNode {
                coord,
                parent: None,
                children: Vec::new(),
            })
            .collect();
        self.root_nodes.clear();

        for (index, &parent) in parents.iter().enumerate() {
            if parent == -1 {
                self.root_nodes.push(index);
                continue;
            }
            let parent = usize::try_from(parent)
                .ok()
                .filter(|&p| p < count && p != index)
                .ok_or_else(|| {
                    Error::InvalidClumpTree(format!("coord {index} has invalid parent {parent}"))
                })?;
            self.nodes[index].parent = Some(parent);
            self.nodes[parent].children.push(index);
        }

        self.check_acyclic()
    }

    fn check_acyclic(&self) -> Result<()> {
        for start in 0..self.nodes.len() {
            let mut current = start;
            let mut steps = 0;
            while let Some(parent) = self.nodes[current].parent {
                steps += 1;
                if steps > self.nodes.len() {
                    return Err(Error::InvalidClumpTree(format!(
                        "coord {start} is part of a parent cycle"
                    )));
                }
                current = parent;
            }
        }
        Ok(())
    }

    /// Check that the nodes form a forest with consistent links.
    pub fn validate(&self) -> Result<()> {
        let count = self.nodes.len();
        for (index, node) in self.nodes.iter().enumerate() {
            match node.parent {
                Some(parent) => {
                    if parent >= count || parent == index {
                        return Err(Error::InvalidClumpTree(format!(
                            "coord {index} has invalid parent {parent}"
                        )));
                    }
                    if !self.nodes[parent].children.contains(&index) {
                        return Err(Error::InvalidClumpTree(format!(
                            "coord {index} is missing from its parent's children"
                        )));
                    }
                }
                None => {
                    if !self.root_nodes.contains(&index) {
                        return Err(Error::InvalidClumpTree(format!(
                            "coord {index} has no parent but is not a root"
                        )));
                    }
                }
            }
            for &child in &node.children {
                if self.nodes.get(child).and_then(|c| c.parent) != Some(index) {
                    return Err(Error::InvalidClumpTree(format!(
                        "coord {index} lists {child} as a child but is not its parent"
                    )));
                }
            }
        }
        if let Some(&root) = self
            .root_nodes
            .iter()
            .find(|&&root| self.nodes.get(root).map_or(true, |n| n.parent.is_some()))
        {
            return Err(Error::InvalidClumpTree(format!("root {root} has a parent")));
        }
        self.check_acyclic()
    }
}

impl ChunkCodec for Clump {
    const KIND: ChunkKind = ChunkKind::Clump;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let mut clump = Clump {
            field00: reader.read_u32()?,
            ..Default::default()
        };

        let coord_count = reader.read_u16()? as usize;
        clump.coord_flags = [reader.read_u8()?, reader.read_u8()?];
        let parents = reader.read_i16_vec(coord_count)?;
        let coords = read_chunk_ids(reader, scope, coord_count)?;

        let model_count = reader.read_u16()? as usize;
        clump.model_flags = [reader.read_u8()?, reader.read_u8()?];
        clump.model_padding = reader.read_u32()?;
        clump.models = read_chunk_ids(reader, scope, model_count)?;

        while !reader.is_empty() {
            let count = reader.read_i16()?;
            if count == GROUP_TERMINATOR {
                clump.has_terminator = true;
                break;
            }
            let count = usize::try_from(count)
                .map_err(|_| Error::invalid("clump", format!("model group count {count}")))?;

            let flags = [reader.read_u8()?, reader.read_u8()?];
            let unk = reader.read_i8_vec(4)?;
            let models = reader
                .read_i32_vec(count)?
                .into_iter()
                .map(|index| scope.signed_chunk(index))
                .collect::<Result<_>>()?;

            clump.model_groups.push(ClumpModelGroup {
                flags,
                unk: [unk[0], unk[1], unk[2], unk[3]],
                models,
            });
        }

        clump.build_tree(coords, &parents)?;
        Ok(clump)
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        self.validate()?;

        out.write_u32(self.field00);
        out.write_u16(count_u16("coord count", self.nodes.len())?);
        out.write_bytes(&self.coord_flags);

        // Parents are clump-local, so they never touch the page scope.
        for node in &self.nodes {
            let parent = match node.parent {
                Some(parent) => i16::try_from(parent)
                    .map_err(|_| Error::overflow("coord parent index", parent))?,
                None => -1,
            };
            out.write_i16(parent);
        }
        let coords: Vec<_> = self.coords().collect();
        write_chunk_ids(out, scope, &coords)?;

        out.write_u16(count_u16("model count", self.models.len())?);
        out.write_bytes(&self.model_flags);
        out.write_u32(self.model_padding);
        write_chunk_ids(out, scope, &self.models)?;

        for group in &self.model_groups {
            let count = i16::try_from(group.models.len())
                .map_err(|_| Error::overflow("model group size", group.models.len()))?;
            out.write_i16(count);
            out.write_bytes(&group.flags);
            for &unk in &group.unk {
                out.write_i8(unk);
            }
            for &model in &group.models {
                out.write_i32(scope.signed_index(model)?);
            }
        }
        if self.has_terminator {
            out.write_i16(GROUP_TERMINATOR);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;

    /// Page slots: 0 null, 1 root coord, 2 child coord, 3 model, 4 lod model.
    fn page() -> TestPage {
        TestPage::new(&[
            ("nuccChunkCoord", "root"),
            ("nuccChunkCoord", "spine"),
            ("nuccChunkModel", "body"),
            ("nuccChunkModel", "body_lod"),
        ])
    }

    fn raw_clump(parents: &[i16], groups: &[i16], terminator: bool) -> Vec<u8> {
        let mut out = BinaryWriter::new();
        out.write_u32(1);
        out.write_u16(parents.len() as u16);
        out.write_u16(0);
        out.write_i16_slice(parents);
        for i in 0..parents.len() {
            out.write_u32(1 + i as u32);
        }
        out.write_u16(1);
        out.write_u16(0);
        out.write_u32(0);
        out.write_u32(3);
        for &model in groups {
            out.write_i16(1);
            out.write_u16(0);
            out.write_u32(0x7F7F_FFFF);
            out.write_i32(model as i32);
        }
        if terminator {
            out.write_i16(-1);
        }
        out.into_bytes()
    }

    #[test]
    fn test_two_coord_tree() {
        let page = page();
        let clump: Clump = page.decode(&raw_clump(&[-1, 0], &[], false)).unwrap();

        assert_eq!(clump.nodes.len(), 2);
        assert_eq!(clump.root_nodes, vec![0]);
        let root = &clump.nodes[clump.root_nodes[0]];
        assert_eq!(root.children, vec![1]);
        assert_eq!(root.coord, page.locals[1]);
        assert_eq!(clump.nodes[1].parent, Some(0));
        assert_eq!(clump.models, vec![page.locals[3]]);
        assert!(clump.model_groups.is_empty());
        assert!(!clump.has_terminator);
    }

    #[test]
    fn test_parents_out_of_array_order() {
        // The child is stored before its parent.
        let page = page();
        let clump: Clump = page.decode(&raw_clump(&[1, -1], &[], false)).unwrap();
        assert_eq!(clump.root_nodes, vec![1]);
        assert_eq!(clump.nodes[1].children, vec![0]);
        clump.validate().unwrap();
    }

    #[test]
    fn test_model_groups_and_terminator() {
        let page = page();
        let bytes = raw_clump(&[-1, 0], &[4, -1], true);
        let clump: Clump = page.decode(&bytes).unwrap();

        assert!(clump.has_terminator);
        assert_eq!(clump.model_groups.len(), 2);
        assert_eq!(clump.model_groups[0].models, vec![Some(page.locals[4])]);
        assert_eq!(clump.model_groups[1].models, vec![None]);
        assert_eq!(clump.model_groups[0].unk, [0x7F, 0x7F, -1, -1]);
        assert_eq!(clump.group_models().collect::<Vec<_>>(), vec![page.locals[4]]);

        assert_eq!(page.encode(&clump), bytes);
    }

    #[test]
    fn test_groups_run_to_end_of_payload() {
        let page = page();
        let bytes = raw_clump(&[-1, 0], &[3], false);
        let clump: Clump = page.decode(&bytes).unwrap();
        assert_eq!(clump.model_groups.len(), 1);
        assert!(!clump.has_terminator);
        assert_eq!(page.encode(&clump), bytes);
    }

    #[test]
    fn test_parent_cycle_rejected() {
        let page = page();
        let err = page.decode::<Clump>(&raw_clump(&[1, 0], &[], false)).unwrap_err();
        assert!(matches!(err, Error::InvalidClumpTree(_)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_parent_out_of_range_rejected() {
        let page = page();
        assert!(matches!(
            page.decode::<Clump>(&raw_clump(&[-1, 5], &[], false)),
            Err(Error::InvalidClumpTree(_))
        ));
    }

    #[test]
    fn test_built_tree_encodes_parents() {
        let page = page();
        let mut clump = Clump {
            field00: 1,
            models: vec![page.locals[3]],
            ..Default::default()
        };
        let root = clump.add_coord(page.locals[1], None).unwrap();
        clump.add_coord(page.locals[2], Some(root)).unwrap();
        clump.validate().unwrap();

        assert_eq!(page.encode(&clump), raw_clump(&[-1, 0], &[], false));
    }

    #[test]
    fn test_inconsistent_tree_fails_encode() {
        let page = page();
        let mut clump = Clump::default();
        let root = clump.add_coord(page.locals[1], None).unwrap();
        clump.add_coord(page.locals[2], Some(root)).unwrap();
        clump.nodes[root].children.clear();
        assert!(matches!(clump.validate(), Err(Error::InvalidClumpTree(_))));
    }
}

//! Streamed animations.
//!
//! A `nuccChunkAnmStrm` chunk carries the clump bindings and a frame index;
//! the sampled values live in one `nuccChunkAnmStrmFrame` chunk per frame.
//!
//! ```text
//! AnmStrm:
//! u32 frame count, u32 frame size
//! u16 entry count, u16 looped, u16 clump count, u16 other entry count,
//! u16 coord parent count, u16 frame info count
//! clumps:        u32 clump, u16 bone count, u16 model count,
//!                u32 bone[bone count], u32 model[model count], u32 unk[model count]
//! other entries: u32 chunk
//! coord parents: as in nuccChunkAnm
//! frame infos:   u32 offset, u32 frame
//!
//! AnmStrmFrame:
//! u32 frame, u16 entry count, u16 unk
//! entries:       i16 clump, i16 bone, u16 entry type, u16 body length, body
//! ```

use xfbin_common::{BinaryReader, BinaryWriter};

use super::anm::{read_references, write_references, AnmCoordParent, AnmEntryFormat};
use super::ChunkCodec;
use crate::error::count_u16;
use crate::{ChunkId, ChunkKind, ChunkReference, DecodeScope, EncodeScope, Error, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnmStrmClump {
    pub clump: ChunkReference,
    /// Animated bones and materials.
    pub bones: Vec<ChunkReference>,
    pub models: Vec<ChunkReference>,
    /// One value per model.
    pub model_unk: Vec<u32>,
}

/// Where one frame's data starts in the stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameInfo {
    pub offset: u32,
    pub frame: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnmStrm {
    pub frame_count: u32,
    pub frame_size: u32,
    pub entry_count: u16,
    pub is_looped: bool,
    pub clumps: Vec<AnmStrmClump>,
    pub other_entries: Vec<ChunkId>,
    pub coord_parents: Vec<AnmCoordParent>,
    pub frame_infos: Vec<FrameInfo>,
}

impl ChunkCodec for AnmStrm {
    const KIND: ChunkKind = ChunkKind::AnmStrm;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let frame_count = reader.read_u32()?;
        let frame_size = reader.read_u32()?;
        let entry_count = reader.read_u16()?;
        let is_looped = reader.read_u16()? != 0;
        let clump_count = reader.read_u16()? as usize;
        let other_count = reader.read_u16()? as usize;
        let coord_count = reader.read_u16()? as usize;
        let frame_info_count = reader.read_u16()? as usize;

        let mut clumps = Vec::with_capacity(clump_count);
        for _ in 0..clump_count {
            let clump = scope.reference(reader.read_u32()?)?.clone();
            let bone_count = reader.read_u16()? as usize;
            let model_count = reader.read_u16()? as usize;
            let bones = read_references(reader, scope, bone_count)?;
            let models = read_references(reader, scope, model_count)?;
            let model_unk = reader.read_u32_vec(model_count)?;
            clumps.push(AnmStrmClump {
                clump,
                bones,
                models,
                model_unk,
            });
        }

        let other_entries = reader
            .read_u32_vec(other_count)?
            .into_iter()
            .map(|index| scope.chunk(index))
            .collect::<Result<_>>()?;

        let coord_parents = (0..coord_count)
            .map(|_| AnmCoordParent::read(reader))
            .collect::<Result<_>>()?;

        let frame_infos = reader
            .read_u32_vec(frame_info_count * 2)?
            .chunks_exact(2)
            .map(|pair| FrameInfo {
                offset: pair[0],
                frame: pair[1],
            })
            .collect();

        Ok(Self {
            frame_count,
            frame_size,
            entry_count,
            is_looped,
            clumps,
            other_entries,
            coord_parents,
            frame_infos,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_u32(self.frame_count);
        out.write_u32(self.frame_size);
        out.write_u16(self.entry_count);
        out.write_u16(u16::from(self.is_looped));
        out.write_u16(count_u16("clump count", self.clumps.len())?);
        out.write_u16(count_u16("other entry count", self.other_entries.len())?);
        out.write_u16(count_u16("coord parent count", self.coord_parents.len())?);
        out.write_u16(count_u16("frame info count", self.frame_infos.len())?);

        for clump in &self.clumps {
            if clump.model_unk.len() != clump.models.len() {
                return Err(Error::invalid(
                    "anm strm",
                    format!(
                        "{} model values for {} models",
                        clump.model_unk.len(),
                        clump.models.len()
                    ),
                ));
            }
            out.write_u32(scope.reference_index(&clump.clump)?);
            out.write_u16(count_u16("bone count", clump.bones.len())?);
            out.write_u16(count_u16("model count", clump.models.len())?);
            write_references(out, scope, &clump.bones)?;
            write_references(out, scope, &clump.models)?;
            out.write_u32_slice(&clump.model_unk);
        }

        for &chunk in &self.other_entries {
            out.write_u32(scope.index_of(chunk)?);
        }
        for parent in &self.coord_parents {
            parent.write(out);
        }
        for info in &self.frame_infos {
            out.write_u32(info.offset);
            out.write_u32(info.frame);
        }
        Ok(())
    }
}

/// Sampled values of one streamed entry.
#[derive(Debug, Clone, PartialEq)]
pub enum StrmEntryBody {
    Bone {
        curve_type: u32,
        position: [f32; 3],
        rotation: [f32; 4],
        scale: [f32; 3],
        opacity: f32,
    },
    Camera {
        curve_type: u32,
        position: [f32; 3],
        rotation: [f32; 4],
        fov: f32,
        scale: [f32; 3],
    },
    Material {
        curve_type: u32,
        values: [f32; 16],
    },
    LightDirc {
        curve_type: u32,
        color: [f32; 3],
        intensity: f32,
        direction: [f32; 4],
    },
    LightPoint {
        curve_type: u32,
        color: [f32; 3],
        position: [f32; 3],
        intensity: f32,
        range: f32,
        falloff: f32,
    },
    Ambient {
        curve_type: u32,
        color: [f32; 4],
    },
    /// An entry type without a known layout.
    Unknown { entry_type: u16, data: Vec<u8> },
}

impl StrmEntryBody {
    pub fn entry_type(&self) -> u16 {
        let format = match self {
            Self::Bone { .. } => AnmEntryFormat::Bone,
            Self::Camera { .. } => AnmEntryFormat::Camera,
            Self::Material { .. } => AnmEntryFormat::Material,
            Self::LightDirc { .. } => AnmEntryFormat::LightDirc,
            Self::LightPoint { .. } => AnmEntryFormat::LightPoint,
            Self::Ambient { .. } => AnmEntryFormat::Ambient,
            Self::Unknown { entry_type, .. } => return *entry_type,
        };
        format as u16
    }

    fn read(reader: &mut BinaryReader<'_>, entry_type: u16, length: usize) -> Result<Self> {
        let Some(format) = AnmEntryFormat::from_raw(entry_type) else {
            return Ok(Self::Unknown {
                entry_type,
                data: reader.read_bytes(length)?.to_vec(),
            });
        };

        let curve_type = reader.read_u32()?;
        Ok(match format {
            AnmEntryFormat::Bone => Self::Bone {
                curve_type,
                position: reader.read_f32_array()?,
                rotation: reader.read_f32_array()?,
                scale: reader.read_f32_array()?,
                opacity: reader.read_f32()?,
            },
            AnmEntryFormat::Camera => Self::Camera {
                curve_type,
                position: reader.read_f32_array()?,
                rotation: reader.read_f32_array()?,
                fov: reader.read_f32()?,
                scale: reader.read_f32_array()?,
            },
            AnmEntryFormat::Material => Self::Material {
                curve_type,
                values: reader.read_f32_array()?,
            },
            AnmEntryFormat::LightDirc => Self::LightDirc {
                curve_type,
                color: reader.read_f32_array()?,
                intensity: reader.read_f32()?,
                direction: reader.read_f32_array()?,
            },
            AnmEntryFormat::LightPoint => Self::LightPoint {
                curve_type,
                color: reader.read_f32_array()?,
                position: reader.read_f32_array()?,
                intensity: reader.read_f32()?,
                range: reader.read_f32()?,
                falloff: reader.read_f32()?,
            },
            AnmEntryFormat::Ambient => Self::Ambient {
                curve_type,
                color: reader.read_f32_array()?,
            },
        })
    }

    fn write(&self, out: &mut BinaryWriter) {
        match self {
            Self::Bone {
                curve_type,
                position,
                rotation,
                scale,
                opacity,
            } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(position);
                out.write_f32_slice(rotation);
                out.write_f32_slice(scale);
                out.write_f32(*opacity);
            }
            Self::Camera {
                curve_type,
                position,
                rotation,
                fov,
                scale,
            } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(position);
                out.write_f32_slice(rotation);
                out.write_f32(*fov);
                out.write_f32_slice(scale);
            }
            Self::Material { curve_type, values } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(values);
            }
            Self::LightDirc {
                curve_type,
                color,
                intensity,
                direction,
            } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(color);
                out.write_f32(*intensity);
                out.write_f32_slice(direction);
            }
            Self::LightPoint {
                curve_type,
                color,
                position,
                intensity,
                range,
                falloff,
            } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(color);
                out.write_f32_slice(position);
                out.write_f32(*intensity);
                out.write_f32(*range);
                out.write_f32(*falloff);
            }
            Self::Ambient { curve_type, color } => {
                out.write_u32(*curve_type);
                out.write_f32_slice(color);
            }
            Self::Unknown { data, .. } => out.write_bytes(data),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StrmEntry {
    pub clump_index: i16,
    pub bone_index: i16,
    pub body: StrmEntryBody,
}

impl StrmEntry {
    fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let clump_index = reader.read_i16()?;
        let bone_index = reader.read_i16()?;
        let entry_type = reader.read_u16()?;
        let length = reader.read_u16()? as usize;

        let body_start = reader.position();
        let body = StrmEntryBody::read(reader, entry_type, length)?;
        // Skip any tail the typed body does not cover.
        if reader.position() < body_start + length {
            reader.seek(body_start + length)?;
        }

        Ok(Self {
            clump_index,
            bone_index,
            body,
        })
    }

    fn write(&self, out: &mut BinaryWriter) -> Result<()> {
        let mut body = BinaryWriter::new();
        self.body.write(&mut body);

        out.write_i16(self.clump_index);
        out.write_i16(self.bone_index);
        out.write_u16(self.body.entry_type());
        out.write_u16(count_u16("entry length", body.position())?);
        out.write_bytes(body.as_bytes());
        Ok(())
    }
}

/// Values of every streamed entry at one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnmStrmFrame {
    pub frame: u32,
    pub unk: u16,
    pub entries: Vec<StrmEntry>,
}

impl ChunkCodec for AnmStrmFrame {
    const KIND: ChunkKind = ChunkKind::AnmStrmFrame;

    fn decode(reader: &mut BinaryReader<'_>, _scope: &DecodeScope<'_>) -> Result<Self> {
        let frame = reader.read_u32()?;
        let entry_count = reader.read_u16()? as usize;
        let unk = reader.read_u16()?;
        let entries = (0..entry_count)
            .map(|_| StrmEntry::read(reader))
            .collect::<Result<_>>()?;
        Ok(Self {
            frame,
            unk,
            entries,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, _scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_u32(self.frame);
        out.write_u16(count_u16("entry count", self.entries.len())?);
        out.write_u16(self.unk);
        for entry in &self.entries {
            entry.write(out)?;
        }
        Ok(())
    }
}

//! Keyframed animations.
//!
//! ```text
//! u32 frame count, u32 frame size
//! u16 entry count, u16 looped, u16 clump count, u16 other entry count
//! u32 coord parent count
//! clumps:        u32 clump, u16 bone count, u16 model count,
//!                u32 bone[bone count], u32 model[model count]   (page references)
//! other entries: u32 chunk                                       (page-local index)
//! coord parents: i16 parent clump, u16 parent coord, i16 child clump, u16 child coord
//! entries:       i16 clump, u16 bone, u16 format, u16 curve count,
//!                curve headers: u16 index, u16 format, u16 key count, i16 flags
//!                curve values, each padded to 4 bytes
//! ```

use xfbin_common::{BinaryReader, BinaryWriter};

use super::ChunkCodec;
use crate::error::{count_u16, count_u32};
use crate::{ChunkId, ChunkKind, ChunkReference, DecodeScope, EncodeScope, Error, Result};

/// What an entry animates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum AnmEntryFormat {
    Bone = 1,
    Camera = 2,
    Material = 4,
    LightDirc = 5,
    LightPoint = 6,
    Ambient = 8,
}

impl AnmEntryFormat {
    pub fn from_raw(value: u16) -> Option<Self> {
        Some(match value {
            1 => Self::Bone,
            2 => Self::Camera,
            4 => Self::Material,
            5 => Self::LightDirc,
            6 => Self::LightPoint,
            8 => Self::Ambient,
            _ => return None,
        })
    }
}

/// Value layout of a curve's keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum CurveFormat {
    /// Location or scale.
    Float3 = 0x05,
    /// Location or scale with explicit frames.
    Int1Float3 = 0x06,
    /// Euler rotation.
    Float3Alt = 0x08,
    /// Quaternion rotation with explicit frames.
    Int1Float4 = 0x0A,
    Float1 = 0x0B,
    /// Camera values with explicit frames.
    Int1Float1 = 0x0C,
    Short1 = 0x0F,
    /// Scale in 4.12 fixed point.
    Short3 = 0x10,
    /// Quaternion in 1.15 fixed point.
    Short4 = 0x11,
    Byte3 = 0x14,
    Float3Alt2 = 0x15,
    Float1Alt = 0x16,
    Float1Alt2 = 0x18,
}

impl TryFrom<u16> for CurveFormat {
    type Error = Error;

    fn try_from(value: u16) -> Result<Self> {
        Ok(match value {
            0x05 => Self::Float3,
            0x06 => Self::Int1Float3,
            0x08 => Self::Float3Alt,
            0x0A => Self::Int1Float4,
            0x0B => Self::Float1,
            0x0C => Self::Int1Float1,
            0x0F => Self::Short1,
            0x10 => Self::Short3,
            0x11 => Self::Short4,
            0x14 => Self::Byte3,
            0x15 => Self::Float3Alt2,
            0x16 => Self::Float1Alt,
            0x18 => Self::Float1Alt2,
            other => return Err(Error::UnsupportedCurveFormat(other)),
        })
    }
}

impl CurveFormat {
    fn is_float3(self) -> bool {
        matches!(self, Self::Float3 | Self::Float3Alt | Self::Float3Alt2)
    }
}

/// Key values of one curve.
#[derive(Debug, Clone, PartialEq)]
pub enum CurveKeys {
    Float1(Vec<f32>),
    Float3(Vec<[f32; 3]>),
    Int1Float1(Vec<(i32, f32)>),
    Int1Float3(Vec<(i32, [f32; 3])>),
    Int1Float4(Vec<(i32, [f32; 4])>),
    Short1(Vec<i16>),
    Short3(Vec<[i16; 3]>),
    Short4(Vec<[i16; 4]>),
    Byte3(Vec<[i8; 3]>),
}

impl CurveKeys {
    pub fn len(&self) -> usize {
        match self {
            Self::Float1(keys) => keys.len(),
            Self::Float3(keys) => keys.len(),
            Self::Int1Float1(keys) => keys.len(),
            Self::Int1Float3(keys) => keys.len(),
            Self::Int1Float4(keys) => keys.len(),
            Self::Short1(keys) => keys.len(),
            Self::Short3(keys) => keys.len(),
            Self::Short4(keys) => keys.len(),
            Self::Byte3(keys) => keys.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether these keys can be stored under `format`.
    pub fn fits(&self, format: CurveFormat) -> bool {
        use CurveFormat as F;
        match self {
            Self::Float1(_) => matches!(format, F::Float1 | F::Float1Alt | F::Float1Alt2),
            Self::Float3(_) => format.is_float3(),
            Self::Int1Float1(_) => format == F::Int1Float1,
            Self::Int1Float3(_) => format == F::Int1Float3,
            Self::Int1Float4(_) => format == F::Int1Float4,
            Self::Short1(_) => format == F::Short1,
            Self::Short3(_) => format == F::Short3,
            Self::Short4(_) => format == F::Short4,
            Self::Byte3(_) => format == F::Byte3,
        }
    }

    fn read(reader: &mut BinaryReader<'_>, format: CurveFormat, count: usize) -> Result<Self> {
        use CurveFormat as F;
        Ok(match format {
            F::Float3 | F::Float3Alt | F::Float3Alt2 => {
                Self::Float3(read_keys(reader, count, |r| r.read_f32_array())?)
            }
            F::Int1Float3 => Self::Int1Float3(read_keys(reader, count, |r| {
                Ok((r.read_i32()?, r.read_f32_array()?))
            })?),
            F::Int1Float4 => Self::Int1Float4(read_keys(reader, count, |r| {
                Ok((r.read_i32()?, r.read_f32_array()?))
            })?),
            F::Float1 | F::Float1Alt | F::Float1Alt2 => Self::Float1(reader.read_f32_vec(count)?),
            F::Int1Float1 => Self::Int1Float1(read_keys(reader, count, |r| {
                Ok((r.read_i32()?, r.read_f32()?))
            })?),
            F::Short1 => Self::Short1(reader.read_i16_vec(count)?),
            F::Short3 => Self::Short3(read_keys(reader, count, |r| {
                Ok([r.read_i16()?, r.read_i16()?, r.read_i16()?])
            })?),
            F::Short4 => Self::Short4(read_keys(reader, count, |r| {
                Ok([r.read_i16()?, r.read_i16()?, r.read_i16()?, r.read_i16()?])
            })?),
            F::Byte3 => Self::Byte3(read_keys(reader, count, |r| {
                Ok([r.read_i8()?, r.read_i8()?, r.read_i8()?])
            })?),
        })
    }

    fn write(&self, out: &mut BinaryWriter) {
        match self {
            Self::Float1(keys) => out.write_f32_slice(keys),
            Self::Float3(keys) => keys.iter().for_each(|k| out.write_f32_slice(k)),
            Self::Int1Float1(keys) => keys.iter().for_each(|(frame, v)| {
                out.write_i32(*frame);
                out.write_f32(*v);
            }),
            Self::Int1Float3(keys) => keys.iter().for_each(|(frame, v)| {
                out.write_i32(*frame);
                out.write_f32_slice(v);
            }),
            Self::Int1Float4(keys) => keys.iter().for_each(|(frame, v)| {
                out.write_i32(*frame);
                out.write_f32_slice(v);
            }),
            Self::Short1(keys) => out.write_i16_slice(keys),
            Self::Short3(keys) => keys.iter().for_each(|k| out.write_i16_slice(k)),
            Self::Short4(keys) => keys.iter().for_each(|k| out.write_i16_slice(k)),
            Self::Byte3(keys) => keys.iter().flatten().for_each(|&b| out.write_i8(b)),
        }
    }

    /// Keys as (frame, values), using `index × frame_size` when frames are implicit.
    fn keyframes(&self, frame_size: u32, scale: f32) -> Vec<Keyframe> {
        let at = |i: usize| i as i64 * i64::from(frame_size);
        let scaled = |v: &[i16]| -> Vec<f32> { v.iter().map(|&x| f32::from(x) / scale).collect() };
        match self {
            Self::Float1(keys) => keys.iter().enumerate().map(|(i, v)| Keyframe::new(at(i), vec![*v])).collect(),
            Self::Float3(keys) => keys.iter().enumerate().map(|(i, v)| Keyframe::new(at(i), v.to_vec())).collect(),
            Self::Int1Float1(keys) => keys.iter().map(|(f, v)| Keyframe::new(i64::from(*f), vec![*v])).collect(),
            Self::Int1Float3(keys) => keys.iter().map(|(f, v)| Keyframe::new(i64::from(*f), v.to_vec())).collect(),
            Self::Int1Float4(keys) => keys.iter().map(|(f, v)| Keyframe::new(i64::from(*f), v.to_vec())).collect(),
            Self::Short1(keys) => keys.iter().enumerate().map(|(i, v)| Keyframe::new(at(i), scaled(&[*v]))).collect(),
            Self::Short3(keys) => keys.iter().enumerate().map(|(i, v)| Keyframe::new(at(i), scaled(&v[..]))).collect(),
            Self::Short4(keys) => keys.iter().enumerate().map(|(i, v)| Keyframe::new(at(i), scaled(&v[..]))).collect(),
            Self::Byte3(keys) => keys
                .iter()
                .enumerate()
                .map(|(i, v)| Keyframe::new(at(i), v.iter().map(|&b| f32::from(b)).collect()))
                .collect(),
        }
    }
}

fn read_keys<T>(
    reader: &mut BinaryReader<'_>,
    count: usize,
    mut read: impl FnMut(&mut BinaryReader<'_>) -> xfbin_common::Result<T>,
) -> Result<Vec<T>> {
    // Every key is at least one byte.
    if count > reader.remaining() {
        return Err(Error::invalid("anm", format!("{count} keys in {} bytes", reader.remaining())));
    }
    let mut keys = Vec::with_capacity(count);
    for _ in 0..count {
        keys.push(read(reader)?);
    }
    Ok(keys)
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnmCurve {
    /// Sort key; curves are not always stored in order.
    pub index: u16,
    pub format: CurveFormat,
    pub flags: i16,
    pub keys: CurveKeys,
}

/// Where a track's values go on the animated object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataPath {
    Location,
    RotationEuler,
    RotationQuaternion,
    Scale,
    Toggled,
    Camera,
    Unknown,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Keyframe {
    pub frame: i64,
    pub value: Vec<f32>,
}

impl Keyframe {
    fn new(frame: i64, value: Vec<f32>) -> Self {
        Self { frame, value }
    }
}

/// A curve converted to frames and plain float values.
#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub data_path: DataPath,
    pub keyframes: Vec<Keyframe>,
}

/// Curve slots of bone and camera entries, in curve index order.
#[derive(Clone, Copy)]
enum Slot {
    Location,
    Rotation,
    Scale,
    Toggled,
    Camera,
}

const BONE_SLOTS: [Slot; 4] = [Slot::Location, Slot::Rotation, Slot::Scale, Slot::Toggled];
const CAMERA_SLOTS: [Slot; 3] = [Slot::Location, Slot::Rotation, Slot::Camera];

#[derive(Debug, Clone, PartialEq)]
pub struct AnmEntry {
    /// Index into [`Anm::clumps`], or -1 for entries in [`Anm::other_entries`].
    pub clump_index: i16,
    pub bone_index: u16,
    /// Raw entry format; see [`AnmEntryFormat`].
    pub format: u16,
    pub curves: Vec<AnmCurve>,
}

impl AnmEntry {
    pub fn entry_format(&self) -> Option<AnmEntryFormat> {
        AnmEntryFormat::from_raw(self.format)
    }

    /// Convert the curves to keyframe tracks.
    ///
    /// Bone entries yield location, rotation, scale and toggled slots; camera
    /// entries yield location, rotation and camera slots. Missing curves leave
    /// `None` in their slot. Other entries yield one unknown track per curve.
    /// A trailing keyframe at frame -1 is dropped.
    pub fn tracks(&self, frame_size: u32) -> Result<Vec<Option<Track>>> {
        let mut curves: Vec<&AnmCurve> = self.curves.iter().collect();
        curves.sort_by_key(|curve| curve.index);

        let slots: &[Slot] = match self.entry_format() {
            Some(AnmEntryFormat::Bone) => &BONE_SLOTS,
            Some(AnmEntryFormat::Camera) => &CAMERA_SLOTS,
            _ => {
                return Ok(curves
                    .into_iter()
                    .map(|curve| Some(finish(DataPath::Unknown, curve.keys.keyframes(frame_size, 1.0))))
                    .collect())
            }
        };

        slots
            .iter()
            .enumerate()
            .map(|(i, &slot)| curves.get(i).map(|curve| slot_track(slot, curve, frame_size)).transpose())
            .collect()
    }
}

fn slot_track(slot: Slot, curve: &AnmCurve, frame_size: u32) -> Result<Track> {
    use CurveFormat as F;
    let format = curve.format;
    let (data_path, scale) = match (slot, format) {
        (Slot::Location, f) if f.is_float3() || f == F::Int1Float3 => (DataPath::Location, 1.0),
        (Slot::Rotation, f) if f.is_float3() => (DataPath::RotationEuler, 1.0),
        (Slot::Rotation, F::Int1Float4) => (DataPath::RotationQuaternion, 1.0),
        (Slot::Rotation, F::Short4) => (DataPath::RotationQuaternion, 32768.0),
        (Slot::Scale, f) if f.is_float3() || f == F::Int1Float3 => (DataPath::Scale, 1.0),
        (Slot::Scale, F::Short3) => (DataPath::Scale, 4096.0),
        (Slot::Toggled, F::Float1) => (DataPath::Toggled, 1.0),
        (Slot::Toggled, F::Short1) => (DataPath::Toggled, 32768.0),
        (Slot::Camera, F::Int1Float1) => (DataPath::Camera, 1.0),
        _ => {
            return Err(Error::invalid(
                "anm",
                format!("curve format {:#x} does not fit curve slot {}", format as u16, curve.index),
            ))
        }
    };
    Ok(finish(data_path, curve.keys.keyframes(frame_size, scale)))
}

fn finish(data_path: DataPath, mut keyframes: Vec<Keyframe>) -> Track {
    if keyframes.last().is_some_and(|key| key.frame == -1) {
        keyframes.pop();
    }
    Track {
        data_path,
        keyframes,
    }
}

/// Bones and models of one animated clump, as page references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnmClump {
    pub clump: ChunkReference,
    /// Bones, including animated materials.
    pub bones: Vec<ChunkReference>,
    pub models: Vec<ChunkReference>,
}

/// Links a coord of one clump under a coord of another.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AnmCoordParent {
    pub parent_clump: i16,
    pub parent_coord: u16,
    pub child_clump: i16,
    pub child_coord: u16,
}

impl AnmCoordParent {
    pub(crate) fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        Ok(Self {
            parent_clump: reader.read_i16()?,
            parent_coord: reader.read_u16()?,
            child_clump: reader.read_i16()?,
            child_coord: reader.read_u16()?,
        })
    }

    pub(crate) fn write(&self, out: &mut BinaryWriter) {
        out.write_i16(self.parent_clump);
        out.write_u16(self.parent_coord);
        out.write_i16(self.child_clump);
        out.write_u16(self.child_coord);
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Anm {
    pub frame_count: u32,
    /// Ticks per frame, usually 100.
    pub frame_size: u32,
    pub is_looped: bool,
    pub clumps: Vec<AnmClump>,
    /// Chunks animated outside any clump, e.g. cameras and lights.
    pub other_entries: Vec<ChunkId>,
    pub coord_parents: Vec<AnmCoordParent>,
    pub entries: Vec<AnmEntry>,
}

impl Anm {
    /// The chunk an entry animates.
    pub fn entry_chunk(&self, entry: &AnmEntry) -> Option<ChunkId> {
        match usize::try_from(entry.clump_index) {
            Ok(clump) => self
                .clumps
                .get(clump)?
                .bones
                .get(entry.bone_index as usize)
                .map(|bone| bone.chunk),
            Err(_) => self.other_entries.get(entry.bone_index as usize).copied(),
        }
    }
}

pub(crate) fn read_references(
    reader: &mut BinaryReader<'_>,
    scope: &DecodeScope<'_>,
    count: usize,
) -> Result<Vec<ChunkReference>> {
    reader
        .read_u32_vec(count)?
        .into_iter()
        .map(|index| scope.reference(index).cloned())
        .collect()
}

pub(crate) fn write_references(
    out: &mut BinaryWriter,
    scope: &mut EncodeScope<'_>,
    references: &[ChunkReference],
) -> Result<()> {
    for reference in references {
        out.write_u32(scope.reference_index(reference)?);
    }
    Ok(())
}

fn read_entry(reader: &mut BinaryReader<'_>) -> Result<AnmEntry> {
    let clump_index = reader.read_i16()?;
    let bone_index = reader.read_u16()?;
    let format = reader.read_u16()?;
    let curve_count = reader.read_u16()? as usize;

    let mut headers = Vec::with_capacity(curve_count);
    for _ in 0..curve_count {
        let index = reader.read_u16()?;
        let format = CurveFormat::try_from(reader.read_u16()?)?;
        let key_count = reader.read_u16()? as usize;
        let flags = reader.read_i16()?;
        headers.push((index, format, key_count, flags));
    }

    let mut curves = Vec::with_capacity(curve_count);
    for (index, format, key_count, flags) in headers {
        let keys = CurveKeys::read(reader, format, key_count)?;
        reader.align(4)?;
        curves.push(AnmCurve {
            index,
            format,
            flags,
            keys,
        });
    }

    Ok(AnmEntry {
        clump_index,
        bone_index,
        format,
        curves,
    })
}

fn write_entry(out: &mut BinaryWriter, entry: &AnmEntry) -> Result<()> {
    out.write_i16(entry.clump_index);
    out.write_u16(entry.bone_index);
    out.write_u16(entry.format);
    out.write_u16(count_u16("curve count", entry.curves.len())?);

    for curve in &entry.curves {
        if !curve.keys.fits(curve.format) {
            return Err(Error::invalid(
                "anm",
                format!("curve {} keys do not match format {:#x}", curve.index, curve.format as u16),
            ));
        }
        out.write_u16(curve.index);
        out.write_u16(curve.format as u16);
        out.write_u16(count_u16("key count", curve.keys.len())?);
        out.write_i16(curve.flags);
    }
    for curve in &entry.curves {
        curve.keys.write(out);
        out.align(4);
    }
    Ok(())
}

impl ChunkCodec for Anm {
    const KIND: ChunkKind = ChunkKind::Anm;

    fn decode(reader: &mut BinaryReader<'_>, scope: &DecodeScope<'_>) -> Result<Self> {
        let frame_count = reader.read_u32()?;
        let frame_size = reader.read_u32()?;
        let entry_count = reader.read_u16()? as usize;
        let is_looped = reader.read_u16()? != 0;
        let clump_count = reader.read_u16()? as usize;
        let other_count = reader.read_u16()? as usize;
        let coord_count = reader.read_u32()? as usize;

        let mut clumps = Vec::with_capacity(clump_count);
        for _ in 0..clump_count {
            let clump = scope.reference(reader.read_u32()?)?.clone();
            let bone_count = reader.read_u16()? as usize;
            let model_count = reader.read_u16()? as usize;
            clumps.push(AnmClump {
                clump,
                bones: read_references(reader, scope, bone_count)?,
                models: read_references(reader, scope, model_count)?,
            });
        }

        let other_entries = reader
            .read_u32_vec(other_count)?
            .into_iter()
            .map(|index| scope.chunk(index))
            .collect::<Result<_>>()?;

        if coord_count > reader.remaining() / 8 {
            return Err(Error::invalid("anm", format!("{coord_count} coord parents")));
        }
        let coord_parents = (0..coord_count)
            .map(|_| AnmCoordParent::read(reader))
            .collect::<Result<_>>()?;

        let entries = (0..entry_count)
            .map(|_| read_entry(reader))
            .collect::<Result<_>>()?;

        Ok(Self {
            frame_count,
            frame_size,
            is_looped,
            clumps,
            other_entries,
            coord_parents,
            entries,
        })
    }

    fn encode(&self, out: &mut BinaryWriter, scope: &mut EncodeScope<'_>) -> Result<()> {
        out.write_u32(self.frame_count);
        out.write_u32(self.frame_size);
        out.write_u16(count_u16("entry count", self.entries.len())?);
        out.write_u16(u16::from(self.is_looped));
        out.write_u16(count_u16("clump count", self.clumps.len())?);
        out.write_u16(count_u16("other entry count", self.other_entries.len())?);
        out.write_u32(count_u32("coord parent count", self.coord_parents.len())?);

        for clump in &self.clumps {
            out.write_u32(scope.reference_index(&clump.clump)?);
            out.write_u16(count_u16("bone count", clump.bones.len())?);
            out.write_u16(count_u16("model count", clump.models.len())?);
            write_references(out, scope, &clump.bones)?;
            write_references(out, scope, &clump.models)?;
        }

        for &chunk in &self.other_entries {
            out.write_u32(scope.index_of(chunk)?);
        }

        for parent in &self.coord_parents {
            parent.write(out);
        }

        for entry in &self.entries {
            write_entry(out, entry)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunks::test_support::TestPage;

    /// Slots: 0 null, 1 camera. References: clump, two bones.
    fn page() -> TestPage {
        let mut page = TestPage::new(&[("nuccChunkCamera", "cam")]);
        for (type_name, name) in [
            ("nuccChunkClump", "1nrtbod1"),
            ("nuccChunkCoord", "root"),
            ("nuccChunkCoord", "spine"),
        ] {
            let id = page
                .arena
                .insert(crate::ChunkIdentity::new(type_name, "c/1nrt.max", name));
            page.references.push(ChunkReference::new(name, id));
        }
        page
    }

    fn bone_entry() -> AnmEntry {
        AnmEntry {
            clump_index: 0,
            bone_index: 1,
            format: AnmEntryFormat::Bone as u16,
            curves: vec![
                AnmCurve {
                    index: 1,
                    format: CurveFormat::Short4,
                    flags: 0,
                    keys: CurveKeys::Short4(vec![[0, 0, 0, 0x4000], [0x4000, 0, 0, 0]]),
                },
                AnmCurve {
                    index: 0,
                    format: CurveFormat::Int1Float3,
                    flags: 0,
                    keys: CurveKeys::Int1Float3(vec![(0, [0.0, 1.0, 0.0]), (-1, [0.0, 1.0, 0.0])]),
                },
                AnmCurve {
                    index: 2,
                    format: CurveFormat::Short3,
                    flags: 0,
                    keys: CurveKeys::Short3(vec![[0x1000, 0x1000, 0x2000]]),
                },
                AnmCurve {
                    index: 3,
                    format: CurveFormat::Short1,
                    flags: 0,
                    keys: CurveKeys::Short1(vec![0x4000]),
                },
            ],
        }
    }

    fn anm(page: &TestPage) -> Anm {
        Anm {
            frame_count: 2,
            frame_size: 100,
            is_looped: true,
            clumps: vec![AnmClump {
                clump: page.references[0].clone(),
                bones: page.references[1..].to_vec(),
                models: vec![],
            }],
            other_entries: vec![page.locals[1]],
            coord_parents: vec![AnmCoordParent {
                parent_clump: 0,
                parent_coord: 0,
                child_clump: -1,
                child_coord: 0,
            }],
            entries: vec![
                bone_entry(),
                AnmEntry {
                    clump_index: -1,
                    bone_index: 0,
                    format: AnmEntryFormat::Camera as u16,
                    curves: vec![AnmCurve {
                        index: 2,
                        format: CurveFormat::Int1Float1,
                        flags: 0,
                        keys: CurveKeys::Int1Float1(vec![(0, 45.0), (100, 60.0)]),
                    }],
                },
            ],
        }
    }

    #[test]
    fn test_anm_round_trip() {
        let page = page();
        let anm = anm(&page);
        let bytes = page.encode(&anm);
        assert_eq!(bytes.len() % 4, 0);

        let decoded: Anm = page.decode(&bytes).unwrap();
        assert_eq!(decoded, anm);
        assert_eq!(decoded.entry_chunk(&decoded.entries[0]), Some(page.references[2].chunk));
        assert_eq!(decoded.entry_chunk(&decoded.entries[1]), Some(page.locals[1]));
    }

    #[test]
    fn test_curve_values_are_padded() {
        let mut out = BinaryWriter::new();
        let entry = AnmEntry {
            clump_index: -1,
            bone_index: 0,
            format: AnmEntryFormat::LightDirc as u16,
            curves: vec![
                AnmCurve {
                    index: 0,
                    format: CurveFormat::Byte3,
                    flags: 0,
                    keys: CurveKeys::Byte3(vec![[1, 2, 3]]),
                },
                AnmCurve {
                    index: 1,
                    format: CurveFormat::Float1Alt,
                    flags: 0,
                    keys: CurveKeys::Float1(vec![0.5]),
                },
            ],
        };
        write_entry(&mut out, &entry).unwrap();
        // 8-byte entry header, 16 bytes of curve headers, 3 bytes + 1 pad, 4 bytes.
        assert_eq!(out.position(), 8 + 16 + 4 + 4);
        assert_eq!(&out.as_bytes()[24..28], &[1, 2, 3, 0]);

        let mut reader = BinaryReader::new(out.as_bytes());
        assert_eq!(read_entry(&mut reader).unwrap(), entry);
    }

    #[test]
    fn test_unknown_curve_format() {
        let mut out = BinaryWriter::new();
        out.write_u16_slice(&[0xFFFF, 0, 4, 1]);
        out.write_u16_slice(&[0, 0x99, 0, 0]);
        let mut reader = BinaryReader::new(out.as_bytes());
        let err = read_entry(&mut reader).unwrap_err();
        assert!(matches!(err, Error::UnsupportedCurveFormat(0x99)));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_mismatched_keys_rejected() {
        let mut entry = bone_entry();
        entry.curves[0].format = CurveFormat::Float3;
        assert!(write_entry(&mut BinaryWriter::new(), &entry).is_err());
    }

    #[test]
    fn test_bone_tracks() {
        let tracks = bone_entry().tracks(100).unwrap();
        assert_eq!(tracks.len(), 4);

        let location = tracks[0].as_ref().unwrap();
        assert_eq!(location.data_path, DataPath::Location);
        // The frame -1 key is dropped.
        assert_eq!(location.keyframes.len(), 1);

        let rotation = tracks[1].as_ref().unwrap();
        assert_eq!(rotation.data_path, DataPath::RotationQuaternion);
        assert_eq!(rotation.keyframes[1].frame, 100);
        assert_eq!(rotation.keyframes[0].value, vec![0.0, 0.0, 0.0, 0.5]);

        let scale = tracks[2].as_ref().unwrap();
        assert_eq!(scale.keyframes[0].value, vec![1.0, 1.0, 2.0]);

        let toggled = tracks[3].as_ref().unwrap();
        assert_eq!(toggled.data_path, DataPath::Toggled);
        assert_eq!(toggled.keyframes[0].value, vec![0.5]);
    }

    #[test]
    fn test_missing_slots_are_none() {
        let mut entry = bone_entry();
        entry.curves.truncate(2);
        let tracks = entry.tracks(100).unwrap();
        assert!(tracks[2].is_none() && tracks[3].is_none());
    }

    #[test]
    fn test_wrong_format_for_slot() {
        let mut entry = bone_entry();
        entry.curves[3] = AnmCurve {
            index: 3,
            format: CurveFormat::Byte3,
            flags: 0,
            keys: CurveKeys::Byte3(vec![[0, 0, 0]]),
        };
        assert!(entry.tracks(100).is_err());
    }
}
